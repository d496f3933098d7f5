use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

// Spawns its own server rather than using the shared one: the limiter
// settings have to differ from the defaults the other tests run with.
#[tokio::test]
async fn global_limiter_throttles_all_traffic_when_enabled() -> Result<()> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let mut child = Command::new("target/debug/heritage-api")
        .env("HERITAGE_API_PORT", port.to_string())
        .env("DATABASE_RUN_MIGRATIONS", "false")
        .env("API_ENABLE_RATE_LIMITING", "true")
        .env("API_RATE_LIMIT_REQUESTS", "8")
        .env("API_RATE_LIMIT_WINDOW_SECS", "60")
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .context("failed to spawn server binary")?;

    let client = reqwest::Client::new();

    // Wait for liveness; refused connections cost nothing against the
    // window, the first served health check costs one
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if Instant::now() > deadline {
            let _ = child.kill();
            anyhow::bail!("server did not become ready on {}", base_url);
        }
        if let Ok(resp) = client.get(format!("{}/health", base_url)).send().await {
            if resp.status() == StatusCode::OK
                || resp.status() == StatusCode::SERVICE_UNAVAILABLE
            {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    let mut served = 0;
    let mut throttled = 0;
    for _ in 0..20 {
        let res = client.get(&base_url).send().await?;
        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            let body = res.json::<serde_json::Value>().await?;
            assert_eq!(body["code"], "TOO_MANY_REQUESTS");
            throttled += 1;
        } else {
            assert_eq!(res.status(), StatusCode::OK);
            served += 1;
        }
    }

    let _ = child.kill();

    assert!(served > 0, "requests within the window budget should succeed");
    assert!(
        throttled > 0,
        "requests past the window budget should be throttled (served {})",
        served
    );
    Ok(())
}
