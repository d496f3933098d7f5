pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "heritage")]
#[command(about = "Heritage CLI - server and administration commands for the Heritage API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the API server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Create an active administrator account")]
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    #[command(about = "Check that a running server is healthy")]
    Ping {
        #[arg(long, default_value = "http://localhost:3000", help = "Server base URL")]
        url: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port } => commands::serve(port).await,
        Commands::Migrate => commands::migrate().await,
        Commands::CreateAdmin { username, email, password } => {
            commands::create_admin(&username, &email, &password).await
        }
        Commands::Ping { url } => commands::ping(&url).await,
    }
}
