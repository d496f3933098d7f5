pub mod auth;
pub mod rate_limit;
pub mod response;
pub mod security_headers;
