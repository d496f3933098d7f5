pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
