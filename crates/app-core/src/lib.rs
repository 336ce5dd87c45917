pub mod config;
pub mod error;
pub mod middleware;
pub mod provider;
pub mod response;
pub mod webhook;
