pub mod config;
pub mod fetcher;
pub mod rate_limiter;
pub mod state;
