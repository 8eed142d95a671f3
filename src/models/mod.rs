pub mod cache;
pub mod error;
pub mod market;
pub mod news;
pub mod sentiment;
