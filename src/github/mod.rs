pub mod action;
pub mod client;
pub mod rate_limiter;

pub use client::GithubClient;
