pub mod auth;
pub mod block;
pub mod config;
pub mod enforce;
pub mod permissions;
pub mod report;
pub mod usage;
