//! Application services: repository and blob-store boundaries plus the
//! publishing workflow built on top of them.

pub mod admin;
pub mod auth;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod repos;
pub mod storage;
