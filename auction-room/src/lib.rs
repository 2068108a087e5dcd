// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod app;
pub mod auction;
pub mod config;
pub mod db;
pub mod protocol;
pub mod seed;
pub mod ws_server;
