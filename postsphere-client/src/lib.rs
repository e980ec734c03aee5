// Library interface for the PostSphere client (used by the binary and tests)
#[macro_use]
pub mod logging;

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod optimistic;
pub mod session;
pub mod storage;
pub mod validation;
pub mod view;
