//! # airpower-server
//!
//! HTTP server for tracking power usage, budgets and recommendations.
//!
//! Every `/api` route except registration and login requires a bearer
//! token; see `airpower-auth` for the authentication flow. Documents are
//! persisted through the `airpower-storage` abstraction, backed by the
//! in-memory store.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod recommend;
pub mod server;
pub mod storage_adapter;

pub use config::AppConfig;
pub use server::{AirpowerServer, AppState, ServerBuilder, build_app, build_state};
