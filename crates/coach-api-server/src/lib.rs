pub mod auth;
pub mod config;
pub mod database;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;
pub mod utils;

pub use router::build_router;
pub use state::AppState;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
pub(crate) mod testutil;
