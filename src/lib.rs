pub mod app;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod gallery;
pub mod logging;
pub mod models;
pub mod routes;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
