#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone binary for the ZAN dashboard API server.
//!
//! Configured entirely through the environment: `BIND_ADDR`, `PORT`,
//! `ZAN_DATA_DIR`, `ZAN_STATIC_DIR` and `ZAN_ALLOW_RELOAD`.

use zan_dashboard_server::{ServerConfig, run_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    run_server(ServerConfig::from_env()).await
}
