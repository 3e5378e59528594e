//! Common utilities for integration tests.

use std::collections::HashMap;

use v4_pool_desk::{Config, PoolDeskServer};

/// Build a configuration from explicit variables, without reading the environment.
#[allow(dead_code)]
pub fn config_from(pairs: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> =
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    Config::from_vars(&vars).expect("test configuration should be valid")
}

/// Helper to create a test server from environment variables.
#[allow(dead_code)]
pub fn create_test_server() -> Option<PoolDeskServer> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let rpc_url = std::env::var("ETHEREUM_RPC_URL").ok()?;
    if rpc_url.is_empty() {
        return None;
    }

    let config = Config::from_vars(&std::env::vars().collect()).ok()?;
    PoolDeskServer::new(config).ok()
}

/// Skip test if server cannot be created (missing env vars).
#[macro_export]
macro_rules! skip_if_no_server {
    () => {
        match common::create_test_server() {
            Some(server) => server,
            None => {
                eprintln!("Skipping test: ETHEREUM_RPC_URL not set");
                return;
            }
        }
    };
}
