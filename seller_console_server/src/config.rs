use std::env;

use log::*;
use usc_common::helpers::parse_boolean_flag;

const DEFAULT_USC_HOST: &str = "127.0.0.1";
const DEFAULT_USC_PORT: u16 = 8460;
const DEFAULT_DATABASE_URL: &str = "sqlite://seller_console.sqlite";

/// Server configuration, loaded from `USC_*` environment variables.
///
/// Marketplace credentials are intentionally not part of this struct; they are resolved through
/// [`marketplace_tools::CredentialStore`] so that nothing downstream of the boundary carries tokens around.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// When true, the default SKU cost rows are inserted at startup if they are missing.
    pub seed_default_costs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_USC_HOST.to_string(),
            port: DEFAULT_USC_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            seed_default_costs: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("USC_HOST").ok().unwrap_or_else(|| DEFAULT_USC_HOST.into());
        let port = env::var("USC_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for USC_PORT. {e} Using the default, {DEFAULT_USC_PORT}, instead.");
                    DEFAULT_USC_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_USC_PORT);
        let database_url = env::var("USC_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ USC_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let seed_default_costs = parse_boolean_flag(env::var("USC_SEED_DEFAULT_COSTS").ok().as_deref(), false);
        Self { host, port, database_url, seed_default_costs }
    }
}
