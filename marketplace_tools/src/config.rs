use log::*;
use usc_common::Secret;

pub const DEFAULT_ML_BASE_URL: &str = "https://api.mercadolibre.com";
pub const DEFAULT_BM_BASE_URL: &str = "https://www.backmarket.com/ws";

/// Mercado Libre API access configuration.
///
/// The access token is the OAuth bearer token obtained out-of-band (the token exchange itself is handled by the
/// dashboard, not this library). `user_id` is the seller account id; when absent it is fetched from `/users/me` on
/// first use.
#[derive(Debug, Clone, Default)]
pub struct MercadoLibreConfig {
    pub base_url: String,
    pub access_token: Secret<String>,
    pub user_id: Option<String>,
}

impl MercadoLibreConfig {
    pub fn new(access_token: &str, user_id: Option<String>) -> Self {
        Self {
            base_url: DEFAULT_ML_BASE_URL.to_string(),
            access_token: Secret::new(access_token.to_string()),
            user_id,
        }
    }

    /// Load the configuration from `USC_ML_*` environment variables. Returns `None` when no token is set, which is
    /// the "not connected" condition, not an error.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("USC_ML_ACCESS_TOKEN").ok().filter(|t| !t.trim().is_empty())?;
        let base_url = std::env::var("USC_ML_BASE_URL").unwrap_or_else(|_| {
            debug!("USC_ML_BASE_URL not set, using {DEFAULT_ML_BASE_URL}");
            DEFAULT_ML_BASE_URL.to_string()
        });
        let user_id = std::env::var("USC_ML_USER_ID").ok().filter(|u| !u.trim().is_empty());
        if user_id.is_none() {
            info!("USC_ML_USER_ID not set. The seller id will be fetched from the API on first use.");
        }
        Some(Self { base_url, access_token: Secret::new(token), user_id })
    }
}

/// Back Market API access configuration. The token is used as-is in a `Basic` authorization header.
#[derive(Debug, Clone, Default)]
pub struct BackMarketConfig {
    pub base_url: String,
    pub access_token: Secret<String>,
}

impl BackMarketConfig {
    pub fn new(access_token: &str) -> Self {
        Self { base_url: DEFAULT_BM_BASE_URL.to_string(), access_token: Secret::new(access_token.to_string()) }
    }

    /// Load the configuration from `USC_BM_*` environment variables. `None` means "not connected".
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("USC_BM_ACCESS_TOKEN").ok().filter(|t| !t.trim().is_empty())?;
        let base_url = std::env::var("USC_BM_BASE_URL").unwrap_or_else(|_| {
            debug!("USC_BM_BASE_URL not set, using {DEFAULT_BM_BASE_URL}");
            DEFAULT_BM_BASE_URL.to_string()
        });
        Some(Self { base_url, access_token: Secret::new(token) })
    }
}
