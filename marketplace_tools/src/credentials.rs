use crate::{BackMarketConfig, MercadoLibreConfig};

/// Source of marketplace credentials.
///
/// The mapping and reconciliation code never touches ambient storage; whoever builds the clients resolves credentials
/// through this trait once, up front. A platform returning `None` is simply skipped — it contributes zero listings
/// and orders, and no error.
pub trait CredentialStore: Send + Sync {
    fn mercado_libre(&self) -> Option<MercadoLibreConfig>;
    fn back_market(&self) -> Option<BackMarketConfig>;
}

/// Credential store backed by `USC_ML_*` / `USC_BM_*` environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialStore;

impl CredentialStore for EnvCredentialStore {
    fn mercado_libre(&self) -> Option<MercadoLibreConfig> {
        MercadoLibreConfig::from_env()
    }

    fn back_market(&self) -> Option<BackMarketConfig> {
        BackMarketConfig::from_env()
    }
}

/// Fixed in-memory credentials, used by tests and the CLI.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    pub mercado_libre: Option<MercadoLibreConfig>,
    pub back_market: Option<BackMarketConfig>,
}

impl MemoryCredentialStore {
    pub fn disconnected() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn mercado_libre(&self) -> Option<MercadoLibreConfig> {
        self.mercado_libre.clone()
    }

    fn back_market(&self) -> Option<BackMarketConfig> {
        self.back_market.clone()
    }
}
