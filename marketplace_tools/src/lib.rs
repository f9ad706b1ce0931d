//! Typed API clients for the two marketplaces the console aggregates.
//!
//! Each client is a thin wrapper over the marketplace's REST API: it owns a configured [`reqwest::Client`], knows how
//! to page through result sets, and deserializes responses into the wire types declared here. No normalization happens
//! at this layer. The unified schema and all profit logic live in `seller_console_engine`; this crate only moves
//! bytes.
//!
//! Credentials are injected through the [`CredentialStore`] trait. Clients never reach into ambient storage — a
//! disconnected platform simply yields no client.
mod back_market;
mod config;
mod credentials;
mod error;
mod mercado_libre;
mod rate_limiter;

pub use back_market::{BackMarketApi, BmAddress, BmListing, BmOrder, BmOrderline, BmPage, BmTrackingUpdate};
pub use config::{BackMarketConfig, MercadoLibreConfig};
pub use credentials::{CredentialStore, EnvCredentialStore, MemoryCredentialStore};
pub use error::MarketplaceApiError;
pub use mercado_libre::{
    MercadoLibreApi,
    MlBuyer,
    MlItem,
    MlItemRef,
    MlItemUpdate,
    MlOrder,
    MlOrderItem,
    MlOrderSearchResponse,
    MlPaging,
    MlPayment,
    MlShipping,
    MlStatusDetail,
    MlVariation,
    OrderSearchParams,
};
pub use rate_limiter::RateLimiter;
