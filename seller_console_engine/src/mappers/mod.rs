//! Platform mappers: each converts one marketplace's native wire format into the unified schema.
//!
//! Both mappers are pure. The cost lookup is injected as a closure so that a snapshot of the cost table can be built
//! once and shared across a whole batch of orders, instead of re-querying per item.
mod back_market;
mod mercado_libre;

pub use back_market::{map_bm_listing, map_bm_order, BmOrderState};
pub use mercado_libre::{
    estimate_ml_fee_rate,
    map_ml_listing,
    map_ml_order,
    net_payout_estimate,
    ML_ORDER_NUMBER_PREFIX,
};
