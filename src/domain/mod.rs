//! Domain types for the trade marketplace.
//!
//! This module provides:
//! - Lossless value arithmetic via the Value/Multiplier wrappers
//! - Domain primitives: TimeMs, TradeId, UserId, ItemId, modifier ids
//! - Catalog definitions (items, mutations, traits, per-item overrides)
//! - Trade records and their lifecycle status vocabulary

pub mod catalog;
pub mod clock;
pub mod primitives;
pub mod trade;
pub mod value;

pub use catalog::{CatalogItem, Demand, Mutation, MutationOverride, TraitDef, TraitOverride};
pub use clock::{Clock, ManualClock, SystemClock};
pub use primitives::{ItemId, MutationId, TimeMs, TradeId, TraitId, UserId};
pub use trade::{FailReason, Party, Trade, TradeItemSnapshot, TradeStatus};
pub use value::{Multiplier, Value};
