pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod notify;
pub mod sweeper;

pub use catalog::{CatalogSource, MemoryCatalog, SqliteCatalog};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    CatalogItem, Clock, Demand, FailReason, ItemId, Multiplier, Mutation, MutationId, Party,
    SystemClock, TimeMs, Trade, TradeId, TradeItemSnapshot, TradeStatus, TraitDef, TraitId,
    UserId, Value,
};
pub use engine::{TradeEngine, TradeItemDraft};
pub use error::AppError;
pub use notify::{TradeChanged, TradeEvents};
