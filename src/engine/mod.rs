//! Engines: pure value resolution, the two-party agreement protocol, and
//! the trade lifecycle state machine built on top of both.

pub mod agreement;
pub mod effects;
pub mod lifecycle;
pub mod value;

pub use agreement::{AcceptOutcome, Agreement};
pub use effects::SideEffects;
pub use lifecycle::{TradeEngine, TradeItemDraft};
pub use value::{
    allowed_mutation_ids, allowed_trait_ids, final_value, resolve_mutation, resolve_traits,
    snapshot_item, ModifierSelection, ResolvedMutation,
};
