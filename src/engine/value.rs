//! Pure value resolution for catalog items and modifier selections.
//!
//! Everything here is side-effect-free and deterministic: the same inputs
//! produce the same snapshot whether run server-side at post time or
//! client-side as a preview.

use crate::domain::{
    CatalogItem, Multiplier, Mutation, MutationId, TradeItemSnapshot, TraitDef, TraitId,
};

/// A mutation selection resolved against one catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMutation {
    /// Selected mutation, with any per-item multiplier override applied.
    /// None when nothing was selected or the selection is not allowed.
    pub mutation: Option<Mutation>,
    /// Image to display: override image when the item configures one for
    /// the selected mutation, else the item's own image.
    pub image: String,
}

impl ResolvedMutation {
    /// Effective multiplier: the mutation's, or 1 when none.
    pub fn multiplier(&self) -> Multiplier {
        self.mutation
            .as_ref()
            .map(|m| m.multiplier)
            .unwrap_or_else(Multiplier::identity)
    }
}

/// Mutation ids the item permits, in stable (id) order.
pub fn allowed_mutation_ids(item: &CatalogItem) -> Vec<MutationId> {
    item.allowed_mutations.keys().cloned().collect()
}

/// Trait ids the item permits, in stable (id) order.
pub fn allowed_trait_ids(item: &CatalogItem) -> Vec<TraitId> {
    item.allowed_traits.keys().cloned().collect()
}

/// Resolve a mutation selection against an item's allowed set.
///
/// A null or disallowed selection resolves to "no mutation" (multiplier 1,
/// the item's own image) rather than an error.
pub fn resolve_mutation(
    candidates: &[Mutation],
    item: &CatalogItem,
    selected: Option<&MutationId>,
) -> ResolvedMutation {
    let none = ResolvedMutation {
        mutation: None,
        image: item.image.clone(),
    };

    let Some(selected) = selected else {
        return none;
    };
    let Some(override_cfg) = item.allowed_mutations.get(selected) else {
        return none;
    };
    let Some(base) = candidates.iter().find(|m| &m.id == selected) else {
        // Allowed on the item but missing from the definitions list: the
        // catalog halves are out of sync. Degrade the same way as a
        // disallowed selection.
        return none;
    };

    let multiplier = override_cfg.multiplier.unwrap_or(base.multiplier);
    let image = override_cfg
        .image
        .clone()
        .unwrap_or_else(|| item.image.clone());

    ResolvedMutation {
        mutation: Some(Mutation {
            id: base.id.clone(),
            name: base.name.clone(),
            multiplier,
        }),
        image,
    }
}

/// Resolve a trait selection against an item's allowed set.
///
/// Unrecognized and disallowed ids are silently dropped. Output order
/// follows the candidate list, not the selection, so resolution is
/// idempotent and insensitive to how the caller ordered their picks.
pub fn resolve_traits(
    candidates: &[TraitDef],
    item: &CatalogItem,
    selected: &[TraitId],
) -> Vec<TraitDef> {
    candidates
        .iter()
        .filter(|t| selected.contains(&t.id))
        .filter_map(|t| {
            let override_cfg = item.allowed_traits.get(&t.id)?;
            let multiplier = override_cfg.multiplier.unwrap_or(t.multiplier);
            Some(TraitDef {
                id: t.id.clone(),
                name: t.name.clone(),
                multiplier,
            })
        })
        .collect()
}

/// Final value of one item: base x mutation multiplier x each trait
/// multiplier. Traits stack multiplicatively with each other and with the
/// mutation. A zero base yields zero regardless of modifiers.
pub fn final_value(
    base: crate::domain::Value,
    mutation: &ResolvedMutation,
    traits: &[TraitDef],
) -> crate::domain::Value {
    let mut value = base.scaled_by(mutation.multiplier());
    for t in traits {
        value = value.scaled_by(t.multiplier);
    }
    value
}

/// Selection a caller submits for one trade item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierSelection {
    pub mutation_id: Option<MutationId>,
    pub trait_ids: Vec<TraitId>,
}

/// Compose resolution into the immutable snapshot attached to a trade.
pub fn snapshot_item(
    mutations: &[Mutation],
    traits: &[TraitDef],
    item: &CatalogItem,
    selection: &ModifierSelection,
) -> TradeItemSnapshot {
    let resolved_mutation = resolve_mutation(mutations, item, selection.mutation_id.as_ref());
    let resolved_traits = resolve_traits(traits, item, &selection.trait_ids);
    let value = final_value(item.base_value, &resolved_mutation, &resolved_traits);

    TradeItemSnapshot {
        name: item.name.clone(),
        image: resolved_mutation.image.clone(),
        base_value: item.base_value,
        mutation_id: resolved_mutation.mutation.as_ref().map(|m| m.id.clone()),
        trait_ids: resolved_traits.iter().map(|t| t.id.clone()).collect(),
        final_value: value,
    }
}
