//! Item stacks and item templates.

use serde::{Deserialize, Serialize};

/// Suffix that marks an item kind as a plantable seed.
pub const SEED_SUFFIX: &str = "_seed";

/// Returns true if the item kind follows the seed naming convention.
#[must_use]
pub fn is_seed_kind(kind: &str) -> bool {
    kind.ends_with(SEED_SUFFIX)
}

/// Derives a display name from an item kind.
///
/// `wheat_seed` becomes `Wheat Seed`.
#[must_use]
pub fn display_name_for(kind: &str) -> String {
    kind.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Largest count a stack can hold. Matches the signed count of save documents.
pub const MAX_STACK_COUNT: u32 = i32::MAX.unsigned_abs();

/// A quantity of one kind of item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Kind identifier (used for stacking and saves)
    pub kind: String,
    /// Name shown in UI
    pub display_name: String,
    /// How many items are in the stack
    pub count: u32,
}

impl ItemStack {
    /// Creates a new item stack, capping the count at [`MAX_STACK_COUNT`].
    #[must_use]
    pub fn new(kind: impl Into<String>, display_name: impl Into<String>, count: u32) -> Self {
        Self {
            kind: kind.into(),
            display_name: display_name.into(),
            count: count.min(MAX_STACK_COUNT),
        }
    }

    /// Creates a stack whose display name is derived from the kind.
    #[must_use]
    pub fn named(kind: impl Into<String>, count: u32) -> Self {
        let kind = kind.into();
        let display_name = display_name_for(&kind);
        Self::new(kind, display_name, count)
    }

    /// Returns true if the stack holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if this stack holds seeds.
    #[must_use]
    pub fn is_seed(&self) -> bool {
        is_seed_kind(&self.kind)
    }

    /// Adds items to this stack, returning the new count.
    ///
    /// The count saturates at [`MAX_STACK_COUNT`].
    pub fn add(&mut self, amount: u32) -> u32 {
        self.count = self.count.saturating_add(amount).min(MAX_STACK_COUNT);
        self.count
    }

    /// Takes up to `amount` items, returning how many were taken.
    pub fn take(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.count);
        self.count -= taken;
        taken
    }
}

/// Kind and display name of an item, without a quantity.
///
/// Used by configuration to describe harvest yields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTemplate {
    /// Kind identifier
    pub kind: String,
    /// Name shown in UI
    pub display_name: String,
}

impl ItemTemplate {
    /// Creates a new template.
    #[must_use]
    pub fn new(kind: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            display_name: display_name.into(),
        }
    }

    /// Builds a stack of `count` items from this template.
    #[must_use]
    pub fn stack(&self, count: u32) -> ItemStack {
        ItemStack::new(self.kind.clone(), self.display_name.clone(), count)
    }
}
