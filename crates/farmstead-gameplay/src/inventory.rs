//! Slot-based inventory.
//!
//! A fixed number of slots, each holding at most one item stack. Adding
//! always stacks onto the slot already holding the same kind before opening
//! a new slot, so a kind never occupies two slots. Slot indices are stable
//! and are used by UI binding and persistence.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::item::ItemStack;

/// Default number of inventory slots (3x3 grid).
pub const DEFAULT_CAPACITY: usize = 9;

/// Inventory error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// No slot holds the kind and no slot is empty
    #[error("Inventory full: capacity {capacity}")]
    Full {
        /// Inventory capacity
        capacity: usize,
    },
    /// Slot index out of range
    #[error("Invalid slot index {index} (capacity {capacity})")]
    InvalidSlot {
        /// Requested index
        index: usize,
        /// Inventory capacity
        capacity: usize,
    },
    /// Tried to add an empty stack
    #[error("Cannot add zero items")]
    ZeroQuantity,
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// A fixed-capacity slot inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Slots that can hold item stacks (None = empty)
    slots: Vec<Option<ItemStack>>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Inventory {
    /// Creates a new empty inventory with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns every slot in index order.
    #[must_use]
    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    /// Returns the stack in a slot, if any.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Returns true if no slot holds items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns the count of a specific kind.
    #[must_use]
    pub fn count(&self, kind: &str) -> u32 {
        self.find_slot(kind)
            .and_then(|index| self.slot(index))
            .map_or(0, |stack| stack.count)
    }

    /// Finds the slot holding a kind.
    #[must_use]
    pub fn find_slot(&self, kind: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|stack| stack.kind == kind))
    }

    /// Finds the first empty slot.
    #[must_use]
    pub fn find_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Checks whether an add of this kind would succeed.
    #[must_use]
    pub fn has_room_for(&self, kind: &str) -> bool {
        self.find_slot(kind).is_some() || self.find_empty_slot().is_some()
    }

    /// Checks whether every stack could be added without any being dropped.
    #[must_use]
    pub fn can_accept(&self, stacks: &[ItemStack]) -> bool {
        let mut new_kinds: Vec<&str> = Vec::new();
        for stack in stacks.iter().filter(|stack| !stack.is_empty()) {
            if self.find_slot(&stack.kind).is_none() && !new_kinds.contains(&stack.kind.as_str()) {
                new_kinds.push(&stack.kind);
            }
        }
        let empty = self.slots.iter().filter(|slot| slot.is_none()).count();
        new_kinds.len() <= empty
    }

    /// Adds items, returning the slot index they landed in.
    ///
    /// Slots are scanned in index order: an existing slot of the same kind
    /// is merged into first, otherwise the first empty slot is used. When
    /// neither exists the items are dropped and `Full` is returned.
    pub fn add(
        &mut self,
        kind: &str,
        display_name: &str,
        count: u32,
    ) -> InventoryResult<usize> {
        if count == 0 {
            return Err(InventoryError::ZeroQuantity);
        }

        if let Some(index) = self.find_slot(kind) {
            if let Some(stack) = self.slots[index].as_mut() {
                let total = stack.add(count);
                debug!(kind, count, slot = index, total, "stacked items");
            }
            return Ok(index);
        }

        if let Some(index) = self.find_empty_slot() {
            self.slots[index] = Some(ItemStack::new(kind, display_name, count));
            debug!(kind, count, slot = index, "placed items in empty slot");
            return Ok(index);
        }

        warn!(kind, count, "inventory full, items dropped");
        Err(InventoryError::Full {
            capacity: self.capacity(),
        })
    }

    /// Adds a copy of a stack.
    pub fn add_stack(&mut self, stack: &ItemStack) -> InventoryResult<usize> {
        self.add(&stack.kind, &stack.display_name, stack.count)
    }

    /// Removes items of a kind, returning how many were removed.
    ///
    /// The slot is emptied when its count reaches zero. Removing an absent
    /// kind is a no-op that returns 0.
    pub fn remove(&mut self, kind: &str, count: u32) -> u32 {
        let Some(index) = self.find_slot(kind) else {
            return 0;
        };

        let slot = &mut self.slots[index];
        let removed = match slot.as_mut() {
            Some(stack) => stack.take(count),
            None => 0,
        };
        if slot.as_ref().is_some_and(ItemStack::is_empty) {
            *slot = None;
        }

        debug!(kind, removed, slot = index, "removed items");
        removed
    }

    /// Swaps the contents of two slots, including with an empty slot.
    pub fn swap(&mut self, slot_a: usize, slot_b: usize) -> InventoryResult<()> {
        let capacity = self.capacity();
        for index in [slot_a, slot_b] {
            if index >= capacity {
                return Err(InventoryError::InvalidSlot { index, capacity });
            }
        }

        self.slots.swap(slot_a, slot_b);
        Ok(())
    }

    /// Returns the first slot holding seeds.
    #[must_use]
    pub fn first_seed(&self) -> Option<&ItemStack> {
        self.iter_items()
            .find(|stack| stack.is_seed() && stack.count > 0)
    }

    /// Returns an iterator over all non-empty stacks in slot order.
    pub fn iter_items(&self) -> impl Iterator<Item = &ItemStack> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Replaces the slot sequence wholesale, by position.
    ///
    /// Entries past the capacity are dropped, empty stacks become empty
    /// slots, and a repeated kind is merged into its first slot. Returns
    /// the number of entries that could not be placed.
    pub fn restore_slots<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = Option<ItemStack>>,
    {
        self.clear();
        let capacity = self.capacity();
        let mut dropped = 0;

        for (index, entry) in entries.into_iter().enumerate() {
            let Some(stack) = entry.filter(|stack| !stack.is_empty()) else {
                continue;
            };
            if index >= capacity {
                dropped += 1;
                continue;
            }
            match self.find_slot(&stack.kind) {
                Some(existing) => {
                    if let Some(target) = self.slots[existing].as_mut() {
                        target.add(stack.count);
                    }
                },
                None => self.slots[index] = Some(stack),
            }
        }

        if dropped > 0 {
            warn!(dropped, capacity, "restored inventory exceeded capacity");
        }
        dropped
    }
}
