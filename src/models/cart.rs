use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::product::LineEntry;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CartError {
    #[error("Position {position} is out of range for {len} cart slots")]
    PositionOutOfRange { position: usize, len: usize },
}

/// In-memory cart: ordered line entries, the parallel slot sequence and the
/// derived grand total.
///
/// Entries keep insertion order, which is also display order. Slots are UI
/// placeholders; a slot whose product has not been chosen yet has no entry.
#[derive(Debug, Clone)]
pub struct CartModel {
    entries: Vec<LineEntry>,
    slots: Vec<u32>,
    slot_counter: u32,
    grand_total: Decimal,
    invalid: bool,
}

impl Default for CartModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CartModel {
    /// Empty cart with one open slot.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            slots: vec![1],
            slot_counter: 1,
            grand_total: zero_total(),
            invalid: false,
        }
    }

    /// Replace the entry with the same index in place, or append it.
    pub fn upsert(&mut self, entry: LineEntry) {
        match self.entries.iter().position(|e| e.index == entry.index) {
            Some(position) => self.entries[position] = entry,
            None => self.entries.push(entry),
        }
        self.recompute();
    }

    /// Remove the slot at `position` together with its entry, if it has one.
    ///
    /// An entry belongs to the slot whose position equals its `index`.
    pub fn delete_at(&mut self, position: usize) -> Result<Option<LineEntry>, CartError> {
        if position >= self.slots.len() {
            return Err(CartError::PositionOutOfRange {
                position,
                len: self.slots.len(),
            });
        }

        self.slots.remove(position);
        let removed = self
            .entries
            .iter()
            .position(|e| e.index == position)
            .map(|found| self.entries.remove(found));

        // Lines after the removed slot move up one place.
        for entry in self.entries.iter_mut().filter(|e| e.index > position) {
            entry.index -= 1;
        }

        self.recompute();
        Ok(removed)
    }

    /// Append a new open slot and return its id.
    pub fn open_slot(&mut self) -> u32 {
        self.slot_counter += 1;
        self.slots.push(self.slot_counter);
        self.slot_counter
    }

    /// Back to the initial state: no entries, one open slot.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn entries(&self) -> &[LineEntry] {
        &self.entries
    }

    pub fn slots(&self) -> &[u32] {
        &self.slots
    }

    pub fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    /// True when at least one line has a zero quantity.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.entries.len()
    }

    pub fn can_sell(&self) -> bool {
        !self.is_empty() && !self.invalid
    }

    fn recompute(&mut self) {
        self.invalid = self.entries.iter().any(LineEntry::is_zero_quantity);
        self.grand_total = if self.entries.is_empty() {
            zero_total()
        } else {
            self.entries
                .iter()
                .fold(zero_total(), |total, entry| total + entry.total)
        };
    }
}

fn zero_total() -> Decimal {
    Decimal::new(0, 2)
}
