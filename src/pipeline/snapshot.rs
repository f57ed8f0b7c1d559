use std::sync::Arc;

use uuid::Uuid;

use crate::common::{BatchItem, ItemPatch};

/// Immutable view of every item in a batch.
///
/// Updates build a new snapshot; readers holding an older one never observe
/// a half-applied change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSnapshot {
    items: Arc<Vec<BatchItem>>,
}

impl BatchSnapshot {
    pub fn new(items: Vec<BatchItem>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }

    /// Returns a snapshot with `patch` applied to `item_id`. Unknown ids and
    /// invalid transitions leave the contents unchanged.
    pub fn apply_update(&self, item_id: Uuid, patch: ItemPatch) -> BatchSnapshot {
        let Some(index) = self.items.iter().position(|item| item.id() == item_id) else {
            return self.clone();
        };

        let mut items = self.items.as_ref().clone();
        items[index] = items[index].apply(patch);
        Self::new(items)
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&BatchItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
