//! Computerized Adaptive Testing (CAT) item selection.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::item::{Item, ItemId};
use crate::utils::fisher_info_2pl;

/// Items not yet administered to one test-taker. Iterates in insertion order,
/// which for a bank pool is bank order.
#[derive(Debug, Clone, Default)]
pub struct ItemPool {
    items: BTreeMap<usize, Item>,
    slots: HashMap<ItemId, usize>,
}

impl ItemPool {
    /// A repeated id replaces the earlier item and takes its later position.
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let mut pool = Self::default();
        for (slot, item) in items.into_iter().enumerate() {
            if let Some(old) = pool.slots.insert(item.id().clone(), slot) {
                pool.items.remove(&old);
            }
            pool.items.insert(slot, item);
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.slots.get(id).and_then(|slot| self.items.get(slot))
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<Item> {
        let slot = self.slots.remove(id)?;
        self.items.remove(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }
}

/// Selection stage of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Administer `fixed_sequence` in order, ignoring theta.
    Fixed,
    /// Maximum Fisher information at the current theta.
    Adaptive,
}

/// Choose the next item to administer, or `None` when nothing is left.
///
/// The fixed stage returns the first id of `fixed_sequence` still in the pool.
/// The adaptive stage returns the item with the greatest information at
/// `theta`; ties go to the item that comes first in the pool.
pub fn select_next(
    pool: &ItemPool,
    theta: f64,
    stage: Stage,
    fixed_sequence: &[ItemId],
) -> Option<ItemId> {
    let selected = match stage {
        Stage::Fixed => fixed_sequence.iter().find(|id| pool.contains(id)).cloned(),
        Stage::Adaptive => select_max_info(pool, theta).map(|(id, _)| id.clone()),
    };
    debug!(?stage, theta, item = ?selected, "item selected");
    selected
}

/// Select item with maximum Fisher information from the pool
pub fn select_max_info(pool: &ItemPool, theta: f64) -> Option<(&ItemId, f64)> {
    let mut best: Option<(&ItemId, f64)> = None;
    for item in pool.iter() {
        let info = fisher_info_2pl(theta, item.discrimination(), item.difficulty());
        // Strict comparison keeps the first item on ties.
        let better = match best {
            Some((_, best_info)) => info > best_info,
            None => true,
        };
        if better {
            best = Some((item.id(), info));
        }
    }
    best
}

/// All pool items by information at theta, descending; ties keep pool order.
pub fn rank_items(pool: &ItemPool, theta: f64) -> Vec<(ItemId, f64)> {
    let mut ranked: Vec<(ItemId, f64)> = pool
        .iter()
        .map(|item| {
            (
                item.id().clone(),
                fisher_info_2pl(theta, item.discrimination(), item.difficulty()),
            )
        })
        .collect();
    ranked.sort_by(|(_, info_a), (_, info_b)| {
        info_b
            .partial_cmp(info_a)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}
