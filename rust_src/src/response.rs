//! Administered item/response pairs.

use serde::Serialize;

use crate::error::{IrtError, IrtResult};
use crate::item::{Item, ItemId, LikertScale};

/// One collected response. Refers to its item by id only.
///
/// Reverse coding is applied once, at construction, from the item's
/// `reverse_coded` flag: `scored_response` is the keyed value and
/// `normalized_response = (scored_response - 1) / (K - 1)` is the
/// pseudo-binary outcome fed into the 2PL likelihood.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    item_id: ItemId,
    raw_response: i32,
    scored_response: i32,
    normalized_response: f64,
}

impl ResponseRecord {
    pub fn new(item: &Item, raw_response: i32, scale: LikertScale) -> IrtResult<Self> {
        let scored_response = key_response(item, raw_response, scale)?;
        Ok(Self {
            item_id: item.id().clone(),
            raw_response,
            scored_response,
            normalized_response: scale.normalize(scored_response),
        })
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn raw_response(&self) -> i32 {
        self.raw_response
    }

    pub fn scored_response(&self) -> i32 {
        self.scored_response
    }

    pub fn normalized_response(&self) -> f64 {
        self.normalized_response
    }
}

/// Range-checks `raw_response` on `scale` and applies the item's keying.
pub(crate) fn key_response(item: &Item, raw_response: i32, scale: LikertScale) -> IrtResult<i32> {
    scale.validate()?;
    if !scale.contains(raw_response) {
        return Err(IrtError::ResponseOutOfRange {
            id: item.id().clone(),
            value: raw_response,
            max: scale.categories,
        });
    }
    Ok(if item.reverse_coded() {
        scale.reflect(raw_response)
    } else {
        raw_response
    })
}
