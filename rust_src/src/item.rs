//! Item parameters, the ordinal response scale and validated item banks.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cat::ItemPool;
use crate::error::{IrtError, IrtResult};
use crate::response::ResponseRecord;

/// Stable item identifier. Selection ties follow bank order, not id order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Ordinal response scale with `categories` points, coded `1..=categories`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LikertScale {
    pub categories: u32,
}

impl Default for LikertScale {
    fn default() -> Self {
        Self { categories: 5 }
    }
}

impl LikertScale {
    pub fn new(categories: u32) -> IrtResult<Self> {
        let scale = Self { categories };
        scale.validate()?;
        Ok(scale)
    }

    pub fn validate(&self) -> IrtResult<()> {
        if self.categories < 2 {
            return Err(IrtError::InvalidConfig(format!(
                "a response scale needs at least 2 categories, got {}",
                self.categories
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn contains(&self, raw: i32) -> bool {
        raw >= 1 && i64::from(raw) <= i64::from(self.categories)
    }

    /// `(K + 1) - raw`
    #[inline]
    pub fn reflect(&self, raw: i32) -> i32 {
        self.categories as i32 + 1 - raw
    }

    /// Maps `1..=K` onto `[0, 1]`.
    #[inline]
    pub fn normalize(&self, raw: i32) -> f64 {
        f64::from(raw - 1) / f64::from(self.categories - 1)
    }
}

/// A single assessment item. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    id: ItemId,
    discrimination: f64,
    difficulty: f64,
    reverse_coded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Item {
    pub fn new(
        id: impl Into<ItemId>,
        discrimination: f64,
        difficulty: f64,
        reverse_coded: bool,
    ) -> IrtResult<Self> {
        let id = id.into();
        if !discrimination.is_finite() || discrimination <= 0.0 {
            return Err(IrtError::InvalidDiscrimination {
                id,
                value: discrimination,
            });
        }
        if !difficulty.is_finite() {
            return Err(IrtError::InvalidDifficulty {
                id,
                value: difficulty,
            });
        }
        Ok(Self {
            id,
            discrimination,
            difficulty,
            reverse_coded,
            text: None,
        })
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn discrimination(&self) -> f64 {
        self.discrimination
    }

    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    pub fn reverse_coded(&self) -> bool {
        self.reverse_coded
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// One row of an external item-bank table.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRow {
    pub id: ItemId,
    #[serde(alias = "a")]
    pub discrimination: f64,
    #[serde(alias = "b")]
    pub difficulty: f64,
    #[serde(default)]
    pub reverse_coded: bool,
    #[serde(default, alias = "Question")]
    pub text: Option<String>,
}

impl TryFrom<ItemRow> for Item {
    type Error = IrtError;

    fn try_from(row: ItemRow) -> IrtResult<Self> {
        let item = Item::new(row.id, row.discrimination, row.difficulty, row.reverse_coded)?;
        Ok(match row.text {
            Some(text) => item.with_text(text),
            None => item,
        })
    }
}

/// Validated, immutable collection of items sharing one response scale.
#[derive(Debug, Clone)]
pub struct ItemBank {
    scale: LikertScale,
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl ItemBank {
    pub fn new(scale: LikertScale, items: Vec<Item>) -> IrtResult<Self> {
        scale.validate()?;
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            if index.insert(item.id.clone(), pos).is_some() {
                return Err(IrtError::DuplicateItem(item.id.clone()));
            }
        }
        Ok(Self {
            scale,
            items,
            index,
        })
    }

    pub fn from_rows(scale: LikertScale, rows: Vec<ItemRow>) -> IrtResult<Self> {
        let items = rows
            .into_iter()
            .map(Item::try_from)
            .collect::<IrtResult<Vec<_>>>()?;
        Self::new(scale, items)
    }

    /// Parses a JSON array of item rows.
    pub fn from_json_str(scale: LikertScale, json: &str) -> IrtResult<Self> {
        let rows: Vec<ItemRow> = serde_json::from_str(json)?;
        Self::from_rows(scale, rows)
    }

    pub fn load_json(scale: LikertScale, path: impl AsRef<Path>) -> IrtResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(scale, &json)
    }

    pub fn scale(&self) -> LikertScale {
        self.scale
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    pub fn require(&self, id: &ItemId) -> IrtResult<&Item> {
        self.get(id).ok_or_else(|| IrtError::UnknownItem(id.clone()))
    }

    /// Validates a raw response against the bank's scale and item keying.
    pub fn record_response(&self, id: &ItemId, raw_response: i32) -> IrtResult<ResponseRecord> {
        ResponseRecord::new(self.require(id)?, raw_response, self.scale)
    }

    /// Pool containing every item of the bank.
    pub fn pool(&self) -> ItemPool {
        ItemPool::new(self.items.iter().cloned())
    }

    /// Pool without the given administered ids.
    pub fn pool_excluding<'a>(
        &self,
        administered: impl IntoIterator<Item = &'a ItemId>,
    ) -> ItemPool {
        let used: HashSet<&ItemId> = administered.into_iter().collect();
        ItemPool::new(
            self.items
                .iter()
                .filter(|item| !used.contains(&item.id))
                .cloned(),
        )
    }
}
