//! Book (catalog) model and related types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

/// Free-form document fields stored alongside the known ones
pub type ExtraFields = Map<String, Value>;

/// Store-assigned book identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Descriptive fields of a book, everything except its identifier.
///
/// Also used as the snapshot copied into a borrow record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookDetails {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub quantity: i32,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Book document as stored and served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: BookId,
    #[serde(flatten)]
    pub details: BookDetails,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.details.quantity > 0
    }
}

/// Which books a listing returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    All,
    Category(String),
    /// Books with at least one copy on the shelf
    Available,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::All => true,
            BookFilter::Category(category) => book.details.category == *category,
            BookFilter::Available => book.is_available(),
        }
    }
}

/// Largest stock count an admin may set
pub const MAX_QUANTITY: i32 = 1_000_000;

/// Stock count from a request body: an integer in `0..=MAX_QUANTITY`
fn parse_quantity(value: &Value) -> Option<i32> {
    value
        .as_i64()
        .filter(|quantity| (0..=i64::from(MAX_QUANTITY)).contains(quantity))
        .and_then(|quantity| i32::try_from(quantity).ok())
}

/// Add book request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBook {
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<Value>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl CreateBook {
    /// Validated details ready for insertion
    pub fn into_details(mut self) -> Option<BookDetails> {
        if self.validate().is_err() {
            return None;
        }
        let quantity = self.quantity.as_ref().and_then(parse_quantity)?;
        self.extra.remove("_id");

        Some(BookDetails {
            name: self.name?,
            category: self.category.unwrap_or_default(),
            quantity,
            extra: self.extra,
        })
    }
}

/// Edit book request; absent or null fields are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBook {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<Value>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl UpdateBook {
    /// Checked changes, `None` when a quantity is given but is not a valid
    /// stock count
    pub fn into_changes(mut self) -> Option<BookChanges> {
        let quantity = match &self.quantity {
            None => None,
            Some(value) => Some(parse_quantity(value)?),
        };
        self.extra.remove("_id");

        Some(BookChanges {
            name: self.name,
            category: self.category,
            quantity,
            extra: self.extra,
        })
    }
}

/// Partial update of a book; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i32>,
    pub extra: ExtraFields,
}

impl BookChanges {
    /// Fold the changes into existing details
    pub fn apply_to(&self, details: &mut BookDetails) {
        if let Some(name) = &self.name {
            details.name = name.clone();
        }
        if let Some(category) = &self.category {
            details.category = category.clone();
        }
        if let Some(quantity) = self.quantity {
            details.quantity = quantity;
        }
        for (key, value) in &self.extra {
            details.extra.insert(key.clone(), value.clone());
        }
    }
}
