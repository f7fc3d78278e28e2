//! Borrow record model and lending requests

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::book::{Book, BookDetails, BookId};

/// Store-assigned borrow record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorrowId(pub Uuid);

impl BorrowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BorrowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BorrowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An active borrow: who holds which book, with a copy of the book as it
/// was when borrowed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    #[serde(rename = "_id")]
    pub id: BorrowId,
    pub book_id: BookId,
    pub user_email: String,
    pub return_date: String,
    pub borrowed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub book: BookDetails,
}

/// Keys a borrow record serializes itself; a snapshot must not shadow them
const RECORD_FIELDS: [&str; 5] = ["_id", "bookId", "userEmail", "returnDate", "borrowedAt"];

/// Borrow record before the store assigns its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct NewBorrowRecord {
    pub book_id: BookId,
    pub user_email: String,
    pub return_date: String,
    pub borrowed_at: DateTime<Utc>,
    pub book: BookDetails,
}

impl NewBorrowRecord {
    /// Snapshot `book` for `user_email`; the book's own id only survives as
    /// `book_id`
    pub fn snapshot(
        book: Book,
        user_email: String,
        return_date: String,
        borrowed_at: DateTime<Utc>,
    ) -> Self {
        let mut details = book.details;
        for key in RECORD_FIELDS {
            details.extra.remove(key);
        }

        Self {
            book_id: book.id,
            user_email,
            return_date,
            borrowed_at,
            book: details,
        }
    }

    pub fn with_id(self, id: BorrowId) -> BorrowRecord {
        BorrowRecord {
            id,
            book_id: self.book_id,
            user_email: self.user_email,
            return_date: self.return_date,
            borrowed_at: self.borrowed_at,
            book: self.book,
        }
    }
}

/// Borrow book request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub book_id: Option<String>,
    /// Must be the signed-in user's email
    pub user_email: Option<String>,
    /// Free-form due date, stored as given
    pub return_date: Option<String>,
}

/// Return book request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub book_id: Option<String>,
    pub user_email: Option<String>,
}

/// What happened to the catalog when a book came back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// The book's quantity was incremented
    Restocked,
    /// The record was removed but the book no longer exists in the catalog
    Orphaned,
}
