//! Repository layer for document store operations
//!
//! Each collection sits behind a store trait so the lending workflow can run
//! against Postgres in production and an in-memory store in development and
//! tests. Every method is atomic on its own; nothing here spans a multi-call
//! transaction.

pub mod books;
pub mod borrows;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, BookChanges, BookDetails, BookFilter, BookId, BorrowId, BorrowRecord, NewBorrowRecord},
};

/// Result of a conditional stock adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockUpdate {
    /// The quantity was changed
    Applied,
    /// The book exists but the new quantity would leave `0..=i32::MAX`
    Refused,
    /// No book has this id
    Missing,
}

/// The `books` collection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksStore: Send + Sync {
    /// Books matching `filter`, in store order
    async fn find(&self, filter: BookFilter) -> AppResult<Vec<Book>>;

    async fn find_by_id(&self, id: BookId) -> AppResult<Option<Book>>;

    async fn insert(&self, book: BookDetails) -> AppResult<BookId>;

    /// Returns the number of books updated (0 or 1)
    async fn update(&self, id: BookId, changes: BookChanges) -> AppResult<u64>;

    /// Returns the number of books deleted (0 or 1)
    async fn delete(&self, id: BookId) -> AppResult<u64>;

    /// Add `delta` to the quantity unless that would take it below zero or
    /// past `i32::MAX`
    async fn adjust_quantity(&self, id: BookId, delta: i32) -> AppResult<StockUpdate>;

    /// Check that the store answers
    async fn ping(&self) -> AppResult<()>;
}

/// The `borrowedbooks` collection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowsStore: Send + Sync {
    /// All records held by `user_email`, in store order
    async fn find_by_borrower(&self, user_email: &str) -> AppResult<Vec<BorrowRecord>>;

    async fn find_one(&self, book_id: BookId, user_email: &str) -> AppResult<Option<BorrowRecord>>;

    /// Insert a record unless the borrower already holds `max_per_borrower`
    /// records (`LimitExceeded`) or already holds this book (`DuplicateBorrow`).
    /// Both checks and the insert happen atomically.
    async fn insert(&self, record: NewBorrowRecord, max_per_borrower: usize) -> AppResult<BorrowId>;

    /// Returns the number of records deleted (0 or 1)
    async fn delete(&self, id: BorrowId) -> AppResult<u64>;
}

/// Main repository struct holding the collection stores
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BooksStore>,
    pub borrows: Arc<dyn BorrowsStore>,
    pool: Option<Pool<Postgres>>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            borrows: Arc::new(borrows::BorrowsRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repository backed by process memory; contents are lost on exit
    pub fn in_memory() -> Self {
        Self::from_stores(
            Arc::new(memory::MemoryBooks::default()),
            Arc::new(memory::MemoryBorrows::default()),
        )
    }

    pub fn from_stores(books: Arc<dyn BooksStore>, borrows: Arc<dyn BorrowsStore>) -> Self {
        Self {
            books,
            borrows,
            pool: None,
        }
    }

    /// Release database connections
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
