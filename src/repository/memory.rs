//! In-memory stores, used by the `memory` backend and in tests

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookChanges, BookDetails, BookFilter, BookId, BorrowId, BorrowRecord, NewBorrowRecord},
};

use super::{BooksStore, BorrowsStore, StockUpdate};

#[derive(Default)]
pub struct MemoryBooks {
    books: Mutex<Vec<Book>>,
}

#[async_trait]
impl BooksStore for MemoryBooks {
    async fn find(&self, filter: BookFilter) -> AppResult<Vec<Book>> {
        let books = self.books.lock().await;
        Ok(books.iter().filter(|book| filter.matches(book)).cloned().collect())
    }

    async fn find_by_id(&self, id: BookId) -> AppResult<Option<Book>> {
        let books = self.books.lock().await;
        Ok(books.iter().find(|book| book.id == id).cloned())
    }

    async fn insert(&self, book: BookDetails) -> AppResult<BookId> {
        let id = BookId::new();
        self.books.lock().await.push(Book { id, details: book });
        Ok(id)
    }

    async fn update(&self, id: BookId, changes: BookChanges) -> AppResult<u64> {
        let mut books = self.books.lock().await;
        match books.iter_mut().find(|book| book.id == id) {
            Some(book) => {
                changes.apply_to(&mut book.details);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: BookId) -> AppResult<u64> {
        let mut books = self.books.lock().await;
        let before = books.len();
        books.retain(|book| book.id != id);
        Ok((before - books.len()) as u64)
    }

    async fn adjust_quantity(&self, id: BookId, delta: i32) -> AppResult<StockUpdate> {
        let mut books = self.books.lock().await;
        let Some(book) = books.iter_mut().find(|book| book.id == id) else {
            return Ok(StockUpdate::Missing);
        };

        match book.details.quantity.checked_add(delta) {
            Some(quantity) if quantity >= 0 => {
                book.details.quantity = quantity;
                Ok(StockUpdate::Applied)
            }
            _ => Ok(StockUpdate::Refused),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBorrows {
    records: Mutex<Vec<BorrowRecord>>,
}

#[async_trait]
impl BorrowsStore for MemoryBorrows {
    async fn find_by_borrower(&self, user_email: &str) -> AppResult<Vec<BorrowRecord>> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|record| record.user_email == user_email)
            .cloned()
            .collect())
    }

    async fn find_one(&self, book_id: BookId, user_email: &str) -> AppResult<Option<BorrowRecord>> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .find(|record| record.book_id == book_id && record.user_email == user_email)
            .cloned())
    }

    async fn insert(&self, record: NewBorrowRecord, max_per_borrower: usize) -> AppResult<BorrowId> {
        let mut records = self.records.lock().await;

        let held: Vec<&BorrowRecord> = records
            .iter()
            .filter(|existing| existing.user_email == record.user_email)
            .collect();
        if held.len() >= max_per_borrower {
            return Err(AppError::LimitExceeded(max_per_borrower));
        }
        if held.iter().any(|existing| existing.book_id == record.book_id) {
            return Err(AppError::DuplicateBorrow);
        }

        let id = BorrowId::new();
        records.push(record.with_id(id));
        Ok(id)
    }

    async fn delete(&self, id: BorrowId) -> AppResult<u64> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| record.id != id);
        Ok((before - records.len()) as u64)
    }
}
