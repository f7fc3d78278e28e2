//! Borrow/return workflow
//!
//! Each step is a separate store call. The limit and duplicate rules are
//! checked up front for a clear error, then enforced again atomically by
//! [`BorrowsStore::insert`](crate::repository::BorrowsStore::insert); the
//! stock rule is enforced by the conditional decrement, with the inserted
//! record rolled back when it loses the race for the last copy.

use chrono::Utc;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{BookId, BorrowId, BorrowRecord, BorrowRequest, NewBorrowRecord, ReturnOutcome, ReturnRequest},
    repository::{Repository, StockUpdate},
};

const FIELDS_REQUIRED: &str = "All fields are required";

/// Non-empty value of a required request field
fn required(value: Option<String>) -> AppResult<String> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation(FIELDS_REQUIRED.to_string()))
}

fn parse_book_id(value: &str) -> AppResult<BookId> {
    value
        .parse()
        .map_err(|_| AppError::Validation("Invalid book id".to_string()))
}

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    max_borrows: usize,
}

impl LendingService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self {
            repository,
            max_borrows: config.max_borrows_per_user,
        }
    }

    /// Borrow a book and return the new borrow record's id
    pub async fn borrow_book(&self, request: BorrowRequest) -> AppResult<BorrowId> {
        let book_id = required(request.book_id)?;
        let user_email = required(request.user_email)?;
        let return_date = required(request.return_date)?;
        let book_id = parse_book_id(&book_id)?;

        let borrowed = self.repository.borrows.find_by_borrower(&user_email).await?;
        if borrowed.len() >= self.max_borrows {
            tracing::info!("Borrow refused: {} already holds {} books", user_email, borrowed.len());
            return Err(AppError::LimitExceeded(self.max_borrows));
        }
        if borrowed.iter().any(|record| record.book_id == book_id) {
            return Err(AppError::DuplicateBorrow);
        }

        let book = self
            .repository
            .books
            .find_by_id(book_id)
            .await?
            .filter(|book| book.is_available())
            .ok_or(AppError::OutOfStock)?;

        let record = NewBorrowRecord::snapshot(book, user_email, return_date, Utc::now());
        let user_email = record.user_email.clone();
        let borrow_id = self.repository.borrows.insert(record, self.max_borrows).await?;

        let update = self.repository.books.adjust_quantity(book_id, -1).await?;
        if update != StockUpdate::Applied {
            // Someone else took the last copy (or deleted the book) since the stock check
            tracing::warn!(
                "Borrow of book {} by {} lost the last copy ({:?}), rolling back record {}",
                book_id, user_email, update, borrow_id
            );
            if let Err(e) = self.repository.borrows.delete(borrow_id).await {
                tracing::error!(
                    "Rollback failed, borrow record {} (book {}, borrower {}) holds no copy: {}",
                    borrow_id, book_id, user_email, e
                );
                return Err(e);
            }
            return Err(AppError::OutOfStock);
        }

        tracing::info!("Book {} borrowed by {} (record {})", book_id, user_email, borrow_id);
        Ok(borrow_id)
    }

    /// Return a borrowed book
    pub async fn return_book(&self, request: ReturnRequest) -> AppResult<ReturnOutcome> {
        let book_id = required(request.book_id)?;
        let user_email = required(request.user_email)?;
        let book_id = parse_book_id(&book_id)?;

        let not_found = || AppError::NotFound("No borrowed record found".to_string());

        let record = self
            .repository
            .borrows
            .find_one(book_id, &user_email)
            .await?
            .ok_or_else(not_found)?;

        // A concurrent return already removed it; restock only once
        if self.repository.borrows.delete(record.id).await? == 0 {
            return Err(not_found());
        }

        match self.repository.books.adjust_quantity(book_id, 1).await? {
            StockUpdate::Applied => {
                tracing::info!("Book {} returned by {}", book_id, user_email);
                Ok(ReturnOutcome::Restocked)
            }
            StockUpdate::Missing => {
                tracing::warn!(
                    "Book {} returned by {} no longer exists in the catalog",
                    book_id, user_email
                );
                Ok(ReturnOutcome::Orphaned)
            }
            StockUpdate::Refused => {
                tracing::error!(
                    "Book {} returned by {} could not be restocked; record {} already removed",
                    book_id, user_email, record.id
                );
                Err(AppError::Internal(format!("quantity of book {} cannot be incremented", book_id)))
            }
        }
    }

    /// All books currently borrowed by `user_email`
    pub async fn list_borrowed(&self, user_email: &str) -> AppResult<Vec<BorrowRecord>> {
        self.repository.borrows.find_by_borrower(user_email).await
    }
}
