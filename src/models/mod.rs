//! Data models for the bookstore

pub mod book;
pub mod borrow;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookChanges, BookDetails, BookFilter, BookId, CreateBook, UpdateBook};
pub use borrow::{BorrowId, BorrowRecord, BorrowRequest, NewBorrowRecord, ReturnOutcome, ReturnRequest};
pub use user::{SignIn, UserClaims};
