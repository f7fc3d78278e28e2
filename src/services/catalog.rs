//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, BookId, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books matching a filter
    pub async fn list_books(&self, filter: BookFilter) -> AppResult<Vec<Book>> {
        self.repository.books.find(filter).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: BookId) -> AppResult<Book> {
        self.repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Add a book to the catalog
    pub async fn create_book(&self, request: CreateBook) -> AppResult<BookId> {
        let details = request.into_details().ok_or_else(|| {
            AppError::Validation("Book name and numeric quantity are required.".to_string())
        })?;

        let name = details.name.clone();
        let id = self.repository.books.insert(details).await?;
        tracing::info!("Catalog: added book id={} name={:?}", id, name);
        Ok(id)
    }

    /// Apply an administrative edit
    pub async fn update_book(&self, id: BookId, request: UpdateBook) -> AppResult<()> {
        let changes = request
            .into_changes()
            .ok_or_else(|| AppError::Validation("Quantity must be a numeric value.".to_string()))?;

        if self.repository.books.update(id, changes).await? == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        Ok(())
    }

    /// Remove a book from the catalog. Outstanding borrow records keep their
    /// snapshot.
    pub async fn delete_book(&self, id: BookId) -> AppResult<()> {
        if self.repository.books.delete(id).await? == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        tracing::info!("Catalog: deleted book id={}", id);
        Ok(())
    }

    /// Check store connectivity
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.ping().await
    }
}
