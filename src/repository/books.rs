//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{types::Json, FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{book::ExtraFields, Book, BookChanges, BookDetails, BookFilter, BookId},
};

use super::{BooksStore, StockUpdate};

#[derive(FromRow)]
struct BookRow {
    id: Uuid,
    name: String,
    category: String,
    quantity: i32,
    details: Json<ExtraFields>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: BookId(row.id),
            details: BookDetails {
                name: row.name,
                category: row.category,
                quantity: row.quantity,
                extra: row.details.0,
            },
        }
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BooksStore for BooksRepository {
    async fn find(&self, filter: BookFilter) -> AppResult<Vec<Book>> {
        let rows = match filter {
            BookFilter::All => {
                sqlx::query_as::<_, BookRow>(
                    "SELECT id, name, category, quantity, details FROM books ORDER BY created_at, id",
                )
                .fetch_all(&self.pool)
                .await?
            }
            BookFilter::Category(category) => {
                sqlx::query_as::<_, BookRow>(
                    r#"
                    SELECT id, name, category, quantity, details FROM books
                    WHERE category = $1
                    ORDER BY created_at, id
                    "#,
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            BookFilter::Available => {
                sqlx::query_as::<_, BookRow>(
                    r#"
                    SELECT id, name, category, quantity, details FROM books
                    WHERE quantity > 0
                    ORDER BY created_at, id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_id(&self, id: BookId) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            "SELECT id, name, category, quantity, details FROM books WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn insert(&self, book: BookDetails) -> AppResult<BookId> {
        let id = BookId::new();

        sqlx::query(
            r#"
            INSERT INTO books (id, name, category, quantity, details)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.0)
        .bind(&book.name)
        .bind(&book.category)
        .bind(book.quantity)
        .bind(Json(&book.extra))
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update(&self, id: BookId, changes: BookChanges) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE books SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                quantity = COALESCE($4, quantity),
                details = details || $5
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(&changes.name)
        .bind(&changes.category)
        .bind(changes.quantity)
        .bind(Json(&changes.extra))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: BookId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn adjust_quantity(&self, id: BookId, delta: i32) -> AppResult<StockUpdate> {
        let result = sqlx::query(
            r#"
            UPDATE books SET quantity = quantity + $2
            WHERE id = $1 AND quantity::BIGINT + $2 BETWEEN 0 AND 2147483647
            "#,
        )
        .bind(id.0)
        .bind(delta)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(StockUpdate::Applied);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists {
            StockUpdate::Refused
        } else {
            StockUpdate::Missing
        })
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
