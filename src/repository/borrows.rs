//! Borrowed books repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{BookDetails, BookId, BorrowId, BorrowRecord, NewBorrowRecord},
};

use super::BorrowsStore;

#[derive(FromRow)]
struct BorrowRow {
    id: Uuid,
    book_id: Uuid,
    user_email: String,
    return_date: String,
    borrowed_at: DateTime<Utc>,
    snapshot: Json<BookDetails>,
}

impl From<BorrowRow> for BorrowRecord {
    fn from(row: BorrowRow) -> Self {
        BorrowRecord {
            id: BorrowId(row.id),
            book_id: BookId(row.book_id),
            user_email: row.user_email,
            return_date: row.return_date,
            borrowed_at: row.borrowed_at,
            book: row.snapshot.0,
        }
    }
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowsStore for BorrowsRepository {
    async fn find_by_borrower(&self, user_email: &str) -> AppResult<Vec<BorrowRecord>> {
        let rows = sqlx::query_as::<_, BorrowRow>(
            r#"
            SELECT id, book_id, user_email, return_date, borrowed_at, snapshot
            FROM borrowed_books
            WHERE user_email = $1
            ORDER BY borrowed_at, id
            "#,
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BorrowRecord::from).collect())
    }

    async fn find_one(&self, book_id: BookId, user_email: &str) -> AppResult<Option<BorrowRecord>> {
        let row = sqlx::query_as::<_, BorrowRow>(
            r#"
            SELECT id, book_id, user_email, return_date, borrowed_at, snapshot
            FROM borrowed_books
            WHERE book_id = $1 AND user_email = $2
            "#,
        )
        .bind(book_id.0)
        .bind(user_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BorrowRecord::from))
    }

    async fn insert(&self, record: NewBorrowRecord, max_per_borrower: usize) -> AppResult<BorrowId> {
        let mut tx = self.pool.begin().await?;

        // Serialize borrows per borrower until commit
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&record.user_email)
            .execute(&mut *tx)
            .await?;

        let current: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrowed_books WHERE user_email = $1")
                .bind(&record.user_email)
                .fetch_one(&mut *tx)
                .await?;

        if current >= max_per_borrower as i64 {
            return Err(AppError::LimitExceeded(max_per_borrower));
        }

        let id = BorrowId::new();
        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO borrowed_books (id, book_id, user_email, return_date, borrowed_at, snapshot)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_email, book_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(id.0)
        .bind(record.book_id.0)
        .bind(&record.user_email)
        .bind(&record.return_date)
        .bind(record.borrowed_at)
        .bind(Json(&record.book))
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_none() {
            return Err(AppError::DuplicateBorrow);
        }

        tx.commit().await?;

        Ok(id)
    }

    async fn delete(&self, id: BorrowId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM borrowed_books WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
