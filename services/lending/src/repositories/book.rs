//! Book repository for database operations
//!
//! Besides row-level CRUD this module is the read side of the catalog: the
//! available/reservable listings, a member's own and borrowed books, and
//! free-text search. Lifecycle transitions are persisted through
//! [`BookRepository::apply_loan_state`], which writes all five lifecycle
//! columns in a single UPDATE so a transition is committed atomically or
//! not at all.

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::lifecycle::LoanState;
use crate::models::{Book, NewBook};

/// Book repository
#[derive(Clone)]
pub struct BookRepository {
    pool: PgPool,
}

fn map_book(row: &PgRow) -> Book {
    Book {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        image_url: row.get("image_url"),
        owner_id: row.get("owner_id"),
        lender_id: row.get("lender_id"),
        return_date: row.get("return_date"),
        reserved: row.get("reserved"),
        lent_out: row.get("lent_out"),
        available_for_lending: row.get("available_for_lending"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const BOOK_COLUMNS: &str = "id, title, author, image_url, owner_id, lender_id, return_date, \
     reserved, lent_out, available_for_lending, created_at, updated_at";

/// Escape LIKE wildcards so user input only matches literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl BookRepository {
    /// Create a new book repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new catalog entry; all lifecycle flags start at their
    /// defaults (available, not reserved, not lent out)
    pub async fn create(&self, new_book: &NewBook) -> Result<Book> {
        info!(
            "Adding book \"{}\" for owner {}",
            new_book.title, new_book.owner_id
        );

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO books (title, author, image_url, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {BOOK_COLUMNS}
            "#,
        ))
        .bind(&new_book.title)
        .bind(&new_book.author)
        .bind(&new_book.image_url)
        .bind(new_book.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_book(&row))
    }

    /// Find a book by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(map_book))
    }

    /// Persist a lifecycle transition, replacing all five lifecycle columns
    /// in one statement
    pub async fn apply_loan_state(&self, id: Uuid, state: &LoanState) -> Result<Option<Book>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE books
            SET reserved = $2,
                lent_out = $3,
                available_for_lending = $4,
                lender_id = $5,
                return_date = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING {BOOK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(state.reserved)
        .bind(state.lent_out)
        .bind(state.available_for_lending)
        .bind(state.lender_id)
        .bind(state.return_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_book))
    }

    /// Delete a book. Returns true when a row was removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Case-insensitive lookup of an entry with the same (title, author)
    pub async fn find_duplicate(&self, title: &str, author: &str) -> Result<Option<Book>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM books
            WHERE lower(title) = lower($1) AND lower(author) = lower($2)
            "#,
        ))
        .bind(title)
        .bind(author)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_book))
    }

    /// All books listed for lending, ordered by author then title
    pub async fn list_available(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM books
            WHERE available_for_lending = true
            ORDER BY author, title
            "#,
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_book).collect())
    }

    /// Books listed for lending and not currently reserved
    pub async fn list_reservable(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM books
            WHERE reserved = false AND available_for_lending = true
            ORDER BY author, title
            "#,
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_book).collect())
    }

    /// Books owned by the given member
    pub async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM books
            WHERE owner_id = $1
            ORDER BY author, title
            "#,
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_book).collect())
    }

    /// Books the given member has reserved or borrowed, in creation order
    /// (id ties broken deterministically)
    pub async fn list_borrowed(&self, lender_id: Uuid) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM books
            WHERE lender_id = $1
            ORDER BY created_at, id
            "#,
        ))
        .bind(lender_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_book).collect())
    }

    /// Case-insensitive substring search over title and author
    pub async fn search(&self, query: &str) -> Result<Vec<Book>> {
        let pattern = like_pattern(query);

        let rows = sqlx::query(&format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM books
            WHERE title ILIKE $1 OR author ILIKE $1
            ORDER BY title
            "#,
        ))
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_book).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::repositories::UserRepository;
    use common::database::{DatabaseConfig, init_pool};

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("kiyosaki"), "%kiyosaki%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }

    /// A second copy of a title may not enter the catalog, no matter how
    /// the title and author are cased: the duplicate lookup sees it, and
    /// the unique index rejects it even if the lookup were skipped.
    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_duplicate_title_author_rejected_case_insensitively()
    -> Result<(), Box<dyn std::error::Error>> {
        let config = DatabaseConfig::from_env()?;
        let pool = init_pool(&config).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let users = UserRepository::new(pool.clone());
        let books = BookRepository::new(pool.clone());

        let suffix = Uuid::new_v4().simple().to_string();
        let owner = users
            .create(&NewUser {
                first_name: "Juhan".to_string(),
                last_name: "Viik".to_string(),
                email: format!("juhan.{}@example.com", suffix),
                username: format!("juhanv_{}", &suffix[..12]),
                password: "123456".to_string(),
            })
            .await?;

        let title = format!("Rich Dad Poor Dad {}", suffix);
        let book = books
            .create(&NewBook {
                title: title.clone(),
                author: "Robert Kiyosaki".to_string(),
                image_url: "https://example.com/cover.jpg".to_string(),
                owner_id: owner.id,
            })
            .await?;

        // the lookup the add-book handler uses matches regardless of case
        let duplicate = books
            .find_duplicate(&title.to_uppercase(), "ROBERT KIYOSAKI")
            .await?;
        assert_eq!(duplicate.map(|b| b.id), Some(book.id));

        // and the unique index is a backstop for a direct insert
        let second_insert = books
            .create(&NewBook {
                title: title.to_lowercase(),
                author: "robert kiyosaki".to_string(),
                image_url: "https://example.com/cover.jpg".to_string(),
                owner_id: owner.id,
            })
            .await;
        assert!(second_insert.is_err());

        let owned = books.list_owned(owner.id).await?;
        assert_eq!(owned.len(), 1);

        books.delete(book.id).await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(owner.id)
            .execute(&pool)
            .await?;

        Ok(())
    }
}
