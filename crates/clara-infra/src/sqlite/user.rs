//! SQLite user repository implementation.

use chrono::Utc;
use sqlx::Row;

use clara_core::repository::UserRepository;
use clara_types::catalog::{NewUser, User};
use clara_types::error::RepositoryError;

use super::store::{format_datetime, parse_datetime, query_err, SqliteStore};

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct UserRow {
    id: i64,
    email: String,
    first_name: String,
    last_name: String,
    city: Option<String>,
    loyalty_points: i64,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            city: row.try_get("city")?,
            loyalty_points: row.try_get("loyalty_points")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            city: self.city,
            loyalty_points: self.loyalty_points,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn map_user(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<User>, RepositoryError> {
    row.map(|row| UserRow::from_row(&row).map_err(query_err)?.into_user())
        .transpose()
}

// ---------------------------------------------------------------------------
// UserRepository implementation
// ---------------------------------------------------------------------------

impl UserRepository for SqliteStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        map_user(row)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        map_user(row)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let row = sqlx::query(
            r#"INSERT INTO users (email, first_name, last_name, city, loyalty_points, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.city)
        .bind(user.loyalty_points.max(0))
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("email already registered: {}", user.email))
            }
            other => query_err(other),
        })?;

        UserRow::from_row(&row).map_err(query_err)?.into_user()
    }

    async fn update_loyalty(&self, id: i64, delta_points: i64) -> Result<i64, RepositoryError> {
        // Floor at zero in SQL, not in Rust.
        let row = sqlx::query(
            r#"UPDATE users
               SET loyalty_points = MAX(loyalty_points + ?, 0), updated_at = ?
               WHERE id = ?
               RETURNING loyalty_points"#,
        )
        .bind(delta_points)
        .bind(format_datetime(&Utc::now()))
        .bind(id)
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(query_err)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_get("loyalty_points").map_err(query_err)
    }
}
