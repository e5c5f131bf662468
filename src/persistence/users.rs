//! User persistence: lookup and insert.

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite};
use uuid::Uuid;

use crate::types::user::User;

/// Row returned from DB (username is stored as given, compared exactly).
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

const SELECT_USER: &str = "SELECT id, username, email, password_hash, created_at FROM users";

pub async fn get_user_by_username<'e, E>(
    exec: E,
    username: &str,
) -> Result<Option<UserRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, UserRow>(&format!("{} WHERE username = ?", SELECT_USER))
        .bind(username)
        .fetch_optional(exec)
        .await
}

pub async fn get_user_by_email<'e, E>(exec: E, email: &str) -> Result<Option<UserRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, UserRow>(&format!("{} WHERE email = ?", SELECT_USER))
        .bind(email)
        .fetch_optional(exec)
        .await
}

pub async fn get_user_by_id<'e, E>(exec: E, id: Uuid) -> Result<Option<UserRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = ?", SELECT_USER))
        .bind(id)
        .fetch_optional(exec)
        .await
}

/// Insert a user. Uniqueness of username and email is enforced by the schema.
pub async fn insert_user<'e, E>(
    exec: E,
    id: Uuid,
    username: &str,
    email: &str,
    password_hash: &str,
    created_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(created_at)
    .execute(exec)
    .await?;
    Ok(())
}
