use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub name: Option<String>,       // display name, optional
    pub email: String,              // unique, matched exactly as stored
    pub password_hash: String,      // Argon2 hash, never leaves the server
    pub created_at: OffsetDateTime, // creation timestamp
}
