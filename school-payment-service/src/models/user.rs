use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operator account allowed to create payments and read transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl User {
    pub fn new(email: String, password_hash: String) -> Self {
        let now = DateTime::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lookup key for users: surrounding whitespace stripped, lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
