//! Users owning notes

use uuid::Uuid;

/// A registered user
#[derive(Clone, Debug)]
pub struct User {
    /// User ID
    pub id: Uuid,

    /// Unique username
    pub username: String,

    /// Argon2 hash of the password
    pub hashed_password: String,
}

impl User {
    /// Identifier used to scope notes to this user
    pub fn owner_id(&self) -> String {
        self.id.to_string()
    }
}
