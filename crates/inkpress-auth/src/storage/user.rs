//! User model and storage trait.
//!
//! The credential store is an external collaborator: the token subsystem
//! consumes it only as a lookup/upsert capability behind [`UserStorage`].
//! Implementations live with the application (the server ships an in-memory
//! backend; a database backend would implement the same trait).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AuthResult;

// =============================================================================
// Role
// =============================================================================

/// Authorization role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Regular authenticated user.
    User,
}

impl Role {
    /// Returns the role name as it appears on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// User
// =============================================================================

/// A user in the credential store.
///
/// The password hash never serializes: API responses and token payloads see
/// at most the [`UserProjection`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (UUID string).
    pub id: String,

    /// Username for authentication. Unique, non-empty.
    pub username: String,

    /// Email address. Unique when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Authorization role.
    pub role: Role,

    /// Argon2id PHC hash of the user's password.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the user was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the user was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Creates a new regular user from signup data.
    ///
    /// A new UUID is generated as the ID; timestamps are set to now.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: Option<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            email,
            role: Role::User,
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the role, consuming and returning the user.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Returns `true` if the user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns the minimal projection embedded in tokens and responses.
    #[must_use]
    pub fn projection(&self) -> UserProjection {
        UserProjection {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
        }
    }
}

// =============================================================================
// Identity Projection
// =============================================================================

/// The minimal subject fields embedded in tokens and returned with them.
///
/// Never contains the password hash or the email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProjection {
    /// Stable unique identifier.
    pub id: String,

    /// Username.
    pub username: String,

    /// Authorization role.
    pub role: Role,
}

impl From<&User> for UserProjection {
    fn from(user: &User) -> Self {
        user.projection()
    }
}

// =============================================================================
// Storage Trait
// =============================================================================

/// Data needed to create or upsert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Username. Unique, non-empty.
    pub username: String,

    /// Optional email. Unique when present.
    pub email: Option<String>,

    /// Argon2id PHC hash of the password.
    pub password_hash: String,

    /// Role to assign.
    pub role: Role,
}

/// Storage trait for users.
///
/// The token subsystem performs exactly one lookup per verified request
/// (resolving the token's subject) and one create/upsert per signup, so the
/// interface stays small.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by unique ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<User>>;

    /// Finds a user by unique username.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Finds a user by unique email.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::Conflict`] when the username or email is
    /// already taken, or a storage error.
    async fn create(&self, new_user: NewUser) -> AuthResult<User>;

    /// Creates or updates a user keyed by username.
    ///
    /// An existing user keeps its ID and `created_at`; email, password hash,
    /// and role are replaced and `updated_at` advances.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn upsert(&self, new_user: NewUser) -> AuthResult<User>;
}
