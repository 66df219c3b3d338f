//! Storage traits for the credential store.
//!
//! The token subsystem owns the interface, not the implementation: the
//! server provides an in-memory backend, and a database-backed deployment
//! would implement the same trait against its ORM.

pub mod user;

pub use user::{NewUser, Role, User, UserProjection, UserStorage};
