//! HTTP-facing verification guard.
//!
//! Two call shapes over one state machine:
//!
//! - [`guard`] - responding extractors ([`AuthUser`], [`AdminUser`]) for API
//!   routes; rejections become structured 401/403 bodies
//! - [`pages`] - redirecting extractors ([`PageAuth`], [`PageAdmin`]) for
//!   server-rendered pages; rejections become redirects to the login page
//! - [`error`] - `IntoResponse` for the error taxonomy

pub mod error;
pub mod guard;
pub mod pages;

pub use guard::{AdminUser, AuthState, AuthUser};
pub use pages::{PageAdmin, PageAuth};
