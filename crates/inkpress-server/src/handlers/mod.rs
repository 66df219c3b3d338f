//! HTTP handlers.
//!
//! - [`users`] - the authentication API endpoints
//! - [`pages`] - server-rendered pages behind the page guards

pub mod pages;
pub mod users;
