//! Token construction and verification.
//!
//! - [`codec`] - signed encoding/decoding with typed failure reasons
//! - [`issuer`] - matched access/refresh pair issuance

pub mod codec;
pub mod issuer;

pub use codec::{TokenClaims, TokenCodec, TokenKind};
pub use issuer::{TokenIssuer, TokenPair};
