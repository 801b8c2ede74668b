//! Session token creation and validation.

pub mod claims;
pub mod issuer;

pub use claims::Claims;
pub use issuer::{IssuedToken, TokenIssuer};
