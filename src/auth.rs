//! Admin authentication: redacted secrets and the optional client-credentials bearer token.

pub mod secret;
pub mod token;

pub use secret::*;
pub use token::*;
