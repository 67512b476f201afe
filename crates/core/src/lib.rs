//! Domain types for the storefront session gateway.
//!
//! No I/O lives here: identities, role requirements, cookie names and the
//! shared error type.

pub mod error;
pub mod roles;
pub mod tokens;
pub mod types;
pub mod user;
