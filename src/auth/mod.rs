//! Core identity-verification logic: signed tokens, one-time codes and
//! password hashing. No HTTP or ORM types in here.

pub mod otp;
pub mod password;
pub mod token;

pub use token::{Claims, Role, Subject, TokenDomain, TokenError, TokenPair, TokenService};
