//! Authentication and authorization primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access-token generation, validation, and refresh-token helpers.
//! - [`jwe`] -- optional compact JWE wrapping of access tokens.
//! - [`token_store`] -- revoked-token set and rate-limit counters.
//! - [`cookies`] -- auth cookie parsing and `Set-Cookie` builders.

pub mod cookies;
pub mod jwe;
pub mod jwt;
pub mod password;
pub mod token_store;
