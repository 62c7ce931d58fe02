//! Authentication, authorization, and rate-limiting middleware.
//!
//! - [`auth::AuthUser`] -- the authenticated caller, from Bearer header or cookie.
//! - [`auth::MaybeAuthUser`] -- optional variant for public endpoints.
//! - [`rbac`] -- one extractor per permission code (`RequireOrgWrite`, ...).
//! - [`rate_limit`] -- global per-IP limiter and the login limiter.

pub mod auth;
pub mod rate_limit;
pub mod rbac;
