//! Authentication primitives.
//!
//! - [`jwt`] -- bearer token signing and verification.

pub mod jwt;
