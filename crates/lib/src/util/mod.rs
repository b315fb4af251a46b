//! Shared utilities.
//!
//! Common utilities used across the crate including hashing, path helpers and
//! test fakes.

pub mod hash;
pub mod path;

#[cfg(test)]
pub mod testutil;
