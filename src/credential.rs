//! Credential descriptors, cache identity, and secret-placeholder resolution.
//!
//! `descriptor` holds the immutable client-credentials configuration for one token endpoint,
//! `key` derives the cache identity the token store partitions on, and `resolver` replaces
//! `${KEY}` placeholders with real secret values in one explicit pass before any network use.

pub mod descriptor;
pub mod key;
pub mod resolver;

pub use descriptor::*;
pub use key::*;
pub use resolver::*;
