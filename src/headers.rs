//! Outbound header composition.
//!
//! Sources merge in a fixed precedence where later sources override earlier ones
//! case-insensitively: base headers, static headers, the filtered `Cookie` header, and finally
//! the `Authorization` header derived from the [`TokenStore`](crate::store::TokenStore).

/// Fail-closed composer over the token store and cookie filter.
pub mod composer;
/// Header-provider seam for outbound clients.
pub mod provider;
/// Ordered, case-insensitive header collection.
pub mod set;

pub use composer::*;
pub use provider::*;
pub use set::*;
