//! Shared types used across the resolver and the CLI.
//!
//! [`LogicalPhoto`] is serialized by the `discover` command's JSON output and
//! must stay stable across the library and CLI surfaces.

use serde::{Deserialize, Serialize};

/// A conceptual image slot, independent of which encoded file currently
/// represents it.
///
/// Created either from static configuration (featured photos a page pins by
/// hand) or by discovery (see [`discover`](crate::discover)). Immutable after
/// creation; owned by the page section that requested it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalPhoto {
    /// Stable key, `"{category}-{index}"` for discovered photos.
    pub id: String,
    /// Canonical path without format substitution,
    /// e.g. `/photos/venue/image3.png`. Negotiation may swap the extension
    /// at fetch time; this field never changes.
    pub base_source: String,
    /// Grouping tag, e.g. `"venue"` or `"ceremony"`.
    pub category: String,
    /// Alternative text for the rendered image.
    pub alt: String,
    /// Display title.
    pub title: String,
    /// Optional longer caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
