//! # Lazy Gal
//!
//! Best-effort asset resolution for static photo gallery sites, plus the
//! build-time compressor that prepares the photos it resolves.
//!
//! A gallery page served from a dumb static host has two problems: the host
//! cannot list directories, and the page cannot know up front which encoding
//! of a photo the runtime prefers. Lazy Gal answers both with the one signal
//! a static host actually provides — "does a GET for this path succeed?" —
//! and degrades gracefully everywhere that signal says no.
//!
//! # Architecture: Three Cooperating Pieces
//!
//! ```text
//! page section ──▶ discover()  "what photos are in /photos/venue?"
//!        │              │  probes image1.jpg, image2.jpg, … until a gap
//!        │              ▼
//!        │        Vec<LogicalPhoto>
//!        │              │  one ImageSlot per rendered photo
//!        ▼              ▼
//!   ImageSlot ◀── Negotiator   "jpg or webp first?"  (cached per session)
//!        │
//!        ▼  visibility edge → fetch → fallback → Loaded | Failed
//!   LoadState stream (consumer renders blur → image, or a placeholder)
//! ```
//!
//! Asset problems never escalate: a missing photo is one fewer gallery item,
//! a failed fetch is a placeholder graphic. The page never halts and no
//! resolver path returns an error to the rendering layer.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | The asset-store seam: fetch/probe over URL-style paths; docroot + in-memory impls |
//! | [`negotiate`] | Format negotiation: WebP capability probe, cached per session, extension substitution |
//! | [`discover`] | Sequential existence probing: expands a category prefix into concrete [`types::LogicalPhoto`]s |
//! | [`load`] | Visibility-driven lazy loading: per-image state machine with one-shot format fallback |
//! | [`compress`] | Build-time batch compression: fit-resize, JPEG re-encode, WebP siblings |
//! | [`config`] | `photos.toml` loading, merging, validation (ceilings, compression settings) |
//! | [`types`] | Shared types serialized across the library and CLI |
//! | [`output`] | CLI output formatting: pure format functions + print wrappers |
//!
//! # Design Decisions
//!
//! ## The Store Is the Only Oracle
//!
//! Existence is defined as "a fetch succeeds". No HEAD requests, no
//! metadata checks, no manifest files. This keeps the deploy story at
//! "drop files in a folder": nothing to regenerate, nothing to get out of
//! sync. The cost is contiguous-numbering discipline (a gap at
//! `image3` hides `image4`; the `discover` CLI command exists to catch
//! exactly that before deploying).
//!
//! ## Capability by Encoder Probe
//!
//! "Does this runtime handle WebP" is answered by encoding a 1×1 raster in
//! memory and checking the container tag, once per session, cached
//! forever. Inconclusive means no: the cost of a wrong "no" is a few extra
//! kilobytes of JPEG, the cost of a wrong "yes" is a broken image (which
//! the loader's fallback then papers over anyway).
//!
//! ## Nothing Is Spawned
//!
//! Discovery and loading are plain futures the caller drives. The library
//! takes no runtime handle, spawns no tasks, and holds no locks across
//! awaits. A single-threaded executor is fully supported, and teardown is
//! "drop the future" plus an alive flag that suppresses late commits.
//!
//! ## One Retry, Then a Placeholder
//!
//! The loader makes at most two attempts per image: the negotiated variant
//! and, only if that URL differs from the original, the original. There is
//! no backoff and no error surface: terminal failure is a [`load::LoadState`]
//! value the consumer turns into a placeholder graphic.

pub mod compress;
pub mod config;
pub mod discover;
pub mod load;
pub mod negotiate;
pub mod output;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
