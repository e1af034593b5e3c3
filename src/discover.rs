//! Sequential existence discovery.
//!
//! Gallery sections that show "whatever is in the folder" cannot enumerate a
//! directory over a plain static host, so we guess: probe
//! `{prefix}/image1.jpg`, `image2.jpg`, … and stop at the first index with no
//! servable file under any known extension, or at a hard ceiling. Each hit
//! becomes one [`LogicalPhoto`] carrying the extension that actually
//! answered.
//!
//! ## Two independent guards
//!
//! Termination is guaranteed twice over:
//!
//! - **Gap stop**: the numbering is assumed contiguous from 1, so the first
//!   index where every candidate extension misses ends the category. A file
//!   at `image4.jpg` behind a missing index 3 is unreachable. Renumber,
//!   don't skip.
//! - **Ceiling**: an upper bound on the index probed regardless of what the
//!   store answers, so a misbehaving host that says "exists" forever cannot
//!   spin the loop.
//!
//! Probe failures of any kind count as absence. A flaky store costs at most
//! the tail of a gallery, never an error and never a retry.

use crate::store::AssetStore;
use crate::types::LogicalPhoto;
use tracing::debug;

/// Default probe ceiling for general galleries.
pub const DEFAULT_CEILING: u32 = 50;

/// Extension probed first at each index.
const PRIMARY_EXTENSION: &str = "jpg";

/// Extensions tried in order when the primary misses.
const FALLBACK_EXTENSIONS: &[&str] = &["png", "jpeg", "webp"];

/// Bounds for one discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Hard upper bound on the index probed. See the module docs.
    pub ceiling: u32,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
        }
    }
}

/// One path to test for an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub path: String,
    pub extension: &'static str,
}

/// Candidate paths for `index` under `prefix`, primary extension first.
pub(crate) fn candidates(prefix: &str, index: u32) -> impl Iterator<Item = Candidate> {
    let base = prefix.trim_end_matches('/').to_string();
    std::iter::once(PRIMARY_EXTENSION)
        .chain(FALLBACK_EXTENSIONS.iter().copied())
        .map(move |extension| Candidate {
            path: format!("{base}/image{index}.{extension}"),
            extension,
        })
}

/// Category tag: the prefix's final path segment.
fn category_of(prefix: &str) -> &str {
    let trimmed = prefix.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Expand a category prefix into the photos that actually exist.
///
/// Probes indices from 1 upward; the first extension that answers at an
/// index claims it. Returns photos ordered by index, contiguous from 1,
/// at most `options.ceiling` of them. `label` produces the display text
/// (used for both `alt` and `title`) from the index.
///
/// Safe to run concurrently for independent categories: each call owns its
/// loop state and shares only the store reference.
pub async fn discover<S, F>(
    store: &S,
    prefix: &str,
    options: &DiscoverOptions,
    label: F,
) -> Vec<LogicalPhoto>
where
    S: AssetStore + ?Sized,
    F: Fn(u32) -> String,
{
    let category = category_of(prefix);
    let mut photos = Vec::new();

    'indices: for index in 1..=options.ceiling {
        for candidate in candidates(prefix, index) {
            if store.probe(&candidate.path).await.is_ok() {
                debug!(path = %candidate.path, ext = candidate.extension, "discovered");
                let text = label(index);
                photos.push(LogicalPhoto {
                    id: format!("{category}-{index}"),
                    base_source: candidate.path,
                    category: category.to_string(),
                    alt: text.clone(),
                    title: text,
                    description: None,
                });
                continue 'indices;
            }
        }
        debug!(prefix, index, "gap, category ends");
        break;
    }

    photos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::MemoryStore;

    fn label(index: u32) -> String {
        format!("Photo {index}")
    }

    #[test]
    fn candidates_cover_all_extensions_primary_first() {
        let all: Vec<Candidate> = candidates("/photos/venue", 3).collect();
        let paths: Vec<&str> = all.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/photos/venue/image3.jpg",
                "/photos/venue/image3.png",
                "/photos/venue/image3.jpeg",
                "/photos/venue/image3.webp",
            ]
        );
        assert_eq!(all[0].extension, "jpg");
        assert_eq!(all[3].extension, "webp");
    }

    #[test]
    fn candidates_tolerate_trailing_slash() {
        let first = candidates("/photos/venue/", 1).next().unwrap();
        assert_eq!(first.path, "/photos/venue/image1.jpg");
    }

    #[tokio::test]
    async fn contiguous_assets_are_all_discovered() {
        let store = MemoryStore::new()
            .with("/photos/venue/image1.jpg", b"1")
            .with("/photos/venue/image2.jpg", b"2")
            .with("/photos/venue/image3.jpg", b"3");

        let photos = discover(&store, "/photos/venue", &DiscoverOptions::default(), label).await;

        assert_eq!(photos.len(), 3);
        assert_eq!(photos[0].id, "venue-1");
        assert_eq!(photos[1].id, "venue-2");
        assert_eq!(photos[2].id, "venue-3");
        assert_eq!(photos[2].base_source, "/photos/venue/image3.jpg");
        assert_eq!(photos[0].alt, "Photo 1");
        assert_eq!(photos[0].title, "Photo 1");
        assert_eq!(photos[0].category, "venue");
    }

    #[tokio::test]
    async fn fallback_extension_claims_its_index() {
        let store = MemoryStore::new()
            .with("/photos/venue/image1.jpg", b"1")
            .with("/photos/venue/image2.png", b"2");

        let photos = discover(&store, "/photos/venue", &DiscoverOptions::default(), label).await;

        assert_eq!(photos.len(), 2);
        assert_eq!(photos[1].base_source, "/photos/venue/image2.png");
    }

    #[tokio::test]
    async fn empty_category_yields_empty_result() {
        let store = MemoryStore::new();

        let photos = discover(&store, "/photos/venue", &DiscoverOptions::default(), label).await;

        assert!(photos.is_empty());
        // index 1 was probed across the full extension ladder, nothing more
        assert_eq!(store.request_count(), 4);
    }

    #[tokio::test]
    async fn gap_ends_category_even_when_later_indices_exist() {
        // files at 1 (jpg), 2 (png), 4 (jpg): the gap at 3 hides index 4
        let store = MemoryStore::new()
            .with("/photos/hotel/image1.jpg", b"1")
            .with("/photos/hotel/image2.png", b"2")
            .with("/photos/hotel/image4.jpg", b"4");

        let photos = discover(&store, "/photos/hotel", &DiscoverOptions::default(), label).await;

        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].id, "hotel-1");
        assert_eq!(photos[1].id, "hotel-2");
        assert!(
            store.requests().iter().all(|p| !p.contains("image4")),
            "discovery must stop at the gap, not skip over it"
        );
    }

    #[tokio::test]
    async fn ceiling_caps_result_size() {
        let mut store = MemoryStore::new();
        for index in 1..=10 {
            store = store.with(&format!("/photos/venue/image{index}.jpg"), b"x");
        }

        let photos = discover(&store, "/photos/venue", &DiscoverOptions { ceiling: 4 }, label).await;

        assert_eq!(photos.len(), 4);
        assert_eq!(photos.last().unwrap().id, "venue-4");
    }

    #[tokio::test]
    async fn probe_count_is_bounded_by_hits_plus_one_ladder() {
        let store = MemoryStore::new()
            .with("/photos/venue/image1.jpg", b"1")
            .with("/photos/venue/image2.png", b"2");

        discover(&store, "/photos/venue", &DiscoverOptions::default(), label).await;

        // index 1: 1 probe. index 2: jpg miss + png hit = 2. index 3: full
        // ladder miss = 4. Total 7; the ceiling never inflates a short
        // category's probe count.
        assert_eq!(store.request_count(), 7);
    }
}
