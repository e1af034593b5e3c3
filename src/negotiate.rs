//! Format negotiation.
//!
//! Decides which encoded variant of a photo to request first. Locally hosted
//! photos get their extension swapped to WebP when the session is judged
//! capable of handling the format; external URLs and non-negotiable paths
//! pass through untouched. The negotiated variant is an optimistic first
//! attempt; the lazy loader falls back to the original encoding if it fails
//! (see [`load`](crate::load)).
//!
//! ## Capability
//!
//! "Can this runtime handle WebP" is answered once per session by
//! [`EncoderProbe`]: encode a 1×1 raster to WebP in memory and check the
//! result is non-empty and tagged as a WebP container. The answer is cached
//! in the [`Negotiator`] and never recomputed; computing it twice under a
//! race is harmless because the answer is deterministic.
//!
//! The provider is injectable so both answers are testable; see
//! [`FormatCapability`] and the fixed-value provider in [`tests`].

use std::sync::OnceLock;

/// Preferred modern format extension.
pub const MODERN_EXTENSION: &str = "webp";

/// Raster extensions eligible for substitution. Paths with any other
/// extension — including `webp` itself — are returned unchanged, which is
/// what makes negotiation idempotent.
const NEGOTIABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Answers "does this runtime handle the modern image format".
pub trait FormatCapability: Send + Sync {
    fn supports_modern_format(&self) -> bool;
}

impl<T: FormatCapability + ?Sized> FormatCapability for std::sync::Arc<T> {
    fn supports_modern_format(&self) -> bool {
        (**self).supports_modern_format()
    }
}

/// Production capability check: encode a trivial raster to WebP in memory.
///
/// Capable iff encoding succeeds and the output carries the `RIFF`/`WEBP`
/// container tag. Any failure counts as "not capable": the conservative
/// answer keeps sessions on the universally supported original format.
pub struct EncoderProbe;

impl FormatCapability for EncoderProbe {
    fn supports_modern_format(&self) -> bool {
        let pixel = image::RgbaImage::new(1, 1);
        let mut encoded = Vec::new();
        let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut encoded);
        if encoder
            .encode(pixel.as_raw(), 1, 1, image::ExtendedColorType::Rgba8)
            .is_err()
        {
            return false;
        }
        encoded.len() >= 12 && &encoded[0..4] == b"RIFF" && &encoded[8..12] == b"WEBP"
    }
}

/// Picks the encoded variant to request first for a photo.
///
/// Create one per process and share it (`Arc`): the capability answer is
/// computed on first use and cached for the negotiator's lifetime, giving
/// every caller the same deterministic substitution for the whole session.
pub struct Negotiator {
    provider: Box<dyn FormatCapability>,
    capable: OnceLock<bool>,
}

impl Negotiator {
    pub fn new(provider: impl FormatCapability + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            capable: OnceLock::new(),
        }
    }

    /// Negotiator backed by the in-memory encoder probe.
    pub fn with_encoder_probe() -> Self {
        Self::new(EncoderProbe)
    }

    /// Whether this session prefers the modern format. First call runs the
    /// capability provider; later calls read the cached answer.
    pub fn is_capable(&self) -> bool {
        *self
            .capable
            .get_or_init(|| self.provider.supports_modern_format())
    }

    /// Pick the variant to request first for `base_source`.
    ///
    /// External URLs are someone else's host and are returned unchanged. So are
    /// paths whose extension is not a negotiable raster extension. Otherwise
    /// the extension is substituted with [`MODERN_EXTENSION`] when the
    /// session is capable.
    pub fn negotiate(&self, base_source: &str) -> String {
        if is_external(base_source) {
            return base_source.to_string();
        }
        match negotiable_stem(base_source) {
            Some(stem) if self.is_capable() => format!("{stem}.{MODERN_EXTENSION}"),
            _ => base_source.to_string(),
        }
    }
}

/// True for absolute URLs with a network scheme.
pub(crate) fn is_external(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Split off a negotiable raster extension, returning the stem.
fn negotiable_stem(path: &str) -> Option<&str> {
    let (stem, extension) = path.rsplit_once('.')?;
    NEGOTIABLE_EXTENSIONS
        .iter()
        .any(|e| extension.eq_ignore_ascii_case(e))
        .then_some(stem)
}
