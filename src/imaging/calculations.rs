//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Whether an image of `source` dimensions already fits inside the bounds.
pub fn fits_within(source: (u32, u32), max: (u32, u32)) -> bool {
    let (w, h) = source;
    let (max_w, max_h) = max;
    w <= max_w && h <= max_h
}

/// Calculate the dimensions an oversized image is resampled to.
///
/// The longer axis ("dominant axis") is pinned to its maximum and the other
/// axis follows the aspect ratio. Both results are truncated, never rounded.
/// Square images count as height-dominant.
///
/// Only the dominant axis is constrained: a portrait image narrower than it is
/// tall can still come out wider than `max_width` when `max_height` is much
/// larger than `max_width`. Callers that need "fit inside both bounds" must
/// not use this function.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `max` - Maximum dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Target dimensions, each at least 1px
///
/// # Examples
/// ```
/// # use webp_ingest::imaging::calculate_fit_dimensions;
/// // Width dominates: 4000x2000 → 1500x750
/// assert_eq!(calculate_fit_dimensions((4000, 2000), (1500, 1500)), (1500, 750));
///
/// // Height dominates: 800x2000 → 600x1500
/// assert_eq!(calculate_fit_dimensions((800, 2000), (1500, 1500)), (600, 1500));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = max;

    let ratio = src_w as f64 / src_h as f64;

    let (w, h) = if src_w > src_h {
        (max_w as f64, max_w as f64 / ratio)
    } else {
        (max_h as f64 * ratio, max_h as f64)
    };

    // A 1xN sliver would otherwise truncate to zero on the minor axis
    ((w as u32).max(1), (h as u32).max(1))
}
