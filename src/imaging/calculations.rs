//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Box a thumbnail is cropped to: the requested box, shrunk per axis so the
/// output never exceeds the source.
///
/// The backend then fills this box (resize so both edges cover it, center
/// crop the overflow), so a thumbnail is never upscaled past its source.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Requested thumbnail box (width, height)
///
/// # Returns
/// * `(width, height)` - Crop box, never larger than either input on any axis
///
/// # Examples
/// ```
/// # use album_browser::imaging::calculate_cover_box;
/// // Large photo into a 300x450 grid cell → exactly the cell
/// assert_eq!(calculate_cover_box((4000, 3000), (300, 450)), (300, 450));
///
/// // Tiny icon → never enlarged
/// assert_eq!(calculate_cover_box((64, 64), (300, 450)), (64, 64));
/// ```
pub fn calculate_cover_box(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;
    (tgt_w.min(src_w).max(1), tgt_h.min(src_h).max(1))
}
