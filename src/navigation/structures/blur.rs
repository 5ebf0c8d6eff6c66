//! Separable box blur over the penalty field.
//!
//! Smoothing the cost field makes agents drift away from expensive terrain
//! gradually instead of hugging its border. The blur runs as a horizontal
//! pass followed by a vertical pass, each keeping a running window sum, so
//! the cost per cell is O(1) regardless of kernel size.

/// Blur `penalties` (row-major, `width * height`) with a square kernel of
/// side `2 * blur_size + 1`.
///
/// Samples past the grid edge are clamped to the nearest edge cell, so a
/// uniform field stays uniform. `blur_size == 0` returns the input unchanged.
pub fn box_blur(penalties: &[u32], width: usize, height: usize, blur_size: usize) -> Vec<u32> {
    debug_assert_eq!(penalties.len(), width * height);

    if blur_size == 0 || width == 0 || height == 0 {
        return penalties.to_vec();
    }

    let kernel = blur_size * 2 + 1;
    let area = (kernel * kernel) as u64;
    let extents = blur_size as isize;
    let idx = |x: usize, y: usize| y * width + x;

    // Horizontal pass: window sums along each row.
    let mut horizontal = vec![0u64; width * height];
    for y in 0..height {
        let mut sum: u64 = (-extents..=extents)
            .map(|x| penalties[idx(clamp_index(x, width), y)] as u64)
            .sum();
        horizontal[idx(0, y)] = sum;

        for x in 1..width {
            let remove = clamp_index(x as isize - extents - 1, width);
            let add = clamp_index(x as isize + extents, width);
            sum = sum + penalties[idx(add, y)] as u64 - penalties[idx(remove, y)] as u64;
            horizontal[idx(x, y)] = sum;
        }
    }

    // Vertical pass over the horizontal sums, then normalise.
    let mut blurred = vec![0u32; width * height];
    for x in 0..width {
        let mut sum: u64 = (-extents..=extents)
            .map(|y| horizontal[idx(x, clamp_index(y, height))])
            .sum();
        blurred[idx(x, 0)] = rounded_mean(sum, area);

        for y in 1..height {
            let remove = clamp_index(y as isize - extents - 1, height);
            let add = clamp_index(y as isize + extents, height);
            sum = sum + horizontal[idx(x, add)] - horizontal[idx(x, remove)];
            blurred[idx(x, y)] = rounded_mean(sum, area);
        }
    }

    blurred
}

#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

#[inline]
fn rounded_mean(sum: u64, area: u64) -> u32 {
    u32::try_from((sum + area / 2) / area).unwrap_or(u32::MAX)
}
