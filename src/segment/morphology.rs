use ndarray::{Array2, ArrayView2};

/// Nearest-neighbor resize of `src` into `dst`'s shape.
///
/// Never interpolates, so a zero (no data) reading is never blended into its
/// neighbors. Source coordinate is `floor(dst * src_len / dst_len)`.
pub fn resize_nearest(src: ArrayView2<'_, f32>, dst: &mut Array2<f32>) {
    let (src_h, src_w) = src.dim();
    let (dst_h, dst_w) = dst.dim();
    if src_h == 0 || src_w == 0 {
        dst.fill(0.0);
        return;
    }
    let scale_x = src_w as f64 / dst_w as f64;
    let scale_y = src_h as f64 / dst_h as f64;

    for y in 0..dst_h {
        let sy = ((y as f64 * scale_y).floor() as usize).min(src_h - 1);
        for x in 0..dst_w {
            let sx = ((x as f64 * scale_x).floor() as usize).min(src_w - 1);
            dst[[y, x]] = src[[sy, sx]];
        }
    }
}

/// Grayscale erosion with a `(2 * half + 1)` square element.
///
/// Each output is the minimum over the in-bounds part of its neighborhood;
/// pixels outside the image do not participate. Runs as two 1-D passes
/// through `scratch`, which must match `src`'s shape.
pub fn erode(src: ArrayView2<'_, f32>, scratch: &mut Array2<f32>, dst: &mut Array2<f32>, half: usize) {
    let (h, w) = src.dim();
    if h == 0 || w == 0 {
        return;
    }

    for y in 0..h {
        for x in 0..w {
            let lo = x.saturating_sub(half);
            let hi = (x + half).min(w - 1);
            scratch[[y, x]] = (lo..=hi)
                .map(|i| src[[y, i]])
                .fold(f32::INFINITY, f32::min);
        }
    }

    for y in 0..h {
        let lo = y.saturating_sub(half);
        let hi = (y + half).min(h - 1);
        for x in 0..w {
            dst[[y, x]] = (lo..=hi)
                .map(|j| scratch[[j, x]])
                .fold(f32::INFINITY, f32::min);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn nearest_downsample_picks_source_pixels() {
        let src = array![
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ];
        let mut dst = Array2::zeros((2, 2));
        resize_nearest(src.view(), &mut dst);
        assert_eq!(dst, array![[1.0, 3.0], [9.0, 11.0]]);
    }

    #[test]
    fn nearest_resize_never_blends_zero() {
        let src = array![[0.0, 1000.0], [1000.0, 0.0]];
        let mut dst = Array2::zeros((4, 4));
        resize_nearest(src.view(), &mut dst);
        assert!(dst.iter().all(|&v| v == 0.0 || v == 1000.0));
        assert_eq!(dst[[0, 0]], 0.0);
        assert_eq!(dst[[0, 3]], 1000.0);
        assert_eq!(dst[[3, 3]], 0.0);
    }

    #[test]
    fn erosion_removes_isolated_spike() {
        let mut src = Array2::zeros((5, 5));
        src[[2, 2]] = 1.0;
        let mut scratch = Array2::zeros((5, 5));
        let mut dst = Array2::from_elem((5, 5), 9.0);
        erode(src.view(), &mut scratch, &mut dst, 1);
        assert!(dst.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn erosion_keeps_block_interior() {
        let mut src = Array2::zeros((5, 5));
        for y in 1..4 {
            for x in 1..4 {
                src[[y, x]] = 0.5;
            }
        }
        let mut scratch = Array2::zeros((5, 5));
        let mut dst = Array2::zeros((5, 5));
        erode(src.view(), &mut scratch, &mut dst, 1);
        assert_eq!(dst[[2, 2]], 0.5);
        assert_eq!(dst[[1, 1]], 0.0);
        assert_eq!(dst.iter().filter(|&&v| v > 0.0).count(), 1);
    }

    #[test]
    fn erosion_ignores_out_of_bounds_neighbors() {
        let src = Array2::from_elem((3, 3), 0.25);
        let mut scratch = Array2::zeros((3, 3));
        let mut dst = Array2::zeros((3, 3));
        erode(src.view(), &mut scratch, &mut dst, 1);
        assert!(dst.iter().all(|&v| v == 0.25));
    }
}
