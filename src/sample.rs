// Copyright 2025 The Stitchfont Project Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
//! Cell-center sampling of rendered glyphs.
//!
//! The grid dimensions come from exact font-unit bounds, so each cell only
//! needs a fill decision. Sampling a centered sub-rectangle keeps the
//! decision insensitive to anti-aliased haloing and to the gap between
//! cells in pre-gridded fonts.

use image::GrayImage;

use crate::bitmap::Bitmap;
use crate::render::InkBounds;

/// Intensity below which a pixel counts as ink.
const DARK_LIMIT: u8 = 128;

/// Splits `bounds` into a `rows x cols` grid and samples the center
/// `sample_pct` fraction of every cell. A cell emits `'1'` when its
/// dark-pixel ratio strictly exceeds `fill_threshold`.
pub fn sample_bitmap(
    img: &GrayImage,
    bounds: InkBounds,
    rows: u32,
    cols: u32,
    sample_pct: f64,
    fill_threshold: f64,
) -> Bitmap {
    let cell_w = f64::from(bounds.width()) / f64::from(cols);
    let cell_h = f64::from(bounds.height()) / f64::from(rows);
    let half_sample = sample_pct / 2.0;

    let mut bitmap = Vec::with_capacity(rows as usize);
    for row in 0..rows {
        let mut row_str = String::with_capacity(cols as usize);
        for col in 0..cols {
            let cx = f64::from(bounds.left) + (f64::from(col) + 0.5) * cell_w;
            let cy = f64::from(bounds.top) + (f64::from(row) + 0.5) * cell_h;
            row_str.push(sample_cell(img, cx, cy, cell_w, cell_h, half_sample, fill_threshold));
        }
        bitmap.push(row_str);
    }
    bitmap
}

fn sample_cell(
    img: &GrayImage,
    cx: f64,
    cy: f64,
    cell_w: f64,
    cell_h: f64,
    half_sample: f64,
    fill_threshold: f64,
) -> char {
    // Out-of-canvas overlap clips; a degenerate sample rectangle is empty.
    let x1 = ((cx - cell_w * half_sample) as i64).max(0) as u32;
    let y1 = ((cy - cell_h * half_sample) as i64).max(0) as u32;
    let x2 = ((cx + cell_w * half_sample) as i64).max(0).min(i64::from(img.width())) as u32;
    let y2 = ((cy + cell_h * half_sample) as i64).max(0).min(i64::from(img.height())) as u32;

    if x2 <= x1 || y2 <= y1 {
        return '0';
    }

    let mut dark = 0u32;
    let mut total = 0u32;
    for y in y1..y2 {
        for x in x1..x2 {
            total += 1;
            if img.get_pixel(x, y).0[0] < DARK_LIMIT {
                dark += 1;
            }
        }
    }

    if total > 0 && f64::from(dark) / f64::from(total) > fill_threshold {
        '1'
    } else {
        '0'
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;

    /// 200x200 canvas of 50px blocks, black where block row + column is
    /// even.
    fn checkerboard() -> GrayImage {
        GrayImage::from_fn(200, 200, |x, y| {
            if (x / 50 + y / 50) % 2 == 0 {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }

    fn full_bounds() -> InkBounds {
        InkBounds { left: 0, top: 0, right: 200, bottom: 200 }
    }

    #[test]
    fn checkerboard_samples_to_alternating_cells() {
        let bitmap = sample_bitmap(&checkerboard(), full_bounds(), 4, 4, 0.4, 0.15);
        assert_eq!(bitmap, vec!["1010", "0101", "1010", "0101"]);
    }

    #[test]
    fn blank_canvas_samples_to_zeros() {
        let img = GrayImage::from_pixel(200, 200, Luma([255u8]));
        let bitmap = sample_bitmap(&img, full_bounds(), 3, 3, 0.4, 0.15);
        assert_eq!(bitmap, vec!["000", "000", "000"]);
    }

    #[test]
    fn bounds_beyond_canvas_clip_to_empty_cells() {
        let img = GrayImage::from_pixel(100, 100, Luma([0u8]));
        // Right half of the grid sits entirely off-canvas.
        let bounds = InkBounds { left: 0, top: 0, right: 400, bottom: 100 };
        let bitmap = sample_bitmap(&img, bounds, 1, 4, 0.4, 0.15);
        assert_eq!(bitmap, vec!["1000"]);
    }
}
