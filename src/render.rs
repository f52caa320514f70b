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
//! High-resolution glyph rendering.
//!
//! One character is drawn into an oversized grayscale canvas, ink black on
//! white. The ink bounding box comes from the positioned glyph's metrics,
//! never from pixel scanning: decorative cross-stitch fonts scatter
//! anti-aliased specks far from the nominal glyph, which would balloon a
//! pixel-derived box to the whole canvas.

use image::{GrayImage, Luma};
use rusttype::{point, Font, Scale};

/// Multiple of `render_size` used for each canvas side. Leaves room for
/// negative side bearings, tall ascenders and long descenders.
const CANVAS_FACTOR: u32 = 3;

/// Ink bounds of a rendered glyph in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl InkBounds {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Draws `ch` at `render_size` pixels of nominal height onto a fresh
/// canvas, with the pen far enough from the edges that nothing clips.
/// Returns the canvas and the metric ink bounds, or `None` when the glyph
/// has no outline.
pub fn render_glyph(font: &Font, ch: char, render_size: u32) -> (GrayImage, Option<InkBounds>) {
    let canvas_size = render_size * CANVAS_FACTOR;
    let mut canvas = GrayImage::from_pixel(canvas_size, canvas_size, Luma([255u8]));

    let scale = Scale::uniform(render_size as f32);
    let offset = render_size as f32;
    let ascent = font.v_metrics(scale).ascent;
    let glyph = font.glyph(ch).scaled(scale).positioned(point(offset, offset + ascent));

    let metric_box = match glyph.pixel_bounding_box() {
        Some(bb) if bb.max.x > bb.min.x && bb.max.y > bb.min.y => bb,
        _ => return (canvas, None),
    };

    glyph.draw(|x, y, coverage| {
        let px = metric_box.min.x + x as i32;
        let py = metric_box.min.y + y as i32;
        if px >= 0 && py >= 0 && (px as u32) < canvas_size && (py as u32) < canvas_size {
            let alpha = ((coverage * 255.0) + 0.5).floor().max(0.0).min(255.0) as u8;
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            pixel.0[0] = pixel.0[0].min(255 - alpha);
        }
    });

    let bounds = InkBounds {
        left: metric_box.min.x.max(0),
        top: metric_box.min.y.max(0),
        right: metric_box.max.x.min(canvas_size as i32),
        bottom: metric_box.max.y.min(canvas_size as i32),
    };
    if bounds.right <= bounds.left || bounds.bottom <= bounds.top {
        return (canvas, None);
    }
    (canvas, Some(bounds))
}
