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
//! Rasterization of arbitrary fonts at a fixed stitch height.
//!
//! Where the extraction pipeline recovers a stitch grid already present in
//! the font, this one renders any TTF/OTF oversized, crops to ink,
//! downsamples to the target height, binarizes, and optionally thickens
//! and trims. Each glyph is scaled so its own ink box fills the target
//! height; lowercase letters come out as tall as uppercase, which trades
//! typographic proportion for legibility at 6-60 stitches.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::GrayImage;
use log::info;

use crate::bitmap::{self, Bitmap};
use crate::charset;
use crate::config::{
    self, FontConversionOptions, MAX_BOLD, MAX_TARGET_HEIGHT, MIN_TARGET_HEIGHT,
};
use crate::face::{self, FontFile};
use crate::meta;
use crate::render;
use crate::schema::{Font, Glyph};
use crate::{Error, Result};

/// Threshold applied by the max-ink strategy when none is given.
const MAX_INK_THRESHOLD: u8 = 200;

/// Downsampling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// LANCZOS resize then threshold. Good for clean fonts.
    Average,
    /// A cell is set when its darkest source pixel has ink. Preserves the
    /// one-pixel-wide strokes of script fonts that averaging erases.
    MaxInk,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Average => "average",
            Strategy::MaxInk => "max-ink",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Strategy> {
        match s {
            "average" => Ok(Strategy::Average),
            "max-ink" => Ok(Strategy::MaxInk),
            other => Err(Error::InvalidParameters {
                field: "strategy",
                message: format!("expected 'average' or 'max-ink', got '{}'", other),
            }),
        }
    }
}

/// Per-request rasterization parameters.
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Height of the output in stitches.
    pub target_height: u32,
    /// Binarization threshold. `None` selects Otsu's method under
    /// `average` and the max-ink default otherwise.
    pub threshold: Option<u8>,
    /// Dilation radius in stitches.
    pub bold: u32,
    pub strategy: Strategy,
    /// Remove empty border rows and columns from each glyph.
    pub trim: bool,
}

impl Default for RasterOptions {
    fn default() -> RasterOptions {
        RasterOptions {
            target_height: 8,
            threshold: Some(128),
            bold: 0,
            strategy: Strategy::Average,
            trim: true,
        }
    }
}

impl RasterOptions {
    /// Rejects parameters outside their allowed sets, naming the field.
    pub fn validate(&self) -> Result<()> {
        if self.target_height < MIN_TARGET_HEIGHT || self.target_height > MAX_TARGET_HEIGHT {
            return Err(Error::InvalidParameters {
                field: "target_height",
                message: format!(
                    "must be in {}..={}, got {}",
                    MIN_TARGET_HEIGHT, MAX_TARGET_HEIGHT, self.target_height
                ),
            });
        }
        if self.bold > MAX_BOLD {
            return Err(Error::InvalidParameters {
                field: "bold",
                message: format!("must be at most {}, got {}", MAX_BOLD, self.bold),
            });
        }
        Ok(())
    }
}

/// Outcome of rasterizing one font.
#[derive(Debug)]
pub struct RasterResult {
    pub font: Font,
    pub target_height: u32,
    /// Characters that produced no ink, in codepoint order.
    pub skipped: Vec<char>,
}

/// Otsu's method over a 256-bin intensity histogram: the threshold that
/// maximizes between-class variance. Degenerate histograms, including one
/// with all mass in a single bin, resolve to 128.
pub fn otsu_threshold(histogram: &[u64; 256]) -> u8 {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 128;
    }

    let sum_all: f64 = histogram.iter().enumerate().map(|(i, &n)| i as f64 * n as f64).sum();
    let mut sum_bg = 0.0;
    let mut weight_bg = 0u64;
    let mut max_variance = 0.0;
    let mut best = 128u8;

    for t in 0..256usize {
        weight_bg += histogram[t];
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0 {
            break;
        }

        sum_bg += t as f64 * histogram[t] as f64;
        let mean_bg = sum_bg / weight_bg as f64;
        let mean_fg = (sum_all - sum_bg) / weight_fg as f64;

        let variance = weight_bg as f64 * weight_fg as f64 * (mean_bg - mean_fg).powi(2);
        if variance > max_variance {
            max_variance = variance;
            best = t as u8;
        }
    }

    best
}

fn intensity_histogram(img: &GrayImage) -> [u64; 256] {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }
    histogram
}

/// Reduces a cropped ink region to a `target_width x target_height` stitch
/// bitmap. An explicitly provided threshold is used verbatim by either
/// strategy.
pub fn binarize(
    content: &GrayImage,
    target_height: u32,
    target_width: u32,
    threshold: Option<u8>,
    strategy: Strategy,
) -> Bitmap {
    match strategy {
        Strategy::Average => binarize_average(content, target_height, target_width, threshold),
        Strategy::MaxInk => binarize_max_ink(
            content,
            target_height,
            target_width,
            threshold.unwrap_or(MAX_INK_THRESHOLD),
        ),
    }
}

fn binarize_average(
    content: &GrayImage,
    target_height: u32,
    target_width: u32,
    threshold: Option<u8>,
) -> Bitmap {
    let scaled = imageops::resize(content, target_width, target_height, FilterType::Lanczos3);
    let threshold = threshold.unwrap_or_else(|| otsu_threshold(&intensity_histogram(&scaled)));

    let mut bitmap = Vec::with_capacity(target_height as usize);
    for y in 0..target_height {
        let mut row = String::with_capacity(target_width as usize);
        for x in 0..target_width {
            row.push(if scaled.get_pixel(x, y).0[0] < threshold { '1' } else { '0' });
        }
        bitmap.push(row);
    }
    bitmap
}

/// Partitions the full-resolution region into cells along floating-point
/// boundaries and marks a cell when its darkest pixel is below the
/// threshold, so a hairline stroke crossing any cell survives.
fn binarize_max_ink(
    content: &GrayImage,
    target_height: u32,
    target_width: u32,
    threshold: u8,
) -> Bitmap {
    let content_w = content.width();
    let content_h = content.height();
    let cell_h = f64::from(content_h) / f64::from(target_height);
    let cell_w = f64::from(content_w) / f64::from(target_width);

    let mut bitmap = Vec::with_capacity(target_height as usize);
    for row in 0..target_height {
        let y1 = (f64::from(row) * cell_h) as u32;
        let y2 = ((f64::from(row + 1) * cell_h) as u32).min(content_h);
        let mut row_str = String::with_capacity(target_width as usize);

        for col in 0..target_width {
            let x1 = (f64::from(col) * cell_w) as u32;
            let x2 = ((f64::from(col + 1) * cell_w) as u32).min(content_w);

            let mut min_val = 255u8;
            'cell: for y in y1..y2 {
                for x in x1..x2 {
                    let val = content.get_pixel(x, y).0[0];
                    if val < min_val {
                        min_val = val;
                        if min_val == 0 {
                            break 'cell;
                        }
                    }
                }
            }

            row_str.push(if min_val < threshold { '1' } else { '0' });
        }
        bitmap.push(row_str);
    }
    bitmap
}

/// Rasterizes one glyph end to end: render, crop to ink, binarize, dilate,
/// trim. `None` marks the character as skipped.
fn raster_glyph(
    font: &rusttype::Font,
    ch: char,
    render_size: u32,
    options: &RasterOptions,
) -> Option<Bitmap> {
    let (img, bounds) = render::render_glyph(font, ch, render_size);
    let bounds = bounds?;
    let content_w = bounds.width();
    let content_h = bounds.height();
    if content_w <= 0 || content_h <= 0 {
        return None;
    }

    let content = imageops::crop_imm(
        &img,
        bounds.left as u32,
        bounds.top as u32,
        content_w as u32,
        content_h as u32,
    )
    .to_image();

    // Per-glyph scaling: this character's ink box fills the target height.
    let target_width = ((f64::from(content_w) * f64::from(options.target_height)
        / f64::from(content_h))
    .round() as u32)
        .max(1);

    let mut bitmap =
        binarize(&content, options.target_height, target_width, options.threshold, options.strategy);

    if options.bold > 0 {
        bitmap = bitmap::dilate(&bitmap, options.bold);
    }
    if options.trim {
        bitmap = bitmap::trim(bitmap);
    }
    if bitmap.is_empty() || bitmap[0].is_empty() {
        return None;
    }
    Some(bitmap)
}

/// Rasterizes every charset character of the font at `raster.target_height`
/// stitches.
pub fn rasterize_font(
    path: &Path,
    opts: &FontConversionOptions,
    raster: &RasterOptions,
) -> Result<RasterResult> {
    opts.validate()?;
    raster.validate()?;

    let file = FontFile::open(path)?;
    let face = file.face();
    let resolved = meta::resolve(&face, opts);
    let scalable = file.scalable()?;

    let render_size = raster.target_height * config::RASTER_OVERSAMPLE;
    let cmap = face::codepoint_map(&face)?;
    let exclude = opts.exclude_set("");
    let chars = charset::filter_glyphs(&cmap, &opts.charset, &exclude)?;

    let mut glyphs: BTreeMap<char, Glyph> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (_, ch) in chars {
        if ch == ' ' {
            glyphs.insert(ch, Glyph::blank(opts.space_width, raster.target_height));
            continue;
        }

        match raster_glyph(&scalable, ch, render_size, raster) {
            Some(rows) => {
                let width = rows[0].len() as u32;
                if opts.verbose {
                    info!("  '{}': {}x{} stitches", ch, width, rows.len());
                }
                glyphs.insert(ch, Glyph { width, bitmap: rows });
            },
            None => skipped.push(ch),
        }
    }

    let height = glyphs
        .values()
        .map(|g| g.bitmap.len() as u32)
        .max()
        .unwrap_or(raster.target_height);

    let font = Font::assemble(resolved, height, opts.charset.clone(), opts.space_width, glyphs);

    Ok(RasterResult { font, target_height: raster.target_height, skipped })
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;

    #[test]
    fn otsu_of_single_bin_histogram_is_midgray() {
        let mut histogram = [0u64; 256];
        histogram[100] = 10_000;
        assert_eq!(otsu_threshold(&histogram), 128);
    }

    #[test]
    fn otsu_of_empty_histogram_is_midgray() {
        assert_eq!(otsu_threshold(&[0u64; 256]), 128);
    }

    #[test]
    fn otsu_splits_a_bimodal_histogram() {
        let mut histogram = [0u64; 256];
        histogram[50] = 1000;
        histogram[200] = 1000;
        let threshold = otsu_threshold(&histogram);
        assert!((50..200).contains(&(threshold as usize)));
    }

    /// A white region with one black pixel: max-ink keeps the stroke,
    /// averaging at the default threshold erases it.
    fn speck_image() -> GrayImage {
        let mut img = GrayImage::from_pixel(100, 100, Luma([255u8]));
        img.put_pixel(42, 57, Luma([0u8]));
        img
    }

    #[test]
    fn max_ink_preserves_a_single_dark_pixel() {
        let bitmap = binarize(&speck_image(), 10, 10, None, Strategy::MaxInk);
        let ones: usize = bitmap.iter().map(|row| row.matches('1').count()).sum();
        assert_eq!(ones, 1);
        assert_eq!(bitmap[5].as_bytes()[4], b'1');
    }

    #[test]
    fn averaging_erases_a_single_dark_pixel() {
        let bitmap = binarize(&speck_image(), 10, 10, Some(128), Strategy::Average);
        assert!(bitmap.iter().all(|row| row.bytes().all(|b| b == b'0')));
    }

    #[test]
    fn explicit_threshold_is_used_verbatim_by_max_ink() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([255u8]));
        img.put_pixel(0, 0, Luma([150u8]));
        // 150 is ink at the default 200 but not at an explicit 100.
        let loose = binarize(&img, 2, 2, None, Strategy::MaxInk);
        assert_eq!(loose[0].as_bytes()[0], b'1');
        let strict = binarize(&img, 2, 2, Some(100), Strategy::MaxInk);
        assert_eq!(strict[0].as_bytes()[0], b'0');
    }

    #[test]
    fn strategy_parses_from_its_wire_names() {
        assert_eq!("average".parse::<Strategy>().unwrap(), Strategy::Average);
        assert_eq!("max-ink".parse::<Strategy>().unwrap(), Strategy::MaxInk);
        match "blur".parse::<Strategy>() {
            Err(Error::InvalidParameters { field, .. }) => assert_eq!(field, "strategy"),
            other => panic!("expected InvalidParameters, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_parameters_name_the_field() {
        let short = RasterOptions { target_height: 3, ..Default::default() };
        match short.validate() {
            Err(Error::InvalidParameters { field, .. }) => assert_eq!(field, "target_height"),
            other => panic!("expected InvalidParameters, got {:?}", other),
        }

        let heavy = RasterOptions { bold: 4, ..Default::default() };
        match heavy.validate() {
            Err(Error::InvalidParameters { field, .. }) => assert_eq!(field, "bold"),
            other => panic!("expected InvalidParameters, got {:?}", other),
        }

        assert!(RasterOptions::default().validate().is_ok());
    }

    #[test]
    fn binarize_dimensions_match_the_request() {
        let img = GrayImage::from_pixel(80, 40, Luma([0u8]));
        for strategy in [Strategy::Average, Strategy::MaxInk] {
            let bitmap = binarize(&img, 8, 16, Some(128), strategy);
            assert_eq!(bitmap.len(), 8);
            assert!(bitmap.iter().all(|row| row.len() == 16));
        }
    }
}
