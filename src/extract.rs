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
//! Extraction of fonts designed on a stitch grid.
//!
//! The font's own cell size gives exact grid dimensions per glyph; a
//! high-resolution render then only needs a fill decision at the center of
//! each cell.

use std::collections::BTreeMap;
use std::path::Path;

use log::{info, warn};

use crate::cells;
use crate::charset;
use crate::config::{
    self, FontConversionOptions, CONFIDENCE_AUTO, CONFIDENCE_WARNING, DEFAULT_EXCLUDE_CHARS,
};
use crate::face::{self, FontFile};
use crate::meta;
use crate::render;
use crate::sample;
use crate::schema::{Font, Glyph};
use crate::{Error, Result};

/// Rows in the blank glyph emitted for a space without an outline.
const BLANK_SPACE_ROWS: u32 = 4;

/// Per-request extraction parameters.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Skip detection and use this cell size.
    pub cell_units: Option<u32>,
    /// Render height in pixels.
    pub render_size: u32,
    /// Fraction of each cell sampled around its center.
    pub sample_pct: f64,
    /// Minimum dark-pixel ratio for a stitched cell.
    pub fill_threshold: f64,
}

impl Default for ExtractOptions {
    fn default() -> ExtractOptions {
        ExtractOptions {
            cell_units: None,
            render_size: config::DEFAULT_RENDER_SIZE,
            sample_pct: config::DEFAULT_SAMPLE_PCT,
            fill_threshold: config::DEFAULT_FILL_THRESHOLD,
        }
    }
}

impl ExtractOptions {
    /// Rejects parameters outside their allowed sets, naming the field.
    pub fn validate(&self) -> Result<()> {
        if self.render_size == 0 {
            return Err(Error::InvalidParameters {
                field: "render_size",
                message: "must be at least 1".to_owned(),
            });
        }
        if !(self.sample_pct > 0.0 && self.sample_pct <= 1.0) {
            return Err(Error::InvalidParameters {
                field: "sample_pct",
                message: format!("must be in (0, 1], got {}", self.sample_pct),
            });
        }
        if !(0.0..=1.0).contains(&self.fill_threshold) {
            return Err(Error::InvalidParameters {
                field: "fill_threshold",
                message: format!("must be in [0, 1], got {}", self.fill_threshold),
            });
        }
        Ok(())
    }
}

/// Outcome of extracting one font.
#[derive(Debug)]
pub struct ExtractionResult {
    pub font: Font,
    pub cell_units: u32,
    pub confidence: f64,
    /// Characters that produced no ink, in codepoint order.
    pub skipped: Vec<char>,
}

/// Runs the extraction pipeline: cell detection, per-glyph grid dimensions
/// from font-unit bounds, high-resolution render, cell-center sampling.
pub fn extract_font(
    path: &Path,
    opts: &FontConversionOptions,
    extract: &ExtractOptions,
) -> Result<ExtractionResult> {
    opts.validate()?;
    extract.validate()?;

    let (units, confidence) = cells::detect(path, extract.cell_units)?;
    if confidence < CONFIDENCE_WARNING {
        warn!(
            "cell size {} detected with low confidence {:.2}; consider --cell-units",
            units, confidence
        );
    } else if confidence < CONFIDENCE_AUTO || opts.verbose {
        info!("cell size {} (confidence {:.2})", units, confidence);
    }

    let file = FontFile::open(path)?;
    let face = file.face();
    let resolved = meta::resolve(&face, opts);
    let scalable = file.scalable()?;

    let cmap = face::codepoint_map(&face)?;
    let exclude = opts.exclude_set(DEFAULT_EXCLUDE_CHARS);
    let chars = charset::filter_glyphs(&cmap, &opts.charset, &exclude)?;

    let mut glyphs: BTreeMap<char, Glyph> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (codepoint, ch) in chars {
        let glyph_id = cmap[&codepoint];

        let rect = match face::ink_box(&face, glyph_id) {
            Some(rect) => rect,
            None => {
                if ch == ' ' {
                    glyphs.insert(ch, Glyph::blank(opts.space_width, BLANK_SPACE_ROWS));
                } else {
                    skipped.push(ch);
                }
                continue;
            },
        };

        let glyph_w = f64::from(rect.x_max - rect.x_min);
        let glyph_h = f64::from(rect.y_max - rect.y_min);
        let cols = ((glyph_w / f64::from(units)).round() as u32).max(1);
        let rows = ((glyph_h / f64::from(units)).round() as u32).max(1);

        if opts.verbose {
            info!("  '{}': {}x{} cells ({:.0}x{:.0} units)", ch, cols, rows, glyph_w, glyph_h);
        }

        let (img, bounds) = render::render_glyph(&scalable, ch, extract.render_size);
        let bounds = match bounds {
            Some(bounds) => bounds,
            None => {
                skipped.push(ch);
                continue;
            },
        };

        let sampled = sample::sample_bitmap(
            &img,
            bounds,
            rows,
            cols,
            extract.sample_pct,
            extract.fill_threshold,
        );

        // The grid count is authoritative and empty border rows keep the
        // baseline alignment, so no trim here.
        if sampled.is_empty() || sampled[0].is_empty() {
            skipped.push(ch);
            continue;
        }
        glyphs.insert(ch, Glyph { width: cols, bitmap: sampled });
    }

    let height = glyphs.values().map(|g| g.bitmap.len() as u32).max().unwrap_or(1);
    let font = Font::assemble(resolved, height, opts.charset.clone(), opts.space_width, glyphs);

    Ok(ExtractionResult { font, cell_units: units, confidence, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(ExtractOptions::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_parameters_name_the_field() {
        let zero = ExtractOptions { sample_pct: 0.0, ..Default::default() };
        match zero.validate() {
            Err(Error::InvalidParameters { field, .. }) => assert_eq!(field, "sample_pct"),
            other => panic!("expected InvalidParameters, got {:?}", other),
        }

        let over = ExtractOptions { fill_threshold: 1.5, ..Default::default() };
        match over.validate() {
            Err(Error::InvalidParameters { field, .. }) => assert_eq!(field, "fill_threshold"),
            other => panic!("expected InvalidParameters, got {:?}", other),
        }

        let flat = ExtractOptions { render_size: 0, ..Default::default() };
        match flat.validate() {
            Err(Error::InvalidParameters { field, .. }) => assert_eq!(field, "render_size"),
            other => panic!("expected InvalidParameters, got {:?}", other),
        }
    }
}
