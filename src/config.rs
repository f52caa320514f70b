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
//! Compiled-in defaults shared by both conversion pipelines.

use std::collections::HashSet;

use crate::{Error, Result};

/// Cell size in font units for known font families, matched as lowercase
/// substrings of the family or full name.
///
/// ACSF fonts use 57 units per cell: a 44 unit stitch plus a 13 unit gap.
pub const KNOWN_CELL_UNITS: &[(&str, u32)] = &[("acsf", 57)];

/// Candidate range for the cell-unit scoring search.
pub const CELL_UNITS_MIN: u32 = 20;
pub const CELL_UNITS_MAX: u32 = 120;

/// Detection confidence at or above which the result is trusted silently.
pub const CONFIDENCE_AUTO: f64 = 0.9;
/// Detection confidence below which a warning is logged.
pub const CONFIDENCE_WARNING: f64 = 0.7;

/// Render height in pixels for extraction; large enough that cell-center
/// sampling is unaffected by anti-aliased bleed between cells.
pub const DEFAULT_RENDER_SIZE: u32 = 2000;
/// Fraction of each cell inspected around its center.
pub const DEFAULT_SAMPLE_PCT: f64 = 0.4;
/// Minimum dark-pixel ratio for a cell to count as stitched.
pub const DEFAULT_FILL_THRESHOLD: f64 = 0.15;

pub const DEFAULT_LETTER_SPACING: u32 = 1;
pub const DEFAULT_SPACE_WIDTH: u32 = 3;

/// Characters excluded from extraction by default. Pre-gridded cross-stitch
/// fonts reuse these codepoints for formatting marks: `|` a 36 stitch bar,
/// `~` a 1pt space, `_` a 20 stitch fill area.
pub const DEFAULT_EXCLUDE_CHARS: &str = "|~_";

/// Categories accepted by the output schema.
pub const VALID_CATEGORIES: &[&str] =
    &["serif", "sans-serif", "script", "pixel", "decorative", "gothic"];

/// Allowed rasterization heights in stitches.
pub const MIN_TARGET_HEIGHT: u32 = 4;
pub const MAX_TARGET_HEIGHT: u32 = 60;

/// Maximum dilation radius for the bold effect.
pub const MAX_BOLD: u32 = 3;

/// Oversampling factor for rasterization; glyphs render at
/// `target_height * RASTER_OVERSAMPLE` pixels so downsampling is
/// insensitive to subpixel placement.
pub const RASTER_OVERSAMPLE: u32 = 20;

/// Options shared by the extraction and rasterization pipelines.
///
/// `None` fields are inferred from the font's name table; caller-provided
/// values always win.
#[derive(Debug, Clone)]
pub struct FontConversionOptions {
    /// Display name override.
    pub name: Option<String>,
    /// Slug override; derived from the display name when absent.
    pub font_id: Option<String>,
    /// Space between letters in stitches. Advisory metadata.
    pub letter_spacing: u32,
    /// Width of the space character in stitches.
    pub space_width: u32,
    /// `basic` or `extended`.
    pub charset: String,
    pub category: Option<String>,
    /// Attribution text.
    pub source: Option<String>,
    pub license: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Characters to drop before conversion; each pipeline supplies its own
    /// default when absent.
    pub exclude_chars: Option<HashSet<char>>,
    /// Shorthand for connected scripts: forces `letter_spacing` to 0 and the
    /// category to `script`.
    pub is_cursive: bool,
    /// Per-glyph diagnostic logging.
    pub verbose: bool,
}

impl Default for FontConversionOptions {
    fn default() -> FontConversionOptions {
        FontConversionOptions {
            name: None,
            font_id: None,
            letter_spacing: DEFAULT_LETTER_SPACING,
            space_width: DEFAULT_SPACE_WIDTH,
            charset: "basic".to_owned(),
            category: None,
            source: None,
            license: None,
            tags: None,
            exclude_chars: None,
            is_cursive: false,
            verbose: false,
        }
    }
}

impl FontConversionOptions {
    /// Rejects fields outside their allowed sets, naming the field.
    pub fn validate(&self) -> Result<()> {
        if self.space_width < 1 {
            return Err(Error::InvalidParameters {
                field: "space_width",
                message: format!("must be at least 1, got {}", self.space_width),
            });
        }
        if let Some(ref category) = self.category {
            if !VALID_CATEGORIES.contains(&category.as_str()) {
                return Err(Error::InvalidParameters {
                    field: "category",
                    message: format!(
                        "must be one of {}, got '{}'",
                        VALID_CATEGORIES.join(", "),
                        category
                    ),
                });
            }
        }
        Ok(())
    }

    /// The effective exclusion set, with `default` filling the gap when the
    /// caller did not provide one.
    pub fn exclude_set(&self, default: &str) -> HashSet<char> {
        match self.exclude_chars {
            Some(ref set) => set.clone(),
            None => default.chars().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(FontConversionOptions::default().validate().is_ok());
    }

    #[test]
    fn zero_space_width_is_rejected() {
        let opts = FontConversionOptions { space_width: 0, ..Default::default() };
        match opts.validate() {
            Err(Error::InvalidParameters { field, .. }) => assert_eq!(field, "space_width"),
            other => panic!("expected InvalidParameters, got {:?}", other),
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        let opts = FontConversionOptions {
            category: Some("wingdings".to_owned()),
            ..Default::default()
        };
        match opts.validate() {
            Err(Error::InvalidParameters { field, .. }) => assert_eq!(field, "category"),
            other => panic!("expected InvalidParameters, got {:?}", other),
        }
    }

    #[test]
    fn exclude_set_falls_back_to_default() {
        let opts = FontConversionOptions::default();
        let set = opts.exclude_set(DEFAULT_EXCLUDE_CHARS);
        assert!(set.contains(&'|') && set.contains(&'~') && set.contains(&'_'));

        let opts = FontConversionOptions {
            exclude_chars: Some(['x'].iter().cloned().collect()),
            ..Default::default()
        };
        let set = opts.exclude_set(DEFAULT_EXCLUDE_CHARS);
        assert!(set.contains(&'x') && !set.contains(&'|'));
    }
}
