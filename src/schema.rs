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
//! The bitmap font JSON v2 output contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::config::VALID_CATEGORIES;
use crate::meta::ResolvedMetadata;

pub const VERSION: u32 = 2;

/// One glyph: its width in stitches and its bitmap rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glyph {
    pub width: u32,
    pub bitmap: Bitmap,
}

impl Glyph {
    /// An all-empty glyph, used for the space character.
    pub fn blank(width: u32, rows: u32) -> Glyph {
        Glyph { width, bitmap: vec!["0".repeat(width as usize); rows as usize] }
    }
}

/// A complete bitmap font. Constructed once per conversion, serialized and
/// dropped; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Font {
    pub version: u32,
    pub id: String,
    pub name: String,
    pub height: u32,
    pub letter_spacing: u32,
    pub space_width: u32,
    pub source: String,
    pub license: String,
    pub charset: String,
    pub category: String,
    pub tags: Vec<String>,
    pub glyphs: BTreeMap<char, Glyph>,
}

impl Font {
    pub fn assemble(
        meta: ResolvedMetadata,
        height: u32,
        charset: String,
        space_width: u32,
        glyphs: BTreeMap<char, Glyph>,
    ) -> Font {
        Font {
            version: VERSION,
            id: meta.slug,
            name: meta.display_name,
            height,
            letter_spacing: meta.letter_spacing,
            space_width,
            source: meta.source,
            license: meta.license,
            charset,
            category: meta.category,
            tags: meta.tags,
            glyphs,
        }
    }

    /// Output quality checks. Returns human-readable issues; empty means
    /// the record is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.version != VERSION {
            issues.push(format!("version must be {}, got {}", VERSION, self.version));
        }
        if !is_valid_slug(&self.id) {
            issues.push(format!(
                "invalid id format: '{}' (must be lowercase alphanumeric with hyphens)",
                self.id
            ));
        }
        if self.height < 1 {
            issues.push(format!("height must be >= 1, got {}", self.height));
        }
        if self.space_width < 1 {
            issues.push(format!("spaceWidth must be >= 1, got {}", self.space_width));
        }
        if self.charset != "basic" && self.charset != "extended" {
            issues.push(format!("unknown charset '{}'", self.charset));
        }
        if !VALID_CATEGORIES.contains(&self.category.as_str()) {
            issues.push(format!("unknown category '{}'", self.category));
        }
        if self.glyphs.is_empty() {
            issues.push("font has no glyphs".to_owned());
        }

        for (c, glyph) in &self.glyphs {
            if glyph.width < 1 {
                issues.push(format!("glyph '{}' has width {}", c, glyph.width));
            }
            if glyph.bitmap.is_empty() {
                issues.push(format!("glyph '{}' has an empty bitmap", c));
                continue;
            }
            for (i, row) in glyph.bitmap.iter().enumerate() {
                if row.len() != glyph.width as usize {
                    issues.push(format!(
                        "glyph '{}' row {} has length {}, expected {}",
                        c,
                        i,
                        row.len(),
                        glyph.width
                    ));
                }
                if row.bytes().any(|b| b != b'0' && b != b'1') {
                    issues.push(format!("glyph '{}' row {} contains non-binary cells", c, i));
                }
            }
            if glyph.bitmap.len() as u32 > self.height {
                issues.push(format!(
                    "glyph '{}' has {} rows, exceeding font height {}",
                    c,
                    glyph.bitmap.len(),
                    self.height
                ));
            }
        }

        issues
    }
}

/// `^[a-z0-9]+(-[a-z0-9]+)*$` without a regex engine.
fn is_valid_slug(id: &str) -> bool {
    let mut prev_hyphen = true;
    for c in id.chars() {
        match c {
            'a'..='z' | '0'..='9' => prev_hyphen = false,
            '-' if !prev_hyphen => prev_hyphen = true,
            _ => return false,
        }
    }
    !prev_hyphen && !id.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ResolvedMetadata;

    fn sample_font() -> Font {
        let mut glyphs = BTreeMap::new();
        glyphs.insert('A', Glyph { width: 2, bitmap: vec!["11".to_owned(), "10".to_owned()] });
        glyphs.insert(' ', Glyph::blank(3, 2));
        Font::assemble(
            ResolvedMetadata {
                display_name: "Test Font".to_owned(),
                slug: "test-font".to_owned(),
                category: "sans-serif".to_owned(),
                tags: vec!["test".to_owned(), "cross-stitch".to_owned()],
                source: "Unit Tests".to_owned(),
                license: "OFL".to_owned(),
                letter_spacing: 1,
            },
            2,
            "basic".to_owned(),
            3,
            glyphs,
        )
    }

    #[test]
    fn serializes_with_the_v2_key_spelling() {
        let json = serde_json::to_string(&sample_font()).unwrap();
        assert!(json.contains("\"version\":2"));
        assert!(json.contains("\"letterSpacing\":1"));
        assert!(json.contains("\"spaceWidth\":3"));
        assert!(!json.contains("letter_spacing"));
    }

    #[test]
    fn round_trips_through_json() {
        let font = sample_font();
        let json = serde_json::to_string(&font).unwrap();
        let back: Font = serde_json::from_str(&json).unwrap();
        assert_eq!(back, font);
    }

    #[test]
    fn valid_font_has_no_issues() {
        assert!(sample_font().validate().is_empty());
    }

    #[test]
    fn validate_flags_row_width_mismatch() {
        let mut font = sample_font();
        font.glyphs.get_mut(&'A').unwrap().bitmap[0] = "111".to_owned();
        assert!(font.validate().iter().any(|issue| issue.contains("row 0")));
    }

    #[test]
    fn validate_flags_glyphs_taller_than_the_font() {
        let mut font = sample_font();
        font.height = 1;
        assert!(font.validate().iter().any(|issue| issue.contains("exceeding")));
    }

    #[test]
    fn validate_flags_bad_slugs() {
        for id in ["", "-lead", "trail-", "dou--ble", "Upper", "with space"] {
            let mut font = sample_font();
            font.id = id.to_owned();
            assert!(
                font.validate().iter().any(|issue| issue.contains("id format")),
                "slug '{}' should be rejected",
                id
            );
        }
    }

    #[test]
    fn blank_glyph_is_all_zeros() {
        let glyph = Glyph::blank(3, 4);
        assert_eq!(glyph.width, 3);
        assert_eq!(glyph.bitmap, vec!["000"; 4]);
    }
}
