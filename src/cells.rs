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
//! Cell-unit detection for pre-gridded cross-stitch fonts.
//!
//! Such fonts compose every glyph from square cells of a fixed size in font
//! design units; recovering that size turns outline bounds back into stitch
//! counts. Known families resolve by name, everything else goes through a
//! scoring search over integer candidates.

use std::path::Path;

use ttf_parser::{name_id, Face};

use crate::config::{CELL_UNITS_MAX, CELL_UNITS_MIN, KNOWN_CELL_UNITS};
use crate::face::{self, FontFile};
use crate::Result;

/// How far a dimension may sit from a whole number of cells and still count
/// as divisible.
const DIVISIBILITY_TOLERANCE: f64 = 0.15;

/// Returned with zero confidence when a font exposes no usable A-Z ink.
const FALLBACK_CELL_UNITS: u32 = 57;

/// Detects the cell size of `path` and how confident the detection is, on a
/// scale of 0 to 1.
///
/// Strategy, in order: caller override, known-family lookup, scoring
/// search. The first two always carry confidence 1.0.
pub fn detect(path: &Path, override_units: Option<u32>) -> Result<(u32, f64)> {
    if let Some(units) = override_units {
        return Ok((units, 1.0));
    }

    let file = FontFile::open(path)?;
    let face = file.face();

    if let Some(units) = known_family(&face) {
        return Ok((units, 1.0));
    }

    let dimensions = glyph_dimensions(&face)?;
    Ok(score_candidates(&dimensions))
}

/// Matches the full name then the family name against the known-family
/// table, case-insensitively.
fn known_family(face: &Face) -> Option<u32> {
    for &id in &[name_id::FULL_NAME, name_id::FAMILY] {
        let name = match face::name_entry(face, id) {
            Some(name) => name.to_lowercase(),
            None => continue,
        };
        for &(family, units) in KNOWN_CELL_UNITS {
            if name.contains(family) {
                return Some(units);
            }
        }
    }
    None
}

/// Widths and heights of the uppercase A-Z outlines in font units.
/// Uppercase letters have the most consistently cell-aligned dimensions.
fn glyph_dimensions(face: &Face) -> Result<Vec<f64>> {
    let cmap = face::codepoint_map(face)?;
    let mut values = Vec::new();
    for code in 'A'..='Z' {
        let glyph = match cmap.get(&(code as u32)) {
            Some(&glyph) => glyph,
            None => continue,
        };
        if let Some(rect) = face::ink_box(face, glyph) {
            values.push(f64::from(rect.x_max - rect.x_min));
            values.push(f64::from(rect.y_max - rect.y_min));
        }
    }
    Ok(values)
}

/// Scores every candidate cell size by how many of `values` divide into a
/// whole number of cells within tolerance, and returns the best candidate
/// with its normalized score. Ties resolve to the smallest candidate.
pub fn score_candidates(values: &[f64]) -> (u32, f64) {
    if values.is_empty() {
        return (FALLBACK_CELL_UNITS, 0.0);
    }

    let mut best_units = FALLBACK_CELL_UNITS;
    let mut best_score = 0.0;

    for candidate in CELL_UNITS_MIN..=CELL_UNITS_MAX {
        let mut score = 0usize;
        for &value in values {
            let ratio = value / f64::from(candidate);
            let rounded = ratio.round();
            if rounded >= 1.0 && (ratio - rounded).abs() < DIVISIBILITY_TOLERANCE {
                score += 1;
            }
        }
        let normalized = score as f64 / values.len() as f64;
        if normalized > best_score {
            best_score = normalized;
            best_units = candidate;
        }
    }

    (best_units, best_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiples_detect_with_full_confidence() {
        // 2..=9 cells at 57 units each; enough spread that no other
        // candidate matches every value.
        let values: Vec<f64> = (2..=9).map(|k| f64::from(k * 57)).collect();
        assert_eq!(score_candidates(&values), (57, 1.0));
    }

    #[test]
    fn no_values_falls_back() {
        assert_eq!(score_candidates(&[]), (57, 0.0));
    }

    #[test]
    fn ties_resolve_to_the_smallest_candidate() {
        // 40, 80 and 120 divide perfectly by both 20 and 40.
        let (units, confidence) = score_candidates(&[40.0, 80.0, 120.0]);
        assert_eq!(units, 20);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn confidence_stays_in_range() {
        let (units, confidence) = score_candidates(&[61.0, 97.0, 283.0, 701.0]);
        assert!((CELL_UNITS_MIN..=CELL_UNITS_MAX).contains(&units));
        assert!((0.0..=1.0).contains(&confidence));
    }
}
