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
//! Charset filtering and unprintable-character exclusion.

use std::collections::{BTreeMap, HashSet};

use ttf_parser::GlyphId;

use crate::{Error, Result};

/// Letters, digits, space and common punctuation.
pub const BASIC: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789 !\"#%&'()*+,-./:;?";

/// Characters the `extended` charset adds on top of [`BASIC`].
pub const EXTENDED_EXTRA: &str = "@$^[]{}\\<>=_`~";

fn in_charset(charset: &str, c: char) -> bool {
    match charset {
        "basic" => BASIC.contains(c),
        _ => BASIC.contains(c) || EXTENDED_EXTRA.contains(c),
    }
}

/// Space is printable; control characters and other whitespace are not.
fn is_printable(c: char) -> bool {
    c == ' ' || (!c.is_control() && !c.is_whitespace())
}

/// The `(codepoint, character)` pairs of `cmap` that belong to the named
/// charset, minus `exclude` and anything unprintable, in ascending
/// codepoint order.
pub fn filter_glyphs(
    cmap: &BTreeMap<u32, GlyphId>,
    charset: &str,
    exclude: &HashSet<char>,
) -> Result<Vec<(u32, char)>> {
    // Checked up front so an unknown name fails even for an empty cmap.
    if charset != "basic" && charset != "extended" {
        return Err(Error::UnknownCharset(charset.to_owned()));
    }

    let mut result = Vec::new();
    for &codepoint in cmap.keys() {
        let c = match char::from_u32(codepoint) {
            Some(c) => c,
            None => continue,
        };
        if exclude.contains(&c) || !is_printable(c) || !in_charset(charset, c) {
            continue;
        }
        result.push((codepoint, c));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmap_of(chars: &[char]) -> BTreeMap<u32, GlyphId> {
        chars
            .iter()
            .enumerate()
            .map(|(i, &c)| (c as u32, GlyphId(i as u16 + 1)))
            .collect()
    }

    #[test]
    fn filters_and_sorts_by_codepoint() {
        let cmap = cmap_of(&['A', '@', 'B', '\t', '~']);
        let exclude = ['~'].iter().cloned().collect();

        let result = filter_glyphs(&cmap, "basic", &exclude).unwrap();
        // '@' is extended-only, tab is a control, '~' is excluded.
        assert_eq!(result, vec![(65, 'A'), (66, 'B')]);
    }

    #[test]
    fn extended_includes_the_extras() {
        let cmap = cmap_of(&['@', '~', '_']);
        let result = filter_glyphs(&cmap, "extended", &HashSet::new()).unwrap();
        assert_eq!(result, vec![(64, '@'), (95, '_'), (126, '~')]);
    }

    #[test]
    fn space_is_kept() {
        let cmap = cmap_of(&[' ']);
        let result = filter_glyphs(&cmap, "basic", &HashSet::new()).unwrap();
        assert_eq!(result, vec![(32, ' ')]);
    }

    #[test]
    fn unknown_charset_fails() {
        let cmap = cmap_of(&['A']);
        match filter_glyphs(&cmap, "fancy", &HashSet::new()) {
            Err(Error::UnknownCharset(name)) => assert_eq!(name, "fancy"),
            other => panic!("expected UnknownCharset, got {:?}", other),
        }
    }
}
