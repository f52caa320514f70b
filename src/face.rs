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
//! Font file access: cmap, name table and ink bounding boxes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ttf_parser::{cmap, Face, GlyphId, PlatformId, Rect};

use crate::{Error, Result};

/// `(platform, encoding, language)` tuples tried in order for name records:
/// Windows/Unicode BMP/US English, then Mac/Roman/English.
const NAME_PREFERENCE: &[(PlatformId, u16, u16)] =
    &[(PlatformId::Windows, 1, 0x0409), (PlatformId::Macintosh, 0, 0)];

/// An open font file.
///
/// Owns the raw bytes; table views parse lazily and borrow from the handle,
/// so dropping it releases everything on any exit path.
pub struct FontFile {
    path: PathBuf,
    data: Vec<u8>,
}

impl FontFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FontFile> {
        let path = path.as_ref().to_owned();
        let data = fs::read(&path)?;
        // Parse once up front so an unusable font fails at open time.
        if let Err(err) = Face::parse(&data, 0) {
            return Err(Error::BadFont(format!("{}: {}", path.display(), err)));
        }
        Ok(FontFile { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Table-level view of the font.
    pub fn face(&self) -> Face<'_> {
        // The same bytes parsed successfully in `open`.
        Face::parse(&self.data, 0).expect("font data was parsed at open")
    }

    /// Outline-scaling view of the same bytes, for rendering.
    pub fn scalable(&self) -> Result<rusttype::Font<'_>> {
        rusttype::Font::try_from_bytes(&self.data).ok_or_else(|| {
            Error::BadFont(format!("{}: no scalable outlines", self.path.display()))
        })
    }
}

fn cmap_rank(subtable: &cmap::Subtable) -> u8 {
    match (subtable.platform_id, subtable.encoding_id) {
        (PlatformId::Windows, 1) => 0,
        (PlatformId::Windows, 10) => 1,
        (PlatformId::Unicode, _) => 2,
        (PlatformId::Macintosh, 0) => 3,
        _ => u8::MAX,
    }
}

fn best_cmap<'a>(face: &Face<'a>) -> Option<cmap::Subtable<'a>> {
    let table = face.tables().cmap?;
    let mut best: Option<(u8, cmap::Subtable<'a>)> = None;
    for subtable in table.subtables {
        let rank = cmap_rank(&subtable);
        if rank == u8::MAX {
            continue;
        }
        let better = match best {
            Some((best_rank, _)) => rank < best_rank,
            None => true,
        };
        if better {
            best = Some((rank, subtable));
        }
    }
    best.map(|(_, subtable)| subtable)
}

/// Builds the codepoint map from the best cmap subtable, preferring Windows
/// Unicode BMP and falling back through Unicode platforms to Mac Roman.
/// Keys iterate in ascending codepoint order.
pub fn codepoint_map(face: &Face) -> Result<BTreeMap<u32, GlyphId>> {
    let subtable = match best_cmap(face) {
        Some(subtable) => subtable,
        None => return Err(Error::BadFont("no usable cmap table".to_owned())),
    };

    let mut map = BTreeMap::new();
    subtable.codepoints(|codepoint| {
        if let Some(glyph) = subtable.glyph_index(codepoint) {
            map.entry(codepoint).or_insert(glyph);
        }
    });
    Ok(map)
}

/// Tight outline bounds in font units; `None` for glyphs with no ink, such
/// as the space.
pub fn ink_box(face: &Face, glyph: GlyphId) -> Option<Rect> {
    face.glyph_bounding_box(glyph)
        .filter(|r| r.x_max > r.x_min && r.y_max > r.y_min)
}

/// A string from the name table, tried against [`NAME_PREFERENCE`] in
/// order. Mac Roman bytes decode as Latin-1, which covers the name records
/// seen in practice.
pub fn name_entry(face: &Face, name_id: u16) -> Option<String> {
    for &(platform, encoding, language) in NAME_PREFERENCE {
        for name in face.names() {
            if name.name_id != name_id
                || name.platform_id != platform
                || name.encoding_id != encoding
                || name.language_id != language
            {
                continue;
            }
            if let Some(s) = name.to_string() {
                return Some(s);
            }
            if platform == PlatformId::Macintosh {
                return Some(name.name.iter().map(|&b| b as char).collect());
            }
        }
    }
    None
}
