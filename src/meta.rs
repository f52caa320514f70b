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
//! Slug generation and metadata inference from the font name table.

use ttf_parser::{name_id, Face};

use crate::config::FontConversionOptions;
use crate::face;

/// Strings read straight from the name table, empty when absent.
#[derive(Debug, Clone, Default)]
pub struct FontMetadata {
    pub name: String,
    pub license: String,
    pub source: String,
}

/// Metadata ready for font record assembly: inferred values overridden by
/// caller-provided ones, with the cursive shorthand applied.
#[derive(Debug, Clone)]
pub struct ResolvedMetadata {
    pub display_name: String,
    pub slug: String,
    pub category: String,
    pub tags: Vec<String>,
    pub source: String,
    pub license: String,
    pub letter_spacing: u32,
}

/// Converts a display name to a kebab-case slug.
///
/// `"ACSF Brave"` becomes `"acsf-brave"`, `"My_Font  Name!"` becomes
/// `"my-font-name"`.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        match c {
            'a'..='z' | '0'..='9' => slug.push(c),
            '-' | '_' => push_hyphen(&mut slug),
            c if c.is_whitespace() => push_hyphen(&mut slug),
            _ => (),
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn push_hyphen(slug: &mut String) {
    if !slug.is_empty() && !slug.ends_with('-') {
        slug.push('-');
    }
}

/// Reads display name (IDs 4 then 1), license (13 then 0) and designer (9)
/// from the name table.
pub fn infer_metadata(face: &Face) -> FontMetadata {
    let name = face::name_entry(face, name_id::FULL_NAME)
        .or_else(|| face::name_entry(face, name_id::FAMILY))
        .unwrap_or_default();
    let license = face::name_entry(face, name_id::LICENSE)
        .or_else(|| face::name_entry(face, name_id::COPYRIGHT_NOTICE))
        .unwrap_or_default();
    let source = face::name_entry(face, name_id::DESIGNER).unwrap_or_default();

    FontMetadata {
        name: name.trim().to_owned(),
        license: license.trim().to_owned(),
        source: source.trim().to_owned(),
    }
}

/// Keyword heuristics over the display and table names.
pub fn infer_category(display_name: &str, metadata: &FontMetadata) -> &'static str {
    let text = format!("{} {}", display_name, metadata.name).to_lowercase();
    if ["script", "cursive", "italic"].iter().any(|kw| text.contains(kw)) {
        return "script";
    }
    if text.contains("gothic") {
        return "gothic";
    }
    if text.contains("pixel") || text.contains("bitmap") {
        return "pixel";
    }
    if text.contains("serif") && !text.contains("sans") {
        return "serif";
    }
    if text.contains("decorative") || text.contains("ornament") {
        return "decorative";
    }
    "sans-serif"
}

const TAG_STOP_WORDS: &[&str] = &["the", "font", "ttf", "otf"];

/// Tags from the meaningful words of the display name. Always includes
/// `cross-stitch`; cursive fonts also get `cursive` and `connected`.
pub fn infer_tags(display_name: &str, is_cursive: bool) -> Vec<String> {
    let lower = display_name.to_lowercase();
    let mut tags: Vec<String> = Vec::new();

    for word in lower.split(|c: char| !c.is_ascii_alphabetic()) {
        if word.len() >= 3
            && !TAG_STOP_WORDS.contains(&word)
            && !tags.iter().any(|t| t == word)
        {
            tags.push(word.to_owned());
        }
    }

    if !tags.iter().any(|t| t == "cross-stitch") {
        tags.push("cross-stitch".to_owned());
    }
    if is_cursive {
        for tag in ["cursive", "connected"] {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_owned());
            }
        }
    }
    tags
}

/// Resolves font metadata from the name table plus caller overrides.
/// Centralizes the rule shared by the extraction and rasterization
/// pipelines, including the cursive shorthand.
pub fn resolve(face: &Face, opts: &FontConversionOptions) -> ResolvedMetadata {
    let inferred = infer_metadata(face);

    let display_name = match opts.name {
        Some(ref name) => name.clone(),
        None if inferred.name.is_empty() => "Unknown Font".to_owned(),
        None => inferred.name.clone(),
    };
    let slug = opts.font_id.clone().unwrap_or_else(|| generate_slug(&display_name));
    let mut category = opts
        .category
        .clone()
        .unwrap_or_else(|| infer_category(&display_name, &inferred).to_owned());
    let tags =
        opts.tags.clone().unwrap_or_else(|| infer_tags(&display_name, opts.is_cursive));
    let source = opts.source.clone().unwrap_or(inferred.source);
    let license = opts.license.clone().unwrap_or(inferred.license);

    let mut letter_spacing = opts.letter_spacing;
    if opts.is_cursive {
        letter_spacing = 0;
        category = "script".to_owned();
    }

    ResolvedMetadata { display_name, slug, category, tags, source, license, letter_spacing }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_lowercases_and_hyphenates() {
        assert_eq!(generate_slug("ACSF Brave"), "acsf-brave");
        assert_eq!(generate_slug("My_Font  Name!"), "my-font-name");
    }

    #[test]
    fn slug_collapses_and_trims_hyphens() {
        assert_eq!(generate_slug("a - b"), "a-b");
        assert_eq!(generate_slug("--edge--"), "edge");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn category_keywords() {
        let meta = FontMetadata::default();
        assert_eq!(infer_category("Fancy Script Pro", &meta), "script");
        assert_eq!(infer_category("Old Gothic", &meta), "gothic");
        assert_eq!(infer_category("Pixel Dreams", &meta), "pixel");
        assert_eq!(infer_category("Times Serif", &meta), "serif");
        assert_eq!(infer_category("Open Sans Serif", &meta), "sans-serif");
        assert_eq!(infer_category("Ornament Display", &meta), "decorative");
        assert_eq!(infer_category("Plain", &meta), "sans-serif");
    }

    #[test]
    fn tags_skip_short_and_stop_words() {
        let tags = infer_tags("The Brave Font XY", false);
        assert_eq!(tags, vec!["brave", "cross-stitch"]);
    }

    #[test]
    fn cursive_adds_its_tags() {
        let tags = infer_tags("Wave", true);
        assert!(tags.contains(&"cross-stitch".to_owned()));
        assert!(tags.contains(&"cursive".to_owned()));
        assert!(tags.contains(&"connected".to_owned()));
    }
}
