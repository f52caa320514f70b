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
//! Stitchfont - vector fonts in, cross-stitch bitmap fonts out

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use log::{info, warn};

use stitchfont::cache::{self, RasterCache, RequestKey};
use stitchfont::cli::{self, Command};
use stitchfont::schema::Font;
use stitchfont::{die, extract, logging, raster, Result};

fn main() {
    let options = cli::Options::new();
    logging::initialize(&options);

    if let Err(err) = run(options.command) {
        die!("{}", err);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Extract { font, output, conversion, extract: extract_options } => {
            let result = extract::extract_font(&font, &conversion, &extract_options)?;
            report_skipped(&result.skipped);
            info!(
                "extracted {} glyphs at cell size {} (confidence {:.2})",
                result.font.glyphs.len(),
                result.cell_units,
                result.confidence
            );
            write_font(&result.font, output.as_deref())
        },

        Command::Rasterize { font, output, conversion, raster: raster_options, use_cache } => {
            if use_cache {
                let service = RasterCache::new(RasterCache::default_root());
                let key = RequestKey {
                    font_file: font
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| font.display().to_string()),
                    height: raster_options.target_height,
                    bold: raster_options.bold,
                    strategy: raster_options.strategy,
                };
                let serialized = service.get_or_compute(&key, || {
                    raster::rasterize_font(&font, &conversion, &raster_options)
                        .map(|result| result.font)
                })?;
                info!("etag {}", cache::etag(&serialized));
                write_serialized(&serialized, output.as_deref())
            } else {
                let result = raster::rasterize_font(&font, &conversion, &raster_options)?;
                report_skipped(&result.skipped);
                info!(
                    "rasterized {} glyphs at {} stitches",
                    result.font.glyphs.len(),
                    result.target_height
                );
                write_font(&result.font, output.as_deref())
            }
        },

        Command::Validate { file } => validate(&file),
    }
}

fn report_skipped(skipped: &[char]) {
    if !skipped.is_empty() {
        let list: String = skipped.iter().collect();
        warn!("skipped {} empty glyphs: {}", skipped.len(), list);
    }
}

fn write_font(font: &Font, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(font).expect("font record serializes");
    write_serialized(&json, output)
}

fn write_serialized(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, json)?;
            info!("wrote {}", path.display());
        },
        None => {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            writeln!(stdout, "{}", json)?;
        },
    }
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    let raw = fs::read_to_string(path)?;
    let font: Font = match serde_json::from_str(&raw) {
        Ok(font) => font,
        Err(err) => {
            eprintln!("{}: invalid JSON: {}", path.display(), err);
            process::exit(1);
        },
    };

    let issues = font.validate();
    if issues.is_empty() {
        println!("{}: ok ({} glyphs)", path.display(), font.glyphs.len());
        Ok(())
    } else {
        for issue in &issues {
            eprintln!("{}: {}", path.display(), issue);
        }
        process::exit(1);
    }
}
