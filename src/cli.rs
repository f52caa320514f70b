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
//! Command line front end.

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, App, AppSettings, Arg,
    ArgMatches, SubCommand,
};
use log::LevelFilter;

use crate::config::{FontConversionOptions, VALID_CATEGORIES};
use crate::extract::ExtractOptions;
use crate::raster::RasterOptions;

/// Options specified on the command line.
pub struct Options {
    pub log_level: LevelFilter,
    pub command: Command,
}

pub enum Command {
    Extract {
        font: PathBuf,
        output: Option<PathBuf>,
        conversion: FontConversionOptions,
        extract: ExtractOptions,
    },
    Rasterize {
        font: PathBuf,
        output: Option<PathBuf>,
        conversion: FontConversionOptions,
        raster: RasterOptions,
        use_cache: bool,
    },
    Validate {
        file: PathBuf,
    },
}

/// Flags shared by the extract and rasterize subcommands.
fn shared_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name("font").help("Path to the TTF/OTF file").required(true).index(1),
        Arg::with_name("output")
            .long("output")
            .short("o")
            .takes_value(true)
            .help("Write the JSON record here instead of stdout"),
        Arg::with_name("name").long("name").takes_value(true).help("Display name override"),
        Arg::with_name("id")
            .long("id")
            .takes_value(true)
            .help("Font ID override (kebab-case)"),
        Arg::with_name("letter-spacing")
            .long("letter-spacing")
            .takes_value(true)
            .help("Letter spacing in stitches [default: 1]"),
        Arg::with_name("space-width")
            .long("space-width")
            .takes_value(true)
            .help("Space character width in stitches [default: 3]"),
        Arg::with_name("charset")
            .long("charset")
            .takes_value(true)
            .possible_values(&["basic", "extended"])
            .default_value("basic"),
        Arg::with_name("category")
            .long("category")
            .takes_value(true)
            .possible_values(VALID_CATEGORIES),
        Arg::with_name("source").long("source").takes_value(true).help("Attribution text"),
        Arg::with_name("license")
            .long("license")
            .takes_value(true)
            .help("License identifier"),
        Arg::with_name("tags").long("tags").takes_value(true).help("Comma-separated tags"),
        Arg::with_name("exclude-chars")
            .long("exclude-chars")
            .takes_value(true)
            .help("Characters to exclude"),
        Arg::with_name("cursive")
            .long("cursive")
            .help("Shorthand for connected scripts: spacing=0, category=script"),
    ]
}

impl Options {
    /// Build `Options` from command line arguments.
    #[allow(dangerous_implicit_autorefs)]
    pub fn new() -> Options {
        let matches = App::new(crate_name!())
            .version(crate_version!())
            .author(crate_authors!("\n"))
            .about(crate_description!())
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .arg(
                Arg::with_name("q")
                    .short("q")
                    .multiple(true)
                    .global(true)
                    .conflicts_with("v")
                    .help("Reduces the level of verbosity (the min level is -qq)"),
            )
            .arg(
                Arg::with_name("v")
                    .short("v")
                    .multiple(true)
                    .global(true)
                    .conflicts_with("q")
                    .help("Increases the level of verbosity (the max level is -vvv)"),
            )
            .subcommand(
                SubCommand::with_name("extract")
                    .about("Recover the stitch grid of a pre-gridded cross-stitch font")
                    .args(&shared_args())
                    .arg(
                        Arg::with_name("cell-units")
                            .long("cell-units")
                            .takes_value(true)
                            .help("Override cell size detection"),
                    )
                    .arg(
                        Arg::with_name("render-size")
                            .long("render-size")
                            .takes_value(true)
                            .help("Render height in pixels [default: 2000]"),
                    )
                    .arg(
                        Arg::with_name("sample-pct")
                            .long("sample-pct")
                            .takes_value(true)
                            .help("Center sampling fraction [default: 0.4]"),
                    )
                    .arg(
                        Arg::with_name("fill-threshold")
                            .long("fill-threshold")
                            .takes_value(true)
                            .help("Minimum fill ratio [default: 0.15]"),
                    ),
            )
            .subcommand(
                SubCommand::with_name("rasterize")
                    .about("Rasterize any font at a fixed stitch height")
                    .args(&shared_args())
                    .arg(
                        Arg::with_name("height")
                            .long("height")
                            .takes_value(true)
                            .help("Target height in stitches [default: 8]"),
                    )
                    .arg(
                        Arg::with_name("threshold")
                            .long("threshold")
                            .takes_value(true)
                            .help("Binarization threshold 0-255 [default: 128]"),
                    )
                    .arg(
                        Arg::with_name("auto-threshold")
                            .long("auto-threshold")
                            .conflicts_with("threshold")
                            .help("Derive the threshold with Otsu's method"),
                    )
                    .arg(
                        Arg::with_name("bold")
                            .long("bold")
                            .takes_value(true)
                            .help("Thicken strokes by N stitches (0-3)"),
                    )
                    .arg(
                        Arg::with_name("strategy")
                            .long("strategy")
                            .takes_value(true)
                            .possible_values(&["average", "max-ink"])
                            .default_value("average")
                            .help("average=LANCZOS resize, max-ink=keep thin strokes"),
                    )
                    .arg(
                        Arg::with_name("no-trim")
                            .long("no-trim")
                            .help("Keep empty border rows and columns"),
                    )
                    .arg(
                        Arg::with_name("cache")
                            .long("cache")
                            .help("Reuse cached results for repeated requests"),
                    ),
            )
            .subcommand(
                SubCommand::with_name("validate")
                    .about("Check a bitmap font JSON file against the v2 contract")
                    .arg(Arg::with_name("file").help("JSON file to check").required(true).index(1)),
            )
            .get_matches();

        // SubcommandRequiredElseHelp means clap has already exited otherwise.
        let (name, submatches) = matches.subcommand();
        let sub = submatches.expect("a subcommand is required");

        // Global args propagate into the subcommand matches, wherever they
        // were written on the line.
        let mut log_level = LevelFilter::Warn;
        match sub.occurrences_of("q") {
            0 => {},
            1 => log_level = LevelFilter::Error,
            _ => log_level = LevelFilter::Off,
        }
        match sub.occurrences_of("v") {
            0 => {},
            1 => log_level = LevelFilter::Info,
            2 => log_level = LevelFilter::Debug,
            _ => log_level = LevelFilter::Trace,
        }
        let verbose = sub.occurrences_of("v") > 0;

        let command = match name {
            "extract" => {
                let mut extract = ExtractOptions::default();
                if let Some(value) = sub.value_of("cell-units") {
                    extract.cell_units = Some(parse_or_exit(value, "cell-units"));
                }
                if let Some(value) = sub.value_of("render-size") {
                    extract.render_size = parse_or_exit(value, "render-size");
                }
                if let Some(value) = sub.value_of("sample-pct") {
                    extract.sample_pct = parse_or_exit(value, "sample-pct");
                }
                if let Some(value) = sub.value_of("fill-threshold") {
                    extract.fill_threshold = parse_or_exit(value, "fill-threshold");
                }
                Command::Extract {
                    font: font_path(sub),
                    output: output_path(sub),
                    conversion: conversion_options(sub, verbose),
                    extract,
                }
            },
            "rasterize" => {
                let mut raster = RasterOptions::default();
                if let Some(value) = sub.value_of("height") {
                    raster.target_height = parse_or_exit(value, "height");
                }
                if sub.is_present("auto-threshold") {
                    raster.threshold = None;
                } else if let Some(value) = sub.value_of("threshold") {
                    raster.threshold = Some(parse_or_exit(value, "threshold"));
                }
                if let Some(value) = sub.value_of("bold") {
                    raster.bold = parse_or_exit(value, "bold");
                }
                if let Some(value) = sub.value_of("strategy") {
                    raster.strategy = parse_or_exit(value, "strategy");
                }
                raster.trim = !sub.is_present("no-trim");
                Command::Rasterize {
                    font: font_path(sub),
                    output: output_path(sub),
                    conversion: conversion_options(sub, verbose),
                    raster,
                    use_cache: sub.is_present("cache"),
                }
            },
            "validate" => {
                // Required by clap, so the unwrap always succeeds.
                Command::Validate { file: PathBuf::from(sub.value_of("file").unwrap()) }
            },
            _ => unreachable!("a subcommand is required"),
        };

        Options { log_level, command }
    }
}

fn font_path(matches: &ArgMatches) -> PathBuf {
    // Required by clap, so the unwrap always succeeds.
    PathBuf::from(matches.value_of("font").unwrap())
}

fn output_path(matches: &ArgMatches) -> Option<PathBuf> {
    matches.value_of("output").map(PathBuf::from)
}

fn conversion_options(matches: &ArgMatches, verbose: bool) -> FontConversionOptions {
    let mut opts = FontConversionOptions::default();
    opts.name = matches.value_of("name").map(str::to_owned);
    opts.font_id = matches.value_of("id").map(str::to_owned);
    if let Some(value) = matches.value_of("letter-spacing") {
        opts.letter_spacing = parse_or_exit(value, "letter-spacing");
    }
    if let Some(value) = matches.value_of("space-width") {
        opts.space_width = parse_or_exit(value, "space-width");
    }
    if let Some(value) = matches.value_of("charset") {
        opts.charset = value.to_owned();
    }
    opts.category = matches.value_of("category").map(str::to_owned);
    opts.source = matches.value_of("source").map(str::to_owned);
    opts.license = matches.value_of("license").map(str::to_owned);
    opts.tags = matches.value_of("tags").map(|tags| {
        tags.split(',')
            .map(|tag| tag.trim().to_owned())
            .filter(|tag| !tag.is_empty())
            .collect()
    });
    opts.exclude_chars = matches.value_of("exclude-chars").map(|chars| chars.chars().collect());
    opts.is_cursive = matches.is_present("cursive");
    opts.verbose = verbose;
    opts
}

fn parse_or_exit<T: FromStr>(value: &str, flag: &str) -> T {
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            eprintln!("invalid value for --{}: '{}'", flag, value);
            process::exit(1);
        },
    }
}
