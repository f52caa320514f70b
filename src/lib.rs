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
//!
//! Two pipelines produce the same JSON v2 output. [`extract`] recovers the
//! stitch grid baked into fonts that were designed on one, reading back the
//! on/off state of every cell. [`raster`] takes any TTF/OTF, renders each
//! glyph at a target stitch height and reduces it to a 1-bit bitmap where
//! one pixel is one stitch.

use std::fmt::{self, Display, Formatter};
use std::io;

#[macro_use]
pub mod macros;

pub mod bitmap;
pub mod cache;
pub mod cells;
pub mod charset;
pub mod cli;
pub mod config;
pub mod extract;
pub mod face;
pub mod logging;
pub mod meta;
pub mod raster;
pub mod render;
pub mod sample;
pub mod schema;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors fatal to a conversion.
///
/// A glyph that produces no ink is not an error; both pipelines report it in
/// their skipped-character list instead. Cache I/O failures never surface
/// here either, the cache degrades to recomputation.
#[derive(Debug)]
pub enum Error {
    /// The font file cannot be parsed, or exposes no usable cmap.
    BadFont(String),

    /// A charset name other than `basic` or `extended`.
    UnknownCharset(String),

    /// A request parameter outside its allowed set; carries the field name.
    InvalidParameters { field: &'static str, message: String },

    /// Font or output file I/O failure.
    Io(io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Error::BadFont(ref msg) => write!(f, "unusable font: {}", msg),
            Error::UnknownCharset(ref name) => {
                write!(f, "unknown charset '{}', expected 'basic' or 'extended'", name)
            },
            Error::InvalidParameters { field, ref message } => {
                write!(f, "invalid {}: {}", field, message)
            },
            Error::Io(ref err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(val: io::Error) -> Self {
        Error::Io(val)
    }
}
