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
//! Logging for the stitchfont binary.
//!
//! The executable calls `initialize` exactly once during startup. The
//! level comes from the `-v`/`-q` switches; a `RUST_LOG` environment
//! variable takes precedence when set.

use std::env;

use crate::cli::Options;

pub fn initialize(options: &Options) {
    if env::var("RUST_LOG").is_ok() {
        env_logger::init();
    } else {
        env_logger::Builder::new().filter_level(options.log_level).init();
    }
}
