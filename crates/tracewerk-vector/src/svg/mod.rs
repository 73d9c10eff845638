// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SVG module — serialising fitted outlines into a self-contained document.

pub mod writer;

pub use writer::{SvgOptions, SvgWriter, format_coordinate};
