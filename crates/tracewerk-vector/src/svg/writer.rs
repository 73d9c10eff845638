// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SVG writer — a background rectangle plus one even-odd path holding every
// fitted outline as a closed sub-path.
//
// Documents are rendered into memory first, staged in a temporary file next
// to the destination and renamed into place. A failed write leaves any earlier
// file at the destination untouched.

use std::io::Write;
use std::path::Path;

use tracewerk_core::config::MAX_PRECISION;
use tracewerk_core::error::{Result, TracewerkError};
use tracewerk_core::{ConversionConfig, PathSegment, Point, VectorDocument, VectorPath};
use tracing::{debug, info, instrument};

/// Presentation settings for [`SvgWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct SvgOptions {
    /// Decimal places for coordinates (0..=6).
    pub precision: usize,
    /// Fill of the canvas rectangle.
    pub background: String,
    /// Fill of the combined outline path.
    pub foreground: String,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            precision: 2,
            background: "white".into(),
            foreground: "black".into(),
        }
    }
}

impl SvgOptions {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            precision: config.precision.min(MAX_PRECISION),
            background: config.background.clone(),
            foreground: config.foreground.clone(),
        }
    }
}

/// Builds [`VectorDocument`]s and renders them as SVG bytes.
#[derive(Debug, Clone, Default)]
pub struct SvgWriter {
    options: SvgOptions,
    /// Emitted as `<title>` when set.
    title: Option<String>,
}

impl SvgWriter {
    pub fn new(options: SvgOptions) -> Self {
        Self {
            options,
            title: None,
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(SvgOptions::from_config(config))
    }

    /// Set the document title, usually the source file stem.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn options(&self) -> &SvgOptions {
        &self.options
    }

    // -- Document assembly ----------------------------------------------------

    /// Wrap fitted outlines into a document sized to the source image.
    pub fn serialize(&self, paths: Vec<VectorPath>, width: u32, height: u32) -> VectorDocument {
        VectorDocument {
            width,
            height,
            paths,
            background: self.options.background.clone(),
            foreground: self.options.foreground.clone(),
            title: self.title.clone(),
        }
    }

    // -- Rendering ------------------------------------------------------------

    /// Render the document as UTF-8 SVG.
    ///
    /// The outline path is omitted entirely when there are no paths, leaving
    /// just the background.
    #[instrument(skip_all, fields(width = doc.width, height = doc.height, paths = doc.paths.len()))]
    pub fn render(&self, doc: &VectorDocument) -> Vec<u8> {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = doc.width,
            h = doc.height,
        ));
        if let Some(title) = &doc.title {
            out.push_str(&format!("  <title>{}</title>\n", xml_escape(title)));
        }
        out.push_str(&format!(
            "  <rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>\n",
            doc.width,
            doc.height,
            xml_escape(&doc.background),
        ));

        if !doc.paths.is_empty() {
            let data = doc
                .paths
                .iter()
                .map(|path| self.path_data(path))
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!(
                "  <path d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\"/>\n",
                data,
                xml_escape(&doc.foreground),
            ));
        }
        out.push_str("</svg>\n");

        debug!(bytes = out.len(), "SVG rendered");
        out.into_bytes()
    }

    /// Render and write the document to `path`, returning the bytes written.
    ///
    /// The bytes go to a temporary file in the destination directory, which
    /// then replaces `path`. On failure the temporary file is dropped and
    /// [`TracewerkError::OutputWrite`] is returned.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn write_to(&self, doc: &VectorDocument, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let bytes = self.render(doc);
        let fail = |reason: String| TracewerkError::OutputWrite {
            path: path.to_path_buf(),
            reason,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix(".tracewerk-").suffix(".svg.tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o644));
        }

        let mut staged = builder
            .tempfile_in(dir)
            .map_err(|err| fail(err.to_string()))?;
        staged
            .write_all(&bytes)
            .and_then(|()| staged.flush())
            .map_err(|err| fail(err.to_string()))?;
        staged
            .persist(path)
            .map_err(|err| fail(err.error.to_string()))?;

        info!(bytes = bytes.len(), paths = doc.paths.len(), "SVG written");
        Ok(bytes)
    }

    /// `M x y` followed by one command per segment and a closing `Z`.
    fn path_data(&self, path: &VectorPath) -> String {
        let mut data = format!("M{}", self.point(path.start));
        for segment in &path.segments {
            match *segment {
                PathSegment::Line { end } => {
                    data.push_str(&format!(" L{}", self.point(end)));
                }
                PathSegment::Curve {
                    control1,
                    control2,
                    end,
                } => {
                    data.push_str(&format!(
                        " C{} {} {}",
                        self.point(control1),
                        self.point(control2),
                        self.point(end)
                    ));
                }
            }
        }
        data.push_str(" Z");
        data
    }

    fn point(&self, p: Point) -> String {
        format!(
            "{},{}",
            format_coordinate(p.x, self.options.precision),
            format_coordinate(p.y, self.options.precision)
        )
    }
}

/// Fixed-precision coordinate with trailing zeros trimmed and `-0`
/// normalised to `0`.
pub fn format_coordinate(value: f64, precision: usize) -> String {
    let mut text = format!("{:.*}", precision.min(MAX_PRECISION), value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".into();
    }
    text
}

/// Escape the five XML special characters.
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
