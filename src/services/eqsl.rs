// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! eQSL generation: one annotated copy of the QSL photo per logged contact.
//!
//! Text and the translucent table are laid out as an SVG overlay, rendered
//! with resvg at the photo's size and alpha-blended onto the photo.

use crate::error::{AppError, Result};
use crate::models::contact::{ContactRow, EQSL_COLUMNS};
use crate::services::folders::{CONTACT_LOG_FILE, QSL_MARKER_FILE};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fixed eQSL geometry, in pixels.
pub mod layout {
    pub const CALLSIGN_X: u32 = 50;
    pub const CALLSIGN_Y: u32 = 50;
    pub const CALLSIGN_FONT_SIZE: u32 = 60;
    pub const TABLE_LEFT: u32 = 50;
    /// Table top is this far above the bottom edge
    pub const TABLE_BOTTOM_OFFSET: u32 = 200;
    pub const CELL_HEIGHT: u32 = 40;
    pub const CELL_PADDING: u32 = 10;
    /// Gap between a row's top and its text
    pub const TEXT_INSET: u32 = 8;
    pub const TABLE_FONT_SIZE: u32 = 24;
    pub const COLUMN_WIDTHS: [u32; 5] = [200, 150, 100, 100, 100];
    /// Table background alpha (out of 255)
    pub const TABLE_ALPHA: u8 = 200;
}

const PREFERRED_FAMILY: &str = "DejaVu Sans";

/// Renders eQSL images from an activation folder.
#[derive(Clone)]
pub struct QslCompositor {
    fontdb: Arc<usvg::fontdb::Database>,
    font_family: Option<String>,
}

impl QslCompositor {
    /// Load system fonts, plus `font_path` if given (it becomes the
    /// preferred face).
    pub fn new(font_path: Option<&Path>) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();

        let mut custom_family = None;
        if let Some(path) = font_path {
            match fontdb.load_font_file(path) {
                Ok(()) => {
                    custom_family = fontdb
                        .faces()
                        .filter(|face| matches!(&face.source, usvg::fontdb::Source::File(p) if p == path))
                        .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to load eQSL font");
                }
            }
        }

        let font_family = custom_family
            .or_else(|| {
                fontdb
                    .faces()
                    .flat_map(|face| face.families.iter())
                    .find(|(name, _)| name == PREFERRED_FAMILY)
                    .map(|(name, _)| name.clone())
            })
            .or_else(|| {
                fontdb
                    .faces()
                    .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
            });

        match &font_family {
            Some(family) => {
                fontdb.set_sans_serif_family(family.clone());
                tracing::info!(family = %family, faces = fontdb.len(), "eQSL fonts loaded");
            }
            None => tracing::warn!("No fonts found, eQSL text will not be drawn"),
        }

        Self {
            fontdb: Arc::new(fontdb),
            font_family,
        }
    }

    /// Generate one eQSL per contact log row in `activation`, written to
    /// `output_dir`. Returns the written paths in contact log order.
    ///
    /// Fails with `MissingInput`, writing nothing, when the folder has no
    /// marked QSL photo or no contact log.
    pub fn generate(&self, activation: &Path, callsign: &str, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let marker = match std::fs::read_to_string(activation.join(QSL_MARKER_FILE)) {
            Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
            Ok(_) => return Err(AppError::MissingInput(format!("{} is empty", QSL_MARKER_FILE))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::MissingInput(
                    "no QSL photo marked (send a photo captioned \"qsl\")".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        let log_path = activation.join(CONTACT_LOG_FILE);
        let log = match std::fs::File::open(&log_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::MissingInput(format!("no {} in activation", CONTACT_LOG_FILE)))
            }
            Err(e) => return Err(e.into()),
        };
        let rows = ContactRow::parse_log(log)?;

        let background_path = activation.join(&marker);
        if !background_path.is_file() {
            return Err(AppError::MissingInput(format!("QSL photo {} not found", marker)));
        }
        let background = image::load_from_memory(&std::fs::read(&background_path)?)?.to_rgba8();

        std::fs::create_dir_all(output_dir)?;

        let mut names = OutputNames::default();
        let mut produced = Vec::with_capacity(rows.len());
        for row in &rows {
            let image = self.render(&background, callsign, row)?;
            let path = output_dir.join(names.next(row.counterparty()));
            DynamicImage::ImageRgba8(image)
                .to_rgb8()
                .save_with_format(&path, ImageFormat::Jpeg)?;

            tracing::info!(path = %path.display(), to = row.counterparty(), "eQSL written");
            produced.push(path);
        }

        tracing::info!(
            activation = %activation.display(),
            count = produced.len(),
            "eQSL generation complete"
        );
        Ok(produced)
    }

    /// Draw the overlay for one contact onto a copy of `background`.
    pub fn render(&self, background: &RgbaImage, callsign: &str, row: &ContactRow) -> Result<RgbaImage> {
        let (width, height) = background.dimensions();
        let svg = overlay_svg(width, height, callsign, row);

        let options = usvg::Options {
            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| PREFERRED_FAMILY.to_string()),
            fontdb: self.fontdb.clone(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| AppError::Image(format!("overlay markup: {}", e)))?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| AppError::Image(format!("bad canvas size {}x{}", width, height)))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let mut overlay = RgbaImage::new(width, height);
        for (dst, src) in overlay.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }

        let mut canvas = background.clone();
        image::imageops::overlay(&mut canvas, &overlay, 0, 0);
        Ok(canvas)
    }
}

/// SVG markup for one eQSL overlay on a `width` x `height` photo.
pub fn overlay_svg(width: u32, height: u32, callsign: &str, row: &ContactRow) -> String {
    use layout::*;

    let table_top = i64::from(height) - i64::from(TABLE_BOTTOM_OFFSET);
    let table_width: u32 =
        COLUMN_WIDTHS.iter().sum::<u32>() + CELL_PADDING * COLUMN_WIDTHS.len() as u32;
    let table_height = CELL_HEIGHT * 2;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );

    svg.push_str(&format!(
        r#"<text x="{}" y="{}" font-family="sans-serif" font-weight="bold" font-size="{}" fill="white">{}</text>"#,
        CALLSIGN_X,
        CALLSIGN_Y + CALLSIGN_FONT_SIZE,
        CALLSIGN_FONT_SIZE,
        xml_escape(callsign)
    ));

    svg.push_str(&format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="white" fill-opacity="{:.3}"/>"#,
        TABLE_LEFT,
        table_top,
        table_width,
        table_height,
        f32::from(TABLE_ALPHA) / 255.0
    ));

    let header_baseline = table_top + i64::from(TEXT_INSET + TABLE_FONT_SIZE);
    let rows = [
        (header_baseline, EQSL_COLUMNS.map(str::to_string)),
        (
            header_baseline + i64::from(CELL_HEIGHT),
            EQSL_COLUMNS.map(|col| row.get(col).to_string()),
        ),
    ];

    for (baseline, cells) in &rows {
        let mut x = TABLE_LEFT;
        for (cell, col_width) in cells.iter().zip(COLUMN_WIDTHS) {
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" font-family="sans-serif" font-weight="bold" font-size="{}" fill="black">{}</text>"#,
                x + CELL_PADDING,
                baseline,
                TABLE_FONT_SIZE,
                xml_escape(cell)
            ));
            x += col_width;
        }
    }

    svg.push_str("</svg>");
    svg
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Assigns `eqsl_<station>.jpg` names, suffixing repeats with `_2`, `_3`,
/// ... until the name is unused, so no file is overwritten within a run.
#[derive(Default)]
struct OutputNames {
    used: HashSet<String>,
}

impl OutputNames {
    fn next(&mut self, counterparty: &str) -> String {
        let stem = file_safe(counterparty);
        let mut name = format!("eqsl_{}.jpg", stem);
        let mut n = 1;
        while self.used.contains(&name) {
            n += 1;
            name = format!("eqsl_{}_{}.jpg", stem, n);
        }
        self.used.insert(name.clone());
        name
    }
}

/// Station identifier made safe for a file name ("EA2XX/P" -> "EA2XX-P").
fn file_safe(station: &str) -> String {
    let safe: String = station
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if safe.is_empty() {
        "unknown".to_string()
    } else {
        safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_suffix_duplicates() {
        let mut names = OutputNames::default();
        assert_eq!(names.next("DL1ABC"), "eqsl_DL1ABC.jpg");
        assert_eq!(names.next("F4XYZ"), "eqsl_F4XYZ.jpg");
        assert_eq!(names.next("DL1ABC"), "eqsl_DL1ABC_2.jpg");
        assert_eq!(names.next("DL1ABC"), "eqsl_DL1ABC_3.jpg");
    }

    #[test]
    fn test_output_names_skip_suffix_taken_by_station() {
        let mut names = OutputNames::default();
        assert_eq!(names.next("DL1ABC"), "eqsl_DL1ABC.jpg");
        assert_eq!(names.next("DL1ABC"), "eqsl_DL1ABC_2.jpg");
        assert_eq!(names.next("DL1ABC_2"), "eqsl_DL1ABC_2_2.jpg");
        assert_eq!(names.next("DL1ABC_2"), "eqsl_DL1ABC_2_3.jpg");
    }

    #[test]
    fn test_file_safe_station() {
        assert_eq!(file_safe("EA2XX/P"), "EA2XX-P");
        assert_eq!(file_safe("../etc"), "---etc");
        assert_eq!(file_safe("  "), "unknown");
    }

    #[test]
    fn test_overlay_contains_callsign_and_row() {
        let row = ContactRow::from_pairs([
            ("TO STATION", "DL1ABC"),
            ("DATE", "2025-06-01"),
            ("FREQ", "14.285"),
            ("MODE", "SSB"),
            ("RST", "59"),
        ]);
        let svg = overlay_svg(1024, 768, "EA3GNU", &row);

        assert!(svg.contains(">EA3GNU</text>"));
        for value in ["DL1ABC", "2025-06-01", "14.285", "SSB", "59"] {
            assert!(svg.contains(&format!(">{}</text>", value)), "missing {}", value);
        }
        for header in EQSL_COLUMNS {
            assert!(svg.contains(&format!(">{}</text>", header)));
        }
        // Table sits 200px above the bottom edge and spans 700px.
        assert!(svg.contains(r#"<rect x="50" y="568" width="700" height="80""#));
    }

    #[test]
    fn test_overlay_escapes_markup() {
        let row = ContactRow::from_pairs([("TO STATION", "<A&B>")]);
        let svg = overlay_svg(800, 600, "EA3\"X", &row);
        assert!(svg.contains("&lt;A&amp;B&gt;"));
        assert!(svg.contains("EA3&quot;X"));
    }
}
