//! PDF adapter: Implementation of `ReportWriter` using printpdf.
//!
//! A4 portrait, builtin Helvetica. Blocks are laid out top to bottom; a new
//! page starts whenever the next block would cross the bottom margin. The
//! disclaimer is printed at the foot of the last page.

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Rgb,
};

use crate::application::{Report, ReportBlock, TextStyle};
use crate::ports::{ReportError, ReportWriter};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const TOP: f32 = 277.0;
/// Lowest baseline for body text; the footer lives below it.
const BODY_BOTTOM: f32 = 35.0;
const FOOTER_TOP: f32 = 24.0;

const BRAND: (u8, u8, u8) = (185, 28, 28);
const DARK: (u8, u8, u8) = (31, 41, 55);
const GRAY: (u8, u8, u8) = (107, 114, 128);

/// Writes reports as PDF documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReportWriter;

impl PdfReportWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Cursor over the pages of one document.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    color: (u8, u8, u8),
    pages: usize,
}

impl PageCursor<'_> {
    fn ensure_room(&mut self, height: f32) {
        if self.y - height < BODY_BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
            self.pages += 1;
            // Fill color does not carry over to a new page.
            self.apply_color();
        }
    }

    fn set_color(&mut self, color: (u8, u8, u8)) {
        self.color = color;
        self.apply_color();
    }

    fn apply_color(&self) {
        let (r, g, b) = self.color;
        self.layer.set_fill_color(Color::Rgb(Rgb::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            None,
        )));
    }

    /// Print lines, keeping short blocks on one page and splitting long ones.
    fn lines(&mut self, lines: &[String], size: f32, x: f32, leading: f32, font: &IndirectFontRef) {
        let height = leading * lines.len() as f32;
        if height <= TOP - BODY_BOTTOM {
            self.ensure_room(height);
        }
        for line in lines {
            self.ensure_room(leading);
            self.layer.use_text(line.as_str(), size, Mm(x), Mm(self.y), font);
            self.y -= leading;
        }
    }
}

impl PdfReportWriter {
    fn layout(report: &Report, cursor: &mut PageCursor<'_>, fonts: &Fonts) {
        cursor.set_color(BRAND);
        cursor.layer.use_text(report.title.as_str(), 16.0, Mm(MARGIN), Mm(cursor.y), &fonts.bold);
        cursor.y -= 14.0;

        for block in &report.blocks {
            match block {
                ReportBlock::Text { lines, style } => {
                    let (size, font, color) = match style {
                        TextStyle::Body => (10.0, &fonts.regular, DARK),
                        TextStyle::Strong => (12.0, &fonts.bold, DARK),
                        TextStyle::Accent => (10.0, &fonts.bold, report.tone.rgb()),
                    };
                    cursor.set_color(color);
                    cursor.lines(lines, size, MARGIN, 6.0, font);
                    cursor.y -= 2.0;
                }
                ReportBlock::Heading(text) => {
                    // Keep a heading together with its first bullet.
                    cursor.ensure_room(16.0);
                    cursor.set_color(BRAND);
                    cursor.lines(std::slice::from_ref(text), 11.0, MARGIN, 8.0, &fonts.bold);
                }
                ReportBlock::Bullet(lines) => {
                    cursor.set_color(DARK);
                    let mut marked = Vec::with_capacity(lines.len());
                    for (i, line) in lines.iter().enumerate() {
                        marked.push(if i == 0 { format!("- {line}") } else { format!("  {line}") });
                    }
                    cursor.lines(&marked, 9.0, MARGIN + 2.0, 5.0, &fonts.regular);
                    cursor.y -= 2.0;
                }
                ReportBlock::Spacer => cursor.y -= 6.0,
            }
        }

        cursor.set_color(GRAY);
        let mut y = FOOTER_TOP;
        for line in &report.footer {
            cursor.layer.use_text(line.as_str(), 8.0, Mm(MARGIN), Mm(y), &fonts.regular);
            y -= 4.0;
        }
    }
}

impl ReportWriter for PdfReportWriter {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, report: &Report) -> Result<Vec<u8>, ReportError> {
        let (doc, page, layer) =
            PdfDocument::new(report.title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");

        let fonts = Fonts {
            regular: doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| ReportError::Font(e.to_string()))?,
            bold: doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(|e| ReportError::Font(e.to_string()))?,
        };

        let mut cursor = PageCursor {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: TOP,
            color: DARK,
            pages: 1,
        };
        Self::layout(report, &mut cursor, &fonts);
        tracing::debug!("PDF laid out on {} page(s)", cursor.pages);

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| ReportError::Encode(e.to_string()))?;
        buf.into_inner()
            .map_err(|e| ReportError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{build_report, ReportSubject};
    use crate::domain::{DiseaseType, PredictionResult, RiskAssessment};
    use chrono::{Local, TimeZone};

    fn report(advice: &str) -> Report {
        let result = PredictionResult {
            probability: 0.91,
            risk: RiskAssessment::from_wire("Critical", None),
            risk_advice: Some(advice.to_string()),
        };
        let at = Local
            .with_ymd_and_hms(2026, 1, 9, 8, 0, 0)
            .single()
            .expect("valid local time");
        build_report(&result, &ReportSubject::new("Ann Oak", None), DiseaseType::Stroke, at)
    }

    #[test]
    fn test_renders_pdf_bytes() {
        let bytes = PdfReportWriter::new()
            .render(&report("Seek care now"))
            .expect("Should render");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_reports_paginate() {
        let long = "word ".repeat(4000);
        let mut report = report(&long);
        report.blocks.push(ReportBlock::Text {
            lines: vec!["tail".to_string(); 80],
            style: TextStyle::Body,
        });

        let short = PdfReportWriter::new()
            .render(&self::report("short"))
            .expect("Should render");
        let paged = PdfReportWriter::new().render(&report).expect("Should render");
        assert!(paged.len() > short.len());
    }

    #[test]
    fn test_extension() {
        assert_eq!(PdfReportWriter::new().extension(), "pdf");
    }
}
