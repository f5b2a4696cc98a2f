//! services/api/src/adapters/pdf.rs
//!
//! This module contains the PDF export adapter, which is the concrete
//! implementation of the `PlanExportService` port. It lays a normalized plan
//! and its profile metadata out on A4 pages with a running vertical cursor,
//! then backfills the footer once the total page count is known.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point, Rect, Rgb,
};

use learnai_core::domain::{LearningPlanRecord, PdfExport};
use learnai_core::layout::{segment_plan, LineKind};
use learnai_core::normalize::normalize_plan_text;
use learnai_core::ports::{PlanExportService, PortError, PortResult};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

// Approximate advance width of a Helvetica glyph, in mm per pt of font size.
const GLYPH_WIDTH_FACTOR: f32 = 0.1764;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PlanExportService` using `printpdf` and the
/// built-in Helvetica faces.
#[derive(Clone, Default)]
pub struct PrintPdfExporter;

impl PrintPdfExporter {
    pub fn new() -> Self {
        Self
    }
}

impl PlanExportService for PrintPdfExporter {
    fn render_pdf(&self, plan: &LearningPlanRecord) -> PortResult<PdfExport> {
        let (doc, page, layer) = PdfDocument::new(
            "Plan d'Apprentissage Personnalisé",
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "Layer 1",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut cursor = PageCursor {
            doc: &doc,
            pages: vec![(page, layer)],
            y: MARGIN,
            regular,
            bold,
        };

        draw_header_band(&mut cursor, &plan.profile.subject);
        draw_info_panel(&mut cursor, plan);
        draw_optional_section(
            &mut cursor,
            "Difficultés d'apprentissage",
            &plan.profile.learning_difficulties,
        );
        draw_optional_section(
            &mut cursor,
            "Demandes spécifiques",
            &plan.profile.specific_requests,
        );
        draw_separator(&mut cursor);
        draw_plan_body(&mut cursor, plan.generated_plan_text.as_deref().unwrap_or(""));
        draw_footers(&cursor);

        let file_name = derive_file_name(&plan.profile.subject);
        let bytes = doc
            .save_to_bytes()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(PdfExport { file_name, bytes })
    }
}

//=========================================================================================
// Layout Cursor
//=========================================================================================

/// Tracks the current page and the vertical layout position, measured in mm
/// from the top edge.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    y: f32,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PageCursor<'_> {
    fn layer(&self) -> PdfLayerReference {
        let (page, layer) = *self.pages.last().expect("document always has a page");
        self.doc.get_page(page).get_layer(layer)
    }

    /// Inserts a page break when the next block would cross the bottom
    /// margin; the cursor resets to the top margin on the new page.
    fn ensure_space(&mut self, required: f32) {
        if self.y + required > PAGE_HEIGHT - MARGIN {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.pages.push((page, layer));
            self.y = MARGIN;
        }
    }

    /// Draws one already-wrapped line at the current position.
    fn text_line(&mut self, text: &str, size: f32, bold: bool, color: Color, indent: f32) {
        let line_height = size * 0.5;
        self.ensure_space(line_height);
        let layer = self.layer();
        layer.set_fill_color(color);
        let font = if bold { &self.bold } else { &self.regular };
        layer.use_text(
            text,
            size,
            Mm(MARGIN + indent),
            Mm(PAGE_HEIGHT - self.y),
            font,
        );
        self.y += line_height;
    }

    /// Draws a block of text with automatic wrapping to the content width.
    fn text_block(&mut self, text: &str, size: f32, bold: bool, color: Color, indent: f32) {
        for line in wrap_text(text, size, CONTENT_WIDTH - indent) {
            self.text_line(&line, size, bold, color.clone(), indent);
        }
    }
}

//=========================================================================================
// Document Sections
//=========================================================================================

/// The decorated header band: drawn once per document, not per page.
fn draw_header_band(cursor: &mut PageCursor<'_>, subject: &str) {
    let layer = cursor.layer();
    layer.set_fill_color(rgb(254, 198, 161));
    layer.add_rect(
        Rect::new(Mm(0.0), Mm(PAGE_HEIGHT - 50.0), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT))
            .with_mode(PaintMode::Fill),
    );

    let title = "Plan d'Apprentissage Personnalisé";
    layer.set_fill_color(rgb(80, 50, 30));
    layer.use_text(
        title,
        24.0,
        Mm(centered_x(title, 24.0)),
        Mm(PAGE_HEIGHT - 25.0),
        &cursor.bold,
    );

    layer.set_fill_color(rgb(100, 70, 50));
    layer.use_text(
        subject,
        16.0,
        Mm(centered_x(subject, 16.0)),
        Mm(PAGE_HEIGHT - 38.0),
        &cursor.regular,
    );

    cursor.y = 65.0;
}

fn draw_info_panel(cursor: &mut PageCursor<'_>, plan: &LearningPlanRecord) {
    let layer = cursor.layer();
    layer.set_fill_color(rgb(255, 250, 245));
    layer.add_rect(
        Rect::new(
            Mm(MARGIN - 5.0),
            Mm(PAGE_HEIGHT - (cursor.y - 5.0) - 35.0),
            Mm(MARGIN + CONTENT_WIDTH + 5.0),
            Mm(PAGE_HEIGHT - (cursor.y - 5.0)),
        )
        .with_mode(PaintMode::Fill),
    );

    cursor.text_line("Informations de base", 14.0, true, rgb(200, 120, 80), 0.0);
    cursor.y += 5.0;

    let mut parts = vec![
        format!("Niveau: {}", plan.profile.school_level.display_label()),
        format!("Âge: {} ans", plan.profile.age),
    ];
    if !plan.profile.average_grade.is_empty() {
        parts.push(format!("Moyenne: {}", plan.profile.average_grade));
    }
    cursor.text_line(&parts.join("   |   "), 11.0, false, rgb(60, 60, 60), 0.0);
    cursor.y += 15.0;
}

/// Conditional sections render only when their source field is non-empty.
fn draw_optional_section(cursor: &mut PageCursor<'_>, title: &str, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    cursor.ensure_space(30.0);
    cursor.text_line(title, 12.0, true, rgb(200, 120, 80), 0.0);
    cursor.y += 3.0;
    cursor.text_block(&normalize_plan_text(text), 10.0, false, rgb(80, 80, 80), 0.0);
    cursor.y += 10.0;
}

fn draw_separator(cursor: &mut PageCursor<'_>) {
    cursor.ensure_space(20.0);
    let layer = cursor.layer();
    layer.set_outline_color(rgb(230, 200, 180));
    layer.set_outline_thickness(0.5);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(PAGE_HEIGHT - cursor.y)), false),
            (
                Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(PAGE_HEIGHT - cursor.y)),
                false,
            ),
        ],
        is_closed: false,
    });
    cursor.y += 15.0;
}

/// The plan body: blank-line paragraphs, each line drawn in the style of its
/// classification.
fn draw_plan_body(cursor: &mut PageCursor<'_>, plan_text: &str) {
    cursor.text_line("Plan d'apprentissage", 16.0, true, rgb(200, 120, 80), 0.0);
    cursor.y += 6.0;

    // Normalization is idempotent; running it again here keeps the export
    // safe for records stored before the cleanup pass existed.
    let normalized = normalize_plan_text(plan_text);
    for paragraph in segment_plan(&normalized) {
        cursor.ensure_space(15.0);
        for line in paragraph {
            match line.kind {
                LineKind::ModuleHeading => {
                    cursor.ensure_space(12.0);
                    let layer = cursor.layer();
                    layer.set_fill_color(rgb(200, 120, 80));
                    layer.add_rect(
                        Rect::new(
                            Mm(MARGIN),
                            Mm(PAGE_HEIGHT - cursor.y - 1.0),
                            Mm(MARGIN + 1.5),
                            Mm(PAGE_HEIGHT - cursor.y + 3.0),
                        )
                        .with_mode(PaintMode::Fill),
                    );
                    cursor.text_block(&line.text, 12.0, true, rgb(200, 120, 80), 4.0);
                    cursor.y += 2.0;
                }
                LineKind::SubHeading => {
                    cursor.text_block(&line.text, 11.0, true, rgb(80, 60, 50), 0.0);
                }
                LineKind::Bullet => {
                    cursor.text_block(&line.text, 10.0, false, rgb(60, 60, 60), 4.0);
                }
                LineKind::Numbered => {
                    cursor.text_block(&line.text, 10.0, false, rgb(80, 60, 50), 2.0);
                }
                LineKind::Body => {
                    cursor.text_block(&line.text, 10.0, false, rgb(60, 60, 60), 0.0);
                }
            }
        }
        cursor.y += 3.0;
    }
}

/// Stamps "Page X / N" and the generation date on every page; runs after
/// layout because the total page count must be known.
fn draw_footers(cursor: &PageCursor<'_>) {
    let total = cursor.pages.len();
    let date = chrono::Utc::now().format("%d/%m/%Y");
    let generated = format!("Généré par LearnAI - {}", date);

    for (index, (page, layer)) in cursor.pages.iter().enumerate() {
        let layer = cursor.doc.get_page(*page).get_layer(*layer);
        layer.set_fill_color(rgb(150, 150, 150));
        let marker = format!("Page {} / {}", index + 1, total);
        layer.use_text(
            marker.as_str(),
            8.0,
            Mm(centered_x(&marker, 8.0)),
            Mm(10.0),
            &cursor.regular,
        );
        layer.use_text(
            generated.as_str(),
            8.0,
            Mm(centered_x(&generated, 8.0)),
            Mm(5.0),
            &cursor.regular,
        );
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

/// Estimated x position that centers `text` on the page.
fn centered_x(text: &str, size: f32) -> f32 {
    let width = text.chars().count() as f32 * size * GLYPH_WIDTH_FACTOR;
    ((PAGE_WIDTH - width) / 2.0).max(MARGIN / 2.0)
}

/// Greedy word wrap against the estimated glyph width. Overlong words are
/// hard-broken rather than overflowing the margin.
fn wrap_text(text: &str, size: f32, width: f32) -> Vec<String> {
    let max_chars = ((width / (size * GLYPH_WIDTH_FACTOR)) as usize).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() && word_len > max_chars {
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(max_chars) {
                lines.push(chunk.iter().collect());
            }
            continue;
        }
        let needed = if current.is_empty() {
            word_len
        } else {
            current.chars().count() + 1 + word_len
        };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
            if word_len > max_chars {
                let chars: Vec<char> = word.chars().collect();
                for chunk in chars.chunks(max_chars) {
                    lines.push(chunk.iter().collect());
                }
                continue;
            }
            current = word.to_string();
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Output file name: the subject with non-alphanumeric characters replaced,
/// plus the current date.
fn derive_file_name(subject: &str) -> String {
    let sanitized: String = subject
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!(
        "Plan_{}_{}.pdf",
        sanitized,
        chrono::Utc::now().format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_the_width_budget() {
        let lines = wrap_text("un deux trois quatre cinq six sept huit", 10.0, 30.0);
        assert!(lines.len() > 1);
        let max_chars = (30.0 / (10.0 * GLYPH_WIDTH_FACTOR)) as usize;
        for line in &lines {
            assert!(line.chars().count() <= max_chars, "line too long: {line}");
        }
    }

    #[test]
    fn wrap_hard_breaks_overlong_words() {
        let word = "a".repeat(100);
        let lines = wrap_text(&word, 10.0, 30.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn file_name_is_derived_from_the_subject() {
        let name = derive_file_name("Mathématiques avancées");
        assert!(name.starts_with("Plan_Math_matiques_avanc_es_"));
        assert!(name.ends_with(".pdf"));
    }
}
