//! crates/learnai_core/src/layout.rs
//!
//! Segments a normalized plan body for the PDF renderer: paragraphs are
//! blank-line-delimited, and every line is classified into the visual style
//! it should be drawn with.

use lazy_static::lazy_static;

/// Maximum length of a line still considered a heading candidate.
const SHORT_LINE: usize = 60;

/// Leading keywords that mark a section/module heading.
const MODULE_KEYWORDS: [&str; 9] = [
    "semaine", "module", "chapitre", "étape", "phase", "partie", "séance", "jour", "mois",
];

lazy_static! {
    static ref NUMBERED: regex::Regex = regex::Regex::new(r"^\d+[.)]\s").unwrap();
}

/// The visual classification of one plan-body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// A section/module heading ("Semaine 1: Algèbre", "MODULE 2", ...).
    ModuleHeading,
    /// A short line ending in a colon ("Objectifs:").
    SubHeading,
    /// A bullet item.
    Bullet,
    /// A numbered item ("1." or "1)").
    Numbered,
    /// Plain body text.
    Body,
}

/// A classified line of the plan body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLine {
    pub kind: LineKind,
    pub text: String,
}

/// Splits a normalized plan body into blank-line-delimited paragraphs of
/// classified lines. Empty paragraphs and empty lines are dropped.
pub fn segment_plan(text: &str) -> Vec<Vec<PlanLine>> {
    text.split("\n\n")
        .filter_map(|paragraph| {
            let lines: Vec<PlanLine> = paragraph
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| PlanLine {
                    kind: classify_line(line),
                    text: line.to_string(),
                })
                .collect();
            if lines.is_empty() {
                None
            } else {
                Some(lines)
            }
        })
        .collect()
}

/// Classifies a single trimmed line.
pub fn classify_line(line: &str) -> LineKind {
    if line.starts_with('•') || line.starts_with('-') || line.starts_with('*') || line.starts_with('–')
    {
        return LineKind::Bullet;
    }
    if NUMBERED.is_match(line) {
        return LineKind::Numbered;
    }
    if is_module_heading(line) {
        return LineKind::ModuleHeading;
    }
    if line.chars().count() < SHORT_LINE && line.ends_with(':') {
        return LineKind::SubHeading;
    }
    LineKind::Body
}

fn is_module_heading(line: &str) -> bool {
    if line.chars().count() >= SHORT_LINE {
        return false;
    }
    let lowered = line.to_lowercase();
    let keyword_match = MODULE_KEYWORDS.iter().any(|kw| {
        lowered.strip_prefix(kw).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with([' ', ':', 's'])
        })
    });
    if keyword_match {
        return true;
    }
    // All-caps short lines read as headings too ("REVISIONS FINALES").
    line.chars().any(|c| c.is_alphabetic()) && line == line.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_keywords_make_headings() {
        assert_eq!(classify_line("Semaine 1: Algèbre"), LineKind::ModuleHeading);
        assert_eq!(classify_line("Module 3 - Géométrie"), LineKind::ModuleHeading);
        assert_eq!(classify_line("Étape 2"), LineKind::ModuleHeading);
        assert_eq!(classify_line("Jours 3 et 4"), LineKind::ModuleHeading);
    }

    #[test]
    fn all_caps_short_lines_are_headings() {
        assert_eq!(classify_line("REVISIONS FINALES"), LineKind::ModuleHeading);
    }

    #[test]
    fn short_colon_lines_are_sub_headings() {
        assert_eq!(classify_line("Objectifs:"), LineKind::SubHeading);
        assert_eq!(classify_line("Ressources recommandées:"), LineKind::SubHeading);
    }

    #[test]
    fn bullets_and_numbers_win_over_headings() {
        assert_eq!(classify_line("• Réviser les équations"), LineKind::Bullet);
        assert_eq!(classify_line("- Semaine de pause"), LineKind::Bullet);
        assert_eq!(classify_line("1. Faire les exercices"), LineKind::Numbered);
        assert_eq!(classify_line("2) Relire le cours"), LineKind::Numbered);
    }

    #[test]
    fn everything_else_is_body_text() {
        assert_eq!(
            classify_line("Cette semaine est consacrée aux révisions d'algèbre."),
            LineKind::Body
        );
        // A long line ending in a colon is still body text.
        let long = format!("{}:", "mot ".repeat(20));
        assert_eq!(classify_line(long.trim()), LineKind::Body);
    }

    #[test]
    fn segmentation_is_blank_line_delimited() {
        let body = "Semaine 1: Algèbre\n• Réviser les équations\n\nTexte libre.";
        let paragraphs = segment_plan(body);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0][0].kind, LineKind::ModuleHeading);
        assert_eq!(paragraphs[0][1].kind, LineKind::Bullet);
        assert_eq!(paragraphs[1][0].kind, LineKind::Body);
        assert!(segment_plan("").is_empty());
    }
}
