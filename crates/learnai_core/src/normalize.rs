//! crates/learnai_core/src/normalize.rs
//!
//! The plan-text normalizer: one pure, idempotent cleanup pass applied to
//! every generated plan body before it is displayed or exported. The webhook
//! answers in loose markdown with occasional LaTeX fragments and escaped
//! characters; none of that survives into the UI or the PDF.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    // Boilerplate header echoing the generic templated title.
    static ref TEMPLATE_HEADER: Regex =
        Regex::new(r"(?i)#{0,2}[ \t]*plan d['’]apprentissage[^\n]*\[nom de l['’]élève\][^\n]*\n?")
            .unwrap();

    // Markdown markers. Fences are unwrapped before inline code so the
    // backtick runs cannot pair across a fence boundary.
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)```[a-zA-Z0-9]*\n?(.*?)\n?```").unwrap();
    static ref HEADING: Regex = Regex::new(r"#{1,6}\s*").unwrap();
    static ref BOLD: Regex = Regex::new(r"\*\*([^*]+)\*\*").unwrap();
    static ref ITALIC: Regex = Regex::new(r"\*([^*]+)\*").unwrap();
    static ref BOLD_UNDERSCORE: Regex = Regex::new(r"__([^_]+)__").unwrap();
    static ref ITALIC_UNDERSCORE: Regex = Regex::new(r"_([^_]+)_").unwrap();
    static ref INLINE_CODE: Regex = Regex::new(r"`([^`]+)`").unwrap();

    // Math spans.
    static ref DISPLAY_MATH: Regex = Regex::new(r"\$\$([^$]+)\$\$").unwrap();
    static ref INLINE_MATH: Regex = Regex::new(r"\$([^$]+)\$").unwrap();

    // Lists and links.
    static ref BULLET_MARKER: Regex = Regex::new(r"(?m)^[-*+]\s+").unwrap();
    static ref MARKDOWN_LINK: Regex = Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap();
    static ref EXCESS_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();

    // LaTeX idioms recognized inside math spans.
    static ref LATEX_FRAC: Regex = Regex::new(r"\\frac\{([^}]+)\}\{([^}]+)\}").unwrap();
    static ref LATEX_SUP: Regex = Regex::new(r"\^(\{[^}]+\}|\d+)").unwrap();
    static ref LATEX_SUB: Regex = Regex::new(r"_(\{[^}]+\}|\d+)").unwrap();
    static ref LATEX_SQRT: Regex = Regex::new(r"\\sqrt\{([^}]+)\}").unwrap();
    static ref LATEX_NTH_ROOT: Regex = Regex::new(r"\\sqrt\[(\d+)\]\{([^}]+)\}").unwrap();
    static ref LATEX_LEFTOVERS: Regex = Regex::new(r"[{}\\]").unwrap();
}

/// Normalizes a generated plan body for display and export.
///
/// Pure, and idempotent: running the pass a second time changes nothing.
/// Empty input yields empty output.
pub fn normalize_plan_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    // 1. Boilerplate header lines, wherever they appear.
    let text = TEMPLATE_HEADER.replace_all(text, "");

    // 2. Markdown markers: keep the inner text, drop the syntax.
    let text = CODE_FENCE.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = BOLD_UNDERSCORE.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");

    // 3. Math spans to their closest plain-Unicode rendering.
    let text = DISPLAY_MATH.replace_all(&text, |caps: &Captures| convert_latex_to_text(&caps[1]));
    let text = INLINE_MATH.replace_all(&text, |caps: &Captures| convert_latex_to_text(&caps[1]));

    // 4. Literal escape sequences.
    let text = text.replace("\\n", "\n").replace("\\\"", "\"").replace("\\/", "/");

    // 5. Uniform bullet character; numbered markers stay as they are.
    let text = BULLET_MARKER.replace_all(&text, "• ");

    // 6. Links keep their visible text only.
    let text = MARKDOWN_LINK.replace_all(&text, "$1");

    // 7. Collapse runs of blank lines.
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");

    // 8. Trim.
    text.trim().to_string()
}

/// Converts a recognized subset of LaTeX to plain Unicode. Commands outside
/// the subset lose their braces and backslashes instead of surviving
/// verbatim.
fn convert_latex_to_text(latex: &str) -> String {
    let text = LATEX_FRAC.replace_all(latex, "($1/$2)");

    let text = LATEX_SUP.replace_all(&text, |caps: &Captures| {
        let exp: String = caps[1].chars().filter(|c| *c != '{' && *c != '}').collect();
        exp.chars()
            .map(|c| superscript(c).map(String::from).unwrap_or_else(|| format!("^{c}")))
            .collect::<String>()
    });
    let text = LATEX_SUB.replace_all(&text, |caps: &Captures| {
        let sub: String = caps[1].chars().filter(|c| *c != '{' && *c != '}').collect();
        sub.chars()
            .map(|c| subscript(c).map(String::from).unwrap_or_else(|| format!("_{c}")))
            .collect::<String>()
    });

    let text = LATEX_NTH_ROOT.replace_all(&text, "∛($2)");
    let text = LATEX_SQRT.replace_all(&text, "√($1)");

    let mut text = text.to_string();
    for (command, plain) in [
        // Greek letters
        (r"\alpha", "α"),
        (r"\beta", "β"),
        (r"\gamma", "γ"),
        (r"\delta", "δ"),
        (r"\epsilon", "ε"),
        (r"\theta", "θ"),
        (r"\lambda", "λ"),
        (r"\mu", "μ"),
        (r"\pi", "π"),
        (r"\sigma", "σ"),
        (r"\omega", "ω"),
        (r"\phi", "φ"),
        (r"\Delta", "Δ"),
        (r"\Sigma", "Σ"),
        (r"\Omega", "Ω"),
        // Operators
        (r"\times", "×"),
        (r"\div", "÷"),
        (r"\pm", "±"),
        (r"\leq", "≤"),
        (r"\geq", "≥"),
        (r"\neq", "≠"),
        (r"\approx", "≈"),
        (r"\infty", "∞"),
        // Function names
        (r"\sin", "sin"),
        (r"\cos", "cos"),
        (r"\tan", "tan"),
        (r"\log", "log"),
        (r"\ln", "ln"),
        (r"\exp", "exp"),
    ] {
        text = text.replace(command, plain);
    }

    LATEX_LEFTOVERS.replace_all(&text, "").trim().to_string()
}

fn superscript(c: char) -> Option<&'static str> {
    match c {
        '0' => Some("⁰"),
        '1' => Some("¹"),
        '2' => Some("²"),
        '3' => Some("³"),
        '4' => Some("⁴"),
        '5' => Some("⁵"),
        '6' => Some("⁶"),
        '7' => Some("⁷"),
        '8' => Some("⁸"),
        '9' => Some("⁹"),
        'n' => Some("ⁿ"),
        'x' => Some("ˣ"),
        _ => None,
    }
}

fn subscript(c: char) -> Option<&'static str> {
    match c {
        '0' => Some("₀"),
        '1' => Some("₁"),
        '2' => Some("₂"),
        '3' => Some("₃"),
        '4' => Some("₄"),
        '5' => Some("₅"),
        '6' => Some("₆"),
        '7' => Some("₇"),
        '8' => Some("₈"),
        '9' => Some("₉"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(normalize_plan_text(""), "");
    }

    #[test]
    fn template_header_is_removed_wherever_it_appears() {
        let input = "## Plan d'apprentissage pour [Nom de l'élève]\n\nSemaine 1: Algèbre";
        let out = normalize_plan_text(input);
        assert!(!out.contains("[Nom de l'élève]"));
        assert!(out.starts_with("Semaine 1: Algèbre"));

        let mid = "Intro\nPlan d'apprentissage de [Nom de l'élève] :\nSuite";
        assert_eq!(normalize_plan_text(mid), "Intro\nSuite");
    }

    #[test]
    fn markdown_markers_are_stripped_but_text_survives() {
        let input = "## Objectifs\n**important** et *nuancé* et `formule` et __appuyé__";
        assert_eq!(
            normalize_plan_text(input),
            "Objectifs\nimportant et nuancé et formule et appuyé"
        );
    }

    #[test]
    fn code_fences_keep_their_content() {
        let input = "Avant\n```python\nx = 1\n```\nAprès";
        assert_eq!(normalize_plan_text(input), "Avant\nx = 1\nAprès");
    }

    #[test]
    fn math_idioms_become_unicode() {
        assert_eq!(normalize_plan_text(r"$\frac{1}{2}$"), "(1/2)");
        assert_eq!(normalize_plan_text(r"$x^2$"), "x²");
        assert_eq!(normalize_plan_text(r"$a_1$"), "a₁");
        assert_eq!(normalize_plan_text(r"$\sqrt{9}$"), "√(9)");
        assert_eq!(normalize_plan_text(r"$\pi \times r^2$"), "π × r²");
        assert_eq!(normalize_plan_text(r"$a \neq b$"), "a ≠ b");
    }

    #[test]
    fn unknown_latex_loses_braces_and_backslashes() {
        assert_eq!(normalize_plan_text(r"$\overline{AB}$"), "overlineAB");
    }

    #[test]
    fn escape_sequences_are_unescaped() {
        assert_eq!(
            normalize_plan_text("ligne 1\\nligne 2 \\\"citée\\\" et a\\/b"),
            "ligne 1\nligne 2 \"citée\" et a/b"
        );
    }

    #[test]
    fn list_markers_become_uniform_bullets() {
        let input = "- un\n* deux\n+ trois\n1. quatre";
        assert_eq!(normalize_plan_text(input), "• un\n• deux\n• trois\n1. quatre");
    }

    #[test]
    fn links_keep_only_their_visible_text() {
        assert_eq!(
            normalize_plan_text("Voir [le cours](https://example.com/cours)"),
            "Voir le cours"
        );
    }

    #[test]
    fn newline_runs_collapse_to_two() {
        assert_eq!(normalize_plan_text("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "## Plan d'apprentissage pour [Nom de l'élève]\n\nSemaine 1: Algèbre\n- Réviser les équations",
            "**gras** et $x^2$ et [lien](http://a.fr)\n\n\n\nfin",
            "- a\n- b\n\n```\ncode\n```\n1. c",
            "texte déjà propre\n\n• puce",
            r"$\frac{a}{b} \leq \sqrt{2}$ \n suite",
        ];
        for input in inputs {
            let once = normalize_plan_text(input);
            let twice = normalize_plan_text(&once);
            assert_eq!(once, twice, "normalize must be idempotent for {input:?}");
        }
    }
}
