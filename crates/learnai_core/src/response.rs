//! crates/learnai_core/src/response.rs
//!
//! Normalizes whatever shape the automation webhooks answer with into plain
//! text. The webhook sometimes returns a bare string, sometimes a JSON object
//! whose payload field has drifted across deployments, and sometimes raw
//! non-JSON text; the ordered key list below keeps the precedence auditable.

use serde_json::{Map, Value};

/// Candidate payload fields, tested in priority order.
pub const RESPONSE_FIELD_PRIORITY: [&str; 9] = [
    "response", "answer", "message", "text", "reply", "result", "output", "plan", "content",
];

/// Fallback plan body when the webhook answered but with nothing usable.
pub const EMPTY_RESPONSE_FALLBACK: &str = "Aucun plan n'a pu être généré.";

/// Fallback plan body when the generation call itself failed.
pub const GENERATION_ERROR_FALLBACK: &str = "Plan par défaut: Nous n'avons pas pu générer un plan \
personnalisé en raison d'une erreur technique. Veuillez réessayer ultérieurement.";

/// Fallback assistant reply when the webhook answered with nothing usable.
pub const CHAT_EMPTY_FALLBACK: &str = "Désolé, je n'ai pas pu générer une réponse.";

/// Fallback assistant reply when the chat call itself failed.
pub const CHAT_ERROR_FALLBACK: &str = "Désolé, une erreur est survenue. Veuillez réessayer.";

/// The three shapes a webhook response body can resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookBody {
    /// The body parsed as a JSON string.
    StringBody(String),
    /// The body parsed as a JSON object.
    ObjectBody(Map<String, Value>),
    /// The body is not valid JSON (or is JSON of another type); the raw text
    /// stands for itself.
    RawText(String),
}

/// Classifies a raw response body into one of the three recognized shapes.
pub fn classify_body(raw: &str) -> WebhookBody {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(s)) => WebhookBody::StringBody(s),
        Ok(Value::Object(map)) => WebhookBody::ObjectBody(map),
        _ => WebhookBody::RawText(raw.to_string()),
    }
}

/// Resolves a raw response body to its plan/answer text.
///
/// Order: raw text if the body is not JSON; the string itself for a JSON
/// string; for a JSON object, the first non-empty string among
/// [`RESPONSE_FIELD_PRIORITY`], falling back to the raw text. Returns `None`
/// when the resolved text is empty so the caller can substitute its fallback.
pub fn extract_body(raw: &str) -> Option<String> {
    let text = match classify_body(raw) {
        WebhookBody::StringBody(s) => s,
        WebhookBody::ObjectBody(map) => RESPONSE_FIELD_PRIORITY
            .iter()
            .find_map(|key| match map.get(*key) {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_else(|| raw.to_string()),
        WebhookBody::RawText(s) => s,
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Strips wrapping quote, backtick and leading bracket characters from an
/// assistant reply. The webhook occasionally returns the answer wrapped in
/// its own quoting.
pub fn trim_wrapping_quotes(text: &str) -> String {
    let trimmed = text.trim();
    let start = trimmed.trim_start_matches(['[', '"', '\'', '`']);
    start.trim_end_matches(['"', '\'', '`']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_body_is_returned_unchanged() {
        let raw = "Semaine 1: revoir les bases";
        assert_eq!(extract_body(raw), Some(raw.to_string()));
    }

    #[test]
    fn json_string_body_is_the_answer() {
        assert_eq!(extract_body("\"bonjour\""), Some("bonjour".to_string()));
    }

    #[test]
    fn every_priority_field_is_recognized() {
        for key in RESPONSE_FIELD_PRIORITY {
            let raw = format!("{{\"{key}\": \"texte du plan\"}}");
            assert_eq!(
                extract_body(&raw),
                Some("texte du plan".to_string()),
                "field {key} should be extracted"
            );
        }
    }

    #[test]
    fn priority_order_is_respected() {
        let raw = r#"{"plan": "second", "response": "first"}"#;
        assert_eq!(extract_body(raw), Some("first".to_string()));
    }

    #[test]
    fn empty_priority_fields_are_skipped() {
        let raw = r#"{"response": "  ", "answer": "la réponse"}"#;
        assert_eq!(extract_body(raw), Some("la réponse".to_string()));
    }

    #[test]
    fn object_without_known_fields_falls_back_to_raw_text() {
        let raw = r#"{"status": "ok"}"#;
        assert_eq!(extract_body(raw), Some(raw.to_string()));
    }

    #[test]
    fn empty_body_resolves_to_none() {
        assert_eq!(extract_body(""), None);
        assert_eq!(extract_body("\"\""), None);
        assert_eq!(extract_body("   "), None);
    }

    #[test]
    fn classification_is_explicit() {
        assert_eq!(
            classify_body("\"abc\""),
            WebhookBody::StringBody("abc".to_string())
        );
        assert!(matches!(classify_body("{}"), WebhookBody::ObjectBody(_)));
        assert_eq!(
            classify_body("[1, 2]"),
            WebhookBody::RawText("[1, 2]".to_string())
        );
        assert_eq!(
            classify_body("pas du json"),
            WebhookBody::RawText("pas du json".to_string())
        );
    }

    #[test]
    fn wrapping_quotes_are_stripped() {
        assert_eq!(trim_wrapping_quotes("\"bonjour\""), "bonjour");
        assert_eq!(trim_wrapping_quotes("[`réponse`"), "réponse");
        assert_eq!(trim_wrapping_quotes("  texte simple  "), "texte simple");
    }
}
