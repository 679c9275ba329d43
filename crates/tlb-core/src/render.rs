//! Rendering of board state into Telegram-ready HTML.

use serde_json::Value;

use crate::board::{Entry, DISPLAY_LIMIT};

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Printable form of a stored score. Scores are raw JSON values, so strings
/// render bare and a null score renders as `-`.
pub fn value_display(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render one category as a 1-indexed ranked list, capped at
/// [`DISPLAY_LIMIT`] entries.
pub fn leaderboard_html(kind: &str, entries: &[Entry]) -> String {
    let mut out = format!("<b>{} Leaderboard</b>", escape_html(kind));

    if entries.is_empty() {
        out.push_str("\n\nNo entries yet");
        return out;
    }

    out.push('\n');
    for (i, entry) in entries.iter().take(DISPLAY_LIMIT).enumerate() {
        out.push('\n');
        out.push_str(&format!(
            "{}. {} — {}",
            i + 1,
            escape_html(&entry.name),
            escape_html(&value_display(&entry.value))
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn empty_category_renders_placeholder() {
        let html = leaderboard_html("Money", &[]);
        assert_eq!(html, "<b>Money Leaderboard</b>\n\nNo entries yet");
    }

    #[test]
    fn entries_render_as_ranked_lines() {
        let entries = vec![
            Entry::new("alice", json!(100)),
            Entry::new("bob", json!(50.5)),
            Entry::new("carol", json!(null)),
        ];
        let html = leaderboard_html("Money", &entries);
        assert!(html.contains("1. alice — 100"));
        assert!(html.contains("2. bob — 50.5"));
        assert!(html.contains("3. carol — -"));
    }

    #[test]
    fn names_and_values_are_escaped() {
        let entries = vec![Entry::new("<script>", json!("a & b"))];
        let html = leaderboard_html("M<M", &entries);
        assert!(html.contains("<b>M&lt;M Leaderboard</b>"));
        assert!(html.contains("1. &lt;script&gt; — a &amp; b"));
    }

    #[test]
    fn rendering_truncates_past_the_display_limit() {
        let entries: Vec<Entry> = (0..51)
            .map(|i| Entry::new(format!("p{i}"), json!(100 - i)))
            .collect();
        let html = leaderboard_html("Money", &entries);
        assert!(html.contains("50. p49"));
        assert!(!html.contains("51. "));
    }
}
