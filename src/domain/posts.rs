//! Post field rules applied before anything reaches storage.

use super::error::DomainError;

pub const TITLE_MIN_CHARS: usize = 2;
pub const TITLE_MAX_CHARS: usize = 50;

/// Trim a title and check its length lies within `[TITLE_MIN_CHARS, TITLE_MAX_CHARS]`.
pub fn normalize_title(raw: &str) -> Result<String, DomainError> {
    let title = raw.trim();
    let length = title.chars().count();
    if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&length) {
        return Err(DomainError::validation(
            "title",
            format!(
                "title must be between {TITLE_MIN_CHARS} and {TITLE_MAX_CHARS} characters, got {length}"
            ),
        ));
    }
    Ok(title.to_string())
}

/// Strip disallowed markup from rich-text HTML produced by the editor.
pub fn sanitize_rich_text(html: &str) -> String {
    ammonia::clean(html)
}

/// Sanitize comment content; blank content (after sanitizing) is rejected.
pub fn normalize_comment(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("content", "comment must not be blank"));
    }
    let cleaned = sanitize_rich_text(trimmed);
    if cleaned.trim().is_empty() {
        return Err(DomainError::validation("content", "comment must not be blank"));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_within_bounds_are_accepted() {
        for length in TITLE_MIN_CHARS..=TITLE_MAX_CHARS {
            let title = "a".repeat(length);
            assert_eq!(normalize_title(&title).unwrap(), title);
        }
    }

    #[test]
    fn titles_outside_bounds_are_rejected() {
        assert!(normalize_title("a").is_err());
        assert!(normalize_title(&"a".repeat(TITLE_MAX_CHARS + 1)).is_err());
        assert!(normalize_title("   a   ").is_err());
    }

    #[test]
    fn title_length_is_measured_after_trimming() {
        let padded = format!("  {}  ", "b".repeat(TITLE_MAX_CHARS));
        assert_eq!(normalize_title(&padded).unwrap().len(), TITLE_MAX_CHARS);
    }

    #[test]
    fn sanitizer_drops_script_tags() {
        let cleaned = sanitize_rich_text("<p>hi</p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>hi</p>");
    }

    #[test]
    fn blank_comments_are_rejected() {
        assert!(normalize_comment("   ").is_err());
        assert!(normalize_comment("<script>x</script>").is_err());
        assert_eq!(normalize_comment(" nice ").unwrap(), "nice");
    }
}
