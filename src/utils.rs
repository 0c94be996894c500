// src/utils.rs

/// Make a job title or id safe to use inside a file name.
pub fn sanitize_file_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    let collapsed = clean_text(&cleaned);
    if collapsed.is_empty() {
        "untitled".to_string()
    } else {
        collapsed
    }
}

/// Collapse all whitespace runs (including newlines) to single spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive substring test used by URL classification.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_component() {
        assert_eq!(sanitize_file_component("Dev/Ops: Lead"), "Dev_Ops_ Lead");
        assert_eq!(sanitize_file_component("  a\n b  "), "a b");
        assert_eq!(sanitize_file_component("   "), "untitled");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  What is\n  your   notice period? "), "What is your notice period?");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("https://x/Apply/Review", "review"));
        assert!(!contains_ignore_case("https://x/apply/resume", "review"));
    }
}
