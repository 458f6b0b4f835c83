const MAX_ERROR_MESSAGE_LEN: usize = 256;

pub(crate) fn truncate_message(body: &str) -> String {
    truncate_chars(body, MAX_ERROR_MESSAGE_LEN)
}

/// Collapses newlines and keeps at most `limit` characters.
pub(crate) fn truncate_chars(body: &str, limit: usize) -> String {
    let compact = body.trim().replace('\n', " ");
    compact.chars().take(limit).collect()
}

/// Owned copy of `value` unless it is blank. Surrounding whitespace is kept.
pub(crate) fn non_blank_owned(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub(crate) fn build_v1_url(api_base_url: &str, endpoint_path: &str) -> String {
    let base = api_base_url.trim_end_matches('/');
    let endpoint_path = endpoint_path.trim_start_matches('/');

    if base.ends_with("/v1") {
        format!("{base}/{endpoint_path}")
    } else {
        format!("{base}/v1/{endpoint_path}")
    }
}

#[cfg(test)]
mod tests {
    use super::{build_v1_url, non_blank_owned, truncate_chars, truncate_message};

    #[test]
    fn truncate_message_compacts_newlines_and_limits_length() {
        assert_eq!(truncate_message("line-1\nline-2"), "line-1 line-2");

        let long = "x".repeat(512);
        assert_eq!(truncate_message(&long).len(), 256);
        assert_eq!(truncate_chars(&long, 100).len(), 100);
    }

    #[test]
    fn non_blank_owned_keeps_whitespace_and_drops_blank_values() {
        assert_eq!(non_blank_owned("  text \n"), Some("  text \n".to_string()));
        assert_eq!(non_blank_owned(" \t "), None);
    }

    #[test]
    fn build_v1_url_appends_v1_when_base_has_no_version_segment() {
        assert_eq!(
            build_v1_url("https://api.openai.com", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            build_v1_url("https://api.anthropic.com/", "/messages"),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn build_v1_url_avoids_duplicate_v1_when_base_already_has_v1() {
        assert_eq!(
            build_v1_url("https://proxy.example.com/v1/", "chat/completions"),
            "https://proxy.example.com/v1/chat/completions"
        );
    }
}
