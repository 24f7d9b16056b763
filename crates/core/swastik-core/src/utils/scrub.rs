//! Redaction of secrets and personal data in log text

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest message forwarded to log viewers
pub const MAX_LOG_MESSAGE: usize = 2000;

static PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"sk-[A-Za-z0-9-]{20,}", "sk-REDACTED"),
        (r"(?i)bearer\s+[A-Za-z0-9._~+/=-]{12,}", "Bearer REDACTED"),
        (
            r"(?i)api[_-]?key\s*[:=]?\s*[A-Za-z0-9_-]{12,}",
            "api_key=REDACTED",
        ),
        (
            r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
            "email@redacted",
        ),
        (r"\b\+?\d[\d\s-]{8,}\b", "PHONE_REDACTED"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
        Ok(re) => Some((re, replacement)),
        Err(e) => {
            tracing::error!("invalid scrub pattern {}: {}", pattern, e);
            None
        }
    })
    .collect()
});

/// Truncate `s` and mask keys, bearer tokens, emails and phone numbers
pub fn scrub_message(mut s: String) -> String {
    if s.chars().count() > MAX_LOG_MESSAGE {
        s = s.chars().take(MAX_LOG_MESSAGE).collect();
    }
    for (re, rep) in PATTERNS.iter() {
        s = re.replace_all(&s, *rep).into_owned();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_credentials() {
        let out = scrub_message(
            "calling openrouter with sk-or-v1-abcdefghijklmnopqrstuvwx and \
             Bearer eyJhbGciOiJIUzI1NiJ9.payload"
                .to_string(),
        );
        assert!(out.contains("sk-REDACTED"));
        assert!(out.contains("Bearer REDACTED"));
        assert!(!out.contains("abcdefghijklmnop"));
        assert!(!out.contains("eyJhbGci"));
    }

    #[test]
    fn test_masks_contact_details() {
        let out = scrub_message("customer jane.doe@example.com called 555-123-4567".to_string());
        assert_eq!(out, "customer email@redacted called PHONE_REDACTED");
    }

    #[test]
    fn test_truncates() {
        let out = scrub_message("a".repeat(MAX_LOG_MESSAGE + 50));
        assert_eq!(out.len(), MAX_LOG_MESSAGE);
    }

    #[test]
    fn test_plain_text_untouched() {
        let msg = "backend mode changed".to_string();
        assert_eq!(scrub_message(msg.clone()), msg);
    }
}
