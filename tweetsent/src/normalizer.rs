use regex::Regex;

/// Identifies the cleaning rules below. Stored in the vectorizer artifact so a
/// predictor refuses to run against a vocabulary built from differently
/// cleaned text.
pub const NORMALIZER_VERSION: u32 = 2;

/// Normalizer cleans raw tweet text before it reaches the vectorizer.
/// The same instance type is used by training, prediction and the
/// word-frequency report, so every path sees identical text.
#[derive(Debug, Clone)]
pub struct Normalizer {
    noise: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Creates a new instance of [`Normalizer`].
    ///
    /// # Example
    /// ```
    /// use tweetsent::normalizer::Normalizer;
    ///
    /// let normalizer = Normalizer::new();
    /// assert_eq!(normalizer.normalize("I LOVE this!!! http://x.co @friend"), "i love this");
    /// ```
    pub fn new() -> Self {
        Normalizer {
            // URLs in any letter case, @-mentions, then any single character
            // that is neither a Latin letter nor whitespace. Alternation is
            // leftmost-first.
            noise: Regex::new(r"(?i:http)\S+|@\w+|[^A-Za-z\s]").unwrap(),
        }
    }

    /// Returns the version of the cleaning rules.
    pub fn version(&self) -> u32 {
        NORMALIZER_VERSION
    }

    /// Normalizes a piece of text.
    ///
    /// URLs, mentions and every character outside `[A-Za-z]` and whitespace
    /// are removed, the rest is lowercased, and whitespace runs collapse to a
    /// single space with no leading or trailing space.
    ///
    /// Removing characters can join fragments into a new URL token
    /// (`ht1tp://x` becomes `httpx`), so the cleaning repeats until the text
    /// stops changing. The result is therefore a fixed point: normalizing it
    /// again returns it unchanged.
    ///
    /// # Arguments
    /// * `text` - Arbitrary input text.
    ///
    /// # Returns
    /// A string made only of `[a-z]` words separated by single spaces.
    pub fn normalize(&self, text: &str) -> String {
        let mut normalized = self.clean(text);
        loop {
            // Each pass only removes characters, so this terminates.
            let next = self.clean(&normalized);
            if next == normalized {
                return normalized;
            }
            normalized = next;
        }
    }

    fn clean(&self, text: &str) -> String {
        let stripped = self.noise.replace_all(text, "");
        let mut normalized = String::with_capacity(stripped.len());
        for word in stripped.split_whitespace() {
            if !normalized.is_empty() {
                normalized.push(' ');
            }
            normalized.push_str(&word.to_ascii_lowercase());
        }
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "I LOVE this!!! http://x.co @friend",
        "@user_1 thanks for the follow :) https://t.co/abc?x=1",
        "  Multiple   spaces\tand\ttabs\n ",
        "Numbers 123 and symbols #tag $$$ 100%",
        "caf\u{e9} na\u{ef}ve \u{2014} r\u{e9}sum\u{e9}",
        "http",
        "@",
        "email me: someone@example.com",
        "is upset that he can't update his Facebook by texting it... and might cry as a result",
        "Check HTTPS://X.CO/abc now",
        "HtTp://Mixed.Case link",
        "ht1tp://foo bar",
        "h.t.t.p.s://split.example",
        "@http://x",
        "look: http@home",
        "",
    ];

    #[test]
    fn test_normalize_example() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("I LOVE this!!! http://x.co @friend"), "i love this");
    }

    #[test]
    fn test_normalize_strips_urls_and_mentions() {
        let normalizer = Normalizer::new();
        let result = normalizer.normalize("@user_1 thanks https://t.co/abc?x=1 for http://a.b");
        assert_eq!(result, "thanks for");
        assert!(!result.contains("http"));
        assert!(!result.contains('@'));
    }

    #[test]
    fn test_normalize_strips_uppercase_urls() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("Check HTTPS://X.CO/abc now"), "check now");
        assert_eq!(normalizer.normalize("HtTp://Mixed.Case link"), "link");
    }

    #[test]
    fn test_normalize_strips_urls_joined_by_removed_characters() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("ht1tp://foo bar"), "bar");
        assert_eq!(normalizer.normalize("h.t.t.p.s://split.example"), "");
        assert_eq!(normalizer.normalize("look: http@home"), "look");
    }

    #[test]
    fn test_normalize_keeps_bare_http_word() {
        let normalizer = Normalizer::new();
        // "http" with nothing attached is an ordinary word.
        assert_eq!(normalizer.normalize("http is a protocol"), "http is a protocol");
    }

    #[test]
    fn test_normalize_email_is_split_by_mention_rule() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("email me: someone@example.com"), "email me someonecom");
    }

    #[test]
    fn test_normalize_removes_non_latin_letters() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("caf\u{e9} na\u{ef}ve"), "caf nave");
        assert_eq!(normalizer.normalize("can't won't"), "cant wont");
    }

    #[test]
    fn test_normalize_empty() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("   !!! 123 "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = Normalizer::new();
        for sample in SAMPLES {
            let once = normalizer.normalize(sample);
            assert_eq!(normalizer.normalize(&once), once, "input: {:?}", sample);
        }
    }

    #[test]
    fn test_normalize_output_alphabet() {
        let normalizer = Normalizer::new();
        for sample in SAMPLES {
            let result = normalizer.normalize(sample);
            assert!(
                result.chars().all(|c| c.is_ascii_lowercase() || c == ' '),
                "unexpected character in {:?}",
                result
            );
            assert!(!result.contains("  "));
            assert_eq!(result.trim(), result);
            // No URL token survives; a lone "http" is an ordinary word.
            assert!(
                result.split(' ').all(|w| !w.starts_with("http") || w == "http"),
                "URL token left in {:?}",
                result
            );
        }
    }
}
