use std::fmt;

/// An instrument name pattern.
///
/// `*` matches any run of characters, including an empty one, and `?` matches exactly one character. Every other
/// character matches itself, ignoring ASCII case, as instrument names are case-insensitive.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NamePattern(String);

impl NamePattern {
    /// Creates a new `NamePattern`.
    pub fn new<S: Into<String>>(pattern: S) -> Self {
        Self(pattern.into())
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the pattern contains any wildcards.
    pub fn has_wildcards(&self) -> bool {
        self.0.contains(['*', '?'])
    }

    /// Returns `true` if `name` matches the pattern.
    pub fn matches(&self, name: &str) -> bool {
        let pattern = self.0.chars().collect::<Vec<_>>();
        let name = name.chars().collect::<Vec<_>>();

        let (mut p, mut n) = (0, 0);

        // Position of the last `*` seen, and the name position it is currently assumed to match up to.
        let mut backtrack = None;

        while n < name.len() {
            match pattern.get(p) {
                Some('*') => {
                    backtrack = Some((p, n));
                    p += 1;
                }
                Some(c) if *c == '?' || c.eq_ignore_ascii_case(&name[n]) => {
                    p += 1;
                    n += 1;
                }
                _ => match backtrack {
                    Some((star, matched)) => {
                        backtrack = Some((star, matched + 1));
                        p = star + 1;
                        n = matched + 1;
                    }
                    None => return false,
                },
            }
        }

        pattern[p..].iter().all(|c| *c == '*')
    }
}

impl From<&str> for NamePattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

impl From<String> for NamePattern {
    fn from(pattern: String) -> Self {
        Self(pattern)
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn suffix_wildcard() {
        let pattern = NamePattern::new("*duration");
        assert!(pattern.matches("http.server.duration"));
        assert!(pattern.matches("http_client_request_duration"));
        assert!(pattern.matches("DB.DURATION"));
        assert!(pattern.matches("duration"));
        assert!(pattern.matches("durationduration"));
        assert!(!pattern.matches("duration.total"));
        assert!(!pattern.matches("request_size"));
        assert!(!pattern.matches(""));
    }

    #[test]
    fn literal_and_single_character() {
        assert!(NamePattern::new("queue.depth").matches("Queue.Depth"));
        assert!(!NamePattern::new("queue.depth").matches("queue.depths"));
        assert!(NamePattern::new("queue.?").matches("queue.a"));
        assert!(!NamePattern::new("queue.?").matches("queue."));
        assert!(!NamePattern::new("queue.?").matches("queue.ab"));
    }

    #[test]
    fn inner_wildcards() {
        let pattern = NamePattern::new("http.*.duration");
        assert!(pattern.matches("http.server.duration"));
        assert!(pattern.matches("http..duration"));
        assert!(!pattern.matches("rpc.server.duration"));

        assert!(NamePattern::new("*").matches(""));
        assert!(NamePattern::new("**").matches("anything"));
        assert!(NamePattern::new("a*b*c").matches("aXXbYYbc"));
        assert!(!NamePattern::new("a*b*c").matches("aXXbYYbd"));
    }

    #[test]
    fn wildcard_detection() {
        assert!(NamePattern::new("*duration").has_wildcards());
        assert!(NamePattern::new("queue.?").has_wildcards());
        assert!(!NamePattern::new("queue.depth").has_wildcards());
    }

    proptest! {
        #[test]
        fn property_test_star_suffix_matches_any_prefix(prefix in "[a-z_.]{0,16}") {
            // `*duration` must accept any name that ends with `duration`, whatever comes before it.
            let name = format!("{}duration", prefix);
            prop_assert!(NamePattern::new("*duration").matches(&name));
        }
    }
}
