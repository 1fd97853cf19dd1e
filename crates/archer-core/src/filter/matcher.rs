//! String matching primitives shared by every rule vocabulary.
//!
//! A term is matched in one of three ways:
//! - `re:<regex>`: case-insensitive regular expression (unanchored)
//! - contains `*`: glob, `*` matches any run of characters, anchored
//! - otherwise: case-insensitive equality

use regex::Regex;

use super::parser::FilterError;

/// Compiled string predicate.
#[derive(Debug, Clone)]
pub enum StringMatcher {
    /// Matches every string (empty term).
    Any,
    /// Case-insensitive equality.
    Exact(String),
    /// Regular expression, already case-insensitive.
    Pattern(Regex),
}

impl StringMatcher {
    /// Compile a term. The term is trimmed first.
    pub fn parse(term: &str) -> Result<Self, FilterError> {
        let term = term.trim();

        if term.is_empty() {
            Ok(StringMatcher::Any)
        } else if let Some(pattern) = term.strip_prefix("re:") {
            let regex = Regex::new(&format!("(?i){}", pattern)).map_err(|e| {
                FilterError::InvalidRegex {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                }
            })?;
            Ok(StringMatcher::Pattern(regex))
        } else if term.contains('*') {
            let regex = Regex::new(&glob_to_regex(term)).map_err(|e| FilterError::InvalidGlob {
                pattern: term.to_string(),
                message: e.to_string(),
            })?;
            Ok(StringMatcher::Pattern(regex))
        } else {
            Ok(StringMatcher::Exact(term.to_string()))
        }
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        match self {
            StringMatcher::Any => true,
            StringMatcher::Exact(expected) => eq_ignore_case(candidate, expected),
            StringMatcher::Pattern(regex) => regex.is_match(candidate),
        }
    }

    /// True if any candidate matches.
    pub fn is_match_any<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> bool {
        candidates.into_iter().any(|c| self.is_match(c))
    }
}

/// Translate a `*` glob into an anchored, case-insensitive regex.
///
/// Every other character is escaped before `*` becomes `.*`, so escapes are
/// never applied twice.
pub fn glob_to_regex(glob: &str) -> String {
    let mut body = String::with_capacity(glob.len() * 2);
    let mut buf = [0u8; 4];
    for c in glob.chars() {
        if c == '*' {
            body.push_str(".*");
        } else {
            body.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        }
    }
    format!("(?i)^{}$", body)
}

/// Unicode-aware case-insensitive equality without allocating.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

// ============================================================================
// Tests
// ============================================================================
