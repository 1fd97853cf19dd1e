//! Rule splitting shared by every entity kind, and the parse error type.
//!
//! ## Grammar
//!
//! A rule is trimmed, then:
//! 1. empty: match everything
//! 2. contains `|`: split on every `|`, parse each piece, OR them
//! 3. contains `&`: split on every `&`, parse each piece, AND them
//! 4. otherwise a single term, handed to the kind-specific term parser
//!
//! There are no parentheses and no precedence beyond "`|` is checked first",
//! so `a & b | c` reads as `(a & b) | c`. An empty piece (`a |`, `a && b`) is
//! an error.

use std::str::FromStr;

use thiserror::Error;

use super::tree::FilterTree;

/// Errors raised while turning a rule into a filter.
///
/// Each variant names the offending fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A `re:` term that does not compile.
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    /// A glob that does not compile.
    #[error("invalid glob '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    /// A rule containing `->` that is not `<src> [-<depth>[R]]-> <dest>`.
    #[error("invalid edge filter: {rule}")]
    MalformedEdge { rule: String },

    /// Depth digits that do not fit a depth counter.
    #[error("invalid depth '{digits}' in edge filter: {rule}")]
    InvalidDepth { rule: String, digits: String },

    /// An `id:` term whose value is not a numeric id.
    #[error("invalid id in term: {term}")]
    InvalidId { term: String },

    /// An AND/OR list with an empty piece.
    #[error("empty clause in rule: {rule}")]
    EmptyClause { rule: String },
}

impl FilterError {
    /// The offending fragment of the rule.
    pub fn fragment(&self) -> &str {
        match self {
            FilterError::InvalidRegex { pattern, .. } | FilterError::InvalidGlob { pattern, .. } => {
                pattern
            }
            FilterError::InvalidDepth { digits, .. } => digits,
            FilterError::InvalidId { term } => term,
            FilterError::MalformedEdge { rule } | FilterError::EmptyClause { rule } => rule,
        }
    }
}

/// Options that affect how rules are parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Depth bound for edge rules that give no digits. `None` is unbounded.
    pub default_max_depth: Option<usize>,
}

impl ParseOptions {
    pub fn new() -> Self {
        ParseOptions::default()
    }

    pub fn with_default_max_depth(mut self, depth: Option<usize>) -> Self {
        self.default_max_depth = depth;
        self
    }
}

/// Split `rule` on `|` then `&`, handing single terms to `term`.
///
/// `term` receives a trimmed, non-empty string without `|` or `&`, except for
/// the whole-rule-empty case where it receives `""`.
pub(crate) fn parse_composed<L, F>(rule: &str, term: &mut F) -> Result<FilterTree<L>, FilterError>
where
    F: FnMut(&str) -> Result<FilterTree<L>, FilterError>,
{
    let rule = rule.trim();

    if rule.is_empty() {
        term("")
    } else if rule.contains('|') {
        split_clauses(rule, '|', term).map(FilterTree::Or)
    } else if rule.contains('&') {
        split_clauses(rule, '&', term).map(FilterTree::And)
    } else {
        term(rule)
    }
}

fn split_clauses<L, F>(
    rule: &str,
    separator: char,
    term: &mut F,
) -> Result<Vec<FilterTree<L>>, FilterError>
where
    F: FnMut(&str) -> Result<FilterTree<L>, FilterError>,
{
    rule.split(separator)
        .map(|piece| {
            let piece = piece.trim();
            if piece.is_empty() {
                Err(FilterError::EmptyClause {
                    rule: rule.to_string(),
                })
            } else {
                parse_composed(piece, term)
            }
        })
        .collect()
}

/// Parse the value of an `id:` term.
pub(crate) fn parse_id<T: FromStr>(term: &str, value: &str) -> Result<T, FilterError> {
    value.trim().parse().map_err(|_| FilterError::InvalidId {
        term: term.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
