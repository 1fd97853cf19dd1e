//! File filters.
//!
//! ## Terms
//!
//! - `!<term>`: negation
//! - `id:<n>`: file id
//! - `re:<regex>`: case-insensitive regex against the path
//! - anything else: glob (`*` stays inside one path segment, `**` crosses
//!   them). A glob without `/` is also tried against the file name, so
//!   `*.rs` matches `src/lib.rs`.

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use tracing::debug;

use super::parser::{parse_composed, parse_id, FilterError};
use super::tree::{Classify, FilterTree, Leaf};
use super::usage::{Policy, UsageType};
use crate::model::{File, FileId};

/// Boolean test over a single file.
#[derive(Debug, Clone)]
pub enum FilePredicate {
    Any,
    Not(Box<FilePredicate>),
    Id(FileId),
    Regex(Regex),
    Glob {
        matcher: GlobMatcher,
        /// Also try the file name.
        basename: bool,
    },
    Ignored,
}

impl FilePredicate {
    pub fn parse(term: &str) -> Result<Self, FilterError> {
        let term = term.trim();

        if let Some(rest) = term.strip_prefix('!') {
            return Ok(FilePredicate::Not(Box::new(FilePredicate::parse(rest)?)));
        }
        if term.is_empty() {
            return Ok(FilePredicate::Any);
        }
        if let Some(id) = term.strip_prefix("id:") {
            return Ok(FilePredicate::Id(parse_id(term, id)?));
        }
        if let Some(pattern) = term.strip_prefix("re:") {
            let regex = Regex::new(&format!("(?i){}", pattern)).map_err(|e| {
                FilterError::InvalidRegex {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                }
            })?;
            return Ok(FilePredicate::Regex(regex));
        }

        let glob = GlobBuilder::new(term)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|e| FilterError::InvalidGlob {
                pattern: term.to_string(),
                message: e.to_string(),
            })?;
        Ok(FilePredicate::Glob {
            matcher: glob.compile_matcher(),
            basename: !term.contains('/'),
        })
    }

    pub fn matches(&self, file: &File) -> bool {
        match self {
            FilePredicate::Any => true,
            FilePredicate::Not(inner) => !inner.matches(file),
            FilePredicate::Id(id) => file.id == *id,
            FilePredicate::Regex(regex) => regex.is_match(&file.path),
            FilePredicate::Glob { matcher, basename } => {
                matcher.is_match(&file.path) || (*basename && matcher.is_match(file.file_name()))
            }
            FilePredicate::Ignored => file.ignore,
        }
    }
}

/// Leaf of a file filter tree.
#[derive(Debug, Clone)]
pub struct FileLeaf {
    pub predicate: FilePredicate,
    pub policy: Policy,
}

impl Leaf for FileLeaf {
    fn policy(&self) -> Policy {
        self.policy
    }
}

impl Classify<File> for FileLeaf {
    fn classify(&self, file: &File) -> UsageType {
        if self.predicate.matches(file) {
            self.policy.into()
        } else {
            UsageType::DontCare
        }
    }
}

/// Immutable filter over files.
#[derive(Debug, Clone)]
pub struct FileFilter {
    tree: FilterTree<FileLeaf>,
}

impl FileFilter {
    pub fn parse(rule: &str, policy: Policy) -> Result<Self, FilterError> {
        let tree = parse_composed(rule, &mut |term: &str| {
            Ok(FilterTree::Leaf(FileLeaf {
                predicate: FilePredicate::parse(term)?,
                policy,
            }))
        })?;
        debug!(rule, %policy, leaves = tree.leaf_count(), "parsed file rule");
        Ok(FileFilter { tree })
    }

    pub fn from_predicate(predicate: FilePredicate, policy: Policy) -> Self {
        FileFilter {
            tree: FilterTree::Leaf(FileLeaf { predicate, policy }),
        }
    }

    /// OR-group of filters.
    pub fn group(filters: impl IntoIterator<Item = FileFilter>) -> Self {
        FileFilter {
            tree: FilterTree::Or(filters.into_iter().map(|f| f.tree).collect()),
        }
    }

    pub fn tree(&self) -> &FilterTree<FileLeaf> {
        &self.tree
    }

    pub fn classify(&self, file: &File) -> UsageType {
        self.tree.classify(file)
    }

    pub fn decide(&self, usage: UsageType) -> bool {
        self.tree.decide(usage)
    }

    pub fn keep(&self, file: &File) -> bool {
        self.tree.keep(file)
    }
}

// ============================================================================
// Tests
// ============================================================================
