//! Commit filters.
//!
//! Terms are `!<term>`, `id:<n>`, or a string term matched against the
//! commit hash (`abc1*` selects an abbreviated hash).

use tracing::debug;

use super::matcher::StringMatcher;
use super::parser::{parse_composed, parse_id, FilterError};
use super::tree::{Classify, FilterTree, Leaf};
use super::usage::{Policy, UsageType};
use crate::model::{Commit, CommitId};

/// Boolean test over a single commit.
#[derive(Debug, Clone)]
pub enum CommitPredicate {
    Any,
    Not(Box<CommitPredicate>),
    Id(CommitId),
    Hash(StringMatcher),
    Ignored,
}

impl CommitPredicate {
    pub fn parse(term: &str) -> Result<Self, FilterError> {
        let term = term.trim();

        if let Some(rest) = term.strip_prefix('!') {
            Ok(CommitPredicate::Not(Box::new(CommitPredicate::parse(rest)?)))
        } else if term.is_empty() {
            Ok(CommitPredicate::Any)
        } else if let Some(id) = term.strip_prefix("id:") {
            Ok(CommitPredicate::Id(parse_id(term, id)?))
        } else {
            Ok(CommitPredicate::Hash(StringMatcher::parse(term)?))
        }
    }

    pub fn matches(&self, commit: &Commit) -> bool {
        match self {
            CommitPredicate::Any => true,
            CommitPredicate::Not(inner) => !inner.matches(commit),
            CommitPredicate::Id(id) => commit.id == *id,
            CommitPredicate::Hash(m) => m.is_match(&commit.hash),
            CommitPredicate::Ignored => commit.ignore,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommitLeaf {
    pub predicate: CommitPredicate,
    pub policy: Policy,
}

impl Leaf for CommitLeaf {
    fn policy(&self) -> Policy {
        self.policy
    }
}

impl Classify<Commit> for CommitLeaf {
    fn classify(&self, commit: &Commit) -> UsageType {
        if self.predicate.matches(commit) {
            self.policy.into()
        } else {
            UsageType::DontCare
        }
    }
}

/// Immutable filter over commits.
#[derive(Debug, Clone)]
pub struct CommitFilter {
    tree: FilterTree<CommitLeaf>,
}

impl CommitFilter {
    pub fn parse(rule: &str, policy: Policy) -> Result<Self, FilterError> {
        let tree = parse_composed(rule, &mut |term: &str| {
            Ok(FilterTree::Leaf(CommitLeaf {
                predicate: CommitPredicate::parse(term)?,
                policy,
            }))
        })?;
        debug!(rule, %policy, leaves = tree.leaf_count(), "parsed commit rule");
        Ok(CommitFilter { tree })
    }

    pub fn from_predicate(predicate: CommitPredicate, policy: Policy) -> Self {
        CommitFilter {
            tree: FilterTree::Leaf(CommitLeaf { predicate, policy }),
        }
    }

    pub fn group(filters: impl IntoIterator<Item = CommitFilter>) -> Self {
        CommitFilter {
            tree: FilterTree::Or(filters.into_iter().map(|f| f.tree).collect()),
        }
    }

    pub fn tree(&self) -> &FilterTree<CommitLeaf> {
        &self.tree
    }

    pub fn classify(&self, commit: &Commit) -> UsageType {
        self.tree.classify(commit)
    }

    pub fn decide(&self, usage: UsageType) -> bool {
        self.tree.decide(usage)
    }

    pub fn keep(&self, commit: &Commit) -> bool {
        self.tree.keep(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(id: u32, hash: &str) -> Commit {
        Commit::new(CommitId::new(id), hash)
    }

    #[test]
    fn hash_prefix_glob() {
        let f = CommitFilter::parse("abc1*", Policy::Include).unwrap();
        assert!(f.keep(&commit(1, "ABC123def")));
        assert!(!f.keep(&commit(2, "0abc123")));
    }

    #[test]
    fn exact_hash_is_case_insensitive() {
        let f = CommitFilter::parse("DEADBEEF", Policy::Include).unwrap();
        assert!(f.keep(&commit(1, "deadbeef")));
    }

    #[test]
    fn id_term_and_exclusion() {
        let f = CommitFilter::parse("id:2 | id:3", Policy::Exclude).unwrap();
        assert!(f.keep(&commit(1, "a")));
        assert!(!f.keep(&commit(2, "b")));
        assert!(!f.keep(&commit(3, "c")));
    }

    #[test]
    fn edge_syntax_is_not_special() {
        let f = CommitFilter::parse("a -> b", Policy::Include).unwrap();
        assert!(f.keep(&commit(1, "A -> B")));
    }

    #[test]
    fn invalid_id_is_an_error() {
        assert!(matches!(
            CommitFilter::parse("id:abc", Policy::Include),
            Err(FilterError::InvalidId { .. })
        ));
    }
}
