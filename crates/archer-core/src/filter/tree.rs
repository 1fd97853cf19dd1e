//! Filter composition: leaves combined with AND and OR.
//!
//! A [`FilterTree`] is built once from a parsed rule and then only read, so
//! it can be shared between threads as long as its leaves can.
//!
//! ## Semantics
//!
//! | Node  | classify                                         | decide(`DontCare`)          |
//! |-------|--------------------------------------------------|-----------------------------|
//! | Leaf  | leaf's own classification                        | by the leaf's policy        |
//! | And   | the common result if all children agree, else `DontCare` | every child must keep |
//! | Or    | [`UsageType::merge`] of every child              | every child must keep       |
//!
//! `Include` and `Exclude` are authoritative for every node kind.

use super::usage::{Policy, UsageType};

/// Something that can classify entities of kind `E`.
pub trait Classify<E: ?Sized> {
    fn classify(&self, entity: &E) -> UsageType;
}

/// A leaf filter carries the policy used to resolve `DontCare`.
pub trait Leaf {
    fn policy(&self) -> Policy;
}

/// Composition of leaf filters.
#[derive(Debug, Clone)]
pub enum FilterTree<L> {
    Leaf(L),
    /// All children must agree.
    And(Vec<FilterTree<L>>),
    /// Children are merged, `Exclude` dominant.
    Or(Vec<FilterTree<L>>),
}

impl<L> FilterTree<L> {
    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            FilterTree::Leaf(_) => 1,
            FilterTree::And(children) | FilterTree::Or(children) => {
                children.iter().map(FilterTree::leaf_count).sum()
            }
        }
    }

    /// Visit every leaf, depth first.
    pub fn leaves(&self) -> Vec<&L> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a L>) {
        match self {
            FilterTree::Leaf(leaf) => out.push(leaf),
            FilterTree::And(children) | FilterTree::Or(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

impl<L: Leaf> FilterTree<L> {
    /// Classify an entity.
    pub fn classify<E: ?Sized>(&self, entity: &E) -> UsageType
    where
        L: Classify<E>,
    {
        match self {
            FilterTree::Leaf(leaf) => leaf.classify(entity),
            FilterTree::And(children) => {
                let mut results = children.iter().map(|c| c.classify(entity));
                match results.next() {
                    None => UsageType::DontCare,
                    Some(first) => {
                        if results.all(|r| r == first) {
                            first
                        } else {
                            UsageType::DontCare
                        }
                    }
                }
            }
            FilterTree::Or(children) => {
                UsageType::merge_all(children.iter().map(|c| c.classify(entity)))
            }
        }
    }

    /// Turn a classification into keep (`true`) or drop (`false`).
    pub fn decide(&self, usage: UsageType) -> bool {
        match (self, usage) {
            (FilterTree::Leaf(leaf), _) => usage.decide_for(leaf.policy()),
            (_, UsageType::Include) => true,
            (_, UsageType::Exclude) => false,
            (FilterTree::And(children) | FilterTree::Or(children), UsageType::DontCare) => {
                children.iter().all(|c| c.decide(usage))
            }
        }
    }

    /// Classify then decide.
    pub fn keep<E: ?Sized>(&self, entity: &E) -> bool
    where
        L: Classify<E>,
    {
        self.decide(self.classify(entity))
    }
}

// ============================================================================
// Tests
// ============================================================================
