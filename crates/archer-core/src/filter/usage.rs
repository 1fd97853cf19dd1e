//! Three-valued classification and its merge/decide algebra.

use std::fmt;

use serde::Serialize;

/// Result of classifying one entity with a filter.
///
/// `Exclude` dominates `Include` under [`UsageType::merge`]; `DontCare` is the
/// identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    #[default]
    DontCare,
    Include,
    Exclude,
}

impl UsageType {
    /// Combine two classifications.
    ///
    /// Equal values stay; otherwise `Exclude` wins, and `Include` beats
    /// `DontCare`.
    pub fn merge(self, other: UsageType) -> UsageType {
        if self == other {
            self
        } else if self == UsageType::Exclude || other == UsageType::Exclude {
            UsageType::Exclude
        } else {
            UsageType::Include
        }
    }

    /// Resolve a classification to keep (`true`) or drop (`false`).
    ///
    /// `DontCare` keeps under an exclude policy and drops under an include
    /// policy.
    pub fn decide_for(self, policy: Policy) -> bool {
        match self {
            UsageType::Include => true,
            UsageType::Exclude => false,
            UsageType::DontCare => policy == Policy::Exclude,
        }
    }

    /// Merge an iterator of classifications, `DontCare` when empty.
    pub fn merge_all(values: impl IntoIterator<Item = UsageType>) -> UsageType {
        values
            .into_iter()
            .fold(UsageType::DontCare, UsageType::merge)
    }
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UsageType::DontCare => "dont_care",
            UsageType::Include => "include",
            UsageType::Exclude => "exclude",
        };
        write!(f, "{}", s)
    }
}

/// Polarity attached to a filter: what a match means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    Include,
    Exclude,
}

impl From<Policy> for UsageType {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Include => UsageType::Include,
            Policy::Exclude => UsageType::Exclude,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        UsageType::from(*self).fmt(f)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [UsageType; 3] = [UsageType::DontCare, UsageType::Include, UsageType::Exclude];

    mod merge {
        use super::*;

        #[test]
        fn is_idempotent() {
            for x in ALL {
                assert_eq!(x.merge(x), x);
            }
        }

        #[test]
        fn is_commutative() {
            for a in ALL {
                for b in ALL {
                    assert_eq!(a.merge(b), b.merge(a), "{a} / {b}");
                }
            }
        }

        #[test]
        fn is_associative() {
            for a in ALL {
                for b in ALL {
                    for c in ALL {
                        assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
                    }
                }
            }
        }

        #[test]
        fn exclude_dominates() {
            for x in ALL {
                assert_eq!(UsageType::Exclude.merge(x), UsageType::Exclude);
            }
        }

        #[test]
        fn include_beats_dont_care() {
            assert_eq!(
                UsageType::DontCare.merge(UsageType::Include),
                UsageType::Include
            );
            assert_eq!(
                UsageType::DontCare.merge(UsageType::DontCare),
                UsageType::DontCare
            );
        }

        #[test]
        fn merge_all_of_nothing_is_dont_care() {
            assert_eq!(UsageType::merge_all([]), UsageType::DontCare);
            assert_eq!(
                UsageType::merge_all([UsageType::Include, UsageType::DontCare]),
                UsageType::Include
            );
        }
    }

    mod decide {
        use super::*;

        #[test]
        fn decided_values_ignore_policy() {
            for policy in [Policy::Include, Policy::Exclude] {
                assert!(UsageType::Include.decide_for(policy));
                assert!(!UsageType::Exclude.decide_for(policy));
            }
        }

        #[test]
        fn dont_care_follows_policy() {
            assert!(UsageType::DontCare.decide_for(Policy::Exclude));
            assert!(!UsageType::DontCare.decide_for(Policy::Include));
        }
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(UsageType::DontCare.to_string(), "dont_care");
        assert_eq!(Policy::Exclude.to_string(), "exclude");
    }
}
