//! Project and dependency filters.
//!
//! ## Terms
//!
//! - `!<term>`: negation
//! - `id:<n>`: project id
//! - `root:<term>`: any group segment matches the string term
//! - `<src> [-<depth>][R]-> <dest>`: edge rule (see [`super::edge`])
//! - anything else: string term matched against the full name and the
//!   simple name
//!
//! A node term classifies a dependency through its endpoints: an include
//! rule needs both ends to match, an exclude rule needs only one.

use tracing::debug;

use super::edge::EdgeFilter;
use super::matcher::StringMatcher;
use super::parser::{parse_composed, parse_id, FilterError, ParseOptions};
use super::tree::{Classify, FilterTree, Leaf};
use super::usage::{Policy, UsageType};
use crate::model::{DependencyRef, Project, ProjectId, Projects};

// ============================================================================
// Node Predicates
// ============================================================================

/// Boolean test over a single project.
#[derive(Debug, Clone)]
pub enum NodePredicate {
    /// Always true.
    Any,
    Not(Box<NodePredicate>),
    Id(ProjectId),
    /// Full name or simple name matches.
    Name(StringMatcher),
    /// Some group segment matches one of the matchers.
    Group(Vec<StringMatcher>),
    /// The project is flagged ignored.
    Ignored,
    /// The project is an external library.
    External,
}

impl NodePredicate {
    /// Parse a single project term (no `|`, `&` or `->`).
    pub fn parse(term: &str) -> Result<Self, FilterError> {
        let term = term.trim();

        if let Some(rest) = term.strip_prefix('!') {
            Ok(NodePredicate::Not(Box::new(NodePredicate::parse(rest)?)))
        } else if term.is_empty() {
            Ok(NodePredicate::Any)
        } else if let Some(id) = term.strip_prefix("id:") {
            Ok(NodePredicate::Id(parse_id(term, id)?))
        } else if let Some(group) = term.strip_prefix("root:") {
            Ok(NodePredicate::Group(vec![StringMatcher::parse(group)?]))
        } else {
            Ok(NodePredicate::Name(StringMatcher::parse(term)?))
        }
    }

    pub fn matches(&self, project: &Project) -> bool {
        match self {
            NodePredicate::Any => true,
            NodePredicate::Not(inner) => !inner.matches(project),
            NodePredicate::Id(id) => project.id == *id,
            NodePredicate::Name(m) => m.is_match_any([project.name.as_str(), project.simple_name()]),
            NodePredicate::Group(matchers) => project
                .groups
                .iter()
                .any(|g| matchers.iter().any(|m| m.is_match(g))),
            NodePredicate::Ignored => project.ignore,
            NodePredicate::External => project.is_external_dependency(),
        }
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// Leaf of a project filter tree.
#[derive(Debug, Clone)]
pub enum ProjectLeaf {
    /// Node predicate with a policy.
    Node {
        predicate: NodePredicate,
        policy: Policy,
    },
    /// Resolved edge rule.
    Edge(EdgeFilter),
}

impl Leaf for ProjectLeaf {
    fn policy(&self) -> Policy {
        match self {
            ProjectLeaf::Node { policy, .. } => *policy,
            ProjectLeaf::Edge(edge) => edge.policy(),
        }
    }
}

impl Classify<Project> for ProjectLeaf {
    fn classify(&self, project: &Project) -> UsageType {
        match self {
            ProjectLeaf::Node { predicate, policy } => {
                if predicate.matches(project) {
                    (*policy).into()
                } else {
                    UsageType::DontCare
                }
            }
            // Edge rules speak about edges only.
            ProjectLeaf::Edge(_) => UsageType::DontCare,
        }
    }
}

impl<'a> Classify<DependencyRef<'a>> for ProjectLeaf {
    fn classify(&self, dep: &DependencyRef<'a>) -> UsageType {
        match self {
            ProjectLeaf::Node { predicate, policy } => {
                let source = predicate.matches(dep.source);
                let target = predicate.matches(dep.target);
                let hit = match policy {
                    Policy::Include => source && target,
                    Policy::Exclude => source || target,
                };
                if hit {
                    (*policy).into()
                } else {
                    UsageType::DontCare
                }
            }
            ProjectLeaf::Edge(edge) => edge.classify_dependency(dep),
        }
    }
}

// ============================================================================
// Project Filter
// ============================================================================

/// Immutable filter over projects and their dependency edges.
#[derive(Debug, Clone)]
pub struct ProjectFilter {
    tree: FilterTree<ProjectLeaf>,
}

impl ProjectFilter {
    /// Parse a rule with default options.
    pub fn parse(projects: &Projects, rule: &str, policy: Policy) -> Result<Self, FilterError> {
        ProjectFilter::parse_with_options(projects, rule, policy, &ParseOptions::default())
    }

    /// Parse a rule. Edge rules are resolved against `projects` right away.
    pub fn parse_with_options(
        projects: &Projects,
        rule: &str,
        policy: Policy,
        options: &ParseOptions,
    ) -> Result<Self, FilterError> {
        let tree = parse_composed(rule, &mut |term: &str| {
            if term.contains("->") {
                Ok(FilterTree::Leaf(ProjectLeaf::Edge(EdgeFilter::parse(
                    projects, term, policy, options,
                )?)))
            } else {
                Ok(FilterTree::Leaf(ProjectLeaf::Node {
                    predicate: NodePredicate::parse(term)?,
                    policy,
                }))
            }
        })?;
        debug!(rule, %policy, leaves = tree.leaf_count(), "parsed project rule");
        Ok(ProjectFilter { tree })
    }

    /// Leaf filter from a predicate.
    pub fn from_predicate(predicate: NodePredicate, policy: Policy) -> Self {
        ProjectFilter {
            tree: FilterTree::Leaf(ProjectLeaf::Node { predicate, policy }),
        }
    }

    /// OR-group of filters: merged classification, `Exclude` dominant.
    pub fn group(filters: impl IntoIterator<Item = ProjectFilter>) -> Self {
        ProjectFilter {
            tree: FilterTree::Or(filters.into_iter().map(|f| f.tree).collect()),
        }
    }

    /// AND-group of filters.
    pub fn all_of(filters: impl IntoIterator<Item = ProjectFilter>) -> Self {
        ProjectFilter {
            tree: FilterTree::And(filters.into_iter().map(|f| f.tree).collect()),
        }
    }

    pub fn tree(&self) -> &FilterTree<ProjectLeaf> {
        &self.tree
    }

    pub fn classify_project(&self, project: &Project) -> UsageType {
        self.tree.classify(project)
    }

    pub fn classify_dependency(&self, dep: &DependencyRef<'_>) -> UsageType {
        self.tree.classify(dep)
    }

    pub fn decide(&self, usage: UsageType) -> bool {
        self.tree.decide(usage)
    }

    pub fn keep_project(&self, project: &Project) -> bool {
        self.decide(self.classify_project(project))
    }

    pub fn keep_dependency(&self, dep: &DependencyRef<'_>) -> bool {
        self.decide(self.classify_dependency(dep))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListMode, ProjectType};

    fn graph() -> Projects {
        let mut projects = Projects::new();
        for name in ["org:web", "org:core", "left-pad"] {
            projects.get_or_create(name).unwrap();
        }
        let web = projects.get("org:web").unwrap().id;
        let core = projects.get("org:core").unwrap().id;
        let pad = projects.get("left-pad").unwrap().id;
        projects.get_mut(web).unwrap().groups = vec!["apps".into()];
        projects.get_mut(core).unwrap().groups = vec!["libs".into(), "shared".into()];
        projects.get_mut(pad).unwrap().project_type = ProjectType::Library;
        projects.add_dependency(web, core).unwrap();
        projects.add_dependency(core, pad).unwrap();
        projects
    }

    fn project<'a>(projects: &'a Projects, name: &str) -> &'a Project {
        projects.get(name).unwrap()
    }

    fn dep<'a>(projects: &'a Projects, s: &str, t: &str) -> DependencyRef<'a> {
        projects
            .dependencies(project(projects, s), ListMode::All)
            .into_iter()
            .find(|d| d.target.name == t)
            .unwrap()
    }

    mod terms {
        use super::*;

        #[test]
        fn name_matches_full_or_simple_name() {
            let projects = graph();
            let p = NodePredicate::parse("core").unwrap();
            assert!(p.matches(project(&projects, "org:core")));
            let q = NodePredicate::parse("ORG:CORE").unwrap();
            assert!(q.matches(project(&projects, "org:core")));
            assert!(!q.matches(project(&projects, "org:web")));
        }

        #[test]
        fn negation_nests() {
            let projects = graph();
            let p = NodePredicate::parse("!core").unwrap();
            assert!(!p.matches(project(&projects, "org:core")));
            let q = NodePredicate::parse("!!core").unwrap();
            assert!(q.matches(project(&projects, "org:core")));
        }

        #[test]
        fn id_term() {
            let projects = graph();
            let core = project(&projects, "org:core");
            let p = NodePredicate::parse(&format!("id:{}", core.id)).unwrap();
            assert!(p.matches(core));
            assert!(!p.matches(project(&projects, "org:web")));
        }

        #[test]
        fn invalid_id_is_an_error() {
            assert!(matches!(
                NodePredicate::parse("id:web"),
                Err(FilterError::InvalidId { .. })
            ));
        }

        #[test]
        fn root_term_matches_any_group_segment() {
            let projects = graph();
            let p = NodePredicate::parse("root:shared").unwrap();
            assert!(p.matches(project(&projects, "org:core")));
            assert!(!p.matches(project(&projects, "org:web")));
        }

        #[test]
        fn glob_and_regex_terms() {
            let projects = graph();
            let glob = NodePredicate::parse("org:*").unwrap();
            assert!(glob.matches(project(&projects, "org:web")));
            assert!(!glob.matches(project(&projects, "left-pad")));
            let re = NodePredicate::parse("re:pad$").unwrap();
            assert!(re.matches(project(&projects, "left-pad")));
        }
    }

    mod leaf_classification {
        use super::*;

        #[test]
        fn include_node_rule_needs_both_endpoints() {
            let projects = graph();
            let f = ProjectFilter::parse(&projects, "org:*", Policy::Include).unwrap();
            assert_eq!(
                f.classify_dependency(&dep(&projects, "org:web", "org:core")),
                UsageType::Include
            );
            assert_eq!(
                f.classify_dependency(&dep(&projects, "org:core", "left-pad")),
                UsageType::DontCare
            );
        }

        #[test]
        fn exclude_node_rule_needs_one_endpoint() {
            let projects = graph();
            let f = ProjectFilter::parse(&projects, "left-pad", Policy::Exclude).unwrap();
            assert_eq!(
                f.classify_dependency(&dep(&projects, "org:core", "left-pad")),
                UsageType::Exclude
            );
            assert_eq!(
                f.classify_dependency(&dep(&projects, "org:web", "org:core")),
                UsageType::DontCare
            );
        }

        #[test]
        fn include_rule_decides_false_for_non_matching() {
            let projects = graph();
            let f = ProjectFilter::parse(&projects, "core", Policy::Include).unwrap();
            assert!(f.keep_project(project(&projects, "org:core")));
            assert!(!f.keep_project(project(&projects, "org:web")));
        }

        #[test]
        fn exclude_rule_decides_true_for_non_matching() {
            let projects = graph();
            let f = ProjectFilter::parse(&projects, "core", Policy::Exclude).unwrap();
            assert!(!f.keep_project(project(&projects, "org:core")));
            assert!(f.keep_project(project(&projects, "org:web")));
        }

        #[test]
        fn empty_rule_matches_everything() {
            let projects = graph();
            let f = ProjectFilter::parse(&projects, "", Policy::Include).unwrap();
            for p in projects.list(ListMode::All) {
                assert!(f.keep_project(p));
            }
        }

        #[test]
        fn edge_rules_do_not_classify_projects() {
            let projects = graph();
            let f = ProjectFilter::parse(&projects, "web -> core", Policy::Include).unwrap();
            assert_eq!(
                f.classify_project(project(&projects, "org:web")),
                UsageType::DontCare
            );
            assert!(f.keep_dependency(&dep(&projects, "org:web", "org:core")));
        }
    }

    mod composition {
        use super::*;

        #[test]
        fn or_rule_is_union() {
            let projects = graph();
            let f = ProjectFilter::parse(&projects, "web | left-pad", Policy::Include).unwrap();
            let kept: Vec<_> = projects
                .list(ListMode::All)
                .into_iter()
                .filter(|p| f.keep_project(p))
                .map(|p| p.name.as_str())
                .collect();
            assert_eq!(kept, vec!["left-pad", "org:web"]);
        }

        #[test]
        fn and_rule_is_intersection() {
            let projects = graph();
            let f = ProjectFilter::parse(&projects, "org:* & !web", Policy::Include).unwrap();
            let kept: Vec<_> = projects
                .list(ListMode::All)
                .into_iter()
                .filter(|p| f.keep_project(p))
                .map(|p| p.name.as_str())
                .collect();
            assert_eq!(kept, vec!["org:core"]);
        }

        #[test]
        fn parse_errors_abort_the_whole_rule() {
            let projects = graph();
            let err = ProjectFilter::parse(&projects, "web | re:[", Policy::Include).unwrap_err();
            assert!(matches!(err, FilterError::InvalidRegex { .. }));
        }
    }
}
