//! Edge rules: `<src> [-<depth>][R]-> <dest>`.
//!
//! An edge rule selects the dependency paths that lead from a project matching
//! `src` to a project matching `dest`. The search runs once, when the rule is
//! parsed, and the filter keeps only the resulting edge table.
//!
//! ## Syntax
//!
//! - `web -> api`: any path, unbounded length
//! - `web -2-> api`: paths of at most two edges
//! - `web -R-> api`: only edges recorded on a matching path
//! - `web -3R-> api`: both
//!
//! Terms follow the project term rules (`!`, `id:`, `root:`, `re:`, globs).
//!
//! ## Search
//!
//! From every non-external project matching `src`, a depth-first search walks
//! outgoing edges:
//! - an ignored node ends the branch
//! - a node other than the search root that matches `dest` records the whole
//!   path and ends the branch
//! - an external library is never expanded (it can still be a destination)
//! - the branch ends when the depth budget is spent
//! - a node already visited from this root ends the branch
//! - an edge already known to lead to a destination records the current path
//!   without descending again
//!
//! Nodes touched by any recorded edge form the touched set.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::parser::{FilterError, ParseOptions};
use super::project::NodePredicate;
use super::usage::{Policy, UsageType};
use crate::model::{DependencyRef, ListMode, Project, ProjectId, Projects};

static EDGE_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^>]*?)\s*(?:-(\d+)?(R)?)?->\s*([^>]*)$").expect("edge rule pattern is valid")
});

/// Table of recorded edges, `source -> {targets}`.
pub type EdgeTable = BTreeMap<ProjectId, BTreeSet<ProjectId>>;

/// A resolved edge rule.
#[derive(Debug, Clone)]
pub struct EdgeFilter {
    rule: String,
    policy: Policy,
    max_depth: Option<usize>,
    only_required: bool,
    matches: EdgeTable,
    touched: BTreeSet<ProjectId>,
}

impl EdgeFilter {
    /// Parse an edge rule and run the search over `projects`.
    pub fn parse(
        projects: &Projects,
        rule: &str,
        policy: Policy,
        options: &ParseOptions,
    ) -> Result<Self, FilterError> {
        let rule = rule.trim();
        let caps = EDGE_RULE
            .captures(rule)
            .ok_or_else(|| FilterError::MalformedEdge {
                rule: rule.to_string(),
            })?;

        let src = NodePredicate::parse(caps.get(1).map_or("", |m| m.as_str()))?;

        let max_depth = match caps.get(2) {
            Some(digits) => Some(digits.as_str().parse::<usize>().map_err(|_| {
                FilterError::InvalidDepth {
                    rule: rule.to_string(),
                    digits: digits.as_str().to_string(),
                }
            })?),
            None => options.default_max_depth,
        };

        let only_required = caps.get(3).is_some();

        let dest = NodePredicate::parse(caps.get(4).map_or("", |m| m.as_str()))?;

        let mut search = EdgeSearch::new(projects, &dest, max_depth);
        let mut roots = 0usize;
        for root in projects.list(ListMode::ExcludeExternal) {
            if src.matches(root) {
                roots += 1;
                search.run_from(root);
            }
        }
        let matches = search.matches;

        let mut touched = BTreeSet::new();
        for (source, targets) in &matches {
            touched.insert(*source);
            touched.extend(targets.iter().copied());
        }

        debug!(
            rule,
            %policy,
            ?max_depth,
            only_required,
            roots,
            edges = matches.values().map(BTreeSet::len).sum::<usize>(),
            touched = touched.len(),
            "resolved edge rule"
        );

        Ok(EdgeFilter {
            rule: rule.to_string(),
            policy,
            max_depth,
            only_required,
            matches,
            touched,
        })
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Depth bound used by the search, `None` when unbounded.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// True when the `R` flag was given.
    pub fn only_required(&self) -> bool {
        self.only_required
    }

    /// Edges recorded on matching paths.
    pub fn matches(&self) -> &EdgeTable {
        &self.matches
    }

    /// True if `source -> target` lies on a recorded path.
    pub fn is_recorded(&self, source: ProjectId, target: ProjectId) -> bool {
        self.matches
            .get(&source)
            .is_some_and(|targets| targets.contains(&target))
    }

    /// Every endpoint of a recorded edge.
    pub fn touched(&self) -> &BTreeSet<ProjectId> {
        &self.touched
    }

    /// Classify one dependency edge.
    ///
    /// Under an include policy without `R`, any edge between two touched
    /// nodes is included. Otherwise only recorded edges carry the policy.
    /// `R` keeps every edge recorded on any matching path: with
    /// `web -> core -> api` and `web -> api`, `web -R-> api` keeps all three.
    pub fn classify_dependency(&self, dep: &DependencyRef<'_>) -> UsageType {
        let (source, target) = dep.key();
        let hit = match (self.policy, self.only_required) {
            (Policy::Include, false) => {
                self.touched.contains(&source) && self.touched.contains(&target)
            }
            _ => self.is_recorded(source, target),
        };
        if hit {
            self.policy.into()
        } else {
            UsageType::DontCare
        }
    }
}

// ============================================================================
// Search State
// ============================================================================

struct EdgeSearch<'a> {
    projects: &'a Projects,
    dest: &'a NodePredicate,
    max_depth: Option<usize>,
    matches: EdgeTable,
}

/// One expanded node: its outgoing targets and the budget left for them.
struct Frame<'a> {
    source: ProjectId,
    targets: Vec<&'a Project>,
    next: usize,
    depth: Option<usize>,
}

impl<'a> EdgeSearch<'a> {
    fn new(projects: &'a Projects, dest: &'a NodePredicate, max_depth: Option<usize>) -> Self {
        EdgeSearch {
            projects,
            dest,
            max_depth,
            matches: EdgeTable::new(),
        }
    }

    /// Search from one root with a fresh visited set.
    ///
    /// The walk keeps an explicit frame stack, so long dependency chains do
    /// not grow the call stack. `path[i]` is the project of `stack[i]`.
    fn run_from(&mut self, root: &'a Project) {
        trace!(root = %root.name, "edge search");
        let mut visited = HashSet::new();
        let mut path = vec![root];
        let Some(frame) = self.enter(&path, &mut visited, self.max_depth) else {
            return;
        };
        let mut stack = vec![frame];

        while let Some(frame) = stack.last_mut() {
            let Some(target) = frame.targets.get(frame.next).copied() else {
                stack.pop();
                path.pop();
                continue;
            };
            frame.next += 1;
            let (source, depth) = (frame.source, frame.depth);

            if self.is_known_lead(source, target.id) {
                self.record(&path);
                continue;
            }
            path.push(target);
            match self.enter(&path, &mut visited, depth) {
                Some(frame) => stack.push(frame),
                None => {
                    path.pop();
                }
            }
        }
    }

    /// Check the last node of `path` and return its frame when the walk
    /// should expand it.
    fn enter(
        &mut self,
        path: &[&'a Project],
        visited: &mut HashSet<ProjectId>,
        depth: Option<usize>,
    ) -> Option<Frame<'a>> {
        let (&root, &current) = (path.first()?, path.last()?);

        if current.ignore {
            return None;
        }
        if current.id != root.id && self.dest.matches(current) {
            self.record(path);
            return None;
        }
        if current.is_external_dependency() || depth == Some(0) {
            return None;
        }
        if !visited.insert(current.id) {
            return None;
        }

        let projects: &'a Projects = self.projects;
        let targets = projects
            .dependencies(current, ListMode::All)
            .into_iter()
            .map(|dep| dep.target)
            .collect();
        Some(Frame {
            source: current.id,
            targets,
            next: 0,
            depth: depth.map(|d| d - 1),
        })
    }

    fn is_known_lead(&self, source: ProjectId, target: ProjectId) -> bool {
        self.matches
            .get(&source)
            .is_some_and(|targets| targets.contains(&target))
    }

    fn record(&mut self, path: &[&'a Project]) {
        for pair in path.windows(2) {
            self.matches
                .entry(pair[0].id)
                .or_default()
                .insert(pair[1].id);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProjectType;

    fn graph(edges: &[(&str, &str)]) -> Projects {
        let mut projects = Projects::new();
        for (s, t) in edges {
            let s = projects.get_or_create(s).unwrap().id;
            let t = projects.get_or_create(t).unwrap().id;
            projects.add_dependency(s, t).unwrap();
        }
        projects
    }

    fn parse(projects: &Projects, rule: &str) -> EdgeFilter {
        EdgeFilter::parse(projects, rule, Policy::Include, &ParseOptions::default()).unwrap()
    }

    fn recorded(projects: &Projects, filter: &EdgeFilter) -> Vec<(String, String)> {
        let name = |id: &ProjectId| projects.get_by_id(*id).unwrap().name.clone();
        let mut out: Vec<_> = filter
            .matches()
            .iter()
            .flat_map(|(s, ts)| ts.iter().map(move |t| (*s, *t)))
            .map(|(s, t)| (name(&s), name(&t)))
            .collect();
        out.sort();
        out
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    mod syntax {
        use super::*;

        #[test]
        fn plain_arrow() {
            let projects = graph(&[("a", "b")]);
            let f = parse(&projects, "a -> b");
            assert_eq!(f.max_depth(), None);
            assert!(!f.only_required());
        }

        #[test]
        fn depth_and_required_flag() {
            let projects = graph(&[("a", "b")]);
            let f = parse(&projects, "a -3R-> b");
            assert_eq!(f.max_depth(), Some(3));
            assert!(f.only_required());

            let g = parse(&projects, "a-R->b");
            assert_eq!(g.max_depth(), None);
            assert!(g.only_required());
        }

        #[test]
        fn hyphenated_names_are_terms() {
            let projects = graph(&[("my-app", "left-pad")]);
            let f = parse(&projects, "my-app -> left-pad");
            assert_eq!(recorded(&projects, &f), pairs(&[("my-app", "left-pad")]));
        }

        #[test]
        fn default_depth_comes_from_options() {
            let projects = graph(&[("a", "b")]);
            let options = ParseOptions::new().with_default_max_depth(Some(4));
            let f = EdgeFilter::parse(&projects, "a -> b", Policy::Include, &options).unwrap();
            assert_eq!(f.max_depth(), Some(4));
            let g = EdgeFilter::parse(&projects, "a -1-> b", Policy::Include, &options).unwrap();
            assert_eq!(g.max_depth(), Some(1));
        }

        #[test]
        fn chained_arrows_are_malformed() {
            let projects = graph(&[("a", "b")]);
            let err = EdgeFilter::parse(&projects, "a -> b -> c", Policy::Include, &ParseOptions::default())
                .unwrap_err();
            assert!(matches!(err, FilterError::MalformedEdge { .. }));
        }

        #[test]
        fn oversized_depth_is_invalid() {
            let projects = graph(&[("a", "b")]);
            let err = EdgeFilter::parse(
                &projects,
                "a -99999999999999999999999-> b",
                Policy::Include,
                &ParseOptions::default(),
            )
            .unwrap_err();
            assert!(matches!(err, FilterError::InvalidDepth { .. }));
        }

        #[test]
        fn bad_destination_term_is_reported() {
            let projects = graph(&[("a", "b")]);
            let err = EdgeFilter::parse(&projects, "a -> re:(", Policy::Include, &ParseOptions::default())
                .unwrap_err();
            assert!(matches!(err, FilterError::InvalidRegex { .. }));
        }
    }

    mod search {
        use super::*;

        #[test]
        fn records_every_edge_on_the_path() {
            let projects = graph(&[("a", "x"), ("x", "b")]);
            let f = parse(&projects, "a -> b");
            assert_eq!(recorded(&projects, &f), pairs(&[("a", "x"), ("x", "b")]));
            assert_eq!(f.touched().len(), 3);
        }

        #[test]
        fn depth_bounds_path_length() {
            let projects = graph(&[("a", "x"), ("x", "b")]);
            assert!(parse(&projects, "a -1-> b").matches().is_empty());
            assert_eq!(parse(&projects, "a -2-> b").matches().len(), 2);
        }

        #[test]
        fn cycles_terminate() {
            let projects = graph(&[("a", "b"), ("b", "a")]);
            let f = parse(&projects, "a -> z");
            assert!(f.matches().is_empty());
            assert!(f.touched().is_empty());
        }

        #[test]
        fn root_is_never_its_own_destination() {
            let projects = graph(&[("a", "b"), ("b", "a")]);
            let f = parse(&projects, "a -> a");
            assert!(f.matches().is_empty());
        }

        #[test]
        fn search_stops_at_first_destination() {
            let projects = graph(&[("a", "b1"), ("b1", "b2")]);
            let f = parse(&projects, "a -> b*");
            assert_eq!(recorded(&projects, &f), pairs(&[("a", "b1")]));
        }

        #[test]
        fn ignored_nodes_are_never_destinations() {
            let mut projects = graph(&[("a", "b"), ("a", "c"), ("c", "b2")]);
            let b = projects.get("b").unwrap().id;
            projects.get_mut(b).unwrap().ignore = true;
            let f = parse(&projects, "a -> b*");
            assert_eq!(recorded(&projects, &f), pairs(&[("a", "c"), ("c", "b2")]));
            assert!(!f.touched().contains(&b));
        }

        #[test]
        fn ignored_nodes_block_paths() {
            let mut projects = graph(&[("a", "x"), ("x", "b")]);
            let x = projects.get("x").unwrap().id;
            projects.get_mut(x).unwrap().ignore = true;
            assert!(parse(&projects, "a -> b").matches().is_empty());
        }

        #[test]
        fn external_nodes_are_destinations_but_not_expanded() {
            let mut projects = graph(&[("a", "lib"), ("lib", "b")]);
            let lib = projects.get("lib").unwrap().id;
            projects.get_mut(lib).unwrap().project_type = ProjectType::Library;
            assert!(parse(&projects, "a -> b").matches().is_empty());
            assert_eq!(
                recorded(&projects, &parse(&projects, "a -> lib")),
                pairs(&[("a", "lib")])
            );
        }

        #[test]
        fn external_projects_are_not_roots() {
            let mut projects = graph(&[("lib", "b")]);
            let lib = projects.get("lib").unwrap().id;
            projects.get_mut(lib).unwrap().project_type = ProjectType::Library;
            assert!(parse(&projects, "lib -> b").matches().is_empty());
        }

        #[test]
        fn known_leads_are_reused_across_roots() {
            // Roots run in name order. Root c records c -> d -> target; root z
            // then reaches c within its two-edge budget and reuses that lead.
            let projects = graph(&[("z", "c"), ("c", "d"), ("d", "target")]);
            let f = parse(&projects, "* -2-> target");
            assert_eq!(
                recorded(&projects, &f),
                pairs(&[("c", "d"), ("d", "target"), ("z", "c")])
            );
        }

        #[test]
        fn diamond_records_both_branches() {
            let projects = graph(&[("a", "l"), ("a", "r"), ("l", "z"), ("r", "z")]);
            let f = parse(&projects, "a -> z");
            assert_eq!(
                recorded(&projects, &f),
                pairs(&[("a", "l"), ("a", "r"), ("l", "z"), ("r", "z")])
            );
        }

        fn chain(len: usize) -> Projects {
            let names: Vec<String> = (0..len).map(|i| format!("n{}", i)).collect();
            let links: Vec<(&str, &str)> = names
                .windows(2)
                .map(|w| (w[0].as_str(), w[1].as_str()))
                .collect();
            graph(&links)
        }

        #[test]
        fn long_chain_without_destination_terminates() {
            let projects = chain(100_000);
            let f = parse(&projects, "n0 -> missing");
            assert!(f.matches().is_empty());
            assert!(f.touched().is_empty());
        }

        #[test]
        fn long_chain_records_every_edge() {
            let projects = chain(100_000);
            let f = parse(&projects, "n0 -> n99999");
            assert_eq!(f.matches().values().map(BTreeSet::len).sum::<usize>(), 99_999);
            assert_eq!(f.touched().len(), 100_000);
        }

        #[test]
        fn negated_source_term() {
            let projects = graph(&[("a", "z"), ("b", "z")]);
            let f = parse(&projects, "!a -> z");
            assert_eq!(recorded(&projects, &f), pairs(&[("b", "z")]));
        }
    }

    mod classification {
        use super::*;

        fn dep<'a>(projects: &'a Projects, s: &str, t: &str) -> DependencyRef<'a> {
            let source = projects.get(s).unwrap();
            projects
                .dependencies(source, ListMode::All)
                .into_iter()
                .find(|d| d.target.name == t)
                .unwrap()
        }

        // a -> x -> b, plus x -> a, which links two touched nodes but is not
        // on any recorded path.
        fn with_back_edge() -> Projects {
            graph(&[("a", "x"), ("x", "b"), ("x", "a")])
        }

        #[test]
        fn include_without_r_takes_edges_between_touched_nodes() {
            let projects = with_back_edge();
            let f = parse(&projects, "a -> b");
            assert_eq!(f.classify_dependency(&dep(&projects, "x", "a")), UsageType::Include);
            assert_eq!(f.classify_dependency(&dep(&projects, "a", "x")), UsageType::Include);
        }

        #[test]
        fn required_flag_takes_only_recorded_edges() {
            let projects = with_back_edge();
            let f = parse(&projects, "a -R-> b");
            assert_eq!(f.classify_dependency(&dep(&projects, "x", "a")), UsageType::DontCare);
            assert_eq!(f.classify_dependency(&dep(&projects, "x", "b")), UsageType::Include);
        }

        #[test]
        fn required_flag_keeps_every_path_to_the_destination() {
            let projects = graph(&[("web", "core"), ("core", "api"), ("web", "api")]);
            let f = parse(&projects, "web -R-> api");
            assert_eq!(
                recorded(&projects, &f),
                pairs(&[("core", "api"), ("web", "api"), ("web", "core")])
            );
            for (s, t) in [("web", "core"), ("core", "api"), ("web", "api")] {
                assert_eq!(f.classify_dependency(&dep(&projects, s, t)), UsageType::Include);
            }
        }

        #[test]
        fn exclude_policy_uses_recorded_edges() {
            let projects = with_back_edge();
            let f = EdgeFilter::parse(&projects, "a -> b", Policy::Exclude, &ParseOptions::default())
                .unwrap();
            assert_eq!(f.classify_dependency(&dep(&projects, "x", "a")), UsageType::DontCare);
            assert_eq!(f.classify_dependency(&dep(&projects, "a", "x")), UsageType::Exclude);
        }
    }
}
