//! Built-in filters that callers append to user rules.

use super::commit::{CommitFilter, CommitPredicate};
use super::file::{FileFilter, FilePredicate};
use super::matcher::StringMatcher;
use super::parser::FilterError;
use super::project::{NodePredicate, ProjectFilter};
use super::usage::Policy;

/// Excludes ignored projects and every edge touching one.
pub fn ignore_filter() -> ProjectFilter {
    ProjectFilter::from_predicate(NodePredicate::Ignored, Policy::Exclude)
}

/// Excludes external libraries and every edge touching one.
pub fn external_filter() -> ProjectFilter {
    ProjectFilter::from_predicate(NodePredicate::External, Policy::Exclude)
}

/// Excludes projects outside the given roots.
///
/// A project is inside when one of its group segments matches one of the
/// root terms. An edge is kept only when both endpoints are inside.
pub fn roots_filter<S: AsRef<str>>(roots: &[S]) -> Result<ProjectFilter, FilterError> {
    let matchers = roots
        .iter()
        .map(|r| StringMatcher::parse(r.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ProjectFilter::from_predicate(
        NodePredicate::Not(Box::new(NodePredicate::Group(matchers))),
        Policy::Exclude,
    ))
}

/// Excludes ignored files.
pub fn ignored_files_filter() -> FileFilter {
    FileFilter::from_predicate(FilePredicate::Ignored, Policy::Exclude)
}

/// Excludes ignored commits.
pub fn ignored_commits_filter() -> CommitFilter {
    CommitFilter::from_predicate(CommitPredicate::Ignored, Policy::Exclude)
}
