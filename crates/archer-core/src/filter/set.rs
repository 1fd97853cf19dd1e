//! Combining several rules into one project filter.

use tracing::debug;

use super::defaults::{external_filter, ignore_filter, roots_filter};
use super::parser::{FilterError, ParseOptions};
use super::project::ProjectFilter;
use super::usage::Policy;
use crate::model::Projects;

/// Builder for the filter behind `-i/-e/-r` style options.
///
/// Every rule is parsed on its own and the results are grouped with OR, so
/// each include rule adds to the selection and each exclude rule removes from
/// it. The ignore filter is always appended, the external filter unless
/// [`ProjectFilterSet::keep_external`] is set, and the roots filter when roots
/// are given.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilterSet {
    include: Vec<String>,
    exclude: Vec<String>,
    roots: Vec<String>,
    keep_external: bool,
    options: ParseOptions,
}

impl ProjectFilterSet {
    pub fn new() -> Self {
        ProjectFilterSet::default()
    }

    pub fn include(mut self, rule: impl Into<String>) -> Self {
        self.include.push(rule.into());
        self
    }

    pub fn includes<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(rules.into_iter().map(Into::into));
        self
    }

    pub fn exclude(mut self, rule: impl Into<String>) -> Self {
        self.exclude.push(rule.into());
        self
    }

    pub fn excludes<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(rules.into_iter().map(Into::into));
        self
    }

    pub fn roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roots.extend(roots.into_iter().map(Into::into));
        self
    }

    pub fn keep_external(mut self, keep: bool) -> Self {
        self.keep_external = keep;
        self
    }

    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse every rule against `projects` and group them.
    ///
    /// The first parse error aborts the build.
    pub fn build(&self, projects: &Projects) -> Result<ProjectFilter, FilterError> {
        let mut filters = Vec::with_capacity(self.include.len() + self.exclude.len() + 3);

        for rule in &self.include {
            filters.push(ProjectFilter::parse_with_options(
                projects,
                rule,
                Policy::Include,
                &self.options,
            )?);
        }
        for rule in &self.exclude {
            filters.push(ProjectFilter::parse_with_options(
                projects,
                rule,
                Policy::Exclude,
                &self.options,
            )?);
        }

        filters.push(ignore_filter());
        if !self.keep_external {
            filters.push(external_filter());
        }
        if !self.roots.is_empty() {
            filters.push(roots_filter(&self.roots)?);
        }

        debug!(
            include = self.include.len(),
            exclude = self.exclude.len(),
            roots = self.roots.len(),
            keep_external = self.keep_external,
            "built project filter set"
        );
        Ok(ProjectFilter::group(filters))
    }
}
