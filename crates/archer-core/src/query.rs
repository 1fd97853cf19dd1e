//! Cross-entity queries: the `file`, `proj`, `repo`, `person` and
//! `person.id` parameters used by the listing commands.
//!
//! Each non-empty parameter constrains every entity kind it relates to:
//! a `proj` rule selects projects, and also restricts files to those owned by
//! a selected project, repositories to those holding such files, and so on.
//! Empty or whitespace-only parameters impose no constraint.
//!
//! People are related to files and repositories through the commits they
//! authored or committed.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ArcherError;
use crate::filter::{
    filter_commits, filter_files, filter_projects, ignored_commits_filter, ignored_files_filter,
    CommitFilter, FileFilter, ParseOptions, Policy, ProjectFilter, ProjectFilterSet, StringMatcher,
};
use crate::model::{
    Commit, Dataset, File, FileId, ListMode, Person, PersonId, Project, ProjectId, Repository,
    RepositoryId,
};

/// Raw query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// File rule.
    pub file: String,
    /// Project rule (include policy).
    pub proj: String,
    /// String term against repository names.
    pub repo: String,
    /// String term against people's names and emails.
    pub person: String,
    /// Exact person id. Takes precedence over `person`.
    #[serde(rename = "person.id", skip_serializing_if = "Option::is_none")]
    pub person_id: Option<PersonId>,
    /// Commit rule.
    pub commit: String,
}

impl QueryParams {
    pub fn new() -> Self {
        QueryParams::default()
    }

    pub fn file(mut self, rule: impl Into<String>) -> Self {
        self.file = rule.into();
        self
    }

    pub fn proj(mut self, rule: impl Into<String>) -> Self {
        self.proj = rule.into();
        self
    }

    pub fn repo(mut self, term: impl Into<String>) -> Self {
        self.repo = term.into();
        self
    }

    pub fn person(mut self, term: impl Into<String>) -> Self {
        self.person = term.into();
        self
    }

    pub fn person_id(mut self, id: PersonId) -> Self {
        self.person_id = Some(id);
        self
    }

    pub fn commit(mut self, rule: impl Into<String>) -> Self {
        self.commit = rule.into();
        self
    }
}

/// Non-empty trimmed parameter.
fn constraint(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

// ============================================================================
// People Relations
// ============================================================================

/// Which files and repositories each person touched.
#[derive(Debug, Default)]
struct PeopleRelations {
    files_by_person: HashMap<PersonId, HashSet<FileId>>,
    repos_by_person: HashMap<PersonId, HashSet<RepositoryId>>,
    people_by_file: HashMap<FileId, HashSet<PersonId>>,
}

impl PeopleRelations {
    fn build(dataset: &Dataset) -> Self {
        let mut relations = PeopleRelations::default();
        for repo in &dataset.repositories {
            for commit in &repo.commits {
                for person in commit.people() {
                    relations
                        .repos_by_person
                        .entry(person)
                        .or_default()
                        .insert(repo.id);
                    for file in &commit.file_ids {
                        relations
                            .files_by_person
                            .entry(person)
                            .or_default()
                            .insert(*file);
                        relations
                            .people_by_file
                            .entry(*file)
                            .or_default()
                            .insert(person);
                    }
                }
            }
        }
        relations
    }

    fn files_of(&self, person: PersonId) -> impl Iterator<Item = FileId> + '_ {
        self.files_by_person
            .get(&person)
            .into_iter()
            .flat_map(|files| files.iter().copied())
    }
}

// ============================================================================
// Query
// ============================================================================

/// Compiled query over one dataset.
#[derive(Debug)]
pub struct Query<'a> {
    dataset: &'a Dataset,
    project_filter: ProjectFilter,
    file_filter: FileFilter,
    commit_filter: CommitFilter,
    repo_matcher: Option<StringMatcher>,
    person_matcher: Option<StringMatcher>,
    person_id: Option<PersonId>,
    relations: PeopleRelations,
    /// Selected ids, `None` when the parameter is empty.
    project_ids: Option<HashSet<ProjectId>>,
    file_ids: Option<HashSet<FileId>>,
    repo_ids: Option<HashSet<RepositoryId>>,
    person_ids: Option<HashSet<PersonId>>,
}

impl<'a> Query<'a> {
    /// Compile `params` against `dataset`.
    ///
    /// Any rule that fails to parse aborts the whole query.
    pub fn new(
        dataset: &'a Dataset,
        params: &QueryParams,
        options: &ParseOptions,
    ) -> Result<Self, ArcherError> {
        let mut set = ProjectFilterSet::new().options(*options);
        if let Some(rule) = constraint(&params.proj) {
            set = set.include(rule);
        }
        let project_filter = set
            .build(&dataset.projects)
            .map_err(|e| ArcherError::invalid_rule("project", e))?;

        let mut file_filters = vec![ignored_files_filter()];
        if let Some(rule) = constraint(&params.file) {
            file_filters.push(
                FileFilter::parse(rule, Policy::Include)
                    .map_err(|e| ArcherError::invalid_rule("file", e))?,
            );
        }
        let file_filter = FileFilter::group(file_filters);

        let mut commit_filters = vec![ignored_commits_filter()];
        if let Some(rule) = constraint(&params.commit) {
            commit_filters.push(
                CommitFilter::parse(rule, Policy::Include)
                    .map_err(|e| ArcherError::invalid_rule("commit", e))?,
            );
        }
        let commit_filter = CommitFilter::group(commit_filters);

        let repo_matcher = constraint(&params.repo)
            .map(StringMatcher::parse)
            .transpose()
            .map_err(|e| ArcherError::invalid_rule("repository", e))?;
        let person_matcher = constraint(&params.person)
            .map(StringMatcher::parse)
            .transpose()
            .map_err(|e| ArcherError::invalid_rule("person", e))?;

        let mut query = Query {
            dataset,
            project_filter,
            file_filter,
            commit_filter,
            repo_matcher,
            person_matcher,
            person_id: params.person_id,
            relations: PeopleRelations::build(dataset),
            project_ids: None,
            file_ids: None,
            repo_ids: None,
            person_ids: None,
        };

        if constraint(&params.proj).is_some() {
            query.project_ids = Some(query.projects().iter().map(|p| p.id).collect());
        }
        if constraint(&params.file).is_some() {
            query.file_ids = Some(query.matching_files().map(|f| f.id).collect());
        }
        if query.repo_matcher.is_some() {
            query.repo_ids = Some(query.matching_repositories().map(|r| r.id).collect());
        }
        if query.person_id.is_some() || query.person_matcher.is_some() {
            query.person_ids = Some(query.matching_people().map(|p| p.id).collect());
        }

        debug!(
            projects = ?query.project_ids.as_ref().map(HashSet::len),
            files = ?query.file_ids.as_ref().map(HashSet::len),
            repositories = ?query.repo_ids.as_ref().map(HashSet::len),
            people = ?query.person_ids.as_ref().map(HashSet::len),
            "compiled query"
        );
        Ok(query)
    }

    /// Projects selected by `proj`, external libraries excluded.
    pub fn projects(&self) -> Vec<&'a Project> {
        filter_projects(
            &self.project_filter,
            &self.dataset.projects,
            ListMode::ExcludeExternal,
        )
    }

    /// Files matching every constraint.
    pub fn files(&self) -> Vec<&'a File> {
        filter_files(&self.file_filter, &self.dataset.files)
            .into_iter()
            .filter(|f| self.file_in_projects(f))
            .filter(|f| self.file_in_repositories(f))
            .filter(|f| self.file_touched_by_people(f))
            .collect()
    }

    /// Repositories matching every constraint.
    pub fn repositories(&self) -> Vec<&'a Repository> {
        self.matching_repositories()
            .filter(|r| {
                self.project_ids.is_none()
                    || self.repository_files(r).any(|f| self.file_in_projects(f))
            })
            .filter(|r| {
                self.file_ids.as_ref().is_none_or(|ids| {
                    self.repository_files(r).any(|f| ids.contains(&f.id))
                })
            })
            .filter(|r| {
                self.person_ids.is_none()
                    || self
                        .repository_files(r)
                        .any(|f| self.file_touched_by_people(f))
            })
            .collect()
    }

    /// Commits matching every constraint, with their repository.
    pub fn commits(&self) -> Vec<(&'a Repository, &'a Commit)> {
        let repositories = self
            .dataset
            .repositories
            .iter()
            .filter(|r| !r.ignore)
            .filter(|r| self.repo_ids.as_ref().is_none_or(|ids| ids.contains(&r.id)));
        filter_commits(&self.commit_filter, repositories)
            .into_iter()
            .filter(|(_, c)| {
                self.file_ids
                    .as_ref()
                    .is_none_or(|ids| c.file_ids.iter().any(|f| ids.contains(f)))
            })
            .filter(|(_, c)| {
                self.project_ids.is_none()
                    || c.file_ids
                        .iter()
                        .filter_map(|id| self.dataset.file(*id))
                        .any(|f| self.file_in_projects(f))
            })
            .filter(|(_, c)| {
                self.person_ids
                    .as_ref()
                    .is_none_or(|ids| c.people().iter().any(|p| ids.contains(p)))
            })
            .collect()
    }

    /// People matching every constraint.
    pub fn people(&self) -> Vec<&'a Person> {
        self.matching_people()
            .filter(|p| {
                self.file_ids.as_ref().is_none_or(|ids| {
                    self.relations.files_of(p.id).any(|f| ids.contains(&f))
                })
            })
            .filter(|p| {
                self.project_ids.is_none()
                    || self
                        .relations
                        .files_of(p.id)
                        .filter_map(|id| self.dataset.file(id))
                        .any(|f| self.file_in_projects(f))
            })
            .filter(|p| {
                self.repo_ids.as_ref().is_none_or(|ids| {
                    self.relations
                        .repos_by_person
                        .get(&p.id)
                        .is_some_and(|repos| repos.iter().any(|r| ids.contains(r)))
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Single-parameter selections
    // ------------------------------------------------------------------------

    fn matching_files(&self) -> impl Iterator<Item = &'a File> + '_ {
        self.dataset
            .files
            .iter()
            .filter(|f| self.file_filter.keep(f))
    }

    fn matching_repositories(&self) -> impl Iterator<Item = &'a Repository> + '_ {
        self.dataset
            .repositories
            .iter()
            .filter(|r| !r.ignore)
            .filter(|r| self.repo_matcher.as_ref().is_none_or(|m| m.is_match(&r.name)))
    }

    fn matching_people(&self) -> impl Iterator<Item = &'a Person> + '_ {
        self.dataset.people.iter().filter(|p| !p.ignore).filter(|p| {
            match (self.person_id, &self.person_matcher) {
                (Some(id), _) => p.id == id,
                (None, Some(m)) => {
                    m.is_match_any(p.all_names())
                        || m.is_match_any(p.emails.iter().map(String::as_str))
                }
                (None, None) => true,
            }
        })
    }

    fn repository_files(&self, repo: &Repository) -> impl Iterator<Item = &'a File> + 'a {
        self.dataset.repository_files(repo.id)
    }

    // ------------------------------------------------------------------------
    // Cross-entity constraints
    // ------------------------------------------------------------------------

    fn file_in_projects(&self, file: &File) -> bool {
        self.project_ids.as_ref().is_none_or(|ids| {
            file.project_id.is_some_and(|id| ids.contains(&id))
        })
    }

    fn file_in_repositories(&self, file: &File) -> bool {
        self.repo_ids.as_ref().is_none_or(|ids| {
            file.repository_id.is_some_and(|id| ids.contains(&id))
        })
    }

    fn file_touched_by_people(&self, file: &File) -> bool {
        self.person_ids.as_ref().is_none_or(|ids| {
            self.relations
                .people_by_file
                .get(&file.id)
                .is_some_and(|people| people.iter().any(|p| ids.contains(p)))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
