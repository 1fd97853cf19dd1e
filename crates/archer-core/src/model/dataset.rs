//! Dataset loading: the JSON document produced by the importers.
//!
//! ## Document Shape
//!
//! ```json
//! {
//!   "projects": [
//!     { "name": "web", "groups": ["app"], "type": "code",
//!       "dependencies": [ { "target": "core", "versions": ["1.2"] } ] },
//!     { "name": "core" }
//!   ],
//!   "files": [ { "id": 1, "path": "web/src/main.go", "project_id": 1 } ],
//!   "repositories": [ { "id": 1, "name": "mono", "commits": [] } ],
//!   "people": [ { "id": 1, "name": "Ana", "emails": ["ana@example.com"] } ]
//! }
//! ```
//!
//! Projects without an `id` get one assigned after every explicit id is
//! placed. A dependency on a project that is not declared creates it as an
//! external library.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    File, FileId, Person, PersonId, Project, ProjectId, ProjectType, Projects, Repository,
    RepositoryId,
};

/// Data file looked up in the workspace when none is configured.
pub const DEFAULT_DATA_FILE: &str = "archer.json";

// ============================================================================
// Errors
// ============================================================================

/// Errors from loading or assembling the model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The data file does not exist.
    #[error("data file not found: {}", .path.display())]
    DataNotFound { path: PathBuf },

    /// Two projects share a name.
    #[error("duplicate project name: {name}")]
    DuplicateProject { name: String },

    /// Two entities of the same kind share an id.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: u32 },

    /// Every id of this kind is taken.
    #[error("no {kind} id left to assign")]
    IdOverflow { kind: &'static str },

    /// An entity references an id that was never declared.
    #[error("unknown {kind} id: {id}")]
    UnknownReference { kind: &'static str, id: u32 },

    /// IO error while reading the data file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The document is not valid JSON for this schema.
    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Document Records
// ============================================================================

/// A project as written in the dataset document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProjectId>,
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, rename = "type")]
    pub project_type: ProjectType,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<RepositoryId>,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyRecord>,
}

/// An outgoing edge as written in the dataset document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Target project name.
    pub target: String,
    #[serde(default)]
    pub versions: BTreeSet<String>,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct DatasetDocument {
    #[serde(default)]
    projects: Vec<ProjectRecord>,
    #[serde(default)]
    files: Vec<File>,
    #[serde(default)]
    repositories: Vec<Repository>,
    #[serde(default)]
    people: Vec<Person>,
}

// ============================================================================
// Dataset
// ============================================================================

/// Everything the filters run over, fully populated.
///
/// Id lookups go through an index built when the dataset is assembled. Call
/// [`Dataset::reindex`] after editing the entity vectors directly.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub projects: Projects,
    pub files: Vec<File>,
    pub repositories: Vec<Repository>,
    pub people: Vec<Person>,
    index: DatasetIndex,
}

/// Positions of entities in the dataset vectors, keyed by id.
#[derive(Debug, Clone, Default)]
struct DatasetIndex {
    files: HashMap<FileId, usize>,
    repositories: HashMap<RepositoryId, usize>,
    people: HashMap<PersonId, usize>,
    files_by_repository: HashMap<RepositoryId, Vec<usize>>,
}

impl DatasetIndex {
    fn build(files: &[File], repositories: &[Repository], people: &[Person]) -> Self {
        let mut index = DatasetIndex::default();
        for (pos, file) in files.iter().enumerate() {
            index.files.insert(file.id, pos);
            if let Some(repository_id) = file.repository_id {
                index
                    .files_by_repository
                    .entry(repository_id)
                    .or_default()
                    .push(pos);
            }
        }
        for (pos, repo) in repositories.iter().enumerate() {
            index.repositories.insert(repo.id, pos);
        }
        for (pos, person) in people.iter().enumerate() {
            index.people.insert(person.id, pos);
        }
        index
    }
}

impl Dataset {
    /// Load a dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ModelError::DataNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(ModelError::Io(e)),
        };
        debug!(path = %path.display(), bytes = content.len(), "loading dataset");
        Dataset::from_json(&content)
    }

    /// Parse a dataset from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let document: DatasetDocument = serde_json::from_str(json)?;
        Dataset::from_records(
            document.projects,
            document.files,
            document.repositories,
            document.people,
        )
    }

    /// Assemble a dataset from already-parsed records.
    pub fn from_records(
        project_records: Vec<ProjectRecord>,
        files: Vec<File>,
        repositories: Vec<Repository>,
        people: Vec<Person>,
    ) -> Result<Self, ModelError> {
        let projects = build_projects(&project_records)?;

        ensure_unique("repository", repositories.iter().map(|r| r.id.0))?;
        ensure_unique("person", people.iter().map(|p| p.id.0))?;
        ensure_unique("file", files.iter().map(|f| f.id.0))?;

        let repo_ids: HashSet<RepositoryId> = repositories.iter().map(|r| r.id).collect();
        for file in &files {
            if let Some(project_id) = file.project_id {
                if projects.get_by_id(project_id).is_none() {
                    return Err(ModelError::UnknownReference {
                        kind: "project",
                        id: project_id.0,
                    });
                }
            }
            if let Some(repository_id) = file.repository_id {
                if !repo_ids.contains(&repository_id) {
                    return Err(ModelError::UnknownReference {
                        kind: "repository",
                        id: repository_id.0,
                    });
                }
            }
        }

        let file_ids: HashSet<FileId> = files.iter().map(|f| f.id).collect();
        let person_ids: HashSet<PersonId> = people.iter().map(|p| p.id).collect();
        for repo in &repositories {
            for commit in &repo.commits {
                if commit.file_ids.iter().any(|id| !file_ids.contains(id)) {
                    warn!(repo = %repo.name, commit = %commit.hash, "commit references unknown file");
                }
                if commit.people().iter().any(|id| !person_ids.contains(id)) {
                    warn!(repo = %repo.name, commit = %commit.hash, "commit references unknown person");
                }
            }
        }

        debug!(
            projects = projects.len(),
            files = files.len(),
            repositories = repositories.len(),
            people = people.len(),
            "dataset assembled"
        );

        let index = DatasetIndex::build(&files, &repositories, &people);
        Ok(Dataset {
            projects,
            files,
            repositories,
            people,
            index,
        })
    }

    /// Rebuild the id index from the entity vectors.
    pub fn reindex(&mut self) {
        self.index = DatasetIndex::build(&self.files, &self.repositories, &self.people);
    }

    pub fn file(&self, id: FileId) -> Option<&File> {
        self.index.files.get(&id).and_then(|&pos| self.files.get(pos))
    }

    pub fn repository(&self, id: RepositoryId) -> Option<&Repository> {
        self.index
            .repositories
            .get(&id)
            .and_then(|&pos| self.repositories.get(pos))
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.index.people.get(&id).and_then(|&pos| self.people.get(pos))
    }

    /// Files stored in repository `id`, in document order.
    pub fn repository_files(&self, id: RepositoryId) -> impl Iterator<Item = &File> + '_ {
        self.index
            .files_by_repository
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|&pos| self.files.get(pos))
    }
}

fn build_projects(records: &[ProjectRecord]) -> Result<Projects, ModelError> {
    let mut projects = Projects::new();

    // Explicit ids first so generated ids never collide with them.
    for record in records.iter().filter(|r| r.id.is_some()) {
        if let Some(id) = record.id {
            projects.insert(project_from_record(id, record))?;
        }
    }
    for record in records.iter().filter(|r| r.id.is_none()) {
        if projects.get(&record.name).is_some() {
            return Err(ModelError::DuplicateProject {
                name: record.name.clone(),
            });
        }
        let id = projects.get_or_create(&record.name)?.id;
        if let Some(project) = projects.get_mut(id) {
            *project = project_from_record(id, record);
        }
    }

    for record in records {
        let Some(source) = projects.get(&record.name).map(|p| p.id) else {
            continue;
        };
        for dep in &record.dependencies {
            let target = match projects.get(&dep.target) {
                Some(target) => target.id,
                None => {
                    warn!(
                        source = %record.name,
                        target = %dep.target,
                        "dependency on undeclared project, adding it as an external library"
                    );
                    let target = projects.get_or_create(&dep.target)?;
                    target.project_type = ProjectType::Library;
                    target.id
                }
            };
            let edge = projects.add_dependency(source, target)?;
            edge.versions.extend(dep.versions.iter().cloned());
            edge.data
                .extend(dep.data.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    Ok(projects)
}

fn project_from_record(id: ProjectId, record: &ProjectRecord) -> Project {
    let mut project = Project::new(id, record.name.clone());
    project.groups = record.groups.clone();
    project.project_type = record.project_type;
    project.ignore = record.ignore;
    project.root_dir = record.root_dir.clone();
    project.repository_id = record.repository_id;
    project.data = record.data.clone();
    project
}

fn ensure_unique(kind: &'static str, ids: impl Iterator<Item = u32>) -> Result<(), ModelError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ModelError::DuplicateId { kind, id });
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
