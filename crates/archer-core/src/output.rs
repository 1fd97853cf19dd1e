//! JSON output types and serialization for CLI responses.
//!
//! ## Conventions
//!
//! 1. **Status first:** every response starts with `status` (`ok` or `error`)
//! 2. **Versioned:** every response carries `schema_version`
//! 3. **Deterministic:** list order follows the model (projects by name,
//!    files and repositories in dataset order)
//! 4. **Absent vs empty:** optional fields are omitted when not set

use std::io::{self, Write};

use serde::Serialize;

use crate::error::{ArcherError, OutputErrorCode};
use crate::model::{
    Commit, CommitId, DependencyRef, File, FileId, Person, PersonId, Project, ProjectId,
    ProjectType, Repository, RepositoryId,
};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Entity Views
// ============================================================================

/// A project as shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectInfo {
    pub id: ProjectId,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub dependency_count: usize,
}

impl From<&Project> for ProjectInfo {
    fn from(p: &Project) -> Self {
        ProjectInfo {
            id: p.id,
            name: p.name.clone(),
            groups: p.groups.clone(),
            project_type: p.project_type,
            dependency_count: p.dependency_count(),
        }
    }
}

/// A dependency edge, by endpoint names.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyInfo {
    pub source: String,
    pub target: String,
    pub source_id: ProjectId,
    pub target_id: ProjectId,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<String>,
}

impl From<&DependencyRef<'_>> for DependencyInfo {
    fn from(d: &DependencyRef<'_>) -> Self {
        DependencyInfo {
            source: d.source.name.clone(),
            target: d.target.name.clone(),
            source_id: d.source.id,
            target_id: d.target.id,
            versions: d.dependency.versions.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub id: FileId,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<RepositoryId>,
}

impl From<&File> for FileInfo {
    fn from(f: &File) -> Self {
        FileInfo {
            id: f.id,
            path: f.path.clone(),
            project_id: f.project_id,
            repository_id: f.repository_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryInfo {
    pub id: RepositoryId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,
    pub commit_count: usize,
}

impl From<&Repository> for RepositoryInfo {
    fn from(r: &Repository) -> Self {
        RepositoryInfo {
            id: r.id,
            name: r.name.clone(),
            root_dir: r.root_dir.clone(),
            commit_count: r.commits.len(),
        }
    }
}

/// A commit together with the name of its repository.
#[derive(Debug, Clone, Serialize)]
pub struct CommitInfo {
    pub id: CommitId,
    pub repository: String,
    pub hash: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<PersonId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer: Option<PersonId>,
    pub file_count: usize,
}

impl CommitInfo {
    pub fn new(repository: &Repository, commit: &Commit) -> Self {
        CommitInfo {
            id: commit.id,
            repository: repository.name.clone(),
            hash: commit.hash.clone(),
            message: commit.message.clone(),
            authors: commit.author_ids.clone(),
            committer: commit.committer_id,
            file_count: commit.file_ids.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonInfo {
    pub id: PersonId,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
}

impl From<&Person> for PersonInfo {
    fn from(p: &Person) -> Self {
        PersonInfo {
            id: p.id,
            name: p.name.clone(),
            names: p.names.clone(),
            emails: p.emails.clone(),
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// Error details inside an [`ErrorResponse`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// Numeric error code, also the exit code.
    pub code: u8,
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn from_error(err: &ArcherError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();
        let details = match err {
            ArcherError::InvalidArguments { details, .. } => details.clone(),
            ArcherError::InvalidRule { kind, source } => Some(serde_json::json!({
                "kind": kind,
                "fragment": source.fragment(),
            })),
            ArcherError::DataNotFound { path } => Some(serde_json::json!({ "path": path })),
            ArcherError::InvalidDataset { .. } | ArcherError::InternalError { .. } => None,
        };
        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &ArcherError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }

    /// Create an error response with just code and message.
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo {
                code,
                message: message.into(),
                details: None,
            },
        }
    }
}

// ============================================================================
// Listing Responses
// ============================================================================

/// Response for `archer projects`.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectsResponse {
    pub status: String,
    pub schema_version: String,
    pub count: usize,
    pub projects: Vec<ProjectInfo>,
}

impl ProjectsResponse {
    pub fn new(projects: Vec<ProjectInfo>) -> Self {
        ProjectsResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            count: projects.len(),
            projects,
        }
    }
}

/// Response for `archer deps`.
#[derive(Debug, Clone, Serialize)]
pub struct DependenciesResponse {
    pub status: String,
    pub schema_version: String,
    pub count: usize,
    pub dependencies: Vec<DependencyInfo>,
}

impl DependenciesResponse {
    pub fn new(dependencies: Vec<DependencyInfo>) -> Self {
        DependenciesResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            count: dependencies.len(),
            dependencies,
        }
    }
}

/// Response for `archer files`.
#[derive(Debug, Clone, Serialize)]
pub struct FilesResponse {
    pub status: String,
    pub schema_version: String,
    pub count: usize,
    pub files: Vec<FileInfo>,
}

impl FilesResponse {
    pub fn new(files: Vec<FileInfo>) -> Self {
        FilesResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            count: files.len(),
            files,
        }
    }
}

/// Response for `archer repos`.
#[derive(Debug, Clone, Serialize)]
pub struct ReposResponse {
    pub status: String,
    pub schema_version: String,
    pub count: usize,
    pub repositories: Vec<RepositoryInfo>,
}

impl ReposResponse {
    pub fn new(repositories: Vec<RepositoryInfo>) -> Self {
        ReposResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            count: repositories.len(),
            repositories,
        }
    }
}

/// Response for `archer commits`.
#[derive(Debug, Clone, Serialize)]
pub struct CommitsResponse {
    pub status: String,
    pub schema_version: String,
    pub count: usize,
    pub commits: Vec<CommitInfo>,
}

impl CommitsResponse {
    pub fn new(commits: Vec<CommitInfo>) -> Self {
        CommitsResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            count: commits.len(),
            commits,
        }
    }
}

/// Response for `archer people`.
#[derive(Debug, Clone, Serialize)]
pub struct PeopleResponse {
    pub status: String,
    pub schema_version: String,
    pub count: usize,
    pub people: Vec<PersonInfo>,
}

impl PeopleResponse {
    pub fn new(people: Vec<PersonInfo>) -> Self {
        PeopleResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            count: people.len(),
            people,
        }
    }
}

/// Response for `archer check`: the rule parsed.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    pub status: String,
    pub schema_version: String,
    /// Entity kind the rule was parsed for.
    pub kind: String,
    pub rule: String,
    /// Number of leaf terms in the parsed rule.
    pub leaves: usize,
}

impl CheckResponse {
    pub fn new(kind: impl Into<String>, rule: impl Into<String>, leaves: usize) -> Self {
        CheckResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            kind: kind.into(),
            rule: rule.into(),
            leaves,
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterError;
    use crate::model::Projects;

    fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
        let mut buf = Vec::new();
        emit_response(value, &mut buf).unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    mod responses {
        use super::*;

        #[test]
        fn status_comes_first() {
            let mut buf = Vec::new();
            emit_response(&ProjectsResponse::new(vec![]), &mut buf).unwrap();
            let text = String::from_utf8(buf).unwrap();
            assert!(text.trim_start().starts_with("{\n  \"status\": \"ok\""));
            assert!(text.ends_with('\n'));
        }

        #[test]
        fn projects_response_shape() {
            let mut projects = Projects::new();
            let web = projects.get_or_create("web").unwrap().id;
            let core = projects.get_or_create("core").unwrap().id;
            projects.add_dependency(web, core).unwrap();
            let info: Vec<_> = projects
                .list(crate::model::ListMode::All)
                .into_iter()
                .map(ProjectInfo::from)
                .collect();
            let json = to_json(&ProjectsResponse::new(info));
            assert_eq!(json["schema_version"], "1");
            assert_eq!(json["count"], 2);
            assert_eq!(json["projects"][1]["name"], "web");
            assert_eq!(json["projects"][1]["type"], "code");
            assert_eq!(json["projects"][1]["dependency_count"], 1);
            assert!(json["projects"][1].get("groups").is_none());
        }

        #[test]
        fn dependency_info_uses_names() {
            let mut projects = Projects::new();
            let web = projects.get_or_create("web").unwrap().id;
            let core = projects.get_or_create("core").unwrap().id;
            projects
                .add_dependency(web, core)
                .unwrap()
                .versions
                .insert("1.0".to_string());
            let deps: Vec<_> = projects
                .all_dependencies(crate::model::ListMode::All)
                .iter()
                .map(DependencyInfo::from)
                .collect();
            let json = to_json(&DependenciesResponse::new(deps));
            assert_eq!(json["dependencies"][0]["source"], "web");
            assert_eq!(json["dependencies"][0]["target"], "core");
            assert_eq!(json["dependencies"][0]["versions"][0], "1.0");
        }

        #[test]
        fn check_response_shape() {
            let json = to_json(&CheckResponse::new("file", "*.rs | *.toml", 2));
            assert_eq!(json["status"], "ok");
            assert_eq!(json["kind"], "file");
            assert_eq!(json["leaves"], 2);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn rule_error_details_name_the_fragment() {
            let err = ArcherError::invalid_rule(
                "project",
                FilterError::InvalidRegex {
                    pattern: "(".to_string(),
                    message: "unclosed group".to_string(),
                },
            );
            let json = to_json(&ErrorResponse::from_error(&err));
            assert_eq!(json["status"], "error");
            assert_eq!(json["error"]["code"], 2);
            assert_eq!(json["error"]["details"]["kind"], "project");
            assert_eq!(json["error"]["details"]["fragment"], "(");
        }

        #[test]
        fn internal_error_has_no_details() {
            let json = to_json(&ErrorResponse::from_error(&ArcherError::internal("boom")));
            assert_eq!(json["error"]["code"], 10);
            assert!(json["error"].get("details").is_none());
        }

        #[test]
        fn plain_error_response() {
            let json = to_json(&ErrorResponse::new(2, "bad flag"));
            assert_eq!(json["error"]["message"], "bad flag");
        }
    }
}
