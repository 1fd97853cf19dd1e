//! Source files tracked by the importers.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FileId, ProjectId, RepositoryId};

/// A source file, optionally owned by a project and a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<RepositoryId>,
    #[serde(default)]
    pub ignore: bool,
}

impl File {
    pub fn new(id: FileId, path: impl Into<String>) -> Self {
        File {
            id,
            path: path.into(),
            project_id: None,
            repository_id: None,
            ignore: false,
        }
    }

    /// Final path component, or the whole path if it has none.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.path)
    }
}
