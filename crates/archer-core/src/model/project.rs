//! Projects and the dependency edges between them.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ModelError, ProjectId, RepositoryId};

// ============================================================================
// Project Type
// ============================================================================

/// Kind of project node.
///
/// A [`ProjectType::Library`] is an external dependency supplied by a package
/// manager rather than owned code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectType {
    #[serde(rename = "lib")]
    Library,
    #[default]
    #[serde(rename = "code")]
    Code,
    #[serde(rename = "db")]
    Database,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectType::Library => "lib",
            ProjectType::Code => "code",
            ProjectType::Database => "db",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Project
// ============================================================================

/// A node of the dependency graph.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Hierarchical grouping, outermost first (e.g. `["org", "backend"]`).
    pub groups: Vec<String>,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub ignore: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<RepositoryId>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    /// Outgoing edges keyed by target name.
    #[serde(skip)]
    dependencies: BTreeMap<String, Dependency>,
}

impl Project {
    /// Create a code project with no groups and no dependencies.
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        Project {
            id,
            name: name.into(),
            groups: Vec::new(),
            project_type: ProjectType::Code,
            ignore: false,
            root_dir: None,
            repository_id: None,
            data: BTreeMap::new(),
            dependencies: BTreeMap::new(),
        }
    }

    /// Last `:`-separated segment of the name (`org:lib:core` -> `core`).
    pub fn simple_name(&self) -> &str {
        match self.name.rfind(':') {
            Some(idx) => &self.name[idx + 1..],
            None => &self.name,
        }
    }

    /// Groups joined with `:`.
    pub fn full_group(&self) -> String {
        self.groups.join(":")
    }

    pub fn is_code(&self) -> bool {
        self.project_type == ProjectType::Code
    }

    /// True for third-party packages (`ProjectType::Library`).
    pub fn is_external_dependency(&self) -> bool {
        self.project_type == ProjectType::Library
    }

    /// Number of outgoing dependency edges.
    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Look up an outgoing edge by target name.
    pub fn dependency(&self, target_name: &str) -> Option<&Dependency> {
        self.dependencies.get(target_name)
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ============================================================================
// Dependency
// ============================================================================

/// A directed edge `source -> target` of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub source: ProjectId,
    pub target: ProjectId,
    /// Version strings observed for this edge.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub versions: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl Dependency {
    pub fn new(source: ProjectId, target: ProjectId) -> Self {
        Dependency {
            source,
            target,
            versions: BTreeSet::new(),
            data: BTreeMap::new(),
        }
    }
}

/// A dependency edge with both endpoints resolved.
#[derive(Debug, Clone, Copy)]
pub struct DependencyRef<'a> {
    pub source: &'a Project,
    pub target: &'a Project,
    pub dependency: &'a Dependency,
}

impl DependencyRef<'_> {
    /// `(source, target)` ids of the edge.
    pub fn key(&self) -> (ProjectId, ProjectId) {
        (self.source.id, self.target.id)
    }
}

// ============================================================================
// Projects Arena
// ============================================================================

/// Which projects (or dependency targets) a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    #[default]
    All,
    /// Skip external library projects.
    ExcludeExternal,
}

impl ListMode {
    fn admits(self, project: &Project) -> bool {
        match self {
            ListMode::All => true,
            ListMode::ExcludeExternal => !project.is_external_dependency(),
        }
    }
}

/// The in-memory dependency graph.
///
/// Projects are stored by id (deterministic iteration) with a secondary name
/// index. Edges live inside their source project.
#[derive(Debug, Clone)]
pub struct Projects {
    projects: BTreeMap<ProjectId, Project>,
    by_name: HashMap<String, ProjectId>,
    // Wider than the id so that inserting `u32::MAX` does not wrap.
    next_id: u64,
}

impl Default for Projects {
    fn default() -> Self {
        Projects::new()
    }
}

impl Projects {
    pub fn new() -> Self {
        Projects {
            projects: BTreeMap::new(),
            by_name: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Return the project with this name, creating a code project if missing.
    ///
    /// Fails with [`ModelError::IdOverflow`] when no project id is left.
    pub fn get_or_create(&mut self, name: &str) -> Result<&mut Project, ModelError> {
        let id = match self.by_name.get(name) {
            Some(id) => *id,
            None => {
                let raw = u32::try_from(self.next_id)
                    .map_err(|_| ModelError::IdOverflow { kind: "project" })?;
                let id = ProjectId::new(raw);
                self.next_id += 1;
                self.by_name.insert(name.to_string(), id);
                self.projects.insert(id, Project::new(id, name));
                id
            }
        };
        Ok(self
            .projects
            .entry(id)
            .or_insert_with(|| Project::new(id, name)))
    }

    /// Insert a fully built project, keeping its id.
    pub fn insert(&mut self, project: Project) -> Result<(), ModelError> {
        if self.by_name.contains_key(&project.name) {
            return Err(ModelError::DuplicateProject { name: project.name });
        }
        if self.projects.contains_key(&project.id) {
            return Err(ModelError::DuplicateId {
                kind: "project",
                id: project.id.0,
            });
        }
        self.next_id = self.next_id.max(u64::from(project.id.0) + 1);
        self.by_name.insert(project.name.clone(), project.id);
        self.projects.insert(project.id, project);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Project> {
        self.by_name.get(name).and_then(|id| self.projects.get(id))
    }

    pub fn get_by_id(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn get_mut(&mut self, id: ProjectId) -> Option<&mut Project> {
        self.projects.get_mut(&id)
    }

    /// Add (or return the existing) edge `source -> target`.
    pub fn add_dependency(
        &mut self,
        source: ProjectId,
        target: ProjectId,
    ) -> Result<&mut Dependency, ModelError> {
        let target_name = self
            .projects
            .get(&target)
            .map(|p| p.name.clone())
            .ok_or_else(|| ModelError::UnknownReference {
                kind: "project",
                id: target.0,
            })?;
        let project = self
            .projects
            .get_mut(&source)
            .ok_or_else(|| ModelError::UnknownReference {
                kind: "project",
                id: source.0,
            })?;
        Ok(project
            .dependencies
            .entry(target_name)
            .or_insert_with(|| Dependency::new(source, target)))
    }

    /// Projects admitted by `mode`, in name order.
    pub fn list(&self, mode: ListMode) -> Vec<&Project> {
        let mut result: Vec<&Project> = self
            .projects
            .values()
            .filter(|p| mode.admits(p))
            .collect();
        result.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        result
    }

    /// Outgoing edges of `project` whose targets are admitted by `mode`.
    ///
    /// Code targets come before external ones, then targets are ordered by
    /// name ignoring leading `:`.
    pub fn dependencies<'a>(
        &'a self,
        project: &'a Project,
        mode: ListMode,
    ) -> Vec<DependencyRef<'a>> {
        let mut result: Vec<DependencyRef<'a>> = project
            .dependencies
            .values()
            .filter_map(|dependency| {
                let target = self.projects.get(&dependency.target)?;
                mode.admits(target).then_some(DependencyRef {
                    source: project,
                    target,
                    dependency,
                })
            })
            .collect();
        result.sort_by(|a, b| {
            let ka = (
                a.target.is_external_dependency(),
                a.target.name.trim_start_matches(':'),
            );
            let kb = (
                b.target.is_external_dependency(),
                b.target.name.trim_start_matches(':'),
            );
            ka.cmp(&kb)
        });
        result
    }

    /// Every edge of the graph whose endpoints are admitted by `mode`.
    pub fn all_dependencies(&self, mode: ListMode) -> Vec<DependencyRef<'_>> {
        self.list(mode)
            .into_iter()
            .flat_map(|p| self.dependencies(p, mode))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
