//! Project metadata model: the in-memory graph the filter engine runs over.
//!
//! This module provides the entities imported from build tools and version
//! control:
//! - [`Project`] and [`Dependency`]: nodes and edges of the dependency graph,
//!   stored in the [`Projects`] arena
//! - [`File`]: source files, optionally owned by a project and a repository
//! - [`Repository`] and [`Commit`]: version-control history
//! - [`Person`]: commit authors and committers
//!
//! The [`Dataset`] bundles all of them and loads from a JSON document. Entities
//! are populated once (import finished) and then only read; filters never
//! mutate them.

mod dataset;
mod file;
mod person;
mod project;
mod repository;

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use dataset::{
    Dataset, DependencyRecord, ModelError, ProjectRecord, DEFAULT_DATA_FILE,
};
pub use file::File;
pub use person::Person;
pub use project::{Dependency, DependencyRef, ListMode, Project, ProjectType, Projects};
pub use repository::{Commit, Repository};

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ProjectId(pub u32);

impl ProjectId {
    /// Create a new project ID.
    pub fn new(id: u32) -> Self {
        ProjectId(id)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ProjectId)
    }
}

/// Unique identifier for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new file ID.
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FileId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(FileId)
    }
}

/// Unique identifier for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RepositoryId(pub u32);

impl RepositoryId {
    /// Create a new repository ID.
    pub fn new(id: u32) -> Self {
        RepositoryId(id)
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct CommitId(pub u32);

impl CommitId {
    /// Create a new commit ID.
    pub fn new(id: u32) -> Self {
        CommitId(id)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CommitId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(CommitId)
    }
}

/// Unique identifier for a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct PersonId(pub u32);

impl PersonId {
    /// Create a new person ID.
    pub fn new(id: u32) -> Self {
        PersonId(id)
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
