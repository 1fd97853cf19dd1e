//! Compile-only test to verify public API surface.
//!
//! If this file fails to compile, a public re-export was removed.

#![allow(unused_imports)]

// ============================================================================
// Filter Engine
// ============================================================================

use archer_core::filter::{
    eq_ignore_case, external_filter, filter_commits, filter_dependencies, filter_files,
    filter_projects, glob_to_regex, ignore_filter, ignored_commits_filter, ignored_files_filter,
    roots_filter, Classify, CommitFilter, CommitLeaf, CommitPredicate, EdgeFilter, EdgeTable,
    FileFilter, FileLeaf, FilePredicate, FilterError, FilterTree, Leaf, NodePredicate,
    ParseOptions, Policy, ProjectFilter, ProjectFilterSet, ProjectLeaf, StringMatcher, UsageType,
};

// ============================================================================
// Model
// ============================================================================

use archer_core::model::{
    Commit, CommitId, Dataset, Dependency, DependencyRecord, DependencyRef, File, FileId,
    ListMode, ModelError, Person, PersonId, Project, ProjectId, ProjectRecord, ProjectType,
    Projects, Repository, RepositoryId, DEFAULT_DATA_FILE,
};

// ============================================================================
// Front Doors
// ============================================================================

use archer_core::config::{
    CliOverrides, ConfigError, ConfigSource, ConfigValue, ProjectConfig, ResolvedConfig,
    CONFIG_DIR, CONFIG_FILE, ENV_DATA, ENV_KEEP_EXTERNAL, ENV_MAX_DEPTH,
};
use archer_core::error::{ArcherError, OutputErrorCode};
use archer_core::output::{
    emit_response, CheckResponse, CommitInfo, CommitsResponse, DependenciesResponse,
    DependencyInfo, ErrorInfo, ErrorResponse, FileInfo, FilesResponse, PeopleResponse,
    PersonInfo, ProjectInfo, ProjectsResponse, ReposResponse, RepositoryInfo, SCHEMA_VERSION,
};
use archer_core::query::{Query, QueryParams};

// ============================================================================
// Test
// ============================================================================

#[test]
fn api_surface_compiles() {
    let _ = std::any::type_name::<ProjectFilter>();
    let _ = std::any::type_name::<FilterTree<ProjectLeaf>>();
    let _ = std::any::type_name::<Projects>();
    let _ = std::any::type_name::<Dataset>();
    let _ = std::any::type_name::<ArcherError>();
    let _ = std::any::type_name::<ResolvedConfig>();
    let _ = std::any::type_name::<QueryParams>();
    let _ = std::any::type_name::<ErrorResponse>();
}

#[test]
fn schema_version_is_stable() {
    assert_eq!(SCHEMA_VERSION, "1");
}
