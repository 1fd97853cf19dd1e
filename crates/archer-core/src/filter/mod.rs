//! Filter rules for projects, dependencies, files and commits.
//!
//! A rule is a short string compiled once into an immutable filter. Filters
//! classify an entity as [`UsageType::Include`], [`UsageType::Exclude`] or
//! [`UsageType::DontCare`], then decide whether to keep it.
//!
//! ## Rule syntax
//!
//! - `a | b`: either (checked before `&`)
//! - `a & b`: both
//! - `!a`: negated term
//! - `id:12`: by identifier
//! - `re:^org:.*`: regex, case-insensitive
//! - `*-api`: glob (projects and commits: `*` is any run of characters;
//!   files: `globset` syntax)
//! - `web -2R-> api`: dependency paths (projects only)
//!
//! ## Usage
//!
//! ```
//! use archer_core::filter::{filter_projects, ProjectFilterSet};
//! use archer_core::model::{ListMode, Projects};
//!
//! let mut projects = Projects::new();
//! let web = projects.get_or_create("web").unwrap().id;
//! let core = projects.get_or_create("core").unwrap().id;
//! projects.get_or_create("tools").unwrap();
//! projects.add_dependency(web, core).unwrap();
//!
//! let filter = ProjectFilterSet::new()
//!     .include("web -> core")
//!     .build(&projects)
//!     .unwrap();
//! let kept: Vec<_> = filter_projects(&filter, &projects, ListMode::All)
//!     .iter()
//!     .map(|p| p.name.as_str())
//!     .collect();
//! assert_eq!(kept, vec!["core", "web"]);
//! ```

mod apply;
mod commit;
mod defaults;
mod edge;
mod file;
mod matcher;
mod parser;
mod project;
mod set;
mod tree;
mod usage;

pub use apply::{filter_commits, filter_dependencies, filter_files, filter_projects};
pub use commit::{CommitFilter, CommitLeaf, CommitPredicate};
pub use defaults::{
    external_filter, ignore_filter, ignored_commits_filter, ignored_files_filter, roots_filter,
};
pub use edge::{EdgeFilter, EdgeTable};
pub use file::{FileFilter, FileLeaf, FilePredicate};
pub use matcher::{eq_ignore_case, glob_to_regex, StringMatcher};
pub use parser::{FilterError, ParseOptions};
pub use project::{NodePredicate, ProjectFilter, ProjectLeaf};
pub use set::ProjectFilterSet;
pub use tree::{Classify, FilterTree, Leaf};
pub use usage::{Policy, UsageType};
