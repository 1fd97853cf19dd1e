//! Running filters over the model.

use std::collections::HashSet;

use super::commit::CommitFilter;
use super::file::FileFilter;
use super::project::ProjectFilter;
use crate::model::{
    Commit, DependencyRef, File, ListMode, Project, ProjectId, Projects, Repository,
};

/// Projects kept by `filter`, in name order.
///
/// A project is kept when the filter keeps it, or when it is an endpoint of a
/// kept dependency. Only projects admitted by `mode` are returned.
pub fn filter_projects<'a>(
    filter: &ProjectFilter,
    projects: &'a Projects,
    mode: ListMode,
) -> Vec<&'a Project> {
    let candidates = projects.list(mode);
    let mut kept: HashSet<ProjectId> = HashSet::new();

    for project in &candidates {
        if filter.keep_project(project) {
            kept.insert(project.id);
        }
        for dep in projects.dependencies(project, ListMode::All) {
            if filter.keep_dependency(&dep) {
                kept.insert(dep.source.id);
                kept.insert(dep.target.id);
            }
        }
    }

    candidates
        .into_iter()
        .filter(|p| kept.contains(&p.id))
        .collect()
}

/// Dependency edges kept by `filter`, among the edges admitted by `mode`.
pub fn filter_dependencies<'a>(
    filter: &ProjectFilter,
    projects: &'a Projects,
    mode: ListMode,
) -> Vec<DependencyRef<'a>> {
    projects
        .all_dependencies(mode)
        .into_iter()
        .filter(|dep| filter.keep_dependency(dep))
        .collect()
}

/// Files kept by `filter`, in input order.
pub fn filter_files<'a, I>(filter: &FileFilter, files: I) -> Vec<&'a File>
where
    I: IntoIterator<Item = &'a File>,
{
    files.into_iter().filter(|f| filter.keep(f)).collect()
}

/// Commits kept by `filter`, paired with their repository.
pub fn filter_commits<'a, I>(
    filter: &CommitFilter,
    repositories: I,
) -> Vec<(&'a Repository, &'a Commit)>
where
    I: IntoIterator<Item = &'a Repository>,
{
    repositories
        .into_iter()
        .flat_map(|repo| repo.commits.iter().map(move |c| (repo, c)))
        .filter(|(_, c)| filter.keep(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Policy, ProjectFilterSet};
    use crate::model::{CommitId, FileId, ProjectType, RepositoryId};

    fn graph() -> Projects {
        let mut projects = Projects::new();
        let web = projects.get_or_create("web").unwrap().id;
        let core = projects.get_or_create("core").unwrap().id;
        let api = projects.get_or_create("api").unwrap().id;
        projects.get_or_create("unrelated").unwrap();
        projects.get_mut(api).unwrap().project_type = ProjectType::Library;
        projects.add_dependency(web, core).unwrap();
        projects.add_dependency(core, api).unwrap();
        projects
    }

    fn names(projects: &[&Project]) -> Vec<String> {
        projects.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn endpoints_of_kept_edges_are_kept() {
        let projects = graph();
        let f = ProjectFilterSet::new()
            .include("web -> api")
            .keep_external(true)
            .build(&projects)
            .unwrap();
        assert_eq!(
            names(&filter_projects(&f, &projects, ListMode::All)),
            vec!["api", "core", "web"]
        );
        let deps: Vec<_> = filter_dependencies(&f, &projects, ListMode::All)
            .iter()
            .map(|d| (d.source.name.clone(), d.target.name.clone()))
            .collect();
        assert_eq!(
            deps,
            vec![
                ("core".to_string(), "api".to_string()),
                ("web".to_string(), "core".to_string())
            ]
        );
    }

    #[test]
    fn list_mode_limits_candidates() {
        let projects = graph();
        let f = ProjectFilter::parse(&projects, "", Policy::Include).unwrap();
        assert_eq!(
            names(&filter_projects(&f, &projects, ListMode::ExcludeExternal)),
            vec!["core", "unrelated", "web"]
        );
        assert_eq!(
            filter_dependencies(&f, &projects, ListMode::ExcludeExternal).len(),
            1
        );
    }

    #[test]
    fn files_keep_input_order() {
        let files = vec![
            File::new(FileId::new(1), "src/b.rs"),
            File::new(FileId::new(2), "README.md"),
            File::new(FileId::new(3), "src/a.rs"),
        ];
        let f = FileFilter::parse("*.rs", Policy::Include).unwrap();
        let kept: Vec<_> = filter_files(&f, &files).iter().map(|f| f.id.0).collect();
        assert_eq!(kept, vec![1, 3]);
    }

    #[test]
    fn commits_are_paired_with_repository() {
        let mut a = Repository::new(RepositoryId::new(1), "a");
        a.commits.push(Commit::new(CommitId::new(1), "aaa111"));
        a.commits.push(Commit::new(CommitId::new(2), "bbb222"));
        let mut b = Repository::new(RepositoryId::new(2), "b");
        b.commits.push(Commit::new(CommitId::new(3), "aaa333"));
        let repos = vec![a, b];

        let f = CommitFilter::parse("aaa*", Policy::Include).unwrap();
        let kept: Vec<_> = filter_commits(&f, &repos)
            .iter()
            .map(|(r, c)| (r.name.clone(), c.id.0))
            .collect();
        assert_eq!(kept, vec![("a".to_string(), 1), ("b".to_string(), 3)]);
    }
}
