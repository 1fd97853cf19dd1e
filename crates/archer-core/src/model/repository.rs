//! Version-control repositories and their commits.

use serde::{Deserialize, Serialize};

use super::{CommitId, FileId, PersonId, RepositoryId};

/// A repository with its imported history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<Commit>,
}

impl Repository {
    pub fn new(id: RepositoryId, name: impl Into<String>) -> Self {
        Repository {
            id,
            name: name.into(),
            root_dir: None,
            ignore: false,
            commits: Vec::new(),
        }
    }
}

/// A single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub hash: String,
    #[serde(default)]
    pub message: String,
    /// Parent commit hashes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author_ids: Vec<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer_id: Option<PersonId>,
    /// Files touched by this commit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<FileId>,
    #[serde(default)]
    pub ignore: bool,
}

impl Commit {
    pub fn new(id: CommitId, hash: impl Into<String>) -> Self {
        Commit {
            id,
            hash: hash.into(),
            message: String::new(),
            parents: Vec::new(),
            author_ids: Vec::new(),
            committer_id: None,
            file_ids: Vec::new(),
            ignore: false,
        }
    }

    /// Authors and committer, without duplicates.
    pub fn people(&self) -> Vec<PersonId> {
        let mut result = self.author_ids.clone();
        if let Some(committer) = self.committer_id {
            if !result.contains(&committer) {
                result.push(committer);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn people_merges_committer_once() {
        let mut c = Commit::new(CommitId::new(1), "abc123");
        c.author_ids = vec![PersonId::new(1), PersonId::new(2)];
        c.committer_id = Some(PersonId::new(2));
        assert_eq!(c.people(), vec![PersonId::new(1), PersonId::new(2)]);

        c.committer_id = Some(PersonId::new(3));
        assert_eq!(c.people().len(), 3);
    }

    #[test]
    fn commit_deserializes_with_defaults() {
        let c: Commit = serde_json::from_str(r#"{"id": 1, "hash": "deadbeef"}"#).unwrap();
        assert!(c.parents.is_empty());
        assert_eq!(c.committer_id, None);
    }
}
