//! The working set of changed files that travels through the chain.

use std::collections::HashSet;

/// Ordered, duplicate-free list of changed file paths.
///
/// Paths are relative to the working directory when they live under it,
/// absolute otherwise. Order is discovery order and is preserved by every
/// operation, so handlers see files in a reproducible sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFileSet {
    files: Vec<String>,
}

impl ChangedFileSet {
    /// Build a set, keeping the first occurrence of each path.
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        files.into_iter().map(Into::into).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.files
    }

    /// Split into `(remaining, claimed)`.
    ///
    /// `claim` is called once per file in order; files for which it returns
    /// `true` move to the claimed list.
    pub fn partition(self, mut claim: impl FnMut(&str) -> bool) -> (ChangedFileSet, Vec<String>) {
        let mut remaining = Vec::with_capacity(self.files.len());
        let mut claimed = Vec::new();

        for file in self.files {
            if claim(&file) {
                claimed.push(file);
            } else {
                remaining.push(file);
            }
        }

        (ChangedFileSet { files: remaining }, claimed)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.files
    }
}

impl FromIterator<String> for ChangedFileSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let mut seen = HashSet::new();
        let files = iter
            .into_iter()
            .filter(|f| seen.insert(f.clone()))
            .collect();
        Self { files }
    }
}

impl<'a> IntoIterator for &'a ChangedFileSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
