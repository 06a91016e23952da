//! Search paths and libraries declared by a patch.

use serde::{Deserialize, Serialize};

/// The `declare` statement of a patch: ordered `-path` and `-lib` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependencies {
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default)]
    libs: Vec<String>,
}

impl Dependencies {
    pub fn new(paths: Vec<String>, libs: Vec<String>) -> Self {
        Self { paths, libs }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn libs(&self) -> &[String] {
        &self.libs
    }

    pub fn add_path(&mut self, path: impl Into<String>) {
        self.paths.push(path.into());
    }

    pub fn add_lib(&mut self, lib: impl Into<String>) {
        self.libs.push(lib.into());
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.libs.is_empty()
    }

    /// Append the entries of `other`, keeping declaration order.
    pub fn merge(&mut self, other: Dependencies) {
        self.paths.extend(other.paths);
        self.libs.extend(other.libs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_order() {
        let mut deps = Dependencies::new(vec!["abs".into()], vec![]);
        deps.merge(Dependencies::new(vec!["lib/x".into()], vec!["zexy".into()]));

        assert_eq!(deps.paths(), ["abs", "lib/x"]);
        assert_eq!(deps.libs(), ["zexy"]);
        assert!(!deps.is_empty());
        assert!(Dependencies::default().is_empty());
    }
}
