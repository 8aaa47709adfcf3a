//! Ordered mapping from class index to diagnostic category name.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Ordered, immutable mapping from class index to class name.
///
/// Fixed at checkpoint-load time and read-only for the lifetime of the
/// process. The index order must match the output order of the classifier's
/// final linear layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRegistry {
    classes: Vec<String>,
}

impl ClassRegistry {
    /// Create a registry from an ordered list of class names.
    ///
    /// Fails if the list is empty or contains duplicate names.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: Vec<String> = names.into_iter().map(Into::into).collect();

        if classes.is_empty() {
            return Err(CoreError::EmptyRegistry);
        }
        for (i, name) in classes.iter().enumerate() {
            if classes[..i].contains(name) {
                return Err(CoreError::DuplicateClass(name.clone()));
            }
        }

        Ok(Self { classes })
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the registry is empty. Always false for a constructed registry.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Look up a class name by index.
    pub fn name(&self, index: usize) -> Result<&str> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(CoreError::IndexOutOfBounds {
                index,
                length: self.classes.len(),
            })
    }

    /// Look up the index of a class name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == name)
    }

    /// Iterate over class names in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// The ordered class names as a slice.
    pub fn names(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_basic() {
        let reg = ClassRegistry::from_names(["glioma", "normal"]).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.name(0).unwrap(), "glioma");
        assert_eq!(reg.name(1).unwrap(), "normal");
        assert_eq!(reg.index_of("normal"), Some(1));
        assert_eq!(reg.index_of("unknown"), None);
    }

    #[test]
    fn test_registry_empty() {
        let result = ClassRegistry::from_names(Vec::<String>::new());
        assert!(matches!(result, Err(CoreError::EmptyRegistry)));
    }

    #[test]
    fn test_registry_duplicate() {
        let result = ClassRegistry::from_names(["glioma", "glioma"]);
        match result {
            Err(CoreError::DuplicateClass(name)) => assert_eq!(name, "glioma"),
            other => panic!("Expected DuplicateClass, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_out_of_bounds() {
        let reg = ClassRegistry::from_names(["glioma", "normal"]).unwrap();
        match reg.name(5) {
            Err(CoreError::IndexOutOfBounds { index, length }) => {
                assert_eq!(index, 5);
                assert_eq!(length, 2);
            }
            other => panic!("Expected IndexOutOfBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_serde() {
        let reg = ClassRegistry::from_names(["glioma", "meningioma", "normal"]).unwrap();
        let json = serde_json::to_string(&reg).unwrap();
        let decoded: ClassRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, reg);
    }
}
