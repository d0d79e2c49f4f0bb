//! Skill Library: the category → synonyms reference used to recognize and match skills.
//!
//! Loaded once at startup and shared read-only (`Arc<SkillLibrary>`) across all scoring calls.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;
use tracing::{info, warn};

/// Raised when a skill-library file exists but cannot be used.
#[derive(Debug, Error)]
pub enum SkillLibraryError {
    #[error("Failed to read skill library at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Skill library at {path} is not a JSON object of string arrays: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Immutable mapping of skill categories to their synonym terms, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillLibrary {
    categories: Vec<(String, Vec<String>)>,
    positions: HashMap<String, usize>,
    terms: HashSet<String>,
}

impl SkillLibrary {
    /// A repeated category keeps its first position and its last synonym list.
    pub fn new(entries: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let mut categories: Vec<(String, Vec<String>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (category, synonyms) in entries {
            match positions.get(&category) {
                Some(&i) => categories[i].1 = synonyms,
                None => {
                    positions.insert(category.clone(), categories.len());
                    categories.push((category, synonyms));
                }
            }
        }

        let terms = categories
            .iter()
            .flat_map(|(category, synonyms)| std::iter::once(category).chain(synonyms))
            .cloned()
            .collect();
        Self {
            categories,
            positions,
            terms,
        }
    }

    /// Loads the library from `path`, falling back to the built-in default when the file
    /// does not exist. Nothing is written back.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SkillLibraryError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Skill library file not found, using built-in default");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| SkillLibraryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let malformed = |source| SkillLibraryError::Malformed {
            path: path.to_path_buf(),
            source,
        };
        // serde_json is built with `preserve_order`, so the map iterates in file order.
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&raw).map_err(malformed)?;
        let entries = object
            .into_iter()
            .map(|(category, synonyms)| {
                serde_json::from_value::<Vec<String>>(synonyms).map(|synonyms| (category, synonyms))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(malformed)?;

        let library = Self::new(entries);
        info!(
            path = %path.display(),
            categories = library.categories.len(),
            terms = library.terms.len(),
            "Skill library loaded"
        );
        Ok(library)
    }

    /// Synonyms of `category`, or `None` when `category` is not a category name.
    pub fn synonyms(&self, category: &str) -> Option<&[String]> {
        self.positions
            .get(category)
            .map(|&i| self.categories[i].1.as_slice())
    }

    /// True when `term` is a category name or any category's synonym.
    pub fn recognizes(&self, term: &str) -> bool {
        self.terms.contains(term)
    }
}

impl Default for SkillLibrary {
    fn default() -> Self {
        Self::new(
            [
                ("python", &["django", "flask", "pytorch"][..]),
                ("sql", &["postgresql", "mysql"][..]),
            ]
            .into_iter()
            .map(|(category, synonyms)| {
                (
                    category.to_string(),
                    synonyms.iter().map(|s| s.to_string()).collect(),
                )
            }),
        )
    }
}

/// Serialized as a plain JSON object of string arrays, keys in file order.
impl Serialize for SkillLibrary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (category, synonyms) in &self.categories {
            map.serialize_entry(category, synonyms)?;
        }
        map.end()
    }
}
