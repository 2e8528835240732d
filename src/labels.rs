use crate::error::{BayesError, Result};
use std::collections::{hash_map::Entry, HashMap};

/// Dense index of a class inside its `LabelSet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub usize);

/// The closed set of class labels a model knows about. The enumeration order
/// is also the tie-break order used by prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
    ids: HashMap<String, ClassId>,
}

impl LabelSet {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = Vec::new();
        let mut ids = HashMap::new();
        for label in labels {
            let label = label.into();
            match ids.entry(label.clone()) {
                Entry::Occupied(_) => {
                    return Err(BayesError::InvalidLabelSet(format!(
                        "duplicate label {:?}",
                        label
                    )))
                }
                Entry::Vacant(entry) => {
                    entry.insert(ClassId(names.len()));
                }
            }
            names.push(label);
        }

        if names.is_empty() {
            return Err(BayesError::InvalidLabelSet("no labels given".to_string()));
        }

        Ok(LabelSet { names, ids })
    }

    pub fn id(&self, label: &str) -> Option<ClassId> {
        self.ids.get(label).copied()
    }

    /// Like `id`, but a missing label is an error.
    pub fn require(&self, label: &str) -> Result<ClassId> {
        self.id(label)
            .ok_or_else(|| BayesError::UnknownLabel(label.to_string()))
    }

    pub fn name(&self, id: ClassId) -> &str {
        &self.names[id.0]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (ClassId(i), name.as_str()))
    }
}
