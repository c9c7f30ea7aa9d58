use crate::{cb_error::CbError, scene::SceneProvider};
use ahash::{HashMap, HashMapExt};
use log::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyEntry {
    pub name: String,
    /// Empty for the root
    pub parent_name: String,
    /// Node handle in the scene provider
    pub node: usize,
}

/// Flattened scene graph in depth first pre-order, root first
#[derive(Clone, Debug, Default)]
pub struct Hierarchy {
    entries: Vec<HierarchyEntry>,
    by_name: HashMap<String, usize>,
}

/// Recursive pre-order traversal
fn traverse<S: SceneProvider + ?Sized>(
    scene: &S,
    node: usize,
    parent_name: &str,
    entries: &mut Vec<HierarchyEntry>,
) {
    let name = scene.node_name(node).to_string();
    debug!("{:?} parent={:?}", name, parent_name);
    entries.push(HierarchyEntry {
        name: name.clone(),
        parent_name: parent_name.to_string(),
        node,
    });
    for &child in scene.children(node) {
        traverse(scene, child, &name, entries);
    }
}

impl Hierarchy {
    /// Walks the scene from its root. The graph is trusted to be acyclic.
    #[must_use]
    pub fn build<S: SceneProvider + ?Sized>(scene: &S) -> Self {
        let mut entries = Vec::new();
        traverse(scene, scene.root(), "", &mut entries);

        // First occurrence wins if names are not unique
        let mut by_name = HashMap::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            by_name.entry(e.name.clone()).or_insert(i);
        }
        info!("Hierarchy nodes={}", entries.len());
        Self { entries, by_name }
    }

    #[must_use]
    pub fn entries(&self) -> &[HierarchyEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the entry named `name`
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Finds the entry for a bone
    ///
    /// # Errors
    /// Returns `CbError::BoneNotInHierarchy` if no node has this name
    pub fn lookup(&self, name: &str) -> Result<&HierarchyEntry, CbError> {
        self.index_of(name)
            .and_then(|i| self.entries.get(i))
            .ok_or_else(|| CbError::BoneNotInHierarchy(name.to_string()))
    }
}
