//! Subtree snapshots
//!
//! A snapshot captures an object, its descendants and the bindings that
//! target them so the group can be stored and instantiated again with
//! fresh IDs.

use std::collections::HashMap;

use cw_cad::{Binding, PropertyRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Scene, SceneObject, SceneResult};

/// Serializable copy of a subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub root: Uuid,
    pub objects: Vec<SceneObject>,
    pub parents: Vec<(Uuid, Uuid)>,
    pub bindings: Vec<Binding>,
}

impl SceneSnapshot {
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl Scene {
    /// Capture `root` and everything below it
    pub fn snapshot(&self, root: Uuid) -> SceneResult<SceneSnapshot> {
        let mut ids = vec![root];
        ids.extend(self.descendants(root));

        let mut objects = Vec::with_capacity(ids.len());
        for id in &ids {
            objects.push(self.object(*id)?.clone());
        }
        let parents = ids
            .iter()
            .skip(1)
            .filter_map(|id| self.parent(*id).map(|p| (*id, p)))
            .collect();
        let mut bindings: Vec<Binding> = self
            .bindings()
            .iter()
            .filter(|b| ids.contains(&b.target.object))
            .cloned()
            .collect();
        bindings.sort_by(|a, b| a.target.cmp(&b.target));

        Ok(SceneSnapshot {
            root,
            objects,
            parents,
            bindings,
        })
    }

    /// Recreate a snapshot with new IDs, optionally under `parent`.
    /// Returns the new root ID.
    pub fn instantiate(
        &mut self,
        snapshot: &SceneSnapshot,
        parent: Option<Uuid>,
    ) -> SceneResult<Uuid> {
        if let Some(parent) = parent {
            self.object(parent)?;
        }

        let remap: HashMap<Uuid, Uuid> = snapshot
            .objects
            .iter()
            .map(|o| (o.id, Uuid::new_v4()))
            .collect();
        let map_id = |id: Uuid| remap.get(&id).copied().unwrap_or(id);
        let map_ref = |p: &PropertyRef| PropertyRef::new(map_id(p.object), p.path.clone());

        for object in &snapshot.objects {
            let mut copy = object.clone();
            copy.id = map_id(object.id);
            copy.created = self.next_sequence;
            copy.cuts = object.cuts.iter().map(|c| map_id(*c)).collect();
            self.next_sequence += 1;
            self.objects.insert(copy.id, copy);
        }
        for (child, old_parent) in &snapshot.parents {
            self.attach(map_id(*child), map_id(*old_parent));
        }
        for binding in &snapshot.bindings {
            let mut copy = binding.clone();
            copy.id = Uuid::new_v4();
            copy.target = map_ref(&binding.target);
            for variable in &mut copy.variables {
                variable.source = map_ref(&variable.source);
            }
            self.bindings.insert(copy);
        }

        let root = map_id(snapshot.root);
        if let Some(parent) = parent {
            self.attach(root, parent);
        }
        Ok(root)
    }
}
