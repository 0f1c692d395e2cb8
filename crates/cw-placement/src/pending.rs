//! Objects created during an interactive flow and not yet committed.
//!
//! This list is the only record of what a cancel must delete.

use cw_core::{ObjectTag, Scene};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct PendingObjects {
    ids: Vec<Uuid>,
}

impl PendingObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: Uuid) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    /// Stop tracking an object, e.g. once it is confirmed
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.ids.len();
        self.ids.retain(|p| *p != id);
        self.ids.len() != before
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Keep the objects; returns what was pending
    pub fn commit(&mut self) -> Vec<Uuid> {
        std::mem::take(&mut self.ids)
    }

    /// Delete every pending object, newest first. Objects already removed
    /// (for example as children of an earlier one) are skipped. A wall
    /// whose neighbors fail to update is still removed.
    pub fn rollback(&mut self, scene: &mut Scene) -> usize {
        let before = scene.len();
        for id in self.ids.drain(..).rev() {
            if !scene.contains(id) {
                continue;
            }
            let result = if scene.has_tag(id, ObjectTag::Wall) {
                scene.delete_wall(id)
            } else {
                scene.delete(id)
            };
            if let Err(e) = result {
                warn!("Rollback of {} did not complete cleanly: {}", id, e);
                if scene.contains(id) {
                    if let Err(e) = scene.delete(id) {
                        warn!("Failed to remove pending object {}: {}", id, e);
                    }
                }
            }
        }
        let removed = before.saturating_sub(scene.len());
        debug!("Rolled back {} pending object(s)", removed);
        removed
    }
}
