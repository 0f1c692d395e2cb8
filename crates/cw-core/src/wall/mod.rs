//! Wall Graph
//!
//! Walls are scene objects tagged [`ObjectTag::Wall`] carrying the `Wall`
//! template. Each wall owns an end anchor child whose X location is bound to
//! the wall length. A wall may follow the end anchor of one other wall (its
//! left neighbor); the walls following a wall are its right neighbors.

mod chain;
mod miter;

pub use miter::normalize_angle;

use std::collections::{HashMap, HashSet, VecDeque};

use cw_cad::{PropertyRef, Variable};
use glam::{Vec2, Vec3};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::scene::{ObjectTag, Scene, SceneError, SceneResult};

/// Which end of a wall a neighbor attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborSide {
    /// The wall this wall's start follows
    Left,
    /// A wall whose start follows this wall's end
    Right,
}

/// Face of a wall an attached object sits against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WallFace {
    /// Local y = 0 side
    #[default]
    Front,
    /// Local y = thickness side
    Back,
}

impl WallFace {
    pub fn name(&self) -> &'static str {
        match self {
            WallFace::Front => "Front",
            WallFace::Back => "Back",
        }
    }
}

/// Follow links between walls, with a maintained reverse index
#[derive(Debug, Clone, Default)]
pub(crate) struct WallLinks {
    /// wall -> wall whose end anchor it follows
    left: HashMap<Uuid, Uuid>,
    /// wall -> walls following its end anchor
    followers: HashMap<Uuid, Vec<Uuid>>,
}

impl WallLinks {
    pub fn link(&mut self, wall: Uuid, target: Uuid) {
        self.unlink(wall);
        self.left.insert(wall, target);
        self.followers.entry(target).or_default().push(wall);
    }

    /// Remove the left link of `wall`, returning the old target
    pub fn unlink(&mut self, wall: Uuid) -> Option<Uuid> {
        let target = self.left.remove(&wall)?;
        if let Some(list) = self.followers.get_mut(&target) {
            list.retain(|w| *w != wall);
            if list.is_empty() {
                self.followers.remove(&target);
            }
        }
        Some(target)
    }

    pub fn left_of(&self, wall: Uuid) -> Option<Uuid> {
        self.left.get(&wall).copied()
    }

    pub fn followers_of(&self, wall: Uuid) -> &[Uuid] {
        self.followers.get(&wall).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop every link that involves `id`, from both directions
    pub fn forget(&mut self, id: Uuid) {
        self.unlink(id);
        if let Some(followers) = self.followers.remove(&id) {
            for follower in followers {
                self.left.remove(&follower);
            }
        }
    }

    pub fn pairs(&self) -> Vec<(Uuid, Uuid)> {
        let mut pairs: Vec<(Uuid, Uuid)> = self.left.iter().map(|(w, t)| (*w, *t)).collect();
        pairs.sort();
        pairs
    }
}

/// Geometry of one wall, read from the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallInfo {
    pub id: Uuid,
    pub start: Vec2,
    pub rotation: f32,
    pub length: f32,
    pub thickness: f32,
    pub height: f32,
    pub left_angle: f32,
    pub right_angle: f32,
}

impl WallInfo {
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.rotation)
    }

    pub fn end(&self) -> Vec2 {
        self.start + self.direction() * self.length
    }
}

impl Scene {
    /// Create a wall and its end anchor
    pub fn add_wall(
        &mut self,
        start: Vec2,
        rotation: f32,
        length: f32,
        thickness: f32,
        height: f32,
    ) -> SceneResult<Uuid> {
        let name = format!("Wall {}", self.objects_with_tag(ObjectTag::Wall).len() + 1);
        let wall = self.create_parametric(name, ObjectTag::Wall, "Wall")?;
        self.set_input(wall, "Length", length.max(0.0))?;
        self.set_input(wall, "Thickness", thickness)?;
        self.set_input(wall, "Height", height)?;
        self.set_location(wall, start.extend(0.0))?;
        self.set_rotation_z(wall, rotation)?;

        let anchor = self.create("Wall End", ObjectTag::EndAnchor);
        self.set_parent(anchor, Some(wall), false)?;
        self.set_location(anchor, Vec3::new(length.max(0.0), 0.0, 0.0))?;
        self.bind(
            PropertyRef::location(anchor, 'x'),
            "length",
            vec![Variable::new("length", PropertyRef::input(wall, "Length"))],
        )?;

        debug!("Added wall {} at {:?}, length {}", wall, start, length);
        Ok(wall)
    }

    /// Geometry of a wall
    pub fn wall(&self, id: Uuid) -> SceneResult<WallInfo> {
        let object = self.object(id)?;
        if !object.has_tag(ObjectTag::Wall) {
            return Err(SceneError::NotAWall(id));
        }
        let transform = self.world_transform(id)?;
        Ok(WallInfo {
            id,
            start: transform.location.truncate(),
            rotation: transform.rotation_z,
            length: self.input(id, "Length")?,
            thickness: self.input(id, "Thickness")?,
            height: self.input(id, "Height")?,
            left_angle: self.input(id, "Left Angle")?,
            right_angle: self.input(id, "Right Angle")?,
        })
    }

    pub fn walls(&self) -> Vec<Uuid> {
        self.objects_with_tag(ObjectTag::Wall)
    }

    fn is_wall(&self, id: Uuid) -> bool {
        self.has_tag(id, ObjectTag::Wall)
    }

    /// The anchor marking the end of a wall
    pub fn end_anchor(&self, wall: Uuid) -> Option<Uuid> {
        self.children_with_tag(wall, ObjectTag::EndAnchor)
            .into_iter()
            .next()
    }

    /// Change length and rotation of a wall, then move any walls following it
    pub fn set_wall_geometry(&mut self, wall: Uuid, rotation: f32, length: f32) -> SceneResult<()> {
        if !self.is_wall(wall) {
            return Err(SceneError::NotAWall(wall));
        }
        let length = length.max(0.0);
        self.set_input(wall, "Length", length)?;
        self.set_rotation_z(wall, rotation)?;
        if let Some(anchor) = self.end_anchor(wall) {
            self.set_location(anchor, Vec3::new(length, 0.0, 0.0))?;
        }
        self.apply_wall_constraints();
        Ok(())
    }

    /// Make `wall`'s start follow `target`'s end anchor.
    ///
    /// Does nothing and returns false if `wall` already has a left neighbor
    /// (disconnect it first) or either object is not a wall.
    pub fn connect_walls(&mut self, wall: Uuid, target: Uuid) -> bool {
        if wall == target || !self.is_wall(wall) || !self.is_wall(target) {
            warn!("Cannot connect {} to {}", wall, target);
            return false;
        }
        if self.wall_neighbor(wall, NeighborSide::Left).is_some() {
            debug!("Wall {} already follows another wall", wall);
            return false;
        }
        self.walls.link(wall, target);
        self.apply_wall_constraints();
        debug!("Connected wall {} to end of {}", wall, target);
        true
    }

    /// Remove the left link of `wall`, returning the former neighbor
    pub fn disconnect_wall(&mut self, wall: Uuid) -> Option<Uuid> {
        let target = self.walls.unlink(wall)?;
        debug!("Disconnected wall {} from {}", wall, target);
        Some(target)
    }

    /// Neighbor on one side. Links to objects that no longer exist count as
    /// no neighbor.
    pub fn wall_neighbor(&self, wall: Uuid, side: NeighborSide) -> Option<Uuid> {
        match side {
            NeighborSide::Left => self.walls.left_of(wall).filter(|n| self.is_wall(*n)),
            NeighborSide::Right => self
                .walls
                .followers_of(wall)
                .iter()
                .copied()
                .filter(|n| self.is_wall(*n))
                .min_by_key(|n| self.get(*n).map(|o| o.created)),
        }
    }

    /// Delete a wall, everything attached to it, and every link to it.
    /// Neighbors get their miters recomputed. Returns the removed IDs.
    pub fn delete_wall(&mut self, wall: Uuid) -> SceneResult<Vec<Uuid>> {
        if !self.is_wall(wall) {
            return Err(SceneError::NotAWall(wall));
        }

        let left = self.wall_neighbor(wall, NeighborSide::Left);
        let followers: Vec<Uuid> = self.walls.followers_of(wall).to_vec();

        // Clear both directions before removal so no link can dangle
        self.walls.unlink(wall);
        for follower in &followers {
            self.walls.unlink(*follower);
        }

        let removed = self.delete(wall)?;

        for neighbor in left.into_iter().chain(followers) {
            if self.is_wall(neighbor) {
                self.recompute_miters(neighbor)?;
            }
        }
        info!("Deleted wall {} ({} object(s))", wall, removed.len());
        Ok(removed)
    }

    /// Move every following wall's start onto the end of the wall it follows.
    ///
    /// Walls are visited from chain roots outward so upstream moves are
    /// applied first. In a closed loop the earliest wall stays put.
    pub fn apply_wall_constraints(&mut self) {
        let walls = self.walls();
        let mut visited: HashSet<Uuid> = HashSet::new();
        let mut order = Vec::new();

        let roots = walls
            .iter()
            .copied()
            .filter(|w| self.wall_neighbor(*w, NeighborSide::Left).is_none());
        let cycle_starts = walls.iter().copied();

        for start in roots.chain(cycle_starts).collect::<Vec<_>>() {
            if !visited.insert(start) {
                continue;
            }
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for follower in self.walls.followers_of(current).to_vec() {
                    if self.is_wall(follower) && visited.insert(follower) {
                        order.push(follower);
                        queue.push_back(follower);
                    }
                }
            }
        }

        for wall in order {
            let Some(target) = self.wall_neighbor(wall, NeighborSide::Left) else {
                continue;
            };
            let Ok(end) = self.wall(target).map(|w| w.end()) else {
                continue;
            };
            if let Some(object) = self.get_mut(wall) {
                let z = object.transform.location.z;
                object.transform.location = end.extend(z);
            }
        }
    }
}
