//! Scene objects and planar transforms

use std::collections::BTreeMap;

use cw_cad::{Calculator, ModifierInstance};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tag::{ObjectTag, TagSet};

/// Location plus rotation about Z (everything here is planar)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub location: Vec3,
    pub rotation_z: f32,
}

impl Transform {
    pub fn new(location: Vec3, rotation_z: f32) -> Self {
        Self {
            location,
            rotation_z,
        }
    }

    pub fn from_location(location: Vec3) -> Self {
        Self::new(location, 0.0)
    }

    /// Local X axis in world space
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.rotation_z)
    }

    /// Map a point from this frame into the parent frame
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        let xy = self.direction().rotate(point.truncate());
        self.location + xy.extend(point.z)
    }

    /// Map a point from the parent frame into this frame
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        let delta = point - self.location;
        Vec2::from_angle(-self.rotation_z)
            .rotate(delta.truncate())
            .extend(delta.z)
    }

    /// Compose with a child transform expressed in this frame
    pub fn then(&self, child: &Transform) -> Transform {
        Transform {
            location: self.transform_point(child.location),
            rotation_z: self.rotation_z + child.rotation_z,
        }
    }

    /// Express this (world) transform relative to `parent` (world)
    pub fn relative_to(&self, parent: &Transform) -> Transform {
        Transform {
            location: parent.inverse_transform_point(self.location),
            rotation_z: self.rotation_z - parent.rotation_z,
        }
    }
}

/// An entity in the scene arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: Uuid,
    pub name: String,
    pub tags: TagSet,
    /// Transform relative to the parent (or world if unparented)
    pub transform: Transform,
    pub modifier: Option<ModifierInstance>,
    /// Custom numeric properties, addressable as `props.<name>`
    pub properties: BTreeMap<String, f32>,
    pub calculators: Vec<Calculator>,
    /// Style last applied to this object
    pub style: Option<String>,
    /// Objects cutting boolean holes into this one (walls only)
    pub cuts: Vec<Uuid>,
    /// Creation sequence number, used for deterministic ordering
    pub(crate) created: u64,
}

impl SceneObject {
    pub(crate) fn new(name: impl Into<String>, tags: TagSet, created: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            tags,
            transform: Transform::default(),
            modifier: None,
            properties: BTreeMap::new(),
            calculators: Vec::new(),
            style: None,
            cuts: Vec::new(),
            created,
        }
    }

    pub fn has_tag(&self, tag: ObjectTag) -> bool {
        self.tags.contains(tag)
    }

    pub fn calculator(&self, name: &str) -> Option<&Calculator> {
        self.calculators.iter().find(|c| c.name == name)
    }

    pub fn calculator_mut(&mut self, name: &str) -> Option<&mut Calculator> {
        self.calculators.iter_mut().find(|c| c.name == name)
    }

    /// Numeric modifier input, if the object has one with that name
    pub fn input(&self, name: &str) -> Option<f32> {
        self.modifier.as_ref()?.get_float(name).ok()
    }

    /// Cage dimensions (`Dim X`, `Dim Y`, `Dim Z`)
    pub fn dimensions(&self) -> Option<Vec3> {
        Some(Vec3::new(
            self.input("Dim X")?,
            self.input("Dim Y")?,
            self.input("Dim Z")?,
        ))
    }
}
