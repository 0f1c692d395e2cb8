//! Scene arena
//!
//! Flat store of objects keyed by UUID with incrementally maintained
//! parent/children maps, tag-based classification, parametric modifiers,
//! and the property bindings that drive them.

mod object;
mod snapshot;
mod store;
mod tag;

pub use object::{SceneObject, Transform};
pub use snapshot::SceneSnapshot;
pub use tag::{ObjectTag, TagSet};

use std::collections::HashMap;

use cw_cad::{
    Binding, BindingError, BindingSet, Calculator, CalculatorError, EvalReport, ExprError,
    InputValue, ModifierError, PropertyRef, TemplateRegistry, Variable,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::wall::WallLinks;

/// Scene errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("Object not found: {0}")]
    ObjectNotFound(Uuid),
    #[error("Object is not a wall: {0}")]
    NotAWall(Uuid),
    #[error("Object has no parametric modifier: {0}")]
    NoModifier(Uuid),
    #[error("Cannot parent {child} to {parent}: it would create a cycle")]
    InvalidParent { child: Uuid, parent: Uuid },
    #[error("Calculator not found: {0}")]
    CalculatorNotFound(String),
    #[error(transparent)]
    Modifier(#[from] ModifierError),
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Calculator(#[from] CalculatorError),
}

impl SceneError {
    /// A requested input, object or marker is missing.
    ///
    /// Interactive flows skip the optional step on these instead of
    /// aborting the gesture.
    pub fn is_not_available(&self) -> bool {
        matches!(
            self,
            SceneError::ObjectNotFound(_)
                | SceneError::NotAWall(_)
                | SceneError::NoModifier(_)
                | SceneError::CalculatorNotFound(_)
                | SceneError::Modifier(ModifierError::InputNotAvailable { .. })
                | SceneError::Modifier(ModifierError::TemplateNotFound(_))
        )
    }
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Serialization format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SceneData {
    objects: Vec<SceneObject>,
    parents: Vec<(Uuid, Uuid)>,
    bindings: Vec<Binding>,
    wall_links: Vec<(Uuid, Uuid)>,
}

/// Arena of scene objects
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: HashMap<Uuid, SceneObject>,
    /// Child -> parent
    parents: HashMap<Uuid, Uuid>,
    /// Parent -> children, in insertion order
    children: HashMap<Uuid, Vec<Uuid>>,
    bindings: BindingSet,
    templates: TemplateRegistry,
    pub(crate) walls: WallLinks,
    next_sequence: u64,
}

impl From<&Scene> for SceneData {
    fn from(scene: &Scene) -> Self {
        let objects = scene
            .ids()
            .into_iter()
            .filter_map(|id| scene.objects.get(&id).cloned())
            .collect();
        let mut parents: Vec<(Uuid, Uuid)> =
            scene.parents.iter().map(|(c, p)| (*c, *p)).collect();
        parents.sort_by_key(|(child, _)| scene.sequence(*child));
        let mut bindings: Vec<Binding> = scene.bindings.iter().cloned().collect();
        bindings.sort_by(|a, b| a.target.cmp(&b.target));
        Self {
            objects,
            parents,
            bindings,
            wall_links: scene.walls.pairs(),
        }
    }
}

impl From<SceneData> for Scene {
    fn from(data: SceneData) -> Self {
        let mut scene = Scene::new();
        for object in data.objects {
            scene.next_sequence = scene.next_sequence.max(object.created + 1);
            scene.objects.insert(object.id, object);
        }
        for (child, parent) in data.parents {
            if scene.objects.contains_key(&child) && scene.objects.contains_key(&parent) {
                scene.attach(child, parent);
            }
        }
        for binding in data.bindings {
            scene.bindings.insert(binding);
        }
        for (wall, target) in data.wall_links {
            if scene.objects.contains_key(&wall) && scene.objects.contains_key(&target) {
                scene.walls.link(wall, target);
            }
        }
        scene
    }
}

impl Serialize for Scene {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        SceneData::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Scene {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let data = SceneData::deserialize(deserializer)?;
        Ok(Scene::from(data))
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // ============== Objects ==============

    /// Create an empty object
    pub fn create(&mut self, name: impl Into<String>, tags: impl Into<TagSet>) -> Uuid {
        let object = SceneObject::new(name, tags.into(), self.next_sequence);
        self.next_sequence += 1;
        let id = object.id;
        self.objects.insert(id, object);
        id
    }

    /// Create an object carrying an instance of a registered template
    pub fn create_parametric(
        &mut self,
        name: impl Into<String>,
        tags: impl Into<TagSet>,
        template: &str,
    ) -> SceneResult<Uuid> {
        let modifier = self.templates.instantiate(template)?;
        let id = self.create(name, tags);
        if let Some(object) = self.objects.get_mut(&id) {
            object.modifier = Some(modifier);
        }
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    pub(crate) fn object(&self, id: Uuid) -> SceneResult<&SceneObject> {
        self.objects.get(&id).ok_or(SceneError::ObjectNotFound(id))
    }

    pub(crate) fn object_mut(&mut self, id: Uuid) -> SceneResult<&mut SceneObject> {
        self.objects
            .get_mut(&id)
            .ok_or(SceneError::ObjectNotFound(id))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn sequence(&self, id: Uuid) -> u64 {
        self.objects.get(&id).map(|o| o.created).unwrap_or(u64::MAX)
    }

    /// All object IDs in creation order
    pub fn ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.objects.keys().copied().collect();
        ids.sort_by_key(|id| self.sequence(*id));
        ids
    }

    /// Objects carrying `tag`, in creation order
    pub fn objects_with_tag(&self, tag: ObjectTag) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .objects
            .values()
            .filter(|o| o.has_tag(tag))
            .map(|o| o.id)
            .collect();
        ids.sort_by_key(|id| self.sequence(*id));
        ids
    }

    pub fn has_tag(&self, id: Uuid, tag: ObjectTag) -> bool {
        self.objects.get(&id).is_some_and(|o| o.has_tag(tag))
    }

    pub fn add_tag(&mut self, id: Uuid, tag: ObjectTag) -> SceneResult<()> {
        self.object_mut(id)?.tags.insert(tag);
        Ok(())
    }

    pub fn remove_tag(&mut self, id: Uuid, tag: ObjectTag) -> SceneResult<()> {
        self.object_mut(id)?.tags.remove(tag);
        Ok(())
    }

    /// Delete an object and everything parented under it.
    ///
    /// Bindings targeting removed objects and wall links involving them are
    /// dropped too. Returns the removed IDs.
    pub fn delete(&mut self, id: Uuid) -> SceneResult<Vec<Uuid>> {
        if !self.objects.contains_key(&id) {
            return Err(SceneError::ObjectNotFound(id));
        }

        self.detach(id);
        let mut removed = self.descendants(id);
        removed.push(id);

        for &doomed in &removed {
            self.objects.remove(&doomed);
            self.parents.remove(&doomed);
            self.children.remove(&doomed);
            self.bindings.unbind_object(doomed);
            self.walls.forget(doomed);
        }
        for object in self.objects.values_mut() {
            object.cuts.retain(|c| !removed.contains(c));
        }

        debug!("Deleted {} object(s) under {}", removed.len(), id);
        Ok(removed)
    }

    // ============== Hierarchy ==============

    pub fn parent(&self, id: Uuid) -> Option<Uuid> {
        self.parents.get(&id).copied()
    }

    pub fn children(&self, id: Uuid) -> &[Uuid] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Children of `id` carrying `tag`
    pub fn children_with_tag(&self, id: Uuid, tag: ObjectTag) -> Vec<Uuid> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.has_tag(*c, tag))
            .collect()
    }

    /// All objects below `id`, depth first
    pub fn descendants(&self, id: Uuid) -> Vec<Uuid> {
        let mut result = Vec::new();
        let mut stack: Vec<Uuid> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        result
    }

    /// Walk from `id` up through its parents and return the first match
    pub fn find_ancestor<F>(&self, id: Uuid, predicate: F) -> Option<Uuid>
    where
        F: Fn(&SceneObject) -> bool,
    {
        let mut current = Some(id);
        while let Some(candidate) = current {
            let object = self.objects.get(&candidate)?;
            if predicate(object) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    fn attach(&mut self, child: Uuid, parent: Uuid) {
        self.parents.insert(child, parent);
        self.children.entry(parent).or_default().push(child);
    }

    fn detach(&mut self, child: Uuid) {
        if let Some(parent) = self.parents.remove(&child)
            && let Some(siblings) = self.children.get_mut(&parent)
        {
            siblings.retain(|c| *c != child);
            if siblings.is_empty() {
                self.children.remove(&parent);
            }
        }
    }

    /// Reparent an object. With `keep_world` the world transform is preserved,
    /// otherwise the local transform is kept as is.
    pub fn set_parent(
        &mut self,
        child: Uuid,
        parent: Option<Uuid>,
        keep_world: bool,
    ) -> SceneResult<()> {
        self.object(child)?;
        if let Some(parent) = parent {
            self.object(parent)?;
            if parent == child || self.descendants(child).contains(&parent) {
                return Err(SceneError::InvalidParent { child, parent });
            }
        }
        if self.parent(child) == parent {
            return Ok(());
        }

        let world = self.world_transform(child)?;
        self.detach(child);
        if let Some(parent) = parent {
            self.attach(child, parent);
        }

        if keep_world {
            let local = match parent {
                Some(parent) => world.relative_to(&self.world_transform(parent)?),
                None => world,
            };
            self.object_mut(child)?.transform = local;
        }
        Ok(())
    }

    // ============== Transforms ==============

    /// Transform of `id` in world space
    pub fn world_transform(&self, id: Uuid) -> SceneResult<Transform> {
        let mut chain = vec![self.object(id)?.transform];
        let mut current = self.parent(id);
        while let Some(parent) = current {
            chain.push(self.object(parent)?.transform);
            current = self.parent(parent);
        }
        Ok(chain
            .into_iter()
            .rev()
            .fold(Transform::default(), |acc, t| acc.then(&t)))
    }

    /// Express a world-space point in the local frame of `id`
    pub fn to_local(&self, id: Uuid, world_point: Vec3) -> SceneResult<Vec3> {
        Ok(self.world_transform(id)?.inverse_transform_point(world_point))
    }

    pub fn set_location(&mut self, id: Uuid, location: Vec3) -> SceneResult<()> {
        self.object_mut(id)?.transform.location = location;
        Ok(())
    }

    pub fn set_rotation_z(&mut self, id: Uuid, rotation_z: f32) -> SceneResult<()> {
        self.object_mut(id)?.transform.rotation_z = rotation_z;
        Ok(())
    }

    // ============== Inputs & Properties ==============

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn templates_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.templates
    }

    /// Numeric modifier input
    pub fn input(&self, id: Uuid, name: &str) -> SceneResult<f32> {
        let object = self.object(id)?;
        let modifier = object.modifier.as_ref().ok_or(SceneError::NoModifier(id))?;
        Ok(modifier.get_float(name)?)
    }

    pub fn set_input(
        &mut self,
        id: Uuid,
        name: &str,
        value: impl Into<InputValue>,
    ) -> SceneResult<()> {
        let object = self.object_mut(id)?;
        let modifier = object.modifier.as_mut().ok_or(SceneError::NoModifier(id))?;
        modifier.set_input(name, value)?;
        Ok(())
    }

    /// Cage dimensions of an object, if it has them
    pub fn dimensions(&self, id: Uuid) -> Option<Vec3> {
        self.objects.get(&id)?.dimensions()
    }

    pub fn property(&self, id: Uuid, name: &str) -> Option<f32> {
        self.objects.get(&id)?.properties.get(name).copied()
    }

    pub fn set_property(&mut self, id: Uuid, name: &str, value: f32) -> SceneResult<()> {
        self.object_mut(id)?
            .properties
            .insert(name.to_string(), value);
        Ok(())
    }

    pub fn add_calculator(&mut self, id: Uuid, calculator: Calculator) -> SceneResult<()> {
        let object = self.object_mut(id)?;
        object.calculators.retain(|c| c.name != calculator.name);
        object.calculators.push(calculator);
        Ok(())
    }

    pub fn calculator_mut(&mut self, id: Uuid, name: &str) -> SceneResult<&mut Calculator> {
        self.object_mut(id)?
            .calculator_mut(name)
            .ok_or_else(|| SceneError::CalculatorNotFound(name.to_string()))
    }

    /// Record that `cutter` cuts a hole through `target`. Adding the same
    /// cutter twice is a no-op.
    pub fn add_cut(&mut self, target: Uuid, cutter: Uuid) -> SceneResult<()> {
        self.object(cutter)?;
        let object = self.object_mut(target)?;
        if !object.cuts.contains(&cutter) {
            object.cuts.push(cutter);
        }
        Ok(())
    }

    /// Mark an object with a style and request regeneration of its geometry
    pub fn apply_style(&mut self, id: Uuid, style: &str) -> SceneResult<()> {
        let object = self.object_mut(id)?;
        object.style = Some(style.to_string());
        if let Some(modifier) = object.modifier.as_mut() {
            modifier.touch();
        }
        Ok(())
    }

    // ============== Bindings ==============

    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    /// Declare `target = formula(variables)`, replacing any earlier binding
    pub fn bind(
        &mut self,
        target: PropertyRef,
        formula: &str,
        variables: Vec<Variable>,
    ) -> SceneResult<Uuid> {
        self.object(target.object)?;
        Ok(self.bindings.bind(target, formula, variables)?)
    }

    pub fn unbind(&mut self, target: &PropertyRef) -> Option<Binding> {
        self.bindings.unbind(target)
    }

    /// Force re-evaluation of every binding in dependency order, then
    /// re-apply wall follow constraints.
    pub fn recalculate(&mut self) -> SceneResult<EvalReport> {
        let bindings = std::mem::take(&mut self.bindings);
        let result = bindings.evaluate(self);
        self.bindings = bindings;
        let report = result?;
        self.apply_wall_constraints();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_create_and_tags() {
        let mut scene = Scene::new();
        let a = scene.create("A", ObjectTag::Cabinet);
        let b = scene.create("B", [ObjectTag::Cage, ObjectTag::Cabinet]);
        let c = scene.create("C", ObjectTag::Wall);

        assert_eq!(scene.len(), 3);
        assert_eq!(scene.objects_with_tag(ObjectTag::Cabinet), vec![a, b]);
        assert_eq!(scene.ids(), vec![a, b, c]);
        assert!(scene.has_tag(b, ObjectTag::Cage));
    }

    #[test]
    fn test_parenting_keeps_world_transform() {
        let mut scene = Scene::new();
        let wall = scene.create("Wall", ObjectTag::Wall);
        scene.set_location(wall, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        scene.set_rotation_z(wall, FRAC_PI_2).unwrap();

        let cab = scene.create("Cabinet", ObjectTag::Cabinet);
        scene.set_location(cab, Vec3::new(2.0, 1.0, 0.0)).unwrap();
        scene.set_parent(cab, Some(wall), true).unwrap();

        let local = scene.get(cab).unwrap().transform;
        assert_relative_eq!(local.location.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(local.location.y, 0.0, epsilon = 1e-6);

        let world = scene.world_transform(cab).unwrap();
        assert_relative_eq!(world.location.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(world.location.y, 1.0, epsilon = 1e-6);
        assert_eq!(scene.children(wall), &[cab]);
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let mut scene = Scene::new();
        let a = scene.create("A", ObjectTag::Cage);
        let b = scene.create("B", ObjectTag::Cage);
        scene.set_parent(b, Some(a), false).unwrap();
        assert_eq!(
            scene.set_parent(a, Some(b), false),
            Err(SceneError::InvalidParent {
                child: a,
                parent: b
            })
        );
        assert_eq!(
            scene.set_parent(a, Some(a), false),
            Err(SceneError::InvalidParent {
                child: a,
                parent: a
            })
        );
    }

    #[test]
    fn test_delete_is_recursive_and_drops_bindings() {
        let mut scene = Scene::new();
        let cab = scene
            .create_parametric("Cabinet", ObjectTag::Cage, "Cage")
            .unwrap();
        let side = scene
            .create_parametric("Side", ObjectTag::Part, "CutPart")
            .unwrap();
        let screw = scene.create("Screw", ObjectTag::Part);
        scene.set_parent(side, Some(cab), false).unwrap();
        scene.set_parent(screw, Some(side), false).unwrap();
        scene
            .bind(
                PropertyRef::input(side, "Length"),
                "dim_z",
                vec![Variable::new("dim_z", PropertyRef::input(cab, "Dim Z"))],
            )
            .unwrap();

        let removed = scene.delete(cab).unwrap();
        assert_eq!(removed.len(), 3);
        assert!(scene.is_empty());
        assert!(scene.bindings().is_empty());
        assert_eq!(scene.delete(cab), Err(SceneError::ObjectNotFound(cab)));
    }

    #[test]
    fn test_missing_input_is_not_available() {
        let mut scene = Scene::new();
        let cage = scene
            .create_parametric("Cage", ObjectTag::Cage, "Cage")
            .unwrap();
        let err = scene.input(cage, "Length").unwrap_err();
        assert!(err.is_not_available(), "unexpected error: {err}");

        let empty = scene.create("Empty", ObjectTag::Annotation);
        assert_eq!(
            scene.set_input(empty, "Dim X", 1.0),
            Err(SceneError::NoModifier(empty))
        );
    }

    #[test]
    fn test_recalculate_cascades_through_objects() {
        let mut scene = Scene::new();
        let cab = scene
            .create_parametric("Cabinet", ObjectTag::Cage, "Cage")
            .unwrap();
        let bottom = scene
            .create_parametric("Bottom", ObjectTag::Part, "CutPart")
            .unwrap();
        scene.set_property(cab, "Material Thickness", 0.02).unwrap();
        scene
            .bind(
                PropertyRef::input(bottom, "Length"),
                "dim_x-(mt*2)",
                vec![
                    Variable::new("dim_x", PropertyRef::input(cab, "Dim X")),
                    Variable::new("mt", PropertyRef::prop(cab, "Material Thickness")),
                ],
            )
            .unwrap();
        scene
            .bind(
                PropertyRef::location(bottom, 'x'),
                "mt",
                vec![Variable::new(
                    "mt",
                    PropertyRef::prop(cab, "Material Thickness"),
                )],
            )
            .unwrap();

        scene.set_input(cab, "Dim X", 0.6).unwrap();
        let report = scene.recalculate().unwrap();
        assert!(report.is_clean());
        assert_relative_eq!(scene.input(bottom, "Length").unwrap(), 0.56, epsilon = 1e-6);
        assert_relative_eq!(
            scene.get(bottom).unwrap().transform.location.x,
            0.02,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_add_cut_is_idempotent() {
        let mut scene = Scene::new();
        let wall = scene.create("Wall", ObjectTag::Wall);
        let door = scene.create("Door", ObjectTag::Door);
        scene.add_cut(wall, door).unwrap();
        scene.add_cut(wall, door).unwrap();
        assert_eq!(scene.get(wall).unwrap().cuts, vec![door]);

        scene.delete(door).unwrap();
        assert!(scene.get(wall).unwrap().cuts.is_empty());
    }
}
