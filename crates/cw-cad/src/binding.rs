//! Property Bindings
//!
//! A binding declares that one numeric property of an object equals a
//! formula over named variables, each variable being another property of
//! some object. Bindings are only declarations: values are produced when
//! [`BindingSet::evaluate`] runs them in dependency order against a
//! [`PropertyStore`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::expr::{Expr, ExprError, ExprResult};
use crate::graph::DependencyGraph;

/// Address of a numeric property on an object
///
/// Paths are dotted strings such as `location.x`, `rotation.z`,
/// `inputs.Dim X` or `props.Toe Kick Height`; the store decides which
/// paths it understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyRef {
    pub object: Uuid,
    pub path: String,
}

impl PropertyRef {
    pub fn new(object: Uuid, path: impl Into<String>) -> Self {
        Self {
            object,
            path: path.into(),
        }
    }

    /// Parametric modifier input, e.g. `inputs.Length`
    pub fn input(object: Uuid, name: &str) -> Self {
        Self::new(object, format!("inputs.{}", name))
    }

    /// Custom numeric property, e.g. `props.Material Thickness`
    pub fn prop(object: Uuid, name: &str) -> Self {
        Self::new(object, format!("props.{}", name))
    }

    /// Location component (`x`, `y` or `z`)
    pub fn location(object: Uuid, axis: char) -> Self {
        Self::new(object, format!("location.{}", axis))
    }

    /// Z rotation
    pub fn rotation_z(object: Uuid) -> Self {
        Self::new(object, "rotation.z")
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.object, self.path)
    }
}

/// A named formula variable and the property it reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub source: PropertyRef,
}

impl Variable {
    pub fn new(name: impl Into<String>, source: PropertyRef) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Target property, formula and its variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub id: Uuid,
    pub target: PropertyRef,
    pub formula: String,
    pub expr: Expr,
    pub variables: Vec<Variable>,
}

impl Binding {
    /// Parse `formula` and check every name it uses is declared in `variables`
    pub fn new(
        target: PropertyRef,
        formula: impl Into<String>,
        variables: Vec<Variable>,
    ) -> ExprResult<Self> {
        let formula = formula.into();
        let expr = Expr::parse(&formula)?;
        for name in expr.variables() {
            if !variables.iter().any(|v| v.name == name) {
                return Err(ExprError::UnknownVariable(name.to_string()));
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            target,
            formula,
            expr,
            variables,
        })
    }

    /// Source properties this binding reads
    pub fn sources(&self) -> impl Iterator<Item = &PropertyRef> {
        self.variables.iter().map(|v| &v.source)
    }

    /// Evaluate against a store without writing the result
    pub fn evaluate(&self, store: &impl PropertyStore) -> Result<f32, SkipReason> {
        let mut values = HashMap::with_capacity(self.variables.len());
        for variable in &self.variables {
            match store.get_property(&variable.source) {
                Some(value) => {
                    values.insert(variable.name.as_str(), value);
                }
                None => return Err(SkipReason::Unresolved(variable.name.clone())),
            }
        }
        self.expr
            .eval(&|name: &str| values.get(name).copied())
            .map_err(SkipReason::Evaluation)
    }
}

/// Something that owns numeric properties bindings can read and write
pub trait PropertyStore {
    /// Current value, or None if the property does not resolve
    fn get_property(&self, property: &PropertyRef) -> Option<f32>;

    /// Write a value. Returns false if the property does not accept it.
    fn set_property(&mut self, property: &PropertyRef, value: f32) -> bool;

    /// Properties whose value implicitly feeds `property` inside the store.
    ///
    /// Used for derived values (such as calculator prompts driven by their
    /// total) so evaluation order accounts for them.
    fn implicit_sources(&self, _property: &PropertyRef) -> Vec<PropertyRef> {
        Vec::new()
    }
}

impl PropertyStore for HashMap<PropertyRef, f32> {
    fn get_property(&self, property: &PropertyRef) -> Option<f32> {
        self.get(property).copied()
    }

    fn set_property(&mut self, property: &PropertyRef, value: f32) -> bool {
        self.insert(property.clone(), value);
        true
    }
}

/// Why a binding produced no value during an evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// A variable's source property does not resolve
    Unresolved(String),
    /// The formula failed, e.g. division by zero
    Evaluation(ExprError),
    /// The store refused the target property
    TargetUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unresolved(name) => write!(f, "variable '{}' does not resolve", name),
            SkipReason::Evaluation(err) => write!(f, "{}", err),
            SkipReason::TargetUnavailable => f.write_str("target property is not available"),
        }
    }
}

/// A binding that was left inert during an evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBinding {
    pub target: PropertyRef,
    pub reason: SkipReason,
}

/// Outcome of one evaluation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalReport {
    /// Targets written, in evaluation order
    pub updated: Vec<PropertyRef>,
    /// Bindings that produced nothing; their targets keep the previous value
    pub skipped: Vec<SkippedBinding>,
}

impl EvalReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Binding layer errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    #[error("Binding cycle: {}", format_cycle(.cycle))]
    Cycle { cycle: Vec<PropertyRef> },
}

fn format_cycle(cycle: &[PropertyRef]) -> String {
    cycle
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type for binding operations
pub type BindingResult<T> = Result<T, BindingError>;

/// All declared bindings, one per target property
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindingSet {
    bindings: HashMap<PropertyRef, Binding>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a binding. A previous binding on the same target is replaced.
    pub fn bind(
        &mut self,
        target: PropertyRef,
        formula: &str,
        variables: Vec<Variable>,
    ) -> ExprResult<Uuid> {
        let binding = Binding::new(target, formula, variables)?;
        Ok(self.insert(binding))
    }

    /// Insert an already-built binding, replacing any on the same target
    pub fn insert(&mut self, binding: Binding) -> Uuid {
        let id = binding.id;
        debug!("Bind {} = {}", binding.target, binding.formula);
        self.bindings.insert(binding.target.clone(), binding);
        id
    }

    pub fn unbind(&mut self, target: &PropertyRef) -> Option<Binding> {
        self.bindings.remove(target)
    }

    /// Remove every binding whose target lives on `object`
    pub fn unbind_object(&mut self, object: Uuid) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|target, _| target.object != object);
        before - self.bindings.len()
    }

    pub fn get(&self, target: &PropertyRef) -> Option<&Binding> {
        self.bindings.get(target)
    }

    /// Bindings targeting properties of `object`
    pub fn bindings_for(&self, object: Uuid) -> Vec<&Binding> {
        let mut found: Vec<&Binding> = self
            .bindings
            .values()
            .filter(|b| b.target.object == object)
            .collect();
        found.sort_by(|a, b| a.target.cmp(&b.target));
        found
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Targets in an order where every binding runs after the bindings it reads
    pub fn evaluation_order(&self, store: &impl PropertyStore) -> BindingResult<Vec<PropertyRef>> {
        DependencyGraph::build(self, store).sort()
    }

    /// Evaluate every binding in dependency order and write the results.
    ///
    /// Bindings whose variables do not resolve are left inert: their target
    /// is not touched and they are listed in [`EvalReport::skipped`].
    pub fn evaluate(&self, store: &mut impl PropertyStore) -> BindingResult<EvalReport> {
        let order = self.evaluation_order(store)?;
        let mut report = EvalReport::default();

        for target in order {
            let Some(binding) = self.bindings.get(&target) else {
                continue;
            };
            let result = binding.evaluate(store).and_then(|value| {
                if store.set_property(&target, value) {
                    Ok(())
                } else {
                    Err(SkipReason::TargetUnavailable)
                }
            });
            match result {
                Ok(()) => report.updated.push(target),
                Err(reason) => {
                    warn!("Binding on {} is inert: {}", target, reason);
                    report.skipped.push(SkippedBinding { target, reason });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn store_with(values: &[(&PropertyRef, f32)]) -> HashMap<PropertyRef, f32> {
        values.iter().map(|(p, v)| ((*p).clone(), *v)).collect()
    }

    #[test]
    fn test_bind_rejects_undeclared_variable() {
        let mut set = BindingSet::new();
        let target = PropertyRef::input(Uuid::new_v4(), "Length");
        let result = set.bind(target, "dim_x - mt", vec![]);
        assert!(matches!(result, Err(ExprError::UnknownVariable(_))));
        assert!(set.is_empty());
    }

    #[test]
    fn test_rebind_replaces() {
        let mut set = BindingSet::new();
        let obj = Uuid::new_v4();
        let source = PropertyRef::input(obj, "Dim X");
        let target = PropertyRef::input(obj, "Width");

        set.bind(target.clone(), "w", vec![Variable::new("w", source.clone())])
            .unwrap();
        set.bind(target.clone(), "w * 2", vec![Variable::new("w", source.clone())])
            .unwrap();
        assert_eq!(set.len(), 1);

        let mut store = store_with(&[(&source, 3.0)]);
        set.evaluate(&mut store).unwrap();
        assert_eq!(store[&target], 6.0);
    }

    #[test]
    fn test_cascading_evaluation_order() {
        // cabinet width -> bottom length -> bottom location
        let cabinet = Uuid::new_v4();
        let bottom = Uuid::new_v4();
        let dim_x = PropertyRef::input(cabinet, "Dim X");
        let mt = PropertyRef::prop(cabinet, "Material Thickness");
        let bottom_len = PropertyRef::input(bottom, "Length");
        let bottom_half = PropertyRef::prop(bottom, "Half");

        let mut set = BindingSet::new();
        // Declared out of order on purpose
        set.bind(
            bottom_half.clone(),
            "len / 2",
            vec![Variable::new("len", bottom_len.clone())],
        )
        .unwrap();
        set.bind(
            bottom_len.clone(),
            "dim_x-(mt*2)",
            vec![
                Variable::new("dim_x", dim_x.clone()),
                Variable::new("mt", mt.clone()),
            ],
        )
        .unwrap();

        let mut store = store_with(&[(&dim_x, 1.0), (&mt, 0.1)]);
        let report = set.evaluate(&mut store).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.updated, vec![bottom_len.clone(), bottom_half.clone()]);
        assert_relative_eq!(store[&bottom_len], 0.8, epsilon = 1e-6);
        assert_relative_eq!(store[&bottom_half], 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_unresolved_variable_leaves_binding_inert() {
        let obj = Uuid::new_v4();
        let target = PropertyRef::location(obj, 'x');
        let missing = PropertyRef::input(Uuid::new_v4(), "Length");

        let mut set = BindingSet::new();
        set.bind(target.clone(), "length", vec![Variable::new("length", missing)])
            .unwrap();

        let mut store = store_with(&[(&target, 1.25)]);
        let report = set.evaluate(&mut store).unwrap();

        assert!(report.updated.is_empty());
        assert_eq!(
            report.skipped,
            vec![SkippedBinding {
                target: target.clone(),
                reason: SkipReason::Unresolved("length".into()),
            }]
        );
        // No silent default: the old value survives
        assert_eq!(store[&target], 1.25);
    }

    #[test]
    fn test_cycle_is_reported() {
        let obj = Uuid::new_v4();
        let a = PropertyRef::prop(obj, "a");
        let b = PropertyRef::prop(obj, "b");

        let mut set = BindingSet::new();
        set.bind(a.clone(), "b + 1", vec![Variable::new("b", b.clone())])
            .unwrap();
        set.bind(b.clone(), "a + 1", vec![Variable::new("a", a.clone())])
            .unwrap();

        let mut store = store_with(&[(&a, 0.0), (&b, 0.0)]);
        let err = set.evaluate(&mut store).unwrap_err();
        let BindingError::Cycle { cycle } = err;
        assert!(cycle.contains(&a) && cycle.contains(&b), "cycle: {:?}", cycle);
    }

    #[test]
    fn test_unbind_object() {
        let obj = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut set = BindingSet::new();
        set.bind(PropertyRef::prop(obj, "a"), "1", vec![]).unwrap();
        set.bind(PropertyRef::prop(obj, "b"), "2", vec![]).unwrap();
        set.bind(PropertyRef::prop(other, "a"), "3", vec![]).unwrap();

        assert_eq!(set.unbind_object(obj), 2);
        assert_eq!(set.len(), 1);
        assert!(set.bindings_for(obj).is_empty());
    }
}
