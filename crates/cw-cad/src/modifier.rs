//! Parametric Modifier Templates
//!
//! A template names a procedural generator and the inputs it exposes.
//! Objects carry a [`ModifierInstance`] holding current input values; the
//! generated geometry is produced elsewhere and only needs to know that an
//! input changed (tracked by the instance revision).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Modifier errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModifierError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Input '{input}' is not available on template '{template}'")]
    InputNotAvailable { template: String, input: String },
    #[error("Input '{input}' expects a {expected:?} value")]
    KindMismatch { input: String, expected: InputKind },
}

/// Result type for modifier operations
pub type ModifierResult<T> = Result<T, ModifierError>;

/// Kind of a template input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    Float,
    Int,
    Bool,
    Material,
}

/// Value of a template input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Material(Option<String>),
}

impl InputValue {
    pub fn kind(&self) -> InputKind {
        match self {
            InputValue::Float(_) => InputKind::Float,
            InputValue::Int(_) => InputKind::Int,
            InputValue::Bool(_) => InputKind::Bool,
            InputValue::Material(_) => InputKind::Material,
        }
    }

    /// Numeric view used by bindings (booleans are 0/1)
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            InputValue::Float(v) => Some(*v),
            InputValue::Int(v) => Some(*v as f32),
            InputValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            InputValue::Material(_) => None,
        }
    }
}

impl From<f32> for InputValue {
    fn from(value: f32) -> Self {
        InputValue::Float(value)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        InputValue::Bool(value)
    }
}

impl From<i32> for InputValue {
    fn from(value: i32) -> Self {
        InputValue::Int(value)
    }
}

/// Declared input of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    pub default: InputValue,
}

impl InputSpec {
    pub fn kind(&self) -> InputKind {
        self.default.kind()
    }
}

/// Named procedural template and its inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierTemplate {
    pub name: String,
    pub inputs: Vec<InputSpec>,
}

impl ModifierTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, name: &str, default: impl Into<InputValue>) -> Self {
        self.inputs.push(InputSpec {
            name: name.to_string(),
            default: default.into(),
        });
        self
    }

    pub fn with_material(mut self, name: &str) -> Self {
        self.inputs.push(InputSpec {
            name: name.to_string(),
            default: InputValue::Material(None),
        });
        self
    }

    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Straight wall run with mitered end caps
    pub fn wall() -> Self {
        Self::new("Wall")
            .with_input("Length", 0.0)
            .with_input("Thickness", 0.1)
            .with_input("Height", 2.4)
            .with_input("Left Angle", 0.0)
            .with_input("Right Angle", 0.0)
            .with_material("Material")
    }

    /// Bounding envelope of an assembly (cabinet, appliance, opening)
    pub fn cage() -> Self {
        Self::new("Cage")
            .with_input("Dim X", 1.0)
            .with_input("Dim Y", 1.0)
            .with_input("Dim Z", 1.0)
            .with_input("Mirror X", false)
            .with_input("Mirror Y", false)
            .with_input("Mirror Z", false)
    }

    /// Flat panel such as a cabinet side or bottom
    pub fn cut_part() -> Self {
        Self::new("CutPart")
            .with_input("Length", 1.0)
            .with_input("Width", 1.0)
            .with_input("Thickness", 0.019)
            .with_input("Mirror Y", false)
            .with_input("Mirror Z", false)
            .with_material("Material")
    }
}

/// Live input values of a template applied to an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierInstance {
    template: String,
    values: HashMap<String, InputValue>,
    revision: u64,
}

impl ModifierInstance {
    pub fn new(template: &ModifierTemplate) -> Self {
        Self {
            template: template.name.clone(),
            values: template
                .inputs
                .iter()
                .map(|i| (i.name.clone(), i.default.clone()))
                .collect(),
            revision: 0,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Incremented on every input change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Request regeneration without changing inputs
    pub fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn not_available(&self, name: &str) -> ModifierError {
        ModifierError::InputNotAvailable {
            template: self.template.clone(),
            input: name.to_string(),
        }
    }

    pub fn get_input(&self, name: &str) -> ModifierResult<&InputValue> {
        self.values.get(name).ok_or_else(|| self.not_available(name))
    }

    /// Numeric value of an input
    pub fn get_float(&self, name: &str) -> ModifierResult<f32> {
        let value = self.get_input(name)?;
        value.as_f32().ok_or(ModifierError::KindMismatch {
            input: name.to_string(),
            expected: value.kind(),
        })
    }

    /// Set an input, keeping its declared kind
    pub fn set_input(&mut self, name: &str, value: impl Into<InputValue>) -> ModifierResult<()> {
        let value = value.into();
        let not_available = self.not_available(name);
        let slot = self.values.get_mut(name).ok_or(not_available)?;
        if slot.kind() != value.kind() {
            return Err(ModifierError::KindMismatch {
                input: name.to_string(),
                expected: slot.kind(),
            });
        }
        if *slot != value {
            *slot = value;
            self.revision += 1;
        }
        Ok(())
    }

    /// Set a numeric value, converting to the input's kind
    pub fn set_float(&mut self, name: &str, value: f32) -> ModifierResult<()> {
        let kind = self.get_input(name)?.kind();
        match kind {
            InputKind::Float => self.set_input(name, value),
            InputKind::Int => self.set_input(name, value.round() as i32),
            InputKind::Bool => self.set_input(name, value != 0.0),
            InputKind::Material => Err(ModifierError::KindMismatch {
                input: name.to_string(),
                expected: InputKind::Material,
            }),
        }
    }

    pub fn set_material(&mut self, name: &str, material: Option<String>) -> ModifierResult<()> {
        self.set_input(name, InputValue::Material(material))
    }
}

/// Known templates by name
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, ModifierTemplate>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        let mut registry = Self {
            templates: HashMap::new(),
        };
        registry.register(ModifierTemplate::wall());
        registry.register(ModifierTemplate::cage());
        registry.register(ModifierTemplate::cut_part());
        registry
    }
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template: ModifierTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn get(&self, name: &str) -> Option<&ModifierTemplate> {
        self.templates.get(name)
    }

    pub fn instantiate(&self, name: &str) -> ModifierResult<ModifierInstance> {
        self.get(name)
            .map(ModifierInstance::new)
            .ok_or_else(|| ModifierError::TemplateNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_defaults() {
        let registry = TemplateRegistry::new();
        let wall = registry.instantiate("Wall").unwrap();
        assert_eq!(wall.template(), "Wall");
        assert_eq!(wall.get_float("Length").unwrap(), 0.0);
        assert!(wall.has_input("Left Angle"));
    }

    #[test]
    fn test_missing_template() {
        let registry = TemplateRegistry::new();
        assert_eq!(
            registry.instantiate("Sink").unwrap_err(),
            ModifierError::TemplateNotFound("Sink".into())
        );
    }

    #[test]
    fn test_input_not_available() {
        let mut cage = ModifierInstance::new(&ModifierTemplate::cage());
        let err = cage.set_input("Length", 1.0).unwrap_err();
        assert!(
            matches!(err, ModifierError::InputNotAvailable { ref input, .. } if input == "Length"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_revision_tracks_changes() {
        let mut cage = ModifierInstance::new(&ModifierTemplate::cage());
        cage.set_input("Dim X", 0.6).unwrap();
        assert_eq!(cage.revision(), 1);
        // Same value does not bump
        cage.set_input("Dim X", 0.6).unwrap();
        assert_eq!(cage.revision(), 1);
        cage.set_float("Mirror Y", 1.0).unwrap();
        assert_eq!(cage.get_input("Mirror Y").unwrap(), &InputValue::Bool(true));
        assert_eq!(cage.revision(), 2);
    }

    #[test]
    fn test_kind_mismatch() {
        let mut wall = ModifierInstance::new(&ModifierTemplate::wall());
        assert!(matches!(
            wall.set_input("Length", true),
            Err(ModifierError::KindMismatch { .. })
        ));
        assert!(matches!(
            wall.get_float("Material"),
            Err(ModifierError::KindMismatch { .. })
        ));
        wall.set_material("Material", Some("Drywall".into())).unwrap();
    }
}
