//! Parametric layer for casework modeling
//!
//! This crate provides:
//! - A small formula language (arithmetic, comparisons, `IF`/`AND`/`OR`)
//! - Property bindings with dependency-ordered re-evaluation
//! - Calculators that split a total across equal and fixed prompts
//! - Parametric modifier templates with named inputs

pub mod binding;
pub mod calculator;
pub mod expr;
pub mod modifier;

mod graph;

// Re-exports for convenience
pub use binding::{
    Binding, BindingError, BindingResult, BindingSet, EvalReport, PropertyRef, PropertyStore,
    SkipReason, SkippedBinding, Variable,
};
pub use calculator::{Calculator, CalculatorError, CalculatorPrompt};
pub use expr::{BinaryOp, Expr, ExprError, ExprResult, Function, UnaryOp};
pub use modifier::{
    InputKind, InputSpec, InputValue, ModifierError, ModifierInstance, ModifierResult,
    ModifierTemplate, TemplateRegistry,
};
