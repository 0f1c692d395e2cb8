//! Calculators
//!
//! A calculator splits a total dimension across named prompts. Prompts
//! flagged "equal" share whatever the fixed prompts leave over, so the
//! included prompts always add up to the total.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Calculator errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculatorError {
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),
    #[error("Prompt already exists: {0}")]
    DuplicatePrompt(String),
}

/// One sub-dimension of a calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorPrompt {
    pub name: String,
    value: f32,
    equal: bool,
    include: bool,
}

impl CalculatorPrompt {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: 0.0,
            equal: true,
            include: true,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_equal(&self) -> bool {
        self.equal
    }

    pub fn is_included(&self) -> bool {
        self.include
    }
}

/// Named prompt group summing to a total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculator {
    pub id: Uuid,
    pub name: String,
    total: f32,
    prompts: Vec<CalculatorPrompt>,
}

impl Calculator {
    pub fn new(name: impl Into<String>, total: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            total,
            prompts: Vec::new(),
        }
    }

    /// Builder-style prompt registration; duplicates are ignored
    pub fn with_prompt(mut self, name: &str) -> Self {
        let _ = self.add_prompt(name);
        self
    }

    /// Add an equal, included prompt
    pub fn add_prompt(&mut self, name: &str) -> Result<(), CalculatorError> {
        if self.prompt(name).is_some() {
            return Err(CalculatorError::DuplicatePrompt(name.to_string()));
        }
        self.prompts.push(CalculatorPrompt::new(name));
        self.calculate();
        Ok(())
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn prompts(&self) -> &[CalculatorPrompt] {
        &self.prompts
    }

    pub fn prompt(&self, name: &str) -> Option<&CalculatorPrompt> {
        self.prompts.iter().find(|p| p.name == name)
    }

    fn prompt_mut(&mut self, name: &str) -> Result<&mut CalculatorPrompt, CalculatorError> {
        self.prompts
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| CalculatorError::PromptNotFound(name.to_string()))
    }

    /// Current value of a prompt
    pub fn value(&self, name: &str) -> Option<f32> {
        self.prompt(name).map(|p| p.value)
    }

    pub fn set_total(&mut self, total: f32) {
        self.total = total;
        self.calculate();
    }

    /// Fix a prompt to a user value (clears its equal flag)
    pub fn set_fixed(&mut self, name: &str, value: f32) -> Result<(), CalculatorError> {
        let prompt = self.prompt_mut(name)?;
        prompt.equal = false;
        prompt.value = value;
        self.calculate();
        Ok(())
    }

    pub fn set_equal(&mut self, name: &str, equal: bool) -> Result<(), CalculatorError> {
        self.prompt_mut(name)?.equal = equal;
        self.calculate();
        Ok(())
    }

    pub fn set_include(&mut self, name: &str, include: bool) -> Result<(), CalculatorError> {
        self.prompt_mut(name)?.include = include;
        self.calculate();
        Ok(())
    }

    /// Value shared by each included equal prompt, if there are any
    pub fn equal_value(&self) -> Option<f32> {
        let equal_count = self
            .prompts
            .iter()
            .filter(|p| p.equal && p.include)
            .count();
        if equal_count == 0 {
            return None;
        }
        let fixed: f32 = self
            .prompts
            .iter()
            .filter(|p| !p.equal && p.include)
            .map(|p| p.value)
            .sum();
        Some((self.total - fixed) / equal_count as f32)
    }

    /// Recompute every equal prompt from the total and the fixed prompts
    pub fn calculate(&mut self) {
        let equal_value = self.equal_value();
        for prompt in &mut self.prompts {
            if !prompt.include {
                prompt.value = 0.0;
            } else if prompt.equal {
                prompt.value = equal_value.unwrap_or(0.0);
            }
        }
    }

    /// Sum of all included prompt values
    pub fn included_sum(&self) -> f32 {
        self.prompts
            .iter()
            .filter(|p| p.include)
            .map(|p| p.value)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn three_drawers() -> Calculator {
        Calculator::new("Drawer Heights", 0.75)
            .with_prompt("Top")
            .with_prompt("Middle")
            .with_prompt("Bottom")
    }

    #[test]
    fn test_all_equal() {
        let calc = three_drawers();
        for prompt in calc.prompts() {
            assert_relative_eq!(prompt.value(), 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fixed_prompt_redistributes_rest() {
        let mut calc = three_drawers();
        calc.set_fixed("Top", 0.15).unwrap();

        assert_relative_eq!(calc.value("Top").unwrap(), 0.15);
        assert_relative_eq!(calc.value("Middle").unwrap(), 0.3, epsilon = 1e-6);
        assert_relative_eq!(calc.value("Bottom").unwrap(), 0.3, epsilon = 1e-6);
        assert_relative_eq!(calc.included_sum(), calc.total(), epsilon = 1e-6);
    }

    #[test]
    fn test_total_change_recomputes() {
        let mut calc = three_drawers();
        calc.set_fixed("Top", 0.15).unwrap();
        calc.set_total(0.95);
        assert_relative_eq!(calc.value("Middle").unwrap(), 0.4, epsilon = 1e-6);
        assert_relative_eq!(calc.included_sum(), 0.95, epsilon = 1e-6);
    }

    #[test]
    fn test_excluded_prompt_is_zero_and_not_counted() {
        let mut calc = three_drawers();
        calc.set_include("Bottom", false).unwrap();
        assert_eq!(calc.value("Bottom"), Some(0.0));
        assert_relative_eq!(calc.value("Top").unwrap(), 0.375, epsilon = 1e-6);
        assert_relative_eq!(calc.included_sum(), 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_set_equal_again() {
        let mut calc = three_drawers();
        calc.set_fixed("Top", 0.15).unwrap();
        calc.set_equal("Top", true).unwrap();
        assert_relative_eq!(calc.value("Top").unwrap(), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_unknown_and_duplicate_prompt() {
        let mut calc = three_drawers();
        assert_eq!(
            calc.set_fixed("Nope", 1.0),
            Err(CalculatorError::PromptNotFound("Nope".into()))
        );
        assert_eq!(
            calc.add_prompt("Top"),
            Err(CalculatorError::DuplicatePrompt("Top".into()))
        );
    }
}
