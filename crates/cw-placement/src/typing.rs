//! Typed numeric overrides
//!
//! Keystrokes accumulate in a buffer that is re-parsed on every change so
//! the tool can preview the value live.

use cw_core::{UnitSettings, parse_distance};

use crate::event::Key;

/// Field a typed value goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingTarget {
    Length,
    /// Gap between the left gap boundary and the placement
    OffsetX,
    /// Gap between the placement and the right gap boundary
    OffsetRight,
    Width,
    Height,
    Depth,
}

impl TypingTarget {
    pub fn label(&self) -> &'static str {
        match self {
            TypingTarget::Length => "Length",
            TypingTarget::OffsetX => "Offset X",
            TypingTarget::OffsetRight => "Offset Right",
            TypingTarget::Width => "Width",
            TypingTarget::Height => "Height",
            TypingTarget::Depth => "Depth",
        }
    }

    /// Explicit field switch keys
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Left => Some(TypingTarget::OffsetX),
            Key::Right => Some(TypingTarget::OffsetRight),
            Key::Char('w') | Key::Char('W') => Some(TypingTarget::Width),
            Key::Char('h') | Key::Char('H') => Some(TypingTarget::Height),
            Key::Char('d') | Key::Char('D') => Some(TypingTarget::Depth),
            _ => None,
        }
    }
}

/// Result of feeding a key to a [`TypedInput`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypingOutcome {
    /// Buffer changed; parsed value for live preview
    Preview(Option<f32>),
    /// Enter pressed; parsed value to apply
    Commit(Option<f32>),
    /// Leave typing and restore the value from before typing started
    Exit,
    Ignored,
}

/// Characters that can appear in a dimension string
pub fn is_dimension_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '/' | '\'' | '"' | ' ' | 'm' | 'c' | 'i' | 'n' | 'f' | 't')
}

/// Characters that start typing from the live placement state
pub fn starts_typing(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedInput {
    pub target: TypingTarget,
    buffer: String,
}

impl TypedInput {
    pub fn new(target: TypingTarget) -> Self {
        Self {
            target,
            buffer: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn push(&mut self, c: char) -> bool {
        if is_dimension_char(c) {
            self.buffer.push(c);
            true
        } else {
            false
        }
    }

    pub fn value(&self, units: &UnitSettings) -> Option<f32> {
        parse_distance(&self.buffer, units)
    }

    pub fn handle_key(&mut self, key: Key, units: &UnitSettings) -> TypingOutcome {
        match key {
            Key::Char(c) => {
                if self.push(c) {
                    TypingOutcome::Preview(self.value(units))
                } else {
                    TypingOutcome::Ignored
                }
            }
            Key::Backspace => {
                if self.buffer.pop().is_some() {
                    TypingOutcome::Preview(self.value(units))
                } else {
                    TypingOutcome::Exit
                }
            }
            Key::Enter => TypingOutcome::Commit(self.value(units)),
            Key::Escape => TypingOutcome::Exit,
            _ => TypingOutcome::Ignored,
        }
    }

    /// Header text, e.g. `Width: 24 1/2"`
    pub fn prompt(&self) -> String {
        format!("{}: {}_", self.target.label(), self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cw_core::inch;

    fn type_text(input: &mut TypedInput, text: &str) -> TypingOutcome {
        let units = UnitSettings::imperial();
        let mut outcome = TypingOutcome::Ignored;
        for c in text.chars() {
            outcome = input.handle_key(Key::Char(c), &units);
        }
        outcome
    }

    #[test]
    fn test_live_preview_and_commit() {
        let units = UnitSettings::imperial();
        let mut input = TypedInput::new(TypingTarget::Width);
        assert_eq!(type_text(&mut input, "2"), TypingOutcome::Preview(Some(inch(2.0))));
        let TypingOutcome::Preview(Some(v)) = type_text(&mut input, "4 1/2") else {
            panic!("expected a preview value");
        };
        assert_relative_eq!(v, inch(24.5), epsilon = 1e-6);

        let TypingOutcome::Commit(Some(v)) = input.handle_key(Key::Enter, &units) else {
            panic!("expected a committed value");
        };
        assert_relative_eq!(v, inch(24.5), epsilon = 1e-6);
    }

    #[test]
    fn test_feet_inches_buffer() {
        let units = UnitSettings::imperial();
        let mut input = TypedInput::new(TypingTarget::Length);
        type_text(&mut input, "5'-6 1/2\"");
        assert_relative_eq!(input.value(&units).unwrap(), inch(66.5), epsilon = 1e-5);
    }

    #[test]
    fn test_backspace_on_empty_exits() {
        let units = UnitSettings::imperial();
        let mut input = TypedInput::new(TypingTarget::OffsetX);
        type_text(&mut input, "3");
        assert_eq!(input.handle_key(Key::Backspace, &units), TypingOutcome::Preview(None));
        assert_eq!(input.handle_key(Key::Backspace, &units), TypingOutcome::Exit);
    }

    #[test]
    fn test_rejects_other_characters() {
        let units = UnitSettings::imperial();
        let mut input = TypedInput::new(TypingTarget::Width);
        assert_eq!(input.handle_key(Key::Char('x'), &units), TypingOutcome::Ignored);
        assert!(input.is_empty());
        assert_eq!(input.handle_key(Key::Escape, &units), TypingOutcome::Exit);
    }

    #[test]
    fn test_target_keys() {
        assert_eq!(TypingTarget::from_key(Key::Left), Some(TypingTarget::OffsetX));
        assert_eq!(TypingTarget::from_key(Key::Char('W')), Some(TypingTarget::Width));
        assert_eq!(TypingTarget::from_key(Key::Char('5')), None);
    }
}
