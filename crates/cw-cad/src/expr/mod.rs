//! Formula Expressions
//!
//! The formula language used by property bindings. It covers arithmetic,
//! comparisons, boolean keywords and the driver functions `IF`, `AND`
//! and `OR`. Booleans are plain numbers: true is `1.0`, false is `0.0`.

mod eval;
mod parser;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors produced while parsing or evaluating a formula
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("Unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("Unexpected token '{found}' at {pos}")]
    UnexpectedToken { found: String, pos: usize },
    #[error("Unexpected end of formula")]
    UnexpectedEnd,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("{function} expects {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        found: usize,
    },
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Division by zero")]
    DivisionByZero,
}

/// Result type for formula operations
pub type ExprResult<T> = Result<T, ExprError>;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// Built-in functions callable from a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Function {
    /// `IF(cond, a, b)`
    If,
    /// `AND(a, ...)`, true when every argument is non-zero
    And,
    /// `OR(a, ...)`, true when any argument is non-zero
    Or,
    Min,
    Max,
    Abs,
}

impl Function {
    /// Look up a function by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "IF" => Some(Function::If),
            "AND" => Some(Function::And),
            "OR" => Some(Function::Or),
            "MIN" => Some(Function::Min),
            "MAX" => Some(Function::Max),
            "ABS" => Some(Function::Abs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::If => "IF",
            Function::And => "AND",
            Function::Or => "OR",
            Function::Min => "min",
            Function::Max => "max",
            Function::Abs => "abs",
        }
    }

    fn check_arity(&self, found: usize) -> ExprResult<()> {
        let (ok, expected) = match self {
            Function::If => (found == 3, "3"),
            Function::Abs => (found == 1, "1"),
            Function::And | Function::Or | Function::Min | Function::Max => (found >= 1, "1+"),
        };
        if ok {
            Ok(())
        } else {
            Err(ExprError::Arity {
                function: self.name(),
                expected,
                found,
            })
        }
    }
}

/// Parsed formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f32),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Parse a formula string
    pub fn parse(source: &str) -> ExprResult<Self> {
        parser::parse(source)
    }

    /// Names of all variables referenced by this formula (sorted, unique)
    pub fn variables(&self) -> Vec<&str> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names.into_iter().collect()
    }

    fn collect_variables<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                names.insert(name.as_str());
            }
            Expr::Unary { operand, .. } => operand.collect_variables(names),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }
}

impl FromStr for Expr {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expr::parse(s)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{}", value),
            Expr::Variable(name) => f.write_str(name),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => write!(f, "-({})", operand),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "not ({})", operand),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}
