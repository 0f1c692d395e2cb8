//! Formula evaluation

use super::{BinaryOp, Expr, ExprError, ExprResult, Function, UnaryOp};

fn truth(value: f32) -> bool {
    value != 0.0
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

impl Expr {
    /// Evaluate the formula, resolving variables through `lookup`.
    ///
    /// Evaluation has no side effects: the same variable values always give
    /// the same result. A variable that `lookup` cannot resolve is reported
    /// as [`ExprError::UnknownVariable`].
    pub fn eval<F>(&self, lookup: &F) -> ExprResult<f32>
    where
        F: Fn(&str) -> Option<f32>,
    {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Variable(name) => {
                lookup(name).ok_or_else(|| ExprError::UnknownVariable(name.clone()))
            }
            Expr::Unary { op, operand } => {
                let value = operand.eval(lookup)?;
                Ok(match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Not => flag(!truth(value)),
                })
            }
            Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, lookup),
            Expr::Call { function, args } => eval_call(*function, args, lookup),
        }
    }
}

fn eval_binary<F>(op: BinaryOp, lhs: &Expr, rhs: &Expr, lookup: &F) -> ExprResult<f32>
where
    F: Fn(&str) -> Option<f32>,
{
    let a = lhs.eval(lookup)?;

    // Short-circuit like the boolean keywords of the driver language
    match op {
        BinaryOp::And if !truth(a) => return Ok(0.0),
        BinaryOp::Or if truth(a) => return Ok(1.0),
        _ => {}
    }

    let b = rhs.eval(lookup)?;
    Ok(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::Rem => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            // Result takes the sign of the divisor
            a - b * (a / b).floor()
        }
        BinaryOp::Lt => flag(a < b),
        BinaryOp::Le => flag(a <= b),
        BinaryOp::Gt => flag(a > b),
        BinaryOp::Ge => flag(a >= b),
        BinaryOp::Eq => flag(a == b),
        BinaryOp::Ne => flag(a != b),
        BinaryOp::And | BinaryOp::Or => flag(truth(b)),
    })
}

fn eval_call<F>(function: Function, args: &[Expr], lookup: &F) -> ExprResult<f32>
where
    F: Fn(&str) -> Option<f32>,
{
    function.check_arity(args.len())?;

    match function {
        Function::If => {
            if truth(args[0].eval(lookup)?) {
                args[1].eval(lookup)
            } else {
                args[2].eval(lookup)
            }
        }
        Function::And => {
            for arg in args {
                if !truth(arg.eval(lookup)?) {
                    return Ok(0.0);
                }
            }
            Ok(1.0)
        }
        Function::Or => {
            for arg in args {
                if truth(arg.eval(lookup)?) {
                    return Ok(1.0);
                }
            }
            Ok(0.0)
        }
        Function::Min | Function::Max => {
            let mut result = args[0].eval(lookup)?;
            for arg in &args[1..] {
                let value = arg.eval(lookup)?;
                result = if function == Function::Min {
                    result.min(value)
                } else {
                    result.max(value)
                };
            }
            Ok(result)
        }
        Function::Abs => Ok(args[0].eval(lookup)?.abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn eval_with(source: &str, vars: &[(&str, f32)]) -> ExprResult<f32> {
        let vars: HashMap<&str, f32> = vars.iter().copied().collect();
        Expr::parse(source)?.eval(&|name: &str| vars.get(name).copied())
    }

    #[test]
    fn test_arithmetic() {
        assert_relative_eq!(eval_with("1 + 2 * 3", &[]).unwrap(), 7.0);
        assert_relative_eq!(eval_with("(1 + 2) * 3", &[]).unwrap(), 9.0);
        assert_relative_eq!(eval_with("-2 - -3", &[]).unwrap(), 1.0);
        assert_relative_eq!(eval_with("7 % 4", &[]).unwrap(), 3.0);
    }

    #[test]
    fn test_cabinet_part_formula() {
        let value = eval_with("dim_x-(mt*2)", &[("dim_x", 0.9144), ("mt", 0.01905)]).unwrap();
        assert_relative_eq!(value, 0.9144 - 0.0381, epsilon = 1e-6);
    }

    #[test]
    fn test_if_and_or() {
        assert_eq!(eval_with("IF(a > 1, 10, 20)", &[("a", 2.0)]).unwrap(), 10.0);
        assert_eq!(eval_with("IF(a > 1, 10, 20)", &[("a", 0.5)]).unwrap(), 20.0);
        assert_eq!(eval_with("AND(1, 1, 0)", &[]).unwrap(), 0.0);
        assert_eq!(eval_with("AND(1, 2, 3)", &[]).unwrap(), 1.0);
        assert_eq!(eval_with("OR(0, 0, 5)", &[]).unwrap(), 1.0);
        assert_eq!(eval_with("OR(0, 0)", &[]).unwrap(), 0.0);
        assert_eq!(eval_with("a == 2 and not b", &[("a", 2.0), ("b", 0.0)]).unwrap(), 1.0);
    }

    #[test]
    fn test_if_only_evaluates_taken_branch() {
        // The untaken branch references a missing variable
        assert_eq!(eval_with("IF(1, 4, missing)", &[]).unwrap(), 4.0);
    }

    #[test]
    fn test_min_max_abs() {
        assert_eq!(eval_with("min(3, 1, 2)", &[]).unwrap(), 1.0);
        assert_eq!(eval_with("max(3, 1, 2)", &[]).unwrap(), 3.0);
        assert_eq!(eval_with("abs(-4)", &[]).unwrap(), 4.0);
    }

    #[test]
    fn test_unknown_variable() {
        assert_eq!(
            eval_with("a + 1", &[]),
            Err(ExprError::UnknownVariable("a".into()))
        );
    }

    #[test]
    fn test_remainder_follows_divisor_sign() {
        assert_relative_eq!(eval_with("7 % -3", &[]).unwrap(), -2.0);
        assert_relative_eq!(eval_with("-7 % 3", &[]).unwrap(), 2.0);
        assert_relative_eq!(eval_with("-7 % -3", &[]).unwrap(), -1.0);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_with("1 / 0", &[]), Err(ExprError::DivisionByZero));
        assert_eq!(eval_with("1 % 0", &[]), Err(ExprError::DivisionByZero));
    }
}
