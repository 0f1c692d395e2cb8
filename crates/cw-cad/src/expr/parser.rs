//! Formula grammar built from nom combinators
//!
//! Precedence, lowest first: `or`, `and`, `not`, comparisons, `+ -`,
//! `* / %`, unary sign, primary. Once an operator has been read its
//! operand is mandatory, so a dangling `1 +` fails at the end of input
//! instead of backtracking.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{cut, map, not, opt, recognize, value},
    error::{ErrorKind, ParseError},
    multi::{fold_many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use super::{BinaryOp, Expr, ExprError, ExprResult, Function, UnaryOp};

/// Parser error carrying where parsing stopped and, for semantic
/// failures such as an unknown function, the formula error itself
#[derive(Debug)]
struct SyntaxError<'a> {
    input: &'a str,
    cause: Option<ExprError>,
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Self { input, cause: None }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    // Keep the branch that got furthest
    fn or(self, other: Self) -> Self {
        if self.cause.is_some() || self.input.len() < other.input.len() {
            self
        } else {
            other
        }
    }
}

type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

fn failure(input: &str, cause: ExprError) -> nom::Err<SyntaxError<'_>> {
    nom::Err::Failure(SyntaxError {
        input,
        cause: Some(cause),
    })
}

/// Parse a formula into an expression tree
pub fn parse(source: &str) -> ExprResult<Expr> {
    match ws(or_expr).parse(source) {
        Ok(("", expr)) => Ok(expr),
        Ok((rest, _)) => Err(unexpected(source, rest)),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(e
            .cause
            .unwrap_or_else(|| unexpected(source, e.input))),
        Err(nom::Err::Incomplete(_)) => Err(ExprError::UnexpectedEnd),
    }
}

/// Describe whatever sits at `rest` for an error message
fn unexpected(source: &str, rest: &str) -> ExprError {
    let rest = rest.trim_start();
    let pos = source.len() - rest.len();
    let Some(ch) = rest.chars().next() else {
        return ExprError::UnexpectedEnd;
    };
    match token_text(rest) {
        Ok((_, found)) => ExprError::UnexpectedToken {
            found: found.to_string(),
            pos,
        },
        Err(_) => ExprError::UnexpectedChar { ch, pos },
    }
}

fn token_text(input: &str) -> PResult<'_, &str> {
    alt((
        take_while1(|c: char| c.is_ascii_digit() || c == '.'),
        ident_text,
        recognize(comparison_op),
        recognize(one_of("+-*/%(),")),
    ))(input)
}

// ============== Tokens ==============

fn ws<'a, O, P>(inner: P) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    P: Parser<&'a str, O, SyntaxError<'a>>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn ident_text(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(is_ident_char),
    ))(input)
}

fn identifier(input: &str) -> PResult<'_, &str> {
    ws(ident_text)(input)
}

/// `word` not followed by more identifier characters
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    ws(terminated(tag(word), not(satisfy(is_ident_char))))
}

/// `12`, `0.5`, `.5`, `2.5e-1`
fn number(input: &str) -> PResult<'_, Expr> {
    let (rest, text) = ws(recognize(pair(
        take_while1(|c: char| c.is_ascii_digit() || c == '.'),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;
    match text.parse::<f32>() {
        Ok(value) => Ok((rest, Expr::Number(value))),
        Err(_) => Err(failure(input, ExprError::InvalidNumber(text.to_string()))),
    }
}

fn comparison_op(input: &str) -> PResult<'_, BinaryOp> {
    alt((
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
        value(BinaryOp::Lt, tag("<")),
        value(BinaryOp::Gt, tag(">")),
    ))(input)
}

// ============== Grammar ==============

fn or_expr(input: &str) -> PResult<'_, Expr> {
    let (input, first) = conjunction(input)?;
    fold_many0(
        preceded(keyword("or"), cut(conjunction)),
        move || first.clone(),
        |lhs, rhs| binary(BinaryOp::Or, lhs, rhs),
    )(input)
}

fn conjunction(input: &str) -> PResult<'_, Expr> {
    let (input, first) = negation(input)?;
    fold_many0(
        preceded(keyword("and"), cut(negation)),
        move || first.clone(),
        |lhs, rhs| binary(BinaryOp::And, lhs, rhs),
    )(input)
}

fn negation(input: &str) -> PResult<'_, Expr> {
    alt((
        map(preceded(keyword("not"), cut(negation)), |operand| {
            Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            }
        }),
        comparison,
    ))(input)
}

/// Comparisons do not chain: `a < b < c` is rejected
fn comparison(input: &str) -> PResult<'_, Expr> {
    let (input, lhs) = additive(input)?;
    let (input, rhs) = opt(pair(ws(comparison_op), cut(additive)))(input)?;
    let expr = match rhs {
        Some((op, rhs)) => binary(op, lhs, rhs),
        None => lhs,
    };
    Ok((input, expr))
}

fn additive(input: &str) -> PResult<'_, Expr> {
    let (input, first) = multiplicative(input)?;
    fold_many0(
        pair(ws(one_of("+-")), cut(multiplicative)),
        move || first.clone(),
        |lhs, (op, rhs)| {
            let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            binary(op, lhs, rhs)
        },
    )(input)
}

fn multiplicative(input: &str) -> PResult<'_, Expr> {
    let (input, first) = unary(input)?;
    fold_many0(
        pair(ws(one_of("*/%")), cut(unary)),
        move || first.clone(),
        |lhs, (op, rhs)| {
            let op = match op {
                '*' => BinaryOp::Mul,
                '/' => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            binary(op, lhs, rhs)
        },
    )(input)
}

fn unary(input: &str) -> PResult<'_, Expr> {
    alt((
        map(preceded(ws(char('-')), cut(unary)), |operand| Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        }),
        preceded(ws(char('+')), cut(unary)),
        primary,
    ))(input)
}

fn primary(input: &str) -> PResult<'_, Expr> {
    alt((number, parenthesized, call, variable))(input)
}

fn parenthesized(input: &str) -> PResult<'_, Expr> {
    preceded(ws(char('(')), cut(terminated(or_expr, ws(char(')')))))(input)
}

fn call(input: &str) -> PResult<'_, Expr> {
    let (rest, name) = terminated(identifier, ws(char('(')))(input)?;
    let function = Function::from_name(name)
        .ok_or_else(|| failure(input, ExprError::UnknownFunction(name.to_string())))?;
    let (rest, args) = cut(arguments)(rest)?;
    function
        .check_arity(args.len())
        .map_err(|e| failure(input, e))?;
    Ok((rest, Expr::Call { function, args }))
}

/// Everything after the opening parenthesis of a call
fn arguments(input: &str) -> PResult<'_, Vec<Expr>> {
    alt((
        map(ws(char(')')), |_| Vec::new()),
        terminated(separated_list1(ws(char(',')), or_expr), ws(char(')'))),
    ))(input)
}

fn variable(input: &str) -> PResult<'_, Expr> {
    map(identifier, |name| {
        if name.eq_ignore_ascii_case("true") {
            Expr::Number(1.0)
        } else if name.eq_ignore_ascii_case("false") {
            Expr::Number(0.0)
        } else {
            Expr::Variable(name.to_string())
        }
    })(input)
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
