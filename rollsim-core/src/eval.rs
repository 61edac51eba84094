//! Expression evaluation for scene files
//!
//! This module evaluates expressions to concrete f32 values before the scene
//! is built.

use crate::ast::{BinaryOp, Expr, FuncName, LetDecl, VecExpr};
use crate::diagnostics::Diagnostic;
use glam::Vec2;
use std::collections::HashMap;
use thiserror::Error;

/// Evaluation context storing variable values
#[derive(Debug, Default)]
pub struct EvalContext<'a> {
    /// Values of let-bindings after evaluation
    pub values: HashMap<&'a str, f32>,
}

impl<'a> EvalContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Evaluation error
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("unknown variable '{0}'")]
    UnknownVar(String),
    #[error("division by zero")]
    DivByZero,
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

/// Evaluate all let-bindings in order
/// Returns the evaluation context and any diagnostics
pub fn evaluate_lets(lets: &[LetDecl]) -> (EvalContext<'_>, Vec<Diagnostic>) {
    let mut ctx = EvalContext::new();
    let mut diagnostics = Vec::new();

    for let_decl in lets {
        match eval_expr(&let_decl.expr, &ctx) {
            Ok(value) if value.is_nan() => {
                diagnostics.push(Diagnostic::error(
                    format!("let binding '{}' evaluates to NaN", let_decl.name),
                    let_decl.span,
                ));
            }
            Ok(value) if value.is_infinite() => {
                diagnostics.push(Diagnostic::error(
                    format!("let binding '{}' evaluates to infinity", let_decl.name),
                    let_decl.span,
                ));
            }
            Ok(value) => {
                ctx.values.insert(&let_decl.name, value);
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("error evaluating let binding '{}': {}", let_decl.name, e),
                    let_decl.span,
                ));
            }
        }
    }

    (ctx, diagnostics)
}

/// Evaluate an expression to a f32 value
pub fn eval_expr(expr: &Expr, ctx: &EvalContext<'_>) -> Result<f32, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(*v),

        Expr::Var(name) => ctx
            .values
            .get(name.as_str())
            .copied()
            .ok_or_else(|| EvalError::UnknownVar(name.clone())),

        Expr::UnaryMinus(e) => Ok(-eval_expr(e, ctx)?),

        Expr::Binary { op, left, right } => {
            let left_val = eval_expr(left, ctx)?;
            let right_val = eval_expr(right, ctx)?;

            match op {
                BinaryOp::Add => Ok(left_val + right_val),
                BinaryOp::Sub => Ok(left_val - right_val),
                BinaryOp::Mul => Ok(left_val * right_val),
                BinaryOp::Div => {
                    if right_val == 0.0 {
                        return Err(EvalError::DivByZero);
                    }
                    Ok(left_val / right_val)
                }
            }
        }

        Expr::Call { func, args } => {
            let arg_values = args
                .iter()
                .map(|arg| eval_expr(arg, ctx))
                .collect::<Result<Vec<f32>, EvalError>>()?;

            let arity = |name: &str, count: usize| {
                if arg_values.len() == count {
                    Ok(())
                } else {
                    Err(EvalError::InvalidArgs(format!(
                        "{} expects {} argument{}, got {}",
                        name,
                        count,
                        if count == 1 { "" } else { "s" },
                        arg_values.len()
                    )))
                }
            };

            match func {
                FuncName::Sin => {
                    arity("sin", 1)?;
                    Ok(arg_values[0].sin())
                }
                FuncName::Cos => {
                    arity("cos", 1)?;
                    Ok(arg_values[0].cos())
                }
                FuncName::Sqrt => {
                    arity("sqrt", 1)?;
                    let x = arg_values[0];
                    if x < 0.0 {
                        return Err(EvalError::InvalidArgs(format!(
                            "sqrt of negative number: {}",
                            x
                        )));
                    }
                    Ok(x.sqrt())
                }
                FuncName::Clamp => {
                    arity("clamp", 3)?;
                    // min > max is allowed, bounds apply in the given order
                    Ok(arg_values[0].max(arg_values[1]).min(arg_values[2]))
                }
            }
        }
    }
}

/// Evaluate a `(x, y)` vector expression
pub fn eval_vec(expr: &VecExpr, ctx: &EvalContext<'_>) -> Result<Vec2, EvalError> {
    Ok(Vec2::new(eval_expr(&expr.0, ctx)?, eval_expr(&expr.1, ctx)?))
}
