//! Static analysis for scene files
//!
//! This module checks a parsed program for mistakes that would otherwise
//! surface as nonsense at run time: duplicate or unknown names, non-positive
//! physical quantities, and suspicious geometry.

use crate::ast::{Expr, Program, VecExpr};
use crate::diagnostics::{Diagnostic, Diagnostics, Span};
use crate::eval::{eval_expr, eval_vec, evaluate_lets, EvalContext};
use std::collections::HashSet;

/// Analyze a program and return diagnostics
pub fn analyze_program(program: &Program) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    // Check let bindings: duplicate names
    let mut let_names = HashSet::new();
    for let_decl in &program.lets {
        if !let_names.insert(let_decl.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("duplicate let binding '{}'", let_decl.name),
                let_decl.span,
            ));
        }
    }

    let (env, let_diagnostics) = evaluate_lets(&program.lets);
    diagnostics.extend(let_diagnostics);

    if let Some(world) = &program.world {
        if let Some(gravity) = &world.gravity {
            check_vec(&mut diagnostics, gravity, &env, "world gravity", world.span);
        }
        if let Some(air) = &world.air_density {
            if let Some(value) = check_expr(&mut diagnostics, air, &env, "world air", world.span) {
                if value < 0.0 {
                    diagnostics.push(Diagnostic::error(
                        format!("air density must not be negative, got {}", value),
                        world.span,
                    ));
                }
            }
        }
    }

    // Bodies
    let mut body_names = HashSet::new();
    for body in &program.bodies {
        if !body_names.insert(body.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("duplicate body name '{}'", body.name),
                body.span,
            ));
        }

        let what = format!("body '{}'", body.name);
        check_vec(&mut diagnostics, &body.position, &env, &what, body.span);
        if let Some(velocity) = &body.velocity {
            check_vec(&mut diagnostics, velocity, &env, &what, body.span);
        }
        for expr in [&body.angle, &body.spin, &body.torque].into_iter().flatten() {
            check_expr(&mut diagnostics, expr, &env, &what, body.span);
        }

        for (field, expr) in [("mass", &body.mass), ("radius", &body.radius)] {
            if let Some(value) = check_expr(&mut diagnostics, expr, &env, &what, body.span) {
                if value <= 0.0 {
                    diagnostics.push(Diagnostic::error(
                        format!("{} of {} must be positive, got {}", field, what, value),
                        body.span,
                    ));
                }
            }
        }

        if let Some(e) = check_expr(&mut diagnostics, &body.restitution, &env, &what, body.span) {
            if !(0.0..=1.0).contains(&e) {
                diagnostics.push(Diagnostic::warning(
                    format!("restitution of {} is outside [0, 1]: {}", what, e),
                    body.span,
                ));
            }
        }
    }

    let require_body = |diagnostics: &mut Diagnostics, name: &str, context: &str, span: Option<Span>| {
        if !body_names.contains(name) {
            diagnostics.push(Diagnostic::error(
                format!("unknown body '{}' in {}", name, context),
                span,
            ));
        }
    };

    // Segments
    let mut segment_names = HashSet::new();
    for (idx, segment) in program.segments.iter().enumerate() {
        let what = match &segment.name {
            Some(name) => {
                if !segment_names.insert(name.as_str()) {
                    diagnostics.push(Diagnostic::error(
                        format!("duplicate segment name '{}'", name),
                        segment.span,
                    ));
                }
                format!("segment '{}'", name)
            }
            None => format!("segment #{}", idx),
        };

        let from = check_vec(&mut diagnostics, &segment.from, &env, &what, segment.span);
        let to = check_vec(&mut diagnostics, &segment.to, &env, &what, segment.span);
        if let (Some(from), Some(to)) = (from, to) {
            if from == to {
                diagnostics.push(Diagnostic::warning(
                    format!("{} has zero length", what),
                    segment.span,
                ));
            }
        }
    }

    // Springs
    for spring in &program.springs {
        let what = format!("spring({}, {})", spring.a, spring.b);
        require_body(&mut diagnostics, &spring.a, &what, spring.span);
        require_body(&mut diagnostics, &spring.b, &what, spring.span);

        if spring.a == spring.b {
            diagnostics.push(Diagnostic::warning(
                format!("{} connects a body to itself", what),
                spring.span,
            ));
        }

        if let Some(k) = check_expr(&mut diagnostics, &spring.k, &env, &what, spring.span) {
            if k <= 0.0 {
                diagnostics.push(Diagnostic::error(
                    format!("stiffness of {} must be positive, got {}", what, k),
                    spring.span,
                ));
            }
        }
        if let Some(rest) = &spring.rest {
            if let Some(rest) = check_expr(&mut diagnostics, rest, &env, &what, spring.span) {
                if rest < 0.0 {
                    diagnostics.push(Diagnostic::warning(
                        format!("rest length of {} is negative: {}", what, rest),
                        spring.span,
                    ));
                }
            }
        }
    }

    // Controls
    for control in &program.controls {
        require_body(&mut diagnostics, &control.body, "control", control.span);
        check_expr(&mut diagnostics, &control.step, &env, "control", control.span);
    }

    // Simulate
    let simulate = &program.simulate;
    if let Some(dt) = check_expr(&mut diagnostics, &simulate.dt, &env, "simulate", simulate.span) {
        if dt <= 0.0 {
            diagnostics.push(Diagnostic::error(
                format!("simulate dt must be positive, got {}", dt),
                simulate.span,
            ));
        }
    }
    if let Some(steps) =
        check_expr(&mut diagnostics, &simulate.steps, &env, "simulate", simulate.span)
    {
        if steps < 0.0 || steps.fract() != 0.0 {
            diagnostics.push(Diagnostic::error(
                format!("simulate steps must be a non-negative integer, got {}", steps),
                simulate.span,
            ));
        }
    }

    // Detectors
    let mut detector_names = HashSet::new();
    for detector in &program.detectors {
        if !detector_names.insert(detector.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("duplicate detector name '{}'", detector.name),
                detector.span,
            ));
        }
        let what = format!("detector '{}'", detector.name);
        for name in detector.kind.bodies() {
            require_body(&mut diagnostics, name, &what, detector.span);
        }
    }

    diagnostics
}

/// Evaluate `expr`, recording a diagnostic when it fails or is not finite
fn check_expr(
    diagnostics: &mut Diagnostics,
    expr: &Expr,
    env: &EvalContext<'_>,
    what: &str,
    span: Option<Span>,
) -> Option<f32> {
    match eval_expr(expr, env) {
        Ok(value) if value.is_finite() => Some(value),
        Ok(value) => {
            diagnostics.push(Diagnostic::error(
                format!("{} evaluates to {}", what, value),
                span,
            ));
            None
        }
        Err(e) => {
            diagnostics.push(Diagnostic::error(format!("in {}: {}", what, e), span));
            None
        }
    }
}

fn check_vec(
    diagnostics: &mut Diagnostics,
    expr: &VecExpr,
    env: &EvalContext<'_>,
    what: &str,
    span: Option<Span>,
) -> Option<glam::Vec2> {
    match eval_vec(expr, env) {
        Ok(value) if value.is_finite() => Some(value),
        Ok(value) => {
            diagnostics.push(Diagnostic::error(
                format!("{} evaluates to {:?}", what, value),
                span,
            ));
            None
        }
        Err(e) => {
            diagnostics.push(Diagnostic::error(format!("in {}: {}", what, e), span));
            None
        }
    }
}
