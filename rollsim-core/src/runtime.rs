use crate::analyzer::analyze_program;
use crate::ast::{DetectorKind, Expr, Program, VecExpr};
use crate::diagnostics::Diagnostics;
use crate::engine::{Body, BodyHandle, Scene};
use crate::eval::{eval_expr, eval_vec, evaluate_lets, EvalContext, EvalError};
use crate::forces::Environment;
use crate::parser::{parse_program, ParseError};
use glam::Vec2;
use log::debug;
use std::collections::HashMap;
use thiserror::Error;

/// Failure to turn a scene description into a runnable context
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("error evaluating {context}: {source}")]
    Eval {
        context: String,
        #[source]
        source: EvalError,
    },
    #[error("unknown body '{0}'")]
    UnknownBody(String),
    #[error("scene has {} error(s), first: {}", .0.errors().count(), first_error(.0))]
    Analysis(Diagnostics),
}

fn first_error(diagnostics: &Diagnostics) -> String {
    diagnostics
        .errors()
        .next()
        .map(|d| d.message.clone())
        .unwrap_or_default()
}

/// Body whose angular velocity follows the arrow keys
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Control {
    pub body: BodyHandle,
    pub step: f32,
}

/// Runtime detector with resolved handles
#[derive(Debug, Clone)]
enum DetectorRuntime {
    PositionX(BodyHandle),
    PositionY(BodyHandle),
    Distance(BodyHandle, BodyHandle),
    Speed(BodyHandle),
    Angle(BodyHandle),
    Spin(BodyHandle),
}

/// Result of a detector evaluation
#[derive(Debug, Clone)]
pub struct DetectorResult {
    pub name: String,
    pub value: f32,
}

/// Final result of running a scene headless
#[derive(Debug)]
pub struct SimulationResult {
    pub detectors: Vec<DetectorResult>,
}

/// Snapshot of one body for display
#[derive(Debug, Clone)]
pub struct BodyState {
    pub name: String,
    pub pos: Vec2,
    pub angle: f32,
    pub radius: f32,
    pub speed: f32,
}

/// A scene plus everything needed to run it
#[derive(Debug)]
pub struct SimulationContext {
    pub scene: Scene,
    pub environment: Environment,
    /// Fixed timestep for headless runs
    pub dt: f32,
    pub max_steps: usize,
    pub current_step: usize,
    /// Simulated seconds so far
    pub time: f32,
    /// Body names indexed by handle
    pub body_names: Vec<String>,
    pub controls: Vec<Control>,
    detectors: Vec<(String, DetectorRuntime)>,
}

impl SimulationContext {
    pub fn body_handle(&self, name: &str) -> Option<BodyHandle> {
        self.body_names
            .iter()
            .position(|n| n == name)
            .map(BodyHandle)
    }

    pub fn is_finished(&self) -> bool {
        self.current_step >= self.max_steps
    }
}

/// Main entry point: parse and run a scene file
pub fn run_program(source: &str) -> Result<SimulationResult, BuildError> {
    run_program_with_steps(source, None)
}

/// Run a scene file, optionally overriding its step count
pub fn run_program_with_steps(
    source: &str,
    steps: Option<usize>,
) -> Result<SimulationResult, BuildError> {
    let (mut ctx, _diagnostics) = build_simulation_context_from_source(source)?;
    if let Some(steps) = steps {
        ctx.max_steps = steps;
    }

    while !step_simulation(&mut ctx) {}

    Ok(SimulationResult {
        detectors: evaluate_detectors(&ctx),
    })
}

/// Parse, analyze and build a context. Warnings come back alongside it.
pub fn build_simulation_context_from_source(
    source: &str,
) -> Result<(SimulationContext, Diagnostics), BuildError> {
    let program = parse_program(source)?;
    build_simulation_context(&program)
}

/// Analyze and build a context from a parsed program
pub fn build_simulation_context(
    program: &Program,
) -> Result<(SimulationContext, Diagnostics), BuildError> {
    let diagnostics = analyze_program(program);
    if diagnostics.has_errors() {
        return Err(BuildError::Analysis(diagnostics));
    }

    let (env, _) = evaluate_lets(&program.lets);
    let eval = |expr: &Expr, context: &str| {
        eval_expr(expr, &env).map_err(|source| BuildError::Eval {
            context: context.to_string(),
            source,
        })
    };
    let eval_v = |expr: &VecExpr, context: &str| eval_vector(expr, &env, context);

    let mut environment = Environment::default();
    if let Some(world) = &program.world {
        if let Some(gravity) = &world.gravity {
            environment.gravity = eval_v(gravity, "world gravity")?;
        }
        if let Some(air) = &world.air_density {
            environment.air_density = eval(air, "world air")?;
        }
    }

    let mut scene = Scene::new();
    let mut name_to_handle: HashMap<&str, BodyHandle> = HashMap::new();
    let mut body_names = Vec::new();

    for decl in &program.bodies {
        let what = format!("body '{}'", decl.name);
        let mut body = Body::new(
            eval(&decl.mass, &what)?,
            eval(&decl.radius, &what)?,
            eval(&decl.restitution, &what)?,
            eval_v(&decl.position, &what)?,
        );
        if let Some(velocity) = &decl.velocity {
            body = body.with_velocity(eval_v(velocity, &what)?);
        }
        if let Some(angle) = &decl.angle {
            body = body.with_angle(eval(angle, &what)?);
        }
        if let Some(spin) = &decl.spin {
            body = body.with_angular_velocity(eval(spin, &what)?);
        }
        if let Some(torque) = &decl.torque {
            body = body.with_angular_acceleration(eval(torque, &what)?);
        }

        let handle = scene.add_body(body);
        name_to_handle.insert(&decl.name, handle);
        body_names.push(decl.name.clone());
    }

    let lookup = |name: &str| {
        name_to_handle
            .get(name)
            .copied()
            .ok_or_else(|| BuildError::UnknownBody(name.to_string()))
    };

    for decl in &program.segments {
        let what = "segment";
        scene.create_segment(eval_v(&decl.from, what)?, eval_v(&decl.to, what)?);
    }

    for decl in &program.springs {
        let what = format!("spring({}, {})", decl.a, decl.b);
        let a = lookup(&decl.a)?;
        let b = lookup(&decl.b)?;
        let rest = match &decl.rest {
            Some(rest) => eval(rest, &what)?,
            None => scene.body(a).pos.distance(scene.body(b).pos),
        };
        scene.create_spring(a, b, rest, eval(&decl.k, &what)?);
    }

    let controls = program
        .controls
        .iter()
        .map(|decl| {
            Ok(Control {
                body: lookup(&decl.body)?,
                step: eval(&decl.step, "control")?,
            })
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    let detectors = program
        .detectors
        .iter()
        .map(|decl| {
            let runtime = match &decl.kind {
                DetectorKind::PositionX(name) => DetectorRuntime::PositionX(lookup(name)?),
                DetectorKind::PositionY(name) => DetectorRuntime::PositionY(lookup(name)?),
                DetectorKind::Distance { a, b } => {
                    DetectorRuntime::Distance(lookup(a)?, lookup(b)?)
                }
                DetectorKind::Speed(name) => DetectorRuntime::Speed(lookup(name)?),
                DetectorKind::Angle(name) => DetectorRuntime::Angle(lookup(name)?),
                DetectorKind::Spin(name) => DetectorRuntime::Spin(lookup(name)?),
            };
            Ok((decl.name.clone(), runtime))
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    let dt = eval(&program.simulate.dt, "simulate")?;
    let max_steps = eval(&program.simulate.steps, "simulate")? as usize;

    debug!(
        "built scene: {} bodies, {} segments, {} springs, dt = {}, steps = {}",
        scene.bodies().len(),
        scene.segments().len(),
        scene.springs().len(),
        dt,
        max_steps
    );

    Ok((
        SimulationContext {
            scene,
            environment,
            dt,
            max_steps,
            current_step: 0,
            time: 0.0,
            body_names,
            controls,
            detectors,
        },
        diagnostics,
    ))
}

fn eval_vector(
    expr: &VecExpr,
    env: &EvalContext<'_>,
    context: &str,
) -> Result<Vec2, BuildError> {
    eval_vec(expr, env).map_err(|source| BuildError::Eval {
        context: context.to_string(),
        source,
    })
}

/// Advance one fixed step. Returns true once the run is finished.
pub fn step_simulation(ctx: &mut SimulationContext) -> bool {
    if ctx.is_finished() {
        return true;
    }
    let dt = ctx.dt;
    advance(ctx, dt);
    ctx.current_step += 1;
    ctx.is_finished()
}

/// Advance by an arbitrary timestep, ignoring the step budget
pub fn advance(ctx: &mut SimulationContext, dt: f32) {
    ctx.scene.step_in(&ctx.environment, dt);
    ctx.time += dt;
}

/// Apply one frame of arrow-key input to every controlled body.
/// Left spins counter-clockwise, right clockwise.
pub fn apply_spin_input(ctx: &mut SimulationContext, left: bool, right: bool) {
    for control in &ctx.controls {
        let body = ctx.scene.body_mut(control.body);
        if right {
            body.angular_vel -= control.step;
        }
        if left {
            body.angular_vel += control.step;
        }
    }
}

/// Evaluate all detectors on the current state
pub fn evaluate_detectors(ctx: &SimulationContext) -> Vec<DetectorResult> {
    let scene = &ctx.scene;
    ctx.detectors
        .iter()
        .map(|(name, detector)| {
            let value = match *detector {
                DetectorRuntime::PositionX(h) => scene.body(h).pos.x,
                DetectorRuntime::PositionY(h) => scene.body(h).pos.y,
                DetectorRuntime::Distance(a, b) => scene.body(a).pos.distance(scene.body(b).pos),
                DetectorRuntime::Speed(h) => scene.body(h).speed(),
                DetectorRuntime::Angle(h) => scene.body(h).angle,
                DetectorRuntime::Spin(h) => scene.body(h).angular_vel,
            };
            DetectorResult {
                name: name.clone(),
                value,
            }
        })
        .collect()
}

/// Snapshot every body for drawing
pub fn get_body_states(ctx: &SimulationContext) -> Vec<BodyState> {
    ctx.scene
        .bodies()
        .iter()
        .zip(&ctx.body_names)
        .map(|(body, name)| BodyState {
            name: name.clone(),
            pos: body.pos,
            angle: body.angle,
            radius: body.radius,
            speed: body.speed(),
        })
        .collect()
}
