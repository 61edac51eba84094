//! Real-time 2D simulation of circular rigid bodies: gravity, quadratic air
//! drag, springs and collisions against static segments, plus a small
//! line-oriented scene format to describe and run them.

pub mod analyzer;
pub mod ast;
pub mod clock;
pub mod collision;
pub mod diagnostics;
pub mod engine;
pub mod eval;
pub mod forces;
pub mod integrator;
pub mod parser;
pub mod runtime;
pub mod view;

pub use analyzer::analyze_program;
pub use clock::FrameClock;
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics, SourceLocation, Span};
pub use engine::{Body, BodyHandle, Scene, Segment, SegmentHandle, Spring, SpringHandle};
pub use forces::Environment;
pub use parser::{parse_program, ParseError};
pub use runtime::{
    advance, apply_spin_input, build_simulation_context, build_simulation_context_from_source,
    evaluate_detectors, get_body_states, run_program, run_program_with_steps, step_simulation,
    BodyState, BuildError, Control, DetectorResult, SimulationContext, SimulationResult,
};
