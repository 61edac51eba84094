use crate::diagnostics::Span;

// ============================================================================
// Expressions
// ============================================================================

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f32),
    Var(String),
    UnaryMinus(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        func: FuncName,
        args: Vec<Expr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Built-in function names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncName {
    Sin,
    Cos,
    Sqrt,
    Clamp,
}

/// Vector literal `(x, y)` with expression components
pub type VecExpr = (Expr, Expr);

/// Let binding declaration: `let name = expr`
#[derive(Debug, Clone)]
pub struct LetDecl {
    pub name: String,
    pub expr: Expr,
    pub span: Option<Span>,
}

// ============================================================================
// Scene declarations
// ============================================================================

/// A parsed scene file
#[derive(Debug, Clone)]
pub struct Program {
    pub lets: Vec<LetDecl>,
    pub world: Option<WorldDecl>,
    pub bodies: Vec<BodyDecl>,
    pub segments: Vec<SegmentDecl>,
    pub springs: Vec<SpringDecl>,
    pub controls: Vec<ControlDecl>,
    pub simulate: SimulateDecl,
    pub detectors: Vec<DetectorDecl>,
}

/// `world gravity (x, y) air rho`
#[derive(Debug, Clone)]
pub struct WorldDecl {
    pub gravity: Option<VecExpr>,
    pub air_density: Option<Expr>,
    pub span: Option<Span>,
}

/// `body name at (x, y) mass m radius r restitution e [velocity (vx, vy)] [angle a] [spin w] [torque t]`
#[derive(Debug, Clone)]
pub struct BodyDecl {
    pub name: String,
    pub position: VecExpr,
    pub mass: Expr,
    pub radius: Expr,
    pub restitution: Expr,
    pub velocity: Option<VecExpr>,
    pub angle: Option<Expr>,
    pub spin: Option<Expr>,
    pub torque: Option<Expr>,
    pub span: Option<Span>,
}

/// `segment [name] from (x, y) to (x, y)`
#[derive(Debug, Clone)]
pub struct SegmentDecl {
    pub name: Option<String>,
    pub from: VecExpr,
    pub to: VecExpr,
    pub span: Option<Span>,
}

/// `spring(a, b) k = x [rest = y]`
#[derive(Debug, Clone)]
pub struct SpringDecl {
    pub a: String,
    pub b: String,
    pub k: Expr,
    /// Initial separation of the two bodies when absent
    pub rest: Option<Expr>,
    pub span: Option<Span>,
}

/// `control name spin step`
#[derive(Debug, Clone)]
pub struct ControlDecl {
    pub body: String,
    pub step: Expr,
    pub span: Option<Span>,
}

/// Headless run configuration: `simulate dt = x steps = n`
#[derive(Debug, Clone)]
pub struct SimulateDecl {
    pub dt: Expr,
    pub steps: Expr, // coerced to usize
    pub span: Option<Span>,
}

/// Detector declaration: `detect name = kind(...)`
#[derive(Debug, Clone)]
pub struct DetectorDecl {
    pub name: String,
    pub kind: DetectorKind,
    pub span: Option<Span>,
}

/// Detector kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorKind {
    PositionX(String),
    PositionY(String),
    Distance { a: String, b: String },
    Speed(String),
    Angle(String),
    Spin(String),
}

impl DetectorKind {
    /// Body names this detector reads
    pub fn bodies(&self) -> Vec<&str> {
        match self {
            DetectorKind::PositionX(name)
            | DetectorKind::PositionY(name)
            | DetectorKind::Speed(name)
            | DetectorKind::Angle(name)
            | DetectorKind::Spin(name) => vec![name.as_str()],
            DetectorKind::Distance { a, b } => vec![a.as_str(), b.as_str()],
        }
    }
}
