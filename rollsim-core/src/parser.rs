use crate::ast::{
    BinaryOp, BodyDecl, ControlDecl, DetectorDecl, DetectorKind, Expr, FuncName, LetDecl,
    Program, SegmentDecl, SimulateDecl, SpringDecl, VecExpr, WorldDecl,
};
use crate::diagnostics::Span;
use std::collections::HashMap;
use thiserror::Error;

/// Parse error with optional span information
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{message}")]
    SyntaxError {
        message: String,
        span: Option<Span>,
    },
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span: None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::SyntaxError { span, .. } => *span,
        }
    }
}

/// Helper to track byte offsets while parsing
struct ParseContext {
    line_offsets: Vec<usize>, // Byte offset of start of each line
    len: usize,
}

impl ParseContext {
    fn new(source: &str) -> Self {
        let mut line_offsets = vec![0];
        for (offset, ch) in source.char_indices() {
            if ch == '\n' {
                line_offsets.push(offset + 1);
            }
        }
        Self {
            line_offsets,
            len: source.len(),
        }
    }

    /// Get byte offset for start of line (0-indexed)
    fn line_start(&self, line: usize) -> usize {
        self.line_offsets.get(line).copied().unwrap_or(self.len)
    }

    /// Create a span for the entire line
    fn full_line_span(&self, line: usize) -> Span {
        Span::new(self.line_start(line), self.line_start(line + 1))
    }
}

/// Parse a scene file
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let ctx = ParseContext::new(source);
    let mut lets = Vec::new();
    let mut world = None;
    let mut bodies = Vec::new();
    let mut segments = Vec::new();
    let mut springs = Vec::new();
    let mut controls = Vec::new();
    let mut simulate = None;
    let mut detectors = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        let span = Some(ctx.full_line_span(i));

        match leading_word(line) {
            "let" => lets.push(parse_let(line, span)?),
            "world" => {
                if world.is_some() {
                    return Err(ParseError::new("Duplicate 'world' declaration", span));
                }
                world = Some(parse_world(line, span)?);
            }
            "body" => bodies.push(parse_body(line, span)?),
            "segment" => segments.push(parse_segment(line, span)?),
            "spring" => springs.push(parse_spring(line, span)?),
            "control" => controls.push(parse_control(line, span)?),
            "simulate" => {
                if simulate.is_some() {
                    return Err(ParseError::new("Duplicate 'simulate' declaration", span));
                }
                simulate = Some(parse_simulate(line, span)?);
            }
            "detect" => detectors.push(parse_detector(line, span)?),
            other => {
                return Err(ParseError::new(
                    format!("Unexpected token: {}", other),
                    span,
                ));
            }
        }
    }

    let simulate =
        simulate.ok_or_else(|| ParseError::message("Missing 'simulate' declaration"))?;

    Ok(Program {
        lets,
        world,
        bodies,
        segments,
        springs,
        controls,
        simulate,
        detectors,
    })
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Leading identifier of a line (`spring(a, b)` yields `spring`)
fn leading_word(line: &str) -> &str {
    let end = line
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    if end == 0 {
        line.split_whitespace().next().unwrap_or("")
    } else {
        &line[..end]
    }
}

/// Split the tail of a declaration into `keyword value` clauses.
///
/// A keyword only opens a clause at parenthesis depth 0, so vector literals
/// and call arguments may contain spaces.
fn parse_clauses(
    rest: &str,
    keywords: &[&'static str],
    decl: &str,
    span: Option<Span>,
) -> Result<HashMap<&'static str, String>, ParseError> {
    let mut clauses = HashMap::new();
    let mut current: Option<&'static str> = None;
    let mut value = String::new();
    let mut depth = 0i32;

    for token in rest.split_whitespace() {
        if depth == 0 {
            if let Some(keyword) = keywords.iter().find(|k| **k == token) {
                if let Some(prev) = current.take() {
                    insert_clause(&mut clauses, prev, &value, decl, span)?;
                }
                current = Some(*keyword);
                value.clear();
                continue;
            }
        }

        if current.is_none() {
            return Err(ParseError::new(
                format!("Unexpected '{}' in {} declaration", token, decl),
                span,
            ));
        }

        for ch in token.chars() {
            match ch {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }
        if !value.is_empty() {
            value.push(' ');
        }
        value.push_str(token);
    }

    if let Some(prev) = current {
        insert_clause(&mut clauses, prev, &value, decl, span)?;
    }

    Ok(clauses)
}

fn insert_clause(
    clauses: &mut HashMap<&'static str, String>,
    keyword: &'static str,
    value: &str,
    decl: &str,
    span: Option<Span>,
) -> Result<(), ParseError> {
    if value.trim().is_empty() {
        return Err(ParseError::new(
            format!("Missing value for '{}' in {} declaration", keyword, decl),
            span,
        ));
    }
    if clauses.insert(keyword, value.trim().to_string()).is_some() {
        return Err(ParseError::new(
            format!("Duplicate '{}' in {} declaration", keyword, decl),
            span,
        ));
    }
    Ok(())
}

fn required<'c>(
    clauses: &'c HashMap<&'static str, String>,
    keyword: &str,
    decl: &str,
    span: Option<Span>,
) -> Result<&'c str, ParseError> {
    clauses.get(keyword).map(String::as_str).ok_or_else(|| {
        ParseError::new(
            format!("Expected '{}' in {} declaration", keyword, decl),
            span,
        )
    })
}

/// Strip the `=` of a `key = value` clause
fn assigned<'v>(value: &'v str, keyword: &str, span: Option<Span>) -> Result<&'v str, ParseError> {
    value
        .strip_prefix('=')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ParseError::new(format!("Expected '{} = <value>'", keyword), span))
}

/// Split the head name off a declaration tail: `name rest...`
fn split_name<'l>(
    rest: &'l str,
    decl: &str,
    span: Option<Span>,
) -> Result<(String, &'l str), ParseError> {
    let rest = rest.trim();
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let name = &rest[..end];
    if !is_valid_identifier(name) {
        return Err(ParseError::new(
            format!("Expected a name in {} declaration, found '{}'", decl, name),
            span,
        ));
    }
    Ok((name.to_string(), &rest[end..]))
}

/// Parse a let declaration: `let name = expr`
fn parse_let(line: &str, span: Option<Span>) -> Result<LetDecl, ParseError> {
    let rest = line
        .strip_prefix("let ")
        .ok_or_else(|| ParseError::new("Expected 'let' keyword", span))?;

    let eq_pos = rest.find('=').ok_or_else(|| {
        ParseError::new(format!("Expected '=' in let declaration: {}", line), span)
    })?;

    let name = rest[..eq_pos].trim().to_string();
    if !is_valid_identifier(&name) {
        return Err(ParseError::new(
            format!("Invalid variable name in let declaration: '{}'", name),
            span,
        ));
    }

    let expr = parse_expr(rest[eq_pos + 1..].trim(), span)?;

    Ok(LetDecl { name, expr, span })
}

/// Parse a world declaration: `world gravity (x, y) air rho`
fn parse_world(line: &str, span: Option<Span>) -> Result<WorldDecl, ParseError> {
    let rest = line
        .strip_prefix("world")
        .ok_or_else(|| ParseError::new("Expected 'world' keyword", span))?;
    let clauses = parse_clauses(rest, &["gravity", "air"], "world", span)?;

    if clauses.is_empty() {
        return Err(ParseError::new(
            "Expected 'gravity' or 'air' in world declaration",
            span,
        ));
    }

    Ok(WorldDecl {
        gravity: clauses
            .get("gravity")
            .map(|v| parse_vec(v, span))
            .transpose()?,
        air_density: clauses
            .get("air")
            .map(|v| parse_expr(v, span))
            .transpose()?,
        span,
    })
}

/// Parse a body declaration:
/// `body name at (x, y) mass m radius r restitution e [velocity (vx, vy)] [angle a] [spin w] [torque t]`
fn parse_body(line: &str, span: Option<Span>) -> Result<BodyDecl, ParseError> {
    let rest = line
        .strip_prefix("body")
        .ok_or_else(|| ParseError::new("Expected 'body' keyword", span))?;
    let (name, rest) = split_name(rest, "body", span)?;

    let clauses = parse_clauses(
        rest,
        &[
            "at",
            "mass",
            "radius",
            "restitution",
            "velocity",
            "angle",
            "spin",
            "torque",
        ],
        "body",
        span,
    )?;

    let optional_expr = |key: &str| {
        clauses
            .get(key)
            .map(|v| parse_expr(v, span))
            .transpose()
    };

    Ok(BodyDecl {
        position: parse_vec(required(&clauses, "at", "body", span)?, span)?,
        mass: parse_expr(required(&clauses, "mass", "body", span)?, span)?,
        radius: parse_expr(required(&clauses, "radius", "body", span)?, span)?,
        restitution: parse_expr(required(&clauses, "restitution", "body", span)?, span)?,
        velocity: clauses
            .get("velocity")
            .map(|v| parse_vec(v, span))
            .transpose()?,
        angle: optional_expr("angle")?,
        spin: optional_expr("spin")?,
        torque: optional_expr("torque")?,
        name,
        span,
    })
}

/// Parse a segment declaration: `segment [name] from (x, y) to (x, y)`
fn parse_segment(line: &str, span: Option<Span>) -> Result<SegmentDecl, ParseError> {
    let rest = line
        .strip_prefix("segment")
        .ok_or_else(|| ParseError::new("Expected 'segment' keyword", span))?
        .trim();

    let (name, rest) = if rest.starts_with("from ") || rest.starts_with("from(") {
        (None, rest)
    } else {
        let (name, rest) = split_name(rest, "segment", span)?;
        (Some(name), rest)
    };

    let clauses = parse_clauses(rest, &["from", "to"], "segment", span)?;

    Ok(SegmentDecl {
        name,
        from: parse_vec(required(&clauses, "from", "segment", span)?, span)?,
        to: parse_vec(required(&clauses, "to", "segment", span)?, span)?,
        span,
    })
}

/// Parse a spring declaration: `spring(a, b) k = x [rest = y]`
fn parse_spring(line: &str, span: Option<Span>) -> Result<SpringDecl, ParseError> {
    let rest = line
        .strip_prefix("spring")
        .ok_or_else(|| ParseError::new("Expected 'spring' keyword", span))?
        .trim();

    let (a, b, rest) = parse_body_pair(rest, "spring", line, span)?;

    let clauses = parse_clauses(rest, &["k", "rest"], "spring", span)?;
    let k = assigned(required(&clauses, "k", "spring", span)?, "k", span)?;
    let rest_length = clauses
        .get("rest")
        .map(|v| assigned(v, "rest", span).and_then(|v| parse_expr(v, span)))
        .transpose()?;

    Ok(SpringDecl {
        a,
        b,
        k: parse_expr(k, span)?,
        rest: rest_length,
        span,
    })
}

/// Parse `(a, b)` at the start of `rest`, returning the tail after `)`
fn parse_body_pair<'l>(
    rest: &'l str,
    decl: &str,
    line: &str,
    span: Option<Span>,
) -> Result<(String, String, &'l str), ParseError> {
    let inner = rest
        .strip_prefix('(')
        .ok_or_else(|| ParseError::new(format!("Expected '(' in {}: {}", decl, line), span))?;
    let paren_end = inner
        .find(')')
        .ok_or_else(|| ParseError::new(format!("Expected ')' in {}: {}", decl, line), span))?;

    let args: Vec<&str> = inner[..paren_end].split(',').map(str::trim).collect();
    if args.len() != 2 || !args.iter().all(|a| is_valid_identifier(a)) {
        return Err(ParseError::new(
            format!("Expected two body names in {}: {}", decl, line),
            span,
        ));
    }

    Ok((args[0].to_string(), args[1].to_string(), &inner[paren_end + 1..]))
}

/// Parse a control declaration: `control name spin step`
fn parse_control(line: &str, span: Option<Span>) -> Result<ControlDecl, ParseError> {
    let rest = line
        .strip_prefix("control")
        .ok_or_else(|| ParseError::new("Expected 'control' keyword", span))?;
    let (body, rest) = split_name(rest, "control", span)?;
    let clauses = parse_clauses(rest, &["spin"], "control", span)?;

    Ok(ControlDecl {
        body,
        step: parse_expr(required(&clauses, "spin", "control", span)?, span)?,
        span,
    })
}

/// Parse a simulate declaration: `simulate dt = x steps = n`
fn parse_simulate(line: &str, span: Option<Span>) -> Result<SimulateDecl, ParseError> {
    let rest = line
        .strip_prefix("simulate")
        .ok_or_else(|| ParseError::new("Expected 'simulate' keyword", span))?;
    let clauses = parse_clauses(rest, &["dt", "steps"], "simulate", span)?;

    let dt = assigned(required(&clauses, "dt", "simulate", span)?, "dt", span)?;
    let steps = assigned(required(&clauses, "steps", "simulate", span)?, "steps", span)?;

    Ok(SimulateDecl {
        dt: parse_expr(dt, span)?,
        steps: parse_expr(steps, span)?,
        span,
    })
}

/// Parse a detector declaration: `detect name = position(a).y`, `distance(a, b)`, ...
fn parse_detector(line: &str, span: Option<Span>) -> Result<DetectorDecl, ParseError> {
    let rest = line
        .strip_prefix("detect ")
        .ok_or_else(|| ParseError::new("Expected 'detect' keyword", span))?;

    let eq_pos = rest
        .find('=')
        .ok_or_else(|| ParseError::new(format!("Expected '=' in detector: {}", line), span))?;

    let name = rest[..eq_pos].trim().to_string();
    if !is_valid_identifier(&name) {
        return Err(ParseError::new(
            format!("Invalid detector name: '{}'", name),
            span,
        ));
    }
    let rest = rest[eq_pos + 1..].trim();

    let paren_start = rest
        .find('(')
        .ok_or_else(|| ParseError::new(format!("Expected '(' in detector: {}", line), span))?;
    let func = rest[..paren_start].trim();
    let after = &rest[paren_start + 1..];
    let paren_end = after
        .find(')')
        .ok_or_else(|| ParseError::new(format!("Expected ')' in detector: {}", line), span))?;
    let args: Vec<String> = after[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .collect();
    let suffix = after[paren_end + 1..].trim();

    let single = |args: &[String]| -> Result<String, ParseError> {
        match args {
            [name] if is_valid_identifier(name) => Ok(name.clone()),
            _ => Err(ParseError::new(
                format!("Expected one body name in {} detector: {}", func, line),
                span,
            )),
        }
    };

    let kind = match (func, suffix) {
        ("position", "" | ".x") => DetectorKind::PositionX(single(&args)?),
        ("position", ".y") => DetectorKind::PositionY(single(&args)?),
        ("distance", "") => match args.as_slice() {
            [a, b] if is_valid_identifier(a) && is_valid_identifier(b) => DetectorKind::Distance {
                a: a.clone(),
                b: b.clone(),
            },
            _ => {
                return Err(ParseError::new(
                    format!("Expected two body names in distance detector: {}", line),
                    span,
                ));
            }
        },
        ("speed", "") => DetectorKind::Speed(single(&args)?),
        ("angle", "") => DetectorKind::Angle(single(&args)?),
        ("spin", "") => DetectorKind::Spin(single(&args)?),
        _ => {
            return Err(ParseError::new(
                format!("Unknown detector type: {}", rest),
                span,
            ));
        }
    };

    Ok(DetectorDecl { name, kind, span })
}

// ============================================================================
// Expression Parsing
// ============================================================================

/// Parse a vector literal `(x, y)`
fn parse_vec(s: &str, span: Option<Span>) -> Result<VecExpr, ParseError> {
    let s = s.trim();
    let inner = s
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| ParseError::new(format!("Expected a vector '(x, y)', found '{}'", s), span))?;

    let parts = split_top_level(inner, ',');
    if parts.len() != 2 {
        return Err(ParseError::new(
            format!("Expected two coordinates in vector: {}", s),
            span,
        ));
    }

    Ok((parse_expr(parts[0], span)?, parse_expr(parts[1], span)?))
}

/// Split on `sep` outside of parentheses
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

/// Parse an expression from a string
/// Grammar: ExprAdd (with precedence: add/sub < mul/div < unary < primary)
fn parse_expr(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    parse_expr_add(s.trim(), span)
}

/// Whether the operator at byte `pos` is binary: it must follow an operand,
/// and must not be the sign of a float exponent such as `1e-6`
fn is_binary_at(s: &str, pos: usize) -> bool {
    let before = s[..pos].trim_end();
    let Some(prev) = before.chars().last() else {
        return false;
    };
    if matches!(prev, '(' | ',' | '+' | '-' | '*' | '/') {
        return false;
    }
    if matches!(prev, 'e' | 'E') && before.len() == s[..pos].len() {
        let word_start = before
            .rfind(|c: char| !(c.is_alphanumeric() || c == '.' || c == '_'))
            .map(|i| i + 1)
            .unwrap_or(0);
        let mantissa = &before[word_start..before.len() - 1];
        if mantissa.parse::<f32>().is_ok() {
            return false;
        }
    }
    true
}

/// Parse addition/subtraction (lowest precedence)
/// Splits at the rightmost binary + or - at depth 0 so the operators stay left-associative
fn parse_expr_add(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();

    let mut paren_depth = 0;
    let mut split = None;

    for (i, ch) in s.char_indices().rev() {
        match ch {
            ')' => paren_depth += 1,
            '(' => paren_depth -= 1,
            '+' | '-' if paren_depth == 0 && is_binary_at(s, i) => {
                split = Some((i, ch));
                break;
            }
            _ => {}
        }
    }

    match split {
        Some((pos, op_char)) => {
            let op = if op_char == '+' {
                BinaryOp::Add
            } else {
                BinaryOp::Sub
            };
            Ok(Expr::Binary {
                op,
                left: Box::new(parse_expr_add(&s[..pos], span)?),
                right: Box::new(parse_expr_mul(&s[pos + 1..], span)?),
            })
        }
        None => parse_expr_mul(s, span),
    }
}

/// Parse multiplication/division
fn parse_expr_mul(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();

    let mut paren_depth = 0;
    let mut split = None;

    for (i, ch) in s.char_indices().rev() {
        match ch {
            ')' => paren_depth += 1,
            '(' => paren_depth -= 1,
            '*' | '/' if paren_depth == 0 => {
                split = Some((i, ch));
                break;
            }
            _ => {}
        }
    }

    match split {
        Some((pos, op_char)) => {
            let op = if op_char == '*' {
                BinaryOp::Mul
            } else {
                BinaryOp::Div
            };
            Ok(Expr::Binary {
                op,
                left: Box::new(parse_expr_mul(&s[..pos], span)?),
                right: Box::new(parse_expr_unary(&s[pos + 1..], span)?),
            })
        }
        None => parse_expr_unary(s, span),
    }
}

/// Parse unary minus
fn parse_expr_unary(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();
    // a negative literal stays a literal
    if let Ok(val) = s.parse::<f32>() {
        return Ok(Expr::Literal(val));
    }
    match s.strip_prefix('-') {
        Some(inner) => Ok(Expr::UnaryMinus(Box::new(parse_expr_unary(inner, span)?))),
        None => parse_expr_primary(s, span),
    }
}

/// Index of the `)` matching the `(` at byte `open`
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0;
    for (i, ch) in s[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse primary expressions: literals, variables, function calls, parentheses
fn parse_expr_primary(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();

    if let Ok(val) = s.parse::<f32>() {
        return Ok(Expr::Literal(val));
    }

    if is_valid_identifier(s) {
        return Ok(Expr::Var(s.to_string()));
    }

    if let Some(paren_pos) = s.find('(') {
        if matching_paren(s, paren_pos) == Some(s.len() - 1) {
            let inner = &s[paren_pos + 1..s.len() - 1];
            let func_name = s[..paren_pos].trim();

            if func_name.is_empty() {
                return parse_expr(inner, span);
            }

            let func = match func_name {
                "sin" => FuncName::Sin,
                "cos" => FuncName::Cos,
                "sqrt" => FuncName::Sqrt,
                "clamp" => FuncName::Clamp,
                _ => {
                    return Err(ParseError::new(
                        format!("Unknown function '{}'", func_name),
                        span,
                    ));
                }
            };

            let args = if inner.trim().is_empty() {
                Vec::new()
            } else {
                split_top_level(inner, ',')
                    .into_iter()
                    .map(|arg| parse_expr(arg, span))
                    .collect::<Result<Vec<_>, _>>()?
            };

            return Ok(Expr::Call { func, args });
        }
    }

    Err(ParseError::new(format!("Invalid expression: {}", s), span))
}

/// Check if a string is a valid identifier
fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    // First char must be letter or underscore
    if !first.is_alphabetic() && first != '_' {
        return false;
    }

    // Rest must be alphanumeric or underscore
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
