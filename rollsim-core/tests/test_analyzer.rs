//! Analyzer tests: name resolution, physical ranges and suspicious geometry

use rollsim_core::{analyze_program, parse_program, Diagnostics};

fn analyze(source: &str) -> Diagnostics {
    let program = parse_program(source).unwrap();
    analyze_program(&program)
}

fn has_error(diagnostics: &Diagnostics, needle: &str) -> bool {
    diagnostics.errors().any(|e| e.message.contains(needle))
}

fn has_warning(diagnostics: &Diagnostics, needle: &str) -> bool {
    diagnostics.warnings().any(|w| w.message.contains(needle))
}

#[test]
fn test_valid_program_is_clean() {
    let source = r#"
let r = 30.0
world gravity (0.0, -100.0) air 0.005
body c0 at (-50.0, 0.0) mass 5.0 radius r restitution 0.5
body c1 at (50.0, 0.0) mass 5.0 radius r restitution 0.7
segment floor from (-600.0, 0.0) to (600.0, 0.0)
spring(c0, c1) k = 500.0
control c0 spin 0.1
simulate dt = 1 / 120 steps = 100
detect axle = distance(c0, c1)
"#;
    let diagnostics = analyze(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
}

#[test]
fn test_duplicate_body_name() {
    let source = r#"
body a at (0.0, 0.0) mass 1.0 radius 1.0 restitution 0.5
body a at (5.0, 0.0) mass 2.0 radius 1.0 restitution 0.5
simulate dt = 0.01 steps = 100
"#;
    let diagnostics = analyze(source);
    assert!(has_error(&diagnostics, "duplicate body name 'a'"));
}

#[test]
fn test_unknown_bodies_are_reported_everywhere() {
    let source = r#"
body a at (0.0, 0.0) mass 1.0 radius 1.0 restitution 0.5
spring(a, ghost) k = 10.0
control phantom spin 0.1
simulate dt = 0.01 steps = 100
detect d = distance(a, missing)
"#;
    let diagnostics = analyze(source);
    assert!(has_error(&diagnostics, "unknown body 'ghost' in spring(a, ghost)"));
    assert!(has_error(&diagnostics, "unknown body 'phantom' in control"));
    assert!(has_error(&diagnostics, "unknown body 'missing' in detector 'd'"));
}

#[test]
fn test_non_positive_mass_and_radius() {
    let source = r#"
body a at (0.0, 0.0) mass 0.0 radius -1.0 restitution 0.5
simulate dt = 0.01 steps = 100
"#;
    let diagnostics = analyze(source);
    assert!(has_error(&diagnostics, "mass of body 'a' must be positive"));
    assert!(has_error(&diagnostics, "radius of body 'a' must be positive"));
}

#[test]
fn test_restitution_out_of_range_is_a_warning() {
    let source = r#"
body a at (0.0, 0.0) mass 1.0 radius 1.0 restitution 1.5
simulate dt = 0.01 steps = 100
"#;
    let diagnostics = analyze(source);
    assert!(!diagnostics.has_errors());
    assert!(has_warning(&diagnostics, "restitution of body 'a' is outside [0, 1]"));
}

#[test]
fn test_zero_length_segment_warning() {
    let source = r#"
segment dot from (1.0, 1.0) to (1.0, 1.0)
segment from (2.0, 2.0) to (2.0, 2.0)
simulate dt = 0.01 steps = 100
"#;
    let diagnostics = analyze(source);
    assert!(!diagnostics.has_errors());
    assert!(has_warning(&diagnostics, "segment 'dot' has zero length"));
    assert!(has_warning(&diagnostics, "segment #1 has zero length"));
}

#[test]
fn test_duplicate_segment_name() {
    let source = r#"
segment wall from (0.0, 0.0) to (0.0, 1.0)
segment wall from (1.0, 0.0) to (1.0, 1.0)
simulate dt = 0.01 steps = 100
"#;
    assert!(has_error(&analyze(source), "duplicate segment name 'wall'"));
}

#[test]
fn test_spring_checks() {
    let source = r#"
body a at (0.0, 0.0) mass 1.0 radius 1.0 restitution 0.5
body b at (3.0, 0.0) mass 1.0 radius 1.0 restitution 0.5
spring(a, a) k = 10.0
spring(a, b) k = 0.0
spring(b, a) k = 5.0 rest = -1.0
simulate dt = 0.01 steps = 100
"#;
    let diagnostics = analyze(source);
    assert!(has_warning(&diagnostics, "spring(a, a) connects a body to itself"));
    assert!(has_error(&diagnostics, "stiffness of spring(a, b) must be positive"));
    assert!(has_warning(&diagnostics, "rest length of spring(b, a) is negative"));
}

#[test]
fn test_simulate_checks() {
    let diagnostics = analyze("simulate dt = 0.0 steps = 2.5");
    assert!(has_error(&diagnostics, "simulate dt must be positive"));
    assert!(has_error(&diagnostics, "simulate steps must be a non-negative integer"));

    let diagnostics = analyze("simulate dt = 0.01 steps = -3");
    assert!(has_error(&diagnostics, "simulate steps must be a non-negative integer"));
}

#[test]
fn test_negative_air_density() {
    let diagnostics = analyze("world air -0.5\nsimulate dt = 0.01 steps = 1");
    assert!(has_error(&diagnostics, "air density must not be negative"));
}

#[test]
fn test_evaluation_errors() {
    let source = r#"
let half = 1 / 0
body a at (0.0, unknown_y) mass 1.0 radius 1.0 restitution 0.5
simulate dt = 0.01 steps = 100
"#;
    let diagnostics = analyze(source);
    assert!(has_error(&diagnostics, "error evaluating let binding 'half': division by zero"));
    assert!(has_error(&diagnostics, "unknown variable 'unknown_y'"));
}

#[test]
fn test_duplicate_let_and_detector_names() {
    let source = r#"
let g = 1.0
let g = 2.0
body a at (0.0, 0.0) mass 1.0 radius 1.0 restitution 0.5
simulate dt = 0.01 steps = 100
detect v = speed(a)
detect v = spin(a)
"#;
    let diagnostics = analyze(source);
    assert!(has_error(&diagnostics, "duplicate let binding 'g'"));
    assert!(has_error(&diagnostics, "duplicate detector name 'v'"));
}

#[test]
fn test_diagnostics_carry_spans() {
    let source = "simulate dt = 0.01 steps = 100\nbody a at (0.0, 0.0) mass -2.0 radius 1.0 restitution 0.5\n";
    let diagnostics = analyze(source);
    let error = diagnostics.errors().next().unwrap();

    assert_eq!(error.span.unwrap().location(source).line, 2);
    let rendered = error.render(source);
    assert!(rendered.starts_with("error: mass of body 'a' must be positive"));
    assert!(rendered.contains("at line 2: body a at"));
}
