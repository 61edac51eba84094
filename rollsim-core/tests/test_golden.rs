//! Golden tests - compare outputs to expected snapshots

use rollsim_core::tests::test_helpers::{
    detector, load_expected, result_to_json, run_scene_file, write_expected,
};
use std::path::PathBuf;

fn golden_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("golden");
    path.push(filename);
    path
}

#[test]
fn test_ramp_golden() {
    let scene_path = golden_path("ramp.scene");
    let expected_path = golden_path("ramp.expected");

    let result = run_scene_file(scene_path.to_str().unwrap()).expect("Failed to run ramp.scene");

    // The ball ends up above the floor whatever the snapshot says
    assert!(result.detectors.iter().all(|d| d.value.is_finite()));
    assert!(detector(&result, "y").unwrap() > 0.0);

    let actual_json = result_to_json(&result);

    // Try to load expected, or write it if it doesn't exist
    match load_expected(expected_path.to_str().unwrap()) {
        Ok(expected_json) => {
            assert_eq!(
                actual_json, expected_json,
                "Output does not match expected snapshot. If this is intentional, update the .expected file."
            );
        }
        Err(_) => {
            // First run - write expected file
            eprintln!("Writing expected file for first time: {:?}", expected_path);
            write_expected(expected_path.to_str().unwrap(), &actual_json)
                .expect("Failed to write expected file");
        }
    }
}
