mod view_app;

use clap::{Parser, Subcommand};
use rollsim_core::diagnostics::format_parse_error;
use rollsim_core::{analyze_program, parse_program, run_program_with_steps};
use std::fs;
use std::path::{Path, PathBuf};
use view_app::{ViewApp, ViewSettings};

#[derive(Parser)]
#[command(name = "rollsim")]
#[command(about = "rollsim - rolling bodies, springs and walls in 2D", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scene headless and print its detectors
    Run {
        /// Path to the scene file
        file: PathBuf,
        /// Override the number of steps from the `simulate` line
        #[arg(long)]
        steps: Option<usize>,
    },
    /// Parse and analyze a scene, printing diagnostics
    Check {
        /// Path to the scene file
        file: PathBuf,
    },
    /// Open an interactive window
    View {
        /// Path to the scene file
        file: PathBuf,
        /// Frame rate cap
        #[arg(long, default_value_t = 120.0)]
        max_fps: f32,
        /// Simulated seconds per real second
        #[arg(long, default_value_t = 1.0)]
        time_ratio: f32,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run { file, steps } => run_file(&file, steps),
        Commands::Check { file } => check_file(&file),
        Commands::View {
            file,
            max_fps,
            time_ratio,
        } => view_file(
            file,
            ViewSettings {
                max_fps,
                time_ratio,
            },
        ),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_file(file: &Path, steps: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(file)?;
    let result = run_program_with_steps(&source, steps)?;

    // Print detector results
    for detector in result.detectors {
        println!("{} = {}", detector.name, detector.value);
    }

    Ok(())
}

fn check_file(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(file)?;
    let program = match parse_program(&source) {
        Ok(program) => program,
        Err(e) => return Err(format_parse_error(&e, &source).into()),
    };

    let diagnostics = analyze_program(&program);
    for diagnostic in diagnostics.iter() {
        println!("{}", diagnostic.render(&source));
    }

    let errors = diagnostics.errors().count();
    if errors > 0 {
        return Err(format!("{} error(s) in {}", errors, file.display()).into());
    }

    println!(
        "{}: {} bodies, {} segments, {} springs, {} warning(s)",
        file.display(),
        program.bodies.len(),
        program.segments.len(),
        program.springs.len(),
        diagnostics.warnings().count()
    );
    Ok(())
}

fn view_file(file: PathBuf, settings: ViewSettings) -> Result<(), Box<dyn std::error::Error>> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1366.0, 768.0]),
        ..Default::default()
    };

    eframe::run_native(
        "rollsim",
        options,
        Box::new(move |cc| Ok(Box::new(ViewApp::new(file, settings, cc)))),
    )
    .map_err(|e| format!("viewer failed: {}", e))?;

    Ok(())
}
