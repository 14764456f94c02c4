//! Command-line entry point for the anomaly detector.

use clap::{Parser, ValueEnum};
use lidar_anomaly::app::App;
use lidar_anomaly::{config, Result, Scanner};
use std::path::PathBuf;
use std::process::ExitCode;

/// Which chronometers start enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ChronoMode {
    /// No timing output.
    Notime,
    /// Time the definition routines.
    Char,
    /// Time the anomaly detection routine.
    Anom,
    /// Time everything.
    All,
}

/// Characterizes LiDAR-scanned objects and reports geometric anomalies
/// against stored models.
#[derive(Debug, Parser)]
#[command(name = "lidar-anomaly", version)]
struct Args {
    /// Broadcast code of the live sensor; "default" selects the built-in code
    #[arg(short = 'b', value_name = "CODE", conflicts_with = "file", required_unless_present = "file")]
    broadcast_code: Option<String>,

    /// Recorded point stream; the .csv or .lvx extension selects the reader
    #[arg(short = 'f', value_name = "FILE")]
    file: Option<PathBuf>,

    /// Object scan window in milliseconds
    #[arg(short = 't', value_name = "MS", default_value_t = config::DEFAULT_OBJECT_FRAME_MS)]
    object_frame: u32,

    /// Background scan window in milliseconds
    #[arg(short = 'g', value_name = "MS", default_value_t = config::DEFAULT_BACKGROUND_FRAME_MS)]
    background_frame: u32,

    /// Minimum reflectivity for a point to be considered
    #[arg(short = 'r', value_name = "POINTS", default_value_t = config::DEFAULT_MIN_REFLECTIVITY)]
    reflectivity: f64,

    /// Distance in meters under which a point is considered background
    #[arg(short = 'd', value_name = "M", default_value_t = config::DEFAULT_BACKGROUND_DISTANCE)]
    distance: f64,

    /// Chronometers to enable
    #[arg(short = 'c', value_name = "MODE", value_enum, default_value_t = ChronoMode::Notime)]
    chrono: ChronoMode,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let scanner = match (&args.broadcast_code, &args.file) {
        (Some(code), None) => {
            let code = if code == "default" {
                config::DEFAULT_BROADCAST_CODE
            } else {
                code.as_str()
            };
            Scanner::device(code)
        }
        (None, Some(path)) => Scanner::from_path(path)?,
        // clap enforces exactly one of the two
        _ => unreachable!("one of -b and -f is required"),
    };

    let mut app = App::new(scanner);
    {
        let characterizer = app.characterizer_mut();
        characterizer.set_obj_frame(args.object_frame);
        characterizer.set_back_frame(args.background_frame);
        characterizer.set_min_reflectivity(args.reflectivity);
        characterizer.set_back_distance(args.distance);
    }
    app.set_chrono(
        matches!(args.chrono, ChronoMode::Char | ChronoMode::All),
        matches!(args.chrono, ChronoMode::Anom | ChronoMode::All),
    );

    app.init()?;
    let outcome = app.run();
    app.close();
    outcome
}
