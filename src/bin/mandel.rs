use std::process;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use clap::{value_t, App, Arg, ArgMatches};
use log::info;

use mandelgrid::{render_visualization, Color, Config, ImageSurface, Schedule, Visualization};

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_float(s: &str, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(f) if f.is_finite() => Ok(()),
        _ => Err(err.to_string()),
    }
}

fn validate_color(s: &str) -> Result<(), String> {
    Color::from_str(s).map(|_| ()).map_err(|e| e.to_string())
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const GAP: &str = "gap";
const SEGMENTS: &str = "segments";
const MIN: &str = "min";
const MAX: &str = "max";
const THRESHOLD: &str = "threshold";
const ITERATIONS: &str = "iterations";
const DARK: &str = "dark";
const LIGHT: &str = "light";
const THREADS: &str = "threads";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandel")
        .version("0.1.0")
        .about("Renders which cells of a square window escape under z -> z² + c")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the extension picks the format (png, pnm, ppm)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("2000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1u32,
                        16_384,
                        "Could not parse size",
                        "Size must be between 1 and 16384",
                    )
                })
                .help("Side of the grid area in pixels"),
        )
        .arg(
            Arg::with_name(GAP)
                .long(GAP)
                .short("g")
                .takes_value(true)
                .default_value("30")
                .validator(|s| {
                    validate_range(
                        &s,
                        0u32,
                        1024,
                        "Could not parse gap",
                        "Gap must be between 0 and 1024",
                    )
                })
                .help("Space reserved for axis labels"),
        )
        .arg(
            Arg::with_name(SEGMENTS)
                .long(SEGMENTS)
                .short("n")
                .takes_value(true)
                .default_value("500")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        16_384,
                        "Could not parse segment count",
                        "Segment count must be between 1 and 16384",
                    )
                })
                .help("Grid cells per axis"),
        )
        .arg(
            Arg::with_name(MIN)
                .long(MIN)
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2")
                .validator(|s| validate_float(&s, "Could not parse lower bound"))
                .help("Lower bound of both axes"),
        )
        .arg(
            Arg::with_name(MAX)
                .long(MAX)
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("2")
                .validator(|s| validate_float(&s, "Could not parse upper bound"))
                .help("Upper bound of both axes"),
        )
        .arg(
            Arg::with_name(THRESHOLD)
                .long(THRESHOLD)
                .short("t")
                .takes_value(true)
                .default_value("2")
                .validator(|s| validate_float(&s, "Could not parse threshold"))
                .help("Points farther than this from the origin escape immediately"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Iteration budget per cell"),
        )
        .arg(
            Arg::with_name(DARK)
                .long(DARK)
                .takes_value(true)
                .default_value("#000000")
                .validator(|s| validate_color(&s))
                .help("Colour of unbounded cells"),
        )
        .arg(
            Arg::with_name(LIGHT)
                .long(LIGHT)
                .takes_value(true)
                .default_value("#ffffff")
                .validator(|s| validate_color(&s))
                .help("Background colour, shown by bounded cells"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("j")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in the sampler [default: one per CPU]"),
        )
        .get_matches()
}

fn config(matches: &ArgMatches) -> Config {
    Config {
        size: value_t!(matches, SIZE, u32).unwrap_or_else(|e| e.exit()),
        gap: value_t!(matches, GAP, u32).unwrap_or_else(|e| e.exit()),
        segments: value_t!(matches, SEGMENTS, usize).unwrap_or_else(|e| e.exit()),
        min: value_t!(matches, MIN, f64).unwrap_or_else(|e| e.exit()),
        max: value_t!(matches, MAX, f64).unwrap_or_else(|e| e.exit()),
        threshold: value_t!(matches, THRESHOLD, f64).unwrap_or_else(|e| e.exit()),
        points_to_generate: value_t!(matches, ITERATIONS, usize).unwrap_or_else(|e| e.exit()),
        dark_color: value_t!(matches, DARK, Color).unwrap_or_else(|e| e.exit()),
        light_color: value_t!(matches, LIGHT, Color).unwrap_or_else(|e| e.exit()),
    }
}

fn main() {
    env_logger::init();

    let matches = args();
    let config = config(&matches);
    let schedule = if matches.is_present(THREADS) {
        Schedule::for_threads(value_t!(matches, THREADS, usize).unwrap_or_else(|e| e.exit()))
    } else {
        Schedule::default()
    };
    let output = matches.value_of(OUTPUT).unwrap_or_default().to_string();

    let visualization = Visualization::new(config).with_schedule(schedule);
    let surface = Arc::new(Mutex::new(ImageSurface::new(0, 0)));

    info!("Rendering...");
    let handle = render_visualization(visualization, Arc::clone(&surface));
    if let Err(e) = handle.wait() {
        eprintln!("Render failure: {}", e);
        process::exit(1);
    }

    let saved = match surface.lock() {
        Ok(surface) => surface.save(&output),
        Err(_) => Err(mandelgrid::RenderError::SurfacePoisoned.into()),
    };
    if let Err(e) = saved {
        eprintln!("Could not write {}: {}", output, e);
        process::exit(1);
    }
    info!("wrote {}", output);
}
