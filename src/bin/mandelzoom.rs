//! Command-line entry point: loads the settings file, picks the run
//! mode, and wires the planner, evaluator, and frame sink together.

use clap::{App, Arg, ArgMatches};
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mandelzoom::animation::{render_still, Animation, RunStats};
use mandelzoom::sink::{DiscardSink, FfmpegSink, FrameSink, PngSink};
use mandelzoom::timing::{PerfRecord, RunTimer};
use mandelzoom::{Colormap, Error, Mandelbrot, Settings, Trajectory};

fn validate_range<T: FromStr + Ord>(
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

const CONFIG: &str = "config";
const OUTPUT: &str = "output";
const COLORMAPS: &str = "colormaps";
const THREADS: &str = "threads";
const PERFLOG: &str = "perf-log";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandelzoom")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Mandelbrot still and zoom-animation renderer")
        .arg(
            Arg::with_name(CONFIG)
                .required(false)
                .long(CONFIG)
                .short("c")
                .takes_value(true)
                .default_value("settings.yaml")
                .help("Settings file"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .required(false)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output name, overriding the settings file"),
        )
        .arg(
            Arg::with_name(COLORMAPS)
                .required(false)
                .long(COLORMAPS)
                .short("m")
                .takes_value(true)
                .default_value("colormaps")
                .help("Directory holding the colormap CSV files"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
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
                .help("Number of threads to use in the evaluator"),
        )
        .arg(
            Arg::with_name(PERFLOG)
                .required(false)
                .long(PERFLOG)
                .takes_value(true)
                .help("Append a one-row performance record to this CSV file"),
        )
        .get_matches()
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let t_0 = Instant::now();
    let mut timer = RunTimer::new();

    let mut settings = Settings::from_yaml_file(Path::new(
        matches.value_of(CONFIG).expect("config has a default"),
    ))?;
    if let Some(output) = matches.value_of(OUTPUT) {
        settings.output_name = output.to_string();
    }
    let threads = match matches.value_of(THREADS) {
        // Validated by clap already.
        Some(t) => usize::from_str(t).expect("validated thread count"),
        None => num_cpus::get(),
    };
    if settings.liveplotting {
        warn!("liveplotting is enabled in the settings but this build has no display window");
    }

    let t_setup = Instant::now();
    let colormap_dir = Path::new(matches.value_of(COLORMAPS).expect("colormaps has a default"));
    let colormap = Colormap::from_csv(colormap_dir, &settings.colormap)?;
    let renderer = Mandelbrot::new(
        settings.x_resolution,
        settings.y_resolution,
        colormap,
        threads,
    )?;
    timer.timeit("setup", t_setup);

    let stats = if settings.animate {
        run_animation(&settings, &renderer, &mut timer)?
    } else {
        run_still(&settings, &renderer, &mut timer)?
    };

    timer.timeit("main", t_0);
    timer.log();

    if let Some(perf_path) = matches.value_of(PERFLOG) {
        PerfRecord {
            total: t_0.elapsed(),
            stats,
            x_resolution: settings.x_resolution,
            y_resolution: settings.y_resolution,
        }
        .append_csv(Path::new(perf_path))?;
    }
    Ok(())
}

/// The multi-frame path: plan the trajectory, open the sink, and let
/// the driver walk the frames.
fn run_animation(
    settings: &Settings,
    renderer: &Mandelbrot,
    timer: &mut RunTimer,
) -> Result<RunStats, Error> {
    let t_plan = Instant::now();
    let trajectory = Trajectory::new(
        settings.trajectory.clone(),
        settings.nr_frames,
        settings.start_width(),
        settings.start_height,
        settings.smoothing_power,
    )?;
    let animation = Animation::new(&trajectory, renderer, settings.max_its, settings.x_scale)?;
    timer.timeit("trajectory planning", t_plan);

    let t_frames = Instant::now();
    let stats = if settings.render {
        let output = format!("{}.mp4", settings.output_name);
        let mut sink = FfmpegSink::open(
            Path::new(&output),
            settings.x_resolution,
            settings.y_resolution,
            settings.fps,
        )?;
        animation.run(&mut sink)?
    } else {
        info!("render is off; frames will be computed and discarded");
        animation.run(&mut DiscardSink)?
    };
    timer.timeit("frame loop", t_frames);
    Ok(stats)
}

/// The one-shot path: a single frame at the baseline view of the
/// first waypoint.
fn run_still(
    settings: &Settings,
    renderer: &Mandelbrot,
    timer: &mut RunTimer,
) -> Result<RunStats, Error> {
    let wp = settings.trajectory[0];
    let t_compute = Instant::now();
    let frame = render_still(
        renderer,
        wp.x,
        wp.y,
        settings.start_width(),
        settings.start_height,
        settings.max_its,
    );
    let compute = t_compute.elapsed();
    timer.timeit("mandelbrot", t_compute);

    let t_sink = Instant::now();
    if settings.render {
        let output = format!("{}.png", settings.output_name);
        let mut sink = PngSink::new(Path::new(&output));
        sink.write_frame(&frame)?;
        sink.finish()?;
    }
    timer.timeit("write image", t_sink);

    Ok(RunStats {
        frames: 1,
        compute,
        sink: t_sink.elapsed(),
    })
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mandelzoom=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("mandelzoom: {}", e);
        std::process::exit(1);
    }
}
