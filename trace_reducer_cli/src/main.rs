use clap::{Arg, ArgMatches, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use libtrace_reducer::comparison::{compare_runs, RunComparison, RunFeatures};
use libtrace_reducer::config::Config;
use libtrace_reducer::decoder::CommandDecoder;
use libtrace_reducer::error::ConfigError;
use libtrace_reducer::process::{create_subsets, process_subset, FolderOutcome};
use libtrace_reducer::trigger_source::TriggerSource;
use libtrace_reducer::worker_status::{BarColor, WorkerStatus};

const LOG_FILE_NAME: &str = "trace_reducer.log";

fn make_template_config(path: &Path) -> Result<(), ConfigError> {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config)?;
    let mut file = File::create(path)?;
    file.write_all(yaml_str.as_bytes())?;
    Ok(())
}

fn init_logging(pb_manager: &MultiProgress) -> Result<(), String> {
    let log_file = File::create(LOG_FILE_NAME).map_err(|e| e.to_string())?;
    let logger = simplelog::CombinedLogger::new(vec![
        simplelog::TermLogger::new(
            simplelog::LevelFilter::Info,
            simplelog::Config::default(),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        ),
        simplelog::WriteLogger::new(
            simplelog::LevelFilter::Debug,
            simplelog::Config::default(),
            log_file,
        ),
    ]);
    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .map_err(|e| e.to_string())
}

fn bar_style(color: BarColor) -> ProgressStyle {
    let template = match color {
        BarColor::CYAN => "{prefix} [{bar:40.cyan/blue}] {percent}% {msg}",
        BarColor::GREEN => "{prefix} [{bar:40.green/blue}] {percent}% {msg}",
        BarColor::RED => "{prefix} [{bar:40.red/blue}] {percent}% {msg}",
    };
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn load_config(matches: &ArgMatches) -> Result<Config, ConfigError> {
    match matches.get_one::<String>("config") {
        Some(path) => {
            log::info!("Loading config from {}...", path);
            let config = Config::read_config_file(Path::new(path))?;
            log::info!("Config successfully loaded.");
            Ok(config)
        }
        None => {
            log::info!("No config given, using the default configuration.");
            Ok(Config::default())
        }
    }
}

/// Run the preprocess step over every folder, returning true if all of them succeeded
fn preprocess(config: Config, folders: Vec<PathBuf>, pb_manager: &MultiProgress) -> bool {
    if !config.is_n_threads_valid() {
        log::error!("Number of threads must be at least 1, got {}", config.n_threads);
        return false;
    }
    let decoder = match CommandDecoder::from_config(&config) {
        Ok(d) => Arc::new(d),
        Err(e) => {
            log::error!("{e}");
            return false;
        }
    };
    log::info!("Channel: {}", config.channel);
    log::info!("Decoder: {:?}", config.decoder_program);
    log::info!("Folders to process: {}", folders.len());

    let source = Arc::new(TriggerSource::new(&config, decoder));
    let subsets: Vec<Vec<PathBuf>> = create_subsets(&config, &folders)
        .into_iter()
        .filter(|subset| !subset.is_empty())
        .collect();

    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    let mut bars = Vec::with_capacity(subsets.len());
    let mut workers = Vec::with_capacity(subsets.len());
    for (idx, subset) in subsets.into_iter().enumerate() {
        let pb = pb_manager.add(ProgressBar::new(100));
        pb.set_style(bar_style(BarColor::CYAN));
        pb.set_prefix(format!("Worker {idx}"));
        bars.push(pb);

        let conf = config.clone();
        let source = source.clone();
        let tx = tx.clone();
        workers.push(std::thread::spawn(move || {
            process_subset(&conf, &source, &tx, idx, &subset)
        }));
    }
    drop(tx);

    // The channel disconnects once every worker has dropped its sender
    loop {
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(status) => {
                if let Some(pb) = bars.get(status.worker_id) {
                    pb.set_style(bar_style(status.color));
                    pb.set_message(status.folder.to_string_lossy().to_string());
                    pb.set_position((status.progress * 100.0) as u64);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => (),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let mut outcomes: Vec<FolderOutcome> = Vec::new();
    let mut is_ok = true;
    for worker in workers {
        match worker.join() {
            Ok(Ok(mut results)) => outcomes.append(&mut results),
            Ok(Err(e)) => {
                log::error!("Worker stopped early: {e}");
                is_ok = false;
            }
            Err(_) => {
                log::error!("An error occured joining one of the workers!");
                is_ok = false;
            }
        }
    }
    for pb in bars {
        pb.finish();
    }

    for outcome in outcomes.iter() {
        match &outcome.result {
            Ok(report) => log::info!(
                "{}: {} triggers, {} columns written to {}",
                outcome.folder.to_string_lossy(),
                report.n_triggers,
                report.n_columns,
                report.store_path.to_string_lossy()
            ),
            Err(e) => {
                log::error!("{}: {e}", outcome.folder.to_string_lossy());
                is_ok = false;
            }
        }
    }
    log::info!(
        "Decoded {} triggers; {} still cached.",
        outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| r.n_triggers)
            .sum::<usize>(),
        source.cached_triggers()
    );
    is_ok
}

fn print_comparison(comparison: &RunComparison) {
    print!("{}", comparison.report());
    println!("bin_center\tbin_half_width\tbackground_rate\tbackground_error\tsignal_rate\tsignal_error\tratio\tratio_error");
    let centers = comparison.edges().bin_centers();
    let half_widths = comparison.edges().bin_half_widths();
    let background = &comparison.background.rates;
    let signal = &comparison.signal.rates;
    for bin in 0..centers.len() {
        println!(
            "{:.4}\t{:.4}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.4}\t{:.4}",
            centers[bin],
            half_widths[bin],
            background.rate[bin],
            background.rate_error[bin],
            signal.rate[bin],
            signal.rate_error[bin],
            comparison.ratio.ratio[bin],
            comparison.ratio.error[bin],
        );
    }
}

/// Compare a signal run to a background run, returning true on success
fn compare(config: &Config, matches: &ArgMatches) -> bool {
    let background_folder: PathBuf = matches
        .get_one::<String>("background")
        .map(PathBuf::from)
        .unwrap_or_default();
    let signal_folder: PathBuf = matches
        .get_one::<String>("signal")
        .map(PathBuf::from)
        .unwrap_or_default();
    let labels: Vec<String> = match matches.get_many::<String>("labels") {
        Some(labels) => labels.cloned().collect(),
        None => vec![
            background_folder.to_string_lossy().to_string(),
            signal_folder.to_string_lossy().to_string(),
        ],
    };

    let edges = match config.get_bin_edges() {
        Ok(e) => e,
        Err(e) => {
            log::error!("{e}");
            return false;
        }
    };
    let background_store = config.get_store_path(&background_folder);
    let background = match RunFeatures::load(&labels[0], &background_store) {
        Ok(run) => run,
        Err(e) => {
            log::error!("Could not load background run: {e}");
            return false;
        }
    };
    let signal = match RunFeatures::load(&labels[1], &config.get_store_path(&signal_folder)) {
        Ok(run) => run,
        Err(e) => {
            log::error!("Could not load signal run: {e}");
            return false;
        }
    };

    match compare_runs(&background, &signal, &edges) {
        Ok(comparison) => {
            print_comparison(&comparison);
            true
        }
        Err(e) => {
            log::error!("Comparison failed with error: {e}");
            false
        }
    }
}

fn main() -> ExitCode {
    // Create a cli
    let matches = Command::new("trace_reducer_cli")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .help("Path to the configuration file"),
        )
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(
            Command::new("preprocess")
                .about("Extract trigger features from run folders into HDF5 stores")
                .arg(
                    Arg::new("folders")
                        .required(true)
                        .num_args(1..)
                        .help("Run folders containing waveform files"),
                ),
        )
        .subcommand(
            Command::new("compare")
                .about("Compare the pulse height spectra of a background and a signal run")
                .arg(Arg::new("background").required(true).help("Background run folder"))
                .arg(Arg::new("signal").required(true).help("Signal run folder"))
                .arg(
                    Arg::new("labels")
                        .long("labels")
                        .num_args(2)
                        .value_names(["BACKGROUND", "SIGNAL"])
                        .help("Labels used in the summary"),
                ),
        )
        .get_matches();

    // Initialize feedback
    let pb_manager = MultiProgress::new();
    if let Err(e) = init_logging(&pb_manager) {
        eprintln!("Could not create logging/progress: {e}");
        return ExitCode::FAILURE;
    }

    let is_ok = match matches.subcommand() {
        Some(("new", sub_matches)) => {
            let Some(config_path) = sub_matches.get_one::<String>("config") else {
                log::error!("The new command requires a path given with -c/--config");
                return ExitCode::FAILURE;
            };
            log::info!("Making a template config at {}...", config_path);
            match make_template_config(Path::new(config_path)) {
                Ok(()) => true,
                Err(e) => {
                    log::error!("{e}");
                    false
                }
            }
        }
        Some(("preprocess", sub_matches)) => match load_config(sub_matches) {
            Ok(config) => {
                let folders: Vec<PathBuf> = sub_matches
                    .get_many::<String>("folders")
                    .map(|folders| folders.map(PathBuf::from).collect())
                    .unwrap_or_default();
                preprocess(config, folders, &pb_manager)
            }
            Err(e) => {
                log::error!("{e}");
                false
            }
        },
        Some(("compare", sub_matches)) => match load_config(sub_matches) {
            Ok(config) => compare(&config, sub_matches),
            Err(e) => {
                log::error!("{e}");
                false
            }
        },
        _ => false,
    };

    if is_ok {
        log::info!("Done.");
        ExitCode::SUCCESS
    } else {
        log::error!("Finished with errors. See {} for details.", LOG_FILE_NAME);
        ExitCode::FAILURE
    }
}
