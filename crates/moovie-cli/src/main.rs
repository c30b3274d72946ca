//! Moovie CLI - inspect caption files and simulate cue playback.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use moovie_core::core::settings::default_config_dir;
use moovie_core::{
    format_clock, CaptionFormat, CueSyntaxError, CueTrack, MediaElement, MediaSignal,
    PlayerSession, PlayerSettings, SettingsManager, TimeSec, TrackKind,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "moovie-cli")]
#[command(version)]
#[command(about = "Inspect caption files and simulate cue playback")]
#[command(long_about = "Moovie CLI parses WebVTT and SRT caption files and replays them \
    against a scripted playback clock.\n\n\
    EXAMPLES:\n    \
    moovie-cli parse movie.vtt\n    \
    moovie-cli simulate movie.srt --at 1 2.5 4 0.5\n    \
    moovie-cli clock 3725")]
struct Cli {
    /// Settings directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a caption file and print its cues as JSON
    Parse {
        /// Caption file (.vtt or .srt)
        file: PathBuf,

        /// Format override (vtt, srt)
        #[arg(long)]
        format: Option<String>,
    },

    /// Reconcile a caption file at a sequence of playback positions
    Simulate {
        /// Caption file (.vtt or .srt)
        file: PathBuf,

        /// Format override (vtt, srt)
        #[arg(long)]
        format: Option<String>,

        /// Playback positions in seconds, visited in order
        #[arg(long = "at", required = true, num_args = 1.., allow_negative_numbers = true)]
        at: Vec<f64>,

        /// Track language (defaults to the preferred caption language)
        #[arg(long)]
        language: Option<String>,
    },

    /// Format seconds as a playback clock
    Clock {
        #[arg(allow_negative_numbers = true)]
        seconds: f64,
    },

    /// Print the effective settings as JSON
    Settings {
        /// Write the effective settings back to disk
        #[arg(long)]
        save: bool,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error("Cannot infer caption format of {0:?}; pass --format")]
    UnknownFormat(PathBuf),

    #[error("No settings directory available; pass --config")]
    NoConfigDir,
}

// =============================================================================
// Output
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParseOutput<'a> {
    file: &'a Path,
    format: CaptionFormat,
    cues: &'a [moovie_core::Cue],
    skipped: &'a [CueSyntaxError],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationStep {
    time_sec: TimeSec,
    clock: String,
    state: String,
    entered: Vec<String>,
    exited: Vec<String>,
    active: Vec<String>,
    paused_host: bool,
}

// =============================================================================
// Scripted Host
// =============================================================================

/// Media host driven by the command line instead of a decoder
struct ScriptedHost {
    time: TimeSec,
    duration: TimeSec,
    paused: bool,
}

impl MediaElement for ScriptedHost {
    fn current_time(&self) -> TimeSec {
        self.time
    }

    fn duration(&self) -> TimeSec {
        self.duration
    }

    fn has_metadata(&self) -> bool {
        true
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn seek(&mut self, time_sec: TimeSec) {
        self.time = time_sec;
    }
}

// =============================================================================
// Commands
// =============================================================================

fn settings_manager(config: Option<&Path>) -> Option<SettingsManager> {
    config
        .map(Path::to_path_buf)
        .or_else(default_config_dir)
        .map(SettingsManager::new)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_format(file: &Path, format: Option<&str>) -> anyhow::Result<CaptionFormat> {
    match format {
        Some(tag) => Ok(tag.parse()?),
        None => CaptionFormat::from_path(file)
            .map_err(|_| CliError::UnknownFormat(file.to_path_buf()).into()),
    }
}

async fn read_captions(file: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))
}

async fn run_parse(file: PathBuf, format: Option<String>) -> anyhow::Result<()> {
    let format = resolve_format(&file, format.as_deref())?;
    let text = read_captions(&file).await?;
    let parsed = moovie_core::parse(format, &text)?;

    for err in &parsed.skipped {
        eprintln!("skipped: {}", err);
    }

    let output = ParseOutput {
        file: &file,
        format,
        cues: &parsed.cues,
        skipped: &parsed.skipped,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_simulate(
    settings: PlayerSettings,
    file: PathBuf,
    format: Option<String>,
    at: Vec<f64>,
    language: Option<String>,
) -> anyhow::Result<()> {
    let format = resolve_format(&file, format.as_deref())?;
    let text = read_captions(&file).await?;

    let label = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let language = language.unwrap_or_else(|| settings.captions.preferred_language.clone());

    let mut session = PlayerSession::new(settings);
    let track_id = session.add_track(CueTrack::create(TrackKind::Subtitles, &label, &language));
    let report = session.load_track(&track_id, format, &text)?;
    info!("Simulating {} cues from {:?}", report.cue_count, file);

    let duration = session
        .track(&track_id)
        .map(|t| t.cues().iter().map(|c| c.end_sec).fold(0.0, f64::max))
        .unwrap_or(0.0);
    let mut host = ScriptedHost {
        time: 0.0,
        duration,
        paused: true,
    };

    session.attach(&host);
    host.paused = false;
    session.on_signal(MediaSignal::Play, &mut host);

    for time_sec in at {
        let outcome = if time_sec < host.time {
            session.on_signal(MediaSignal::Seeking, &mut host);
            host.seek(time_sec);
            session.on_signal(MediaSignal::Seeked { paused: host.paused }, &mut host)
        } else {
            host.seek(time_sec);
            session.on_signal(MediaSignal::TimeUpdate, &mut host)
        };
        debug!("Step at {}s -> {}", time_sec, outcome.transition.state);

        let Some(track) = session.track(&track_id) else {
            break;
        };
        let texts = |indices: &[moovie_core::CueIndex]| -> Vec<String> {
            indices
                .iter()
                .filter_map(|idx| track.cue(*idx))
                .map(|cue| cue.text.clone())
                .collect()
        };

        let (entered, exited) = outcome
            .captions
            .first()
            .map(|batch| (texts(&batch.transitions.entered), texts(&batch.transitions.exited)))
            .unwrap_or_default();

        let step = SimulationStep {
            time_sec,
            clock: format_clock(time_sec),
            state: session.state().to_string(),
            entered,
            exited,
            active: track.active_cues().map(|cue| cue.text.clone()).collect(),
            paused_host: outcome.paused_host,
        };
        println!("{}", serde_json::to_string(&step)?);
    }

    Ok(())
}

fn run_settings(
    manager: Option<SettingsManager>,
    settings: PlayerSettings,
    save: bool,
) -> anyhow::Result<()> {
    let settings = if save {
        let manager = manager.ok_or(CliError::NoConfigDir)?;
        let saved = manager.save(&settings)?;
        eprintln!("Saved settings to {:?}", manager.settings_path());
        saved
    } else {
        settings
    };

    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let manager = settings_manager(cli.config.as_deref());
    let settings = manager
        .as_ref()
        .map(SettingsManager::load)
        .unwrap_or_default();

    init_logging(cli.verbose || settings.general.debug);

    match cli.command {
        Command::Parse { file, format } => run_parse(file, format).await,
        Command::Simulate {
            file,
            format,
            at,
            language,
        } => run_simulate(settings, file, format, at, language).await,
        Command::Clock { seconds } => {
            println!("{}", format_clock(seconds));
            Ok(())
        }
        Command::Settings { save } => run_settings(manager, settings, save),
    }
}
