mod report;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use tracepick_core::model::Session;
use tracepick_core::{Exporter, InputShape, JsonExporter, ViewConfig};

/// Seed for the demonstration dataset shown by `--demo-fallback`.
const DEMO_SEED: u64 = 0x7ace;

#[derive(Debug, Parser)]
#[command(name = "tracepick", version, about = "Load an execution trace, query it and export a selection")]
struct Cli {
    /// Trace file: Chrome trace event JSON or ftrace/systrace marker text.
    file: PathBuf,

    /// Input shape instead of sniffing (json, text, protobuf, auto).
    #[arg(long)]
    shape: Option<InputShape>,

    /// Visible window in µs from the first event.
    #[arg(long, num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true)]
    window: Option<Vec<f64>>,

    /// Click at a time and layout height; toggles the hit slice in the selection.
    #[arg(long, num_args = 2, value_names = ["TIME", "Y"], action = clap::ArgAction::Append)]
    at: Vec<f64>,

    /// Drag-select a rectangle; adds the covered slices to the selection.
    #[arg(long, num_args = 4, value_names = ["T0", "T1", "Y0", "Y1"], action = clap::ArgAction::Append)]
    rect: Vec<f64>,

    /// Select every slice visible in the window.
    #[arg(long)]
    select_visible: bool,

    /// Hide a track by id. May be repeated.
    #[arg(long = "hide", value_name = "TRACK")]
    hide: Vec<u32>,

    /// Print the selection (hidden tracks excluded) as JSON.
    #[arg(long)]
    export: bool,

    /// Show the demonstration dataset when the file cannot be decoded.
    #[arg(long)]
    demo_fallback: bool,

    /// Layout configuration (JSON).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => ViewConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewConfig::default(),
    };

    let data = std::fs::read(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;
    let mut session = Session::new(config);
    if let Err(err) = session.load(&data, cli.shape) {
        if !cli.demo_fallback {
            return Err(err).with_context(|| format!("decoding {}", cli.file.display()));
        }
        log::warn!(
            "{} could not be decoded ({err}); showing demonstration data",
            cli.file.display()
        );
        session.load_demo(DEMO_SEED);
    }

    for &track in &cli.hide {
        ensure!(
            session.dataset().track(track).is_some(),
            "no track with id {track}"
        );
        session.toggle_track(track);
    }
    if let Some(window) = &cli.window {
        session.set_window(window[0], window[1]);
    }

    let mut out = std::io::stdout().lock();
    report::summary(&mut out, &session)?;
    report::window(&mut out, &session)?;

    for point in cli.at.chunks_exact(2) {
        let hit = session.click(point[0], point[1], true);
        report::hit(&mut out, &session, point[0], point[1], hit)?;
    }
    for rect in cli.rect.chunks_exact(4) {
        let covered = session.drag_select(rect[0], rect[1], rect[2], rect[3], true);
        writeln!(
            out,
            "rect t=[{}, {}] y=[{}, {}]: {covered} slices",
            rect[0], rect[1], rect[2], rect[3]
        )?;
    }
    if cli.select_visible {
        let count = session.select_all_visible();
        writeln!(out, "selected {count} visible slices")?;
    }

    report::selection(&mut out, &session)?;

    if cli.export {
        let json = JsonExporter::pretty()
            .export(&session.export_payload())
            .context("exporting selection")?;
        writeln!(out, "{json}")?;
    }

    if let Some(frame) = session.take_frame() {
        log::debug!(
            "frame {} would redraw for {:?} ({} requests)",
            frame.seq,
            frame.reasons,
            frame.requests
        );
    }
    Ok(())
}
