use crate::engine::PlotEngine;
use crate::model::{GroupToggles, PlotEvent, PlotGroup, RunConfig};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "plot-smallbaseline",
    version,
    about = "Plot the products of a small-baseline InSAR time-series run"
)]
pub struct Cli {
    /// Directory holding the time-series products
    #[arg(short = 'C', long, default_value = ".")]
    pub workdir: PathBuf,

    /// Viewer command; may include leading arguments (e.g. "python3 -m mintpy.view")
    #[arg(long, default_value = "view.py")]
    pub view_cmd: String,

    /// Resolution passed to the viewer
    #[arg(long, default_value_t = 150)]
    pub dpi: u32,

    /// Mask file overlaid on velocity and time-series plots
    #[arg(long, default_value = "maskTempCoh.h5")]
    pub mask_file: String,

    /// Log file (relative to the working directory), appended to on every run
    #[arg(long, default_value = "plot_smallbaselineApp.log")]
    pub log_file: String,

    /// Output folder (relative to the working directory) for png/pdf/kmz files
    #[arg(long, default_value = "pic")]
    pub pic_dir: String,

    /// Use --plot-key-files true or --plot-key-files false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub plot_key_files: bool,

    /// Plot the loaded interferogram stack
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub plot_loaded_data: bool,

    /// Plot auxiliary files derived from the loaded stack
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub plot_loaded_data_aux: bool,

    /// Plot time-series files
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub plot_timeseries: bool,

    /// Plot geocoded products under geo/
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub plot_geocoded_data: bool,

    /// Plot the remaining velocity and count files
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub plot_the_rest: bool,

    /// Plot only these groups (overrides the per-group switches)
    #[arg(long, value_enum, num_args = 1..)]
    pub only: Vec<PlotGroup>,

    /// Kill a viewer invocation that runs longer than this (e.g. 10m)
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// List what would be plotted without running the viewer
    #[arg(long)]
    pub dry_run: bool,

    /// Print JSON report and exit
    #[arg(long)]
    pub json: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long)]
    pub silent: bool,
}

impl Cli {
    fn toggles(&self) -> GroupToggles {
        if !self.only.is_empty() {
            return GroupToggles::only(&self.only);
        }
        GroupToggles {
            key_files: self.plot_key_files,
            loaded_data: self.plot_loaded_data,
            loaded_data_aux: self.plot_loaded_data_aux,
            timeseries: self.plot_timeseries,
            geocoded_data: self.plot_geocoded_data,
            the_rest: self.plot_the_rest,
        }
    }
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> RunConfig {
    RunConfig {
        workdir: args.workdir.clone(),
        view_cmd: args.view_cmd.clone(),
        dpi: args.dpi,
        mask_file: args.mask_file.clone(),
        log_file: args.log_file.clone(),
        pic_dir: args.pic_dir.clone(),
        toggles: args.toggles(),
        timeout: args.timeout.map(Duration::from),
        dry_run: args.dry_run,
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.silent && args.json {
        return Err(anyhow::anyhow!(
            "--silent and --json are mutually exclusive"
        ));
    }
    if !args.workdir.is_dir() {
        return Err(anyhow::anyhow!(
            "working directory {} does not exist",
            args.workdir.display()
        ));
    }

    let cfg = build_config(&args);
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<PlotEvent>();

    let engine = PlotEngine::new(cfg);
    let handle = tokio::spawn(async move { engine.run(evt_tx).await });

    // Progress goes to stderr so stdout stays clean for JSON.
    while let Some(ev) = evt_rx.recv().await {
        if args.silent {
            continue;
        }
        if let Some(msg) = ev.to_message() {
            let _ = out_tx.send(OutputLine::Stderr(msg));
        }
    }

    let report = handle
        .await
        .context("plot task failed")?
        .context("batch plotting failed")?;

    if args.json {
        let out = serde_json::to_string_pretty(&report)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else if !args.silent {
        let summary = crate::text_summary::build_text_summary(&report);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
