mod viewer;

use crate::catalog;
use crate::model::{Invocation, InvocationOutcome, PlotEvent, RunConfig, RunReport};
use crate::orchestrator;
use anyhow::{Context, Result};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, trace, warn};
use viewer::ViewerCommand;

pub struct PlotEngine {
    cfg: RunConfig,
}

impl PlotEngine {
    pub fn new(cfg: RunConfig) -> Self {
        Self { cfg }
    }

    /// Walk the catalog group by group and plot every file that exists.
    ///
    /// Invocations run strictly one after another. Only setup failures (log file,
    /// output directory, unusable viewer command) abort the run.
    pub async fn run(self, event_tx: mpsc::UnboundedSender<PlotEvent>) -> Result<RunReport> {
        let cfg = self.cfg;
        let viewer = ViewerCommand::parse(&cfg.view_cmd)?;
        let timestamp = orchestrator::banner_timestamp();

        let log = if cfg.dry_run {
            None
        } else {
            let log_path = cfg.log_path();
            let mut log = orchestrator::open_log(&log_path)?;
            orchestrator::write_banner(&mut log, &timestamp)?;

            let pic = cfg.pic_path();
            if !pic.is_dir() {
                let _ = event_tx.send(PlotEvent::Info(format!(
                    "Create {} folder",
                    pic.display()
                )));
                std::fs::create_dir_all(&pic)
                    .with_context(|| format!("failed to create output directory {}", pic.display()))?;
            }
            Some(log)
        };

        let dem_file = catalog::resolve_dem(&cfg.workdir);
        info!("using DEM {}", dem_file.display());

        let mut invocations = Vec::new();
        let mut skipped = 0usize;
        let mut disabled_groups = Vec::new();

        for (group, entries) in catalog::catalog(&cfg, &dem_file) {
            if !cfg.toggles.is_enabled(group) {
                disabled_groups.push(group);
                let _ = event_tx.send(PlotEvent::GroupSkipped { group });
                continue;
            }
            let _ = event_tx.send(PlotEvent::GroupStarted { group });

            for entry in entries {
                if !cfg.resolve(&entry.file).is_file() {
                    trace!("{} not found, skipping", entry.file.display());
                    skipped += 1;
                    continue;
                }

                let args = entry.command_args(cfg.dpi);
                let _ = event_tx.send(PlotEvent::Invoking {
                    group,
                    file: entry.file.clone(),
                });

                let started = Instant::now();
                let outcome = match &log {
                    Some(log) => viewer.run(&args, &cfg.workdir, log, cfg.timeout).await?,
                    None => InvocationOutcome::Planned,
                };
                if outcome.is_failure() {
                    warn!("{} {}: {:?}", viewer.program(), entry.file.display(), outcome);
                }

                let invocation = Invocation {
                    group,
                    file: entry.file,
                    args,
                    outcome,
                    elapsed: started.elapsed(),
                };
                let _ = event_tx.send(PlotEvent::Invoked(invocation.clone()));
                invocations.push(invocation);
            }
        }

        let relocated = if cfg.dry_run {
            Vec::new()
        } else {
            let moved = orchestrator::relocate_artifacts(&cfg.workdir, &cfg.pic_path())?;
            for path in &moved {
                let _ = event_tx.send(PlotEvent::Relocated { path: path.clone() });
            }
            if !moved.is_empty() {
                let _ = event_tx.send(PlotEvent::Info(format!(
                    "Moved {} png/pdf/kmz files into {}",
                    moved.len(),
                    cfg.pic_path().display()
                )));
            }
            moved
        };

        Ok(RunReport {
            timestamp,
            config: cfg,
            dem_file,
            invocations,
            skipped,
            disabled_groups,
            relocated,
        })
    }
}
