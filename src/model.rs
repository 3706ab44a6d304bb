use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Flags appended to every viewer invocation (with `--dpi <n>` between them):
/// no interactive window, and let the viewer skip outputs that are already current.
pub const MODE_FLAGS: [&str; 2] = ["--nodisplay", "--update"];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PlotGroup {
    KeyFiles,
    LoadedData,
    LoadedDataAux,
    #[serde(rename = "timeseries")]
    #[value(name = "timeseries")]
    TimeSeries,
    GeocodedData,
    TheRest,
}

impl PlotGroup {
    /// All groups in execution order.
    pub const ALL: [PlotGroup; 6] = [
        PlotGroup::KeyFiles,
        PlotGroup::LoadedData,
        PlotGroup::LoadedDataAux,
        PlotGroup::TimeSeries,
        PlotGroup::GeocodedData,
        PlotGroup::TheRest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlotGroup::KeyFiles => "key-files",
            PlotGroup::LoadedData => "loaded-data",
            PlotGroup::LoadedDataAux => "loaded-data-aux",
            PlotGroup::TimeSeries => "timeseries",
            PlotGroup::GeocodedData => "geocoded-data",
            PlotGroup::TheRest => "the-rest",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlotGroup::KeyFiles => "Key files",
            PlotGroup::LoadedData => "Loaded interferogram stack",
            PlotGroup::LoadedDataAux => "Auxiliary files from loaded data",
            PlotGroup::TimeSeries => "Time-series files",
            PlotGroup::GeocodedData => "Geocoded products",
            PlotGroup::TheRest => "Remaining files",
        }
    }
}

impl std::fmt::Display for PlotGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-group enable switches. Everything is plotted by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupToggles {
    pub key_files: bool,
    pub loaded_data: bool,
    pub loaded_data_aux: bool,
    pub timeseries: bool,
    pub geocoded_data: bool,
    pub the_rest: bool,
}

impl Default for GroupToggles {
    fn default() -> Self {
        Self {
            key_files: true,
            loaded_data: true,
            loaded_data_aux: true,
            timeseries: true,
            geocoded_data: true,
            the_rest: true,
        }
    }
}

impl GroupToggles {
    /// Toggles with only the listed groups enabled.
    pub fn only(groups: &[PlotGroup]) -> Self {
        let mut toggles = Self::default();
        for group in PlotGroup::ALL {
            toggles.set(group, groups.contains(&group));
        }
        toggles
    }

    pub fn is_enabled(&self, group: PlotGroup) -> bool {
        match group {
            PlotGroup::KeyFiles => self.key_files,
            PlotGroup::LoadedData => self.loaded_data,
            PlotGroup::LoadedDataAux => self.loaded_data_aux,
            PlotGroup::TimeSeries => self.timeseries,
            PlotGroup::GeocodedData => self.geocoded_data,
            PlotGroup::TheRest => self.the_rest,
        }
    }

    pub fn set(&mut self, group: PlotGroup, enabled: bool) {
        let slot = match group {
            PlotGroup::KeyFiles => &mut self.key_files,
            PlotGroup::LoadedData => &mut self.loaded_data,
            PlotGroup::LoadedDataAux => &mut self.loaded_data_aux,
            PlotGroup::TimeSeries => &mut self.timeseries,
            PlotGroup::GeocodedData => &mut self.geocoded_data,
            PlotGroup::TheRest => &mut self.the_rest,
        };
        *slot = enabled;
    }
}

/// One candidate file in the plot catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotEntry {
    pub group: PlotGroup,
    /// Path relative to the working directory.
    pub file: PathBuf,
    /// Dataset selector passed right after the file, e.g. `unwrapPhase-`.
    #[serde(default)]
    pub selector: Option<String>,
    pub options: Vec<String>,
}

impl PlotEntry {
    /// Arguments for the viewer, without the program itself.
    pub fn command_args(&self, dpi: u32) -> Vec<String> {
        let mut args = Vec::with_capacity(self.options.len() + 6);
        args.push(self.file.to_string_lossy().into_owned());
        if let Some(selector) = &self.selector {
            args.push(selector.clone());
        }
        args.extend(self.options.iter().cloned());
        args.push(MODE_FLAGS[0].to_string());
        args.push("--dpi".to_string());
        args.push(dpi.to_string());
        args.push(MODE_FLAGS[1].to_string());
        args
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub workdir: PathBuf,
    /// Viewer command; whitespace separates the program from leading arguments.
    pub view_cmd: String,
    pub dpi: u32,
    pub mask_file: String,
    pub log_file: String,
    pub pic_dir: String,
    pub toggles: GroupToggles,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            view_cmd: "view.py".into(),
            dpi: 150,
            mask_file: "maskTempCoh.h5".into(),
            log_file: "plot_smallbaselineApp.log".into(),
            pic_dir: "pic".into(),
            toggles: GroupToggles::default(),
            timeout: None,
            dry_run: false,
        }
    }
}

impl RunConfig {
    pub fn log_path(&self) -> PathBuf {
        self.workdir.join(&self.log_file)
    }

    pub fn pic_path(&self) -> PathBuf {
        self.workdir.join(&self.pic_dir)
    }

    pub fn resolve(&self, file: &Path) -> PathBuf {
        self.workdir.join(file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// The viewer ran to completion. `code` is `None` when killed by a signal.
    Exited { code: Option<i32> },
    TimedOut,
    SpawnFailed { message: String },
    /// Dry run: the file exists and would have been plotted.
    Planned,
}

impl InvocationOutcome {
    pub fn is_failure(&self) -> bool {
        match self {
            InvocationOutcome::Exited { code } => *code != Some(0),
            InvocationOutcome::TimedOut | InvocationOutcome::SpawnFailed { .. } => true,
            InvocationOutcome::Planned => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub group: PlotGroup,
    pub file: PathBuf,
    pub args: Vec<String>,
    pub outcome: InvocationOutcome,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default)]
    pub timestamp: String,
    pub config: RunConfig,
    pub dem_file: PathBuf,
    pub invocations: Vec<Invocation>,
    /// Candidates of enabled groups that were absent on disk.
    pub skipped: usize,
    pub disabled_groups: Vec<PlotGroup>,
    pub relocated: Vec<PathBuf>,
}

impl RunReport {
    pub fn invocations_in(&self, group: PlotGroup) -> impl Iterator<Item = &Invocation> {
        self.invocations.iter().filter(move |inv| inv.group == group)
    }
}

/// Progress events emitted by the engine and consumed by CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlotEvent {
    GroupStarted { group: PlotGroup },
    GroupSkipped { group: PlotGroup },
    Invoking { group: PlotGroup, file: PathBuf },
    Invoked(Invocation),
    Relocated { path: PathBuf },
    Info(String),
}

impl PlotEvent {
    /// Render a human-readable message, or `None` for events not worth a line.
    pub fn to_message(&self) -> Option<String> {
        match self {
            PlotEvent::GroupStarted { group } => Some(format!("== {} ==", group.label())),
            PlotEvent::GroupSkipped { group } => {
                Some(format!("== {} (disabled) ==", group.label()))
            }
            PlotEvent::Invoking { file, .. } => Some(format!("plotting {}", file.display())),
            PlotEvent::Invoked(inv) => match &inv.outcome {
                InvocationOutcome::Exited { code: Some(0) } | InvocationOutcome::Planned => None,
                InvocationOutcome::Exited { code: Some(c) } => {
                    Some(format!("{}: viewer exited with status {c}", inv.file.display()))
                }
                InvocationOutcome::Exited { code: None } => {
                    Some(format!("{}: viewer terminated by signal", inv.file.display()))
                }
                InvocationOutcome::TimedOut => Some(format!(
                    "{}: viewer timed out after {}",
                    inv.file.display(),
                    humantime::format_duration(inv.elapsed)
                )),
                InvocationOutcome::SpawnFailed { message } => {
                    Some(format!("{}: failed to start viewer: {message}", inv.file.display()))
                }
            },
            PlotEvent::Relocated { .. } => None,
            PlotEvent::Info(msg) => Some(msg.clone()),
        }
    }
}
