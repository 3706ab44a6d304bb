//! Fixed catalog of the files a small-baseline run is expected to produce,
//! and the viewer options each one is plotted with.

use crate::model::{PlotEntry, PlotGroup, RunConfig};
use std::path::{Path, PathBuf};

/// DEM sources in order of preference: radar geometry first, then geocoded geometry.
pub const DEM_CANDIDATES: [&str; 2] = ["inputs/geometryRadar.h5", "inputs/geometryGeo.h5"];

/// Tropospheric correction models that appear as time-series suffixes.
pub const TROP_MODELS: [&str; 4] = ["ECMWF", "MERRA", "NARR", "tropHgt"];

/// Correction models that have their own velocity file.
pub const VELOCITY_TROP_MODELS: [&str; 3] = ["ECMWF", "MERRA", "NARR"];

const TROP_VARIANTS: [&str; 4] = ["", "_demErr", "_ramp", "_ramp_demErr"];

const GRAY_UNIT_RANGE: [&str; 5] = ["-c", "gray", "--vlim", "0", "1"];

/// Pick the DEM overlay. Falls back to the first candidate when neither
/// exists; the viewer deals with a missing DEM itself.
pub fn resolve_dem(workdir: &Path) -> PathBuf {
    DEM_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| workdir.join(p).is_file())
        .unwrap_or_else(|| PathBuf::from(DEM_CANDIDATES[0]))
}

fn entry(group: PlotGroup, file: impl Into<PathBuf>, options: &[&str]) -> PlotEntry {
    PlotEntry {
        group,
        file: file.into(),
        selector: None,
        options: options.iter().map(|s| s.to_string()).collect(),
    }
}

fn selected(group: PlotGroup, file: &str, selector: &str, options: &[&str]) -> PlotEntry {
    PlotEntry {
        selector: Some(selector.to_string()),
        ..entry(group, file, options)
    }
}

/// Ordered candidates for one group.
pub fn group_entries(group: PlotGroup, cfg: &RunConfig, dem: &Path) -> Vec<PlotEntry> {
    let mask = cfg.mask_file.as_str();
    match group {
        PlotGroup::KeyFiles => {
            let dem = dem.to_string_lossy();
            vec![
                entry(
                    group,
                    "velocity.h5",
                    &["--dem", &*dem, "--mask", mask, "-u", "cm"],
                ),
                entry(group, "temporalCoherence.h5", &GRAY_UNIT_RANGE),
                entry(group, "maskTempCoh.h5", &GRAY_UNIT_RANGE),
                entry(group, DEM_CANDIDATES[0], &[]),
                entry(group, DEM_CANDIDATES[1], &[]),
            ]
        }
        PlotGroup::LoadedData => {
            let stack = "inputs/ifgramStack.h5";
            vec![
                selected(group, stack, "unwrapPhase-", &["--zero-mask", "--wrap"]),
                selected(group, stack, "unwrapPhase-", &["--zero-mask"]),
                selected(group, stack, "coherence-", &["--mask", "no"]),
            ]
        }
        PlotGroup::LoadedDataAux => vec![
            entry(group, "avgPhaseVelocity.h5", &[]),
            entry(group, "avgSpatialCoh.h5", &GRAY_UNIT_RANGE),
            entry(group, "maskConnComp.h5", &GRAY_UNIT_RANGE),
        ],
        PlotGroup::TimeSeries => {
            let opts = ["--mask", mask, "--noaxis", "-u", "cm"];
            let mut files = vec![
                "timeseries.h5".to_string(),
                // line-of-sight delay corrected (Envisat)
                "timeseries_LODcor.h5".to_string(),
                "timeseries_LODcor_ECMWF.h5".to_string(),
            ];
            for trop in TROP_MODELS {
                for variant in TROP_VARIANTS {
                    files.push(format!("timeseries_{trop}{variant}.h5"));
                }
            }
            files.push("timeseries_ramp.h5".to_string());
            files.push("timeseries_demErr_ramp.h5".to_string());
            files.into_iter().map(|f| entry(group, f, &opts)).collect()
        }
        PlotGroup::GeocodedData => vec![
            entry(group, "geo/geo_maskTempCoh.h5", &["-c", "gray"]),
            entry(group, "geo/geo_temporalCoherence.h5", &["-c", "gray"]),
            selected(group, "geo/geo_velocity.h5", "velocity", &[]),
            entry(group, "geo/geo_timeseries_ECMWF_demErr_ramp.h5", &["--noaxis"]),
            entry(group, "geo/geo_timeseries_ECMWF_demErr.h5", &["--noaxis"]),
            entry(group, "geo/geo_timeseries_demErr_ramp.h5", &["--noaxis"]),
            entry(group, "geo/geo_timeseries_demErr.h5", &["--noaxis"]),
        ],
        PlotGroup::TheRest => VELOCITY_TROP_MODELS
            .iter()
            .map(|trop| format!("velocity{trop}.h5"))
            .chain(std::iter::once("numInvIfgram.h5".to_string()))
            .map(|f| entry(group, f, &["--mask", "no"]))
            .collect(),
    }
}

/// The whole catalog, groups in execution order.
pub fn catalog(cfg: &RunConfig, dem: &Path) -> Vec<(PlotGroup, Vec<PlotEntry>)> {
    PlotGroup::ALL
        .iter()
        .map(|group| (*group, group_entries(*group, cfg, dem)))
        .collect()
}
