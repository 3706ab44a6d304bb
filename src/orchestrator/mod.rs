//! Run lifecycle utilities around the plot engine.
//!
//! This module owns the append-only run log and post-run processing (collecting the
//! viewer's image artifacts). The engine calls into it before and after the plot groups.

mod post_process;
mod run_log;

pub(crate) use post_process::relocate_artifacts;
pub(crate) use run_log::{banner_timestamp, open_log, write_banner};
