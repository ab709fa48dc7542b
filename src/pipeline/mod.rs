//! Transform pipeline.
//!
//! ```text
//!              ┌──────────────────────────┐
//!              │       Orchestrator       │
//!              └────────────┬─────────────┘
//!          ┌────────────────┴─────────────────┐
//!          ▼                                  ▼
//!   compress phase                     image phases
//!   (output root)                (output root ∥ public root)
//!          │                                  │
//!          └────────────────┬─────────────────┘
//!                           ▼ both settled
//!                        archive
//! ```
//!
//! Each [`PipelinePhase`] is one scan → filter → staleness → fan-out cycle
//! driving a [`TransformJob`]. Per-file failures stay inside the phase's
//! [`PhaseReport`]; only structural failures leave the pipeline as `Err`.

mod compress;
mod image;
mod job;
mod orchestrator;
mod phase;
mod report;

pub use compress::CompressJob;
pub use image::ImageJob;
pub use job::{JobError, TransformJob, TransformResult};
pub(crate) use job::run_blocking;
pub use orchestrator::Orchestrator;
pub use phase::{PhaseLimits, PipelinePhase};
pub use report::PhaseReport;
