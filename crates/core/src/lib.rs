//! Domain types shared by the Lumterior relighting pipeline.
//!
//! Nothing in this crate performs network I/O. It describes the jobs sent
//! to the remote compute service, the task snapshots observed while
//! polling, the image records that seed a run, and the progress sink the
//! orchestrator reports into.

pub mod error;
pub mod job;
pub mod progress;
pub mod record;
pub mod reference;
pub mod storage;
pub mod task;
pub mod types;

pub use error::CoreError;
