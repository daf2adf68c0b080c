//! Client library for the remote image-generation compute service.
//!
//! Provides the [`ComputeService`] seam, an HTTP implementation over
//! reqwest, fixed-interval task polling with optional limits and retry,
//! and a [`JobRunner`] that composes submission with polling.

pub mod api;
pub mod config;
pub mod error;
pub mod poller;
pub mod retry;
pub mod runner;
pub mod service;

pub use api::ComputeApi;
pub use config::{ComputeConfig, PollLimits};
pub use error::ComputeError;
pub use poller::TaskPoller;
pub use retry::RetryPolicy;
pub use runner::JobRunner;
pub use service::ComputeService;
