//! Uniform Allocation client
//!
//! Talks to the allocation service, drives optimization jobs to completion
//! and keeps the state the screens render.

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod store;

pub use app::App;
pub use config::Config;
pub use controller::{CompletedRun, JobController, Phase, PollSchedule, RunHandle};
pub use error::{ClientError, ClientResult, ErrorDetail};
pub use gateway::{Gateway, HttpGateway};
pub use store::{reduce, Action, AppState, Store};
