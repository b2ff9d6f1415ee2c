//! Domain models for the Uniform Allocation service

mod inventory;
mod job;
mod optimization;
mod picking;
mod school;

pub use inventory::*;
pub use job::*;
pub use optimization::*;
pub use picking::*;
pub use school::*;
