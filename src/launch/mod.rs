// src/launch/mod.rs

//! The launch sequence: build a [`LaunchPlan`], then [`transfer_control`].

pub mod environment;
pub mod handoff;
pub mod logs;
pub mod plan;
pub mod workdir;

pub use environment::LaunchEnvironment;
pub use handoff::transfer_control;
pub use logs::LogTargets;
pub use plan::{LaunchPlan, resolve_program};
pub use workdir::resolve_workdir;
