// src/group/mod.rs

//! Composition groups: commands whose body is a small state machine over
//! member commands.
//!
//! - [`sequential`] runs members one after another.
//! - [`parallel`] runs members together until all finish.
//! - [`race`] runs members together until any finishes.
//! - [`deadline`] runs members together until a designated one finishes.
//!
//! Groups are built from [`Member`](crate::command::Member)s, which the
//! scheduler hands out only after marking the underlying commands composed
//! (see [`Scheduler::sequence`](crate::scheduler::Scheduler::sequence) and
//! friends). Metadata is aggregated with
//! [`aggregate_info`](crate::command::aggregate_info).

pub mod deadline;
pub mod parallel;
pub mod race;
pub mod sequential;

pub use deadline::ParallelDeadlineGroup;
pub use parallel::ParallelCommandGroup;
pub use race::ParallelRaceGroup;
pub use sequential::SequentialCommandGroup;
