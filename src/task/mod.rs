//! Background tasks.

pub mod challenge_scheduler;
