//! photo-marathon-bot - game-day tracking engine for a month-long photo
//! challenge run inside a group chat.
//!
//! Each active participant must post at least two qualifying photos per game
//! day (06:00 to the next 06:00 in a fixed civil timezone) or is eliminated.
//! This crate provides:
//! - game-day and anchor arithmetic ([`clock`])
//! - the persistent participant/report store ([`repository`])
//! - the capped, idempotent counter engine and the elimination sweep
//!   ([`service::tracking_service`])
//! - roster reconciliation: identity binding plus historical backfill
//!   ([`service::reconciliation_service`])
//! - the live message collector ([`collector`]) and the three-anchor
//!   scheduler ([`task::challenge_scheduler`])
//!
//! The chat platform itself (message delivery, membership, history) is a
//! collaborator behind the [`chat::ChatPlatform`] trait; a platform-specific
//! binary wires a client implementation into [`service::Services`] and the
//! scheduler.

pub mod chat;
pub mod clock;
pub mod collector;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod repository;
pub mod service;
pub mod task;
