//! Kobo Activities - KoboToolbox submissions normalized for activity reporting.
//!
//! # Overview
//!
//! A planning survey on KoboToolbox collects one submission per activity.
//! The form has been revised several times, so the same question appears
//! under different field names depending on when it was answered. This crate
//! downloads every submission and rewrites each one into a fixed
//! [`model::Activity`] record that the reporting dashboard can rely on.
//!
//! # Stages
//!
//! 1. **Fetch**: follow the API's `next` links and save all submissions as a
//!    single page-shaped JSON file.
//! 2. **Transform**: resolve field-name aliases, normalize dates, statuses,
//!    priorities and percentages, derive the overdue flag, sort, and save.
//!
//! # Modules
//!
//! - [`config`]: Settings read once from the environment
//! - [`data_sources`]: KoboToolbox API client
//! - [`model`]: Submission and activity types
//! - [`normalize`]: Alias resolution and value normalization
//! - [`storage`]: Atomic JSON file reads and writes
//! - [`pipeline`]: Stages wired to their input and output files

pub mod config;
pub mod data_sources;
pub mod error;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod storage;
