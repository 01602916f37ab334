//! Remote sources of survey submissions.
//!
//! # Data Sources
//!
//! - [`kobo`]: KoboToolbox v2 data API, paginated through `next` links

pub mod kobo;

pub use kobo::{FetchOptions, KoboClient};
