//! Shared primitives for the Parley gateway crates

#![allow(clippy::must_use_candidate)]

mod error;
mod time;

pub use error::HttpError;
pub use time::unix_now;
