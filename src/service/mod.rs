//! Service Module
//!
//! Request resolution: cache lookup, upstream fetch on miss, admission.

mod resolver;

pub use resolver::{CacheReport, Outcome, Resolution, ResolutionService};
