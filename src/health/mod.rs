// src/health/mod.rs
mod checker;
mod probe;
mod status;

pub use checker::{CheckBatch, CheckResult, HealthChecker, Summary};
pub use probe::{HttpProbe, Probe};
pub use status::{Category, Status};
