//! Job module
//!
//! [`FetchJob`] ties a source, the retrying transport, the format registry
//! and a sink into one run that produces one uploaded file.

mod fetch;
mod types;

pub use fetch::FetchJob;
pub use types::{JobReport, LocalArtifact};

#[cfg(test)]
mod tests;
