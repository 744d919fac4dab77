pub mod extractor;
pub mod partitioner;
pub mod pipeline;

pub use pipeline::{partition_all, run, RunSummary};
