pub mod aggregator;
pub mod batch_pipeline;
pub mod snapshot;

pub use aggregator::{aggregate, majority_vote, summarize};
pub use batch_pipeline::{BatchPipeline, Pacing, PipelineObserver, PipelineState};
pub use snapshot::BatchSnapshot;
