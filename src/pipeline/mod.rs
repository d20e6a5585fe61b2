//! Pipeline module for orchestrating terrain generation stages.
//!
//! A pipeline fills a heightfield from a source stage and then refines it,
//! currently with droplet erosion.

mod stage;

pub use stage::{
    ErosionStage, GenerationStage, HillStage, ImageStage, Pipeline, PipelineError, StageConfig,
    StageId,
};
