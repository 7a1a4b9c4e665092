//! Concrete pipeline stages

pub mod fetch;
pub mod ingest;
pub mod prepare;
pub mod register;
pub mod train;
pub mod transform;
pub mod validate;

use crate::model::LogisticRegressionTrainer;
use crate::stage::Stage;

pub use fetch::FetchStage;
pub use ingest::IngestStage;
pub use prepare::PrepareStage;
pub use register::RegisterFeaturesStage;
pub use train::TrainStage;
pub use transform::TransformStage;
pub use validate::ValidateStage;

/// The full stage chain in declared execution order.
pub fn standard_chain() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(FetchStage),
        Box::new(IngestStage),
        Box::new(ValidateStage),
        Box::new(PrepareStage),
        Box::new(TransformStage),
        Box::new(RegisterFeaturesStage),
        Box::new(TrainStage::new(Box::new(LogisticRegressionTrainer::default()))),
    ]
}
