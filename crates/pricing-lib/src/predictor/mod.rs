//! Price prediction engine

mod batch;
mod encoder;
mod features;
mod heuristic;
mod inference;
mod orchestrator;
mod store;
mod trends;


pub use batch::{per_item_heuristic, price_batch, vectorized_learned, BatchRunner, MAX_BATCH_SIZE};
pub use encoder::{CategoricalColumn, CategoricalEncoder, DEFAULT_CODE};
pub use features::{current_year, FeatureNormalizer, DEFAULT_FLOORS, MAX_YEARS_AHEAD, MIN_YEAR_BUILT};
pub use heuristic::{
    amenity_value, condition_adjustment, contributions, location_premium, HeuristicEstimate,
    HeuristicPricingModel, AMENITY_VALUES, BASE_PRICE, CONDITION_ADJUSTMENTS, HEURISTIC_CONFIDENCE,
    HEURISTIC_RANGE_FRACTION, LOCATION_PREMIUMS, PRICE_PER_SQ_FT,
};
pub use inference::{
    FeatureRow, LearnedEstimate, LearnedModelAdapter, OnnxRegressor, RegressionModel,
    UnavailableReason, NUM_FEATURES, TRAINING_COLUMNS,
};
pub use orchestrator::{learned_result, PredictionOrchestrator, LEARNED_CONFIDENCE, LEARNED_RANGE_FRACTION};
pub use store::{compute_checksum, ModelPaths, ModelStatus, ModelStore, ReloadOutcome};
pub use trends::{MarketTrends, MarketTrendsReport, MarketTrendsReporter};
