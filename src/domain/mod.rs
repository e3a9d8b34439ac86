// Domain layer - Session entities and figure models
pub mod axis_range;
pub mod feature;
pub mod figure;
pub mod inference;
pub mod lookback;
pub mod records;
