//! medscout-ranker — Disease opportunity scoring engine.
//! Min-max normalisation across candidates, signed weighted sum,
//! deterministic ordering.

pub mod normalise;
pub mod scorer;
pub mod weights;

pub use scorer::score_rows;
pub use weights::WeightTable;
