pub mod store;
pub mod tracker;

pub use store::ProgressStore;
pub use tracker::{ProgressSettings, ProgressTracker};
