pub mod aggregate;
pub mod arrange;
pub mod compose;
pub mod curve_ops;
pub mod extract;
pub mod fill;
pub mod frame;
pub mod labels;
pub mod pipeline;
pub mod report;
pub mod section;

pub use pipeline::{TakeoffResult, TakeoffStats, run_takeoff};
