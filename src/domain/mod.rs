pub mod alert;
pub mod dataset;
pub mod forecast;
pub mod grid;
pub mod household;
pub mod pattern;

pub use alert::*;
pub use dataset::{DemandRecord, DEFAULT_REGION};
pub use forecast::*;
pub use household::{Household, HouseholdSpec};
pub use pattern::*;
