pub mod face;
pub mod feature;
pub mod measure;

pub use face::*;
pub use feature::*;
pub use measure::*;
