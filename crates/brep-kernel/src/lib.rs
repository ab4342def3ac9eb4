pub mod mock_kernel;
pub mod traits;
pub mod types;

#[cfg(feature = "truck")]
mod native;
#[cfg(feature = "truck")]
pub mod tessellation;
#[cfg(feature = "truck")]
pub mod truck_kernel;

pub use mock_kernel::{MockKernel, MockSolid};
pub use traits::*;
#[cfg(feature = "truck")]
pub use truck_kernel::TruckKernel;
pub use types::*;
