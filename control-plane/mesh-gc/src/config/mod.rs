pub mod cni;
pub mod types;

pub use cni::CniConfig;
pub use types::{GcConfig, RetryConfig};
