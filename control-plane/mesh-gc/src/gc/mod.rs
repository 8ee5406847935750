//! Version-aware garbage collection of infrastructure shared between
//! control planes.

pub mod catalog;
pub mod census;
pub mod executor;
pub mod ownership;
pub mod pruner;
pub mod resolver;

pub use catalog::{CNI_RESOURCES, ResourceDescriptor, Scope};
pub use ownership::Attribution;
pub use pruner::{CniPruner, PruneReport};
