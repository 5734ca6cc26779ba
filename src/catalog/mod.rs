// Resource catalog: the static, ordered list of assets a preload session fetches.

pub mod catalog;
pub mod descriptor;

pub use catalog::ResourceCatalog;
pub use descriptor::{Priority, ResourceDescriptor, ResourceKind};
