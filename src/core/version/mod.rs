pub mod catalog;
pub mod manifest;
pub mod model;
pub mod version_file;

pub use catalog::VersionCatalog;
pub use manifest::{MojangVersionSource, VersionManifest, VersionSource};
pub use model::{LoaderType, VersionDescriptor, VersionRecord};
pub use version_file::VersionJson;
