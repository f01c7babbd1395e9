pub mod local;
pub mod store;

pub use local::LocalBlobStore;
pub use store::{BlobError, BlobStore};
