//! Remote storage: the [`RemoteStore`] contract the pipeline uploads
//! through, and the pCloud REST adapter implementing it.

pub mod error;
pub mod pcloud;
pub mod remote;

pub use {
    error::{Error, Result},
    pcloud::PcloudStore,
    remote::{FileId, FolderId, RemoteStore},
};
