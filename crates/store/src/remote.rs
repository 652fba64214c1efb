use async_trait::async_trait;

use crate::error::Result;

/// Opaque remote folder handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderId(pub u64);

/// Opaque remote file handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileId(pub u64);

impl std::fmt::Display for FolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upload contract the pipeline depends on.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Walk `segments` from the root, creating each level as needed, and
    /// return the id of the final folder. Idempotent: existing folders are
    /// reused, and two concurrent walkers converge on the same folder.
    async fn ensure_path(&self, segments: &[&str]) -> Result<FolderId>;

    /// Upload `bytes` as `filename` into `folder`.
    async fn upload(&self, folder: FolderId, filename: &str, bytes: Vec<u8>) -> Result<FileId>;
}
