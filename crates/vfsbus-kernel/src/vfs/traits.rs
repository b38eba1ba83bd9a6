//! The virtual file seam and its error type.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::emitter::EventEmitter;

/// Errors a virtual file tree reports back to dispatch.
#[derive(Debug, thiserror::Error)]
pub enum VfsError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("is a directory: {}", .0.display())]
    IsADirectory(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid name {name:?} at {}", .path.display())]
    InvalidName { path: PathBuf, name: String },

    #[error("cannot modify root directory")]
    RootDirectory,
}

/// A file tree that events are applied to.
///
/// Implementors own storage, diffing and transport; dispatch only calls
/// these methods. Paths are virtual: `/` is the root of the tree, not of the
/// host filesystem.
#[async_trait]
pub trait VirtualFile: Send + Sync {
    /// Create directory `dir_name` inside `virtual_path`.
    async fn create_dir(&self, virtual_path: &str, dir_name: &str) -> Result<(), VfsError>;

    /// Create an empty file `file_name` inside `virtual_path`.
    async fn create_file(&self, virtual_path: &str, file_name: &str) -> Result<(), VfsError>;

    /// Rename the entry at `virtual_path`, keeping its parent.
    async fn rename_file(&self, virtual_path: &str, new_name: &str) -> Result<(), VfsError>;

    /// Delete a file, or a directory and everything under it.
    async fn delete_file(&self, virtual_path: &str) -> Result<(), VfsError>;

    /// Move the entry at `virtual_path` so it lives at `new_path`.
    async fn move_file(&self, virtual_path: &str, new_path: &str) -> Result<(), VfsError>;

    /// Apply a content edit that originated on this side.
    async fn change_file_content(&self, virtual_path: &str, content: &str) -> Result<(), VfsError>;

    /// Read the whole text of a file.
    async fn get_file_content(&self, virtual_path: &str) -> Result<String, VfsError>;

    /// Store content received from the peer.
    async fn set_file_content(&self, virtual_path: &str, content: &str) -> Result<(), VfsError>;

    /// The emitter this tree sends events through. Dispatch also publishes
    /// on its bus.
    fn emitter(&self) -> &EventEmitter;
}
