//! Event records — the `{eventType, data}` shape exchanged between peers.
//!
//! On the wire an event looks like:
//!
//! ```json
//! {"eventType": "CREATE_DIR", "data": {"virtualPath": "/src", "dirName": "util"}}
//! ```
//!
//! Paths are kept as strings: they are virtual paths owned by whatever file
//! tree receives the event, not host filesystem paths.

use serde::{Deserialize, Serialize};

use crate::event_type::EventType;

/// A file-tree event.
///
/// Construct with the associated functions ([`VfsEvent::create_dir`],
/// [`VfsEvent::move_file`], ...) rather than the variants directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "data")]
pub enum VfsEvent {
    /// A file changed somewhere; informational only.
    #[serde(rename = "FILE_CHANGE", rename_all = "camelCase")]
    FileChange { virtual_path: String },

    /// A change notice carrying opaque change data.
    ///
    /// vfsbus-specific: peers that only know the other nine kinds never send
    /// `CHANGE_FILE`, and neither dispatch role applies it. It is published
    /// and nothing more.
    #[serde(rename = "CHANGE_FILE", rename_all = "camelCase")]
    ChangeFile {
        virtual_path: String,
        data: serde_json::Value,
    },

    /// Create `file_name` inside the directory at `virtual_path`.
    #[serde(rename = "CREATE_FILE", rename_all = "camelCase")]
    CreateFile {
        virtual_path: String,
        file_name: String,
    },

    /// Create `dir_name` inside the directory at `virtual_path`.
    #[serde(rename = "CREATE_DIR", rename_all = "camelCase")]
    CreateDir {
        virtual_path: String,
        dir_name: String,
    },

    #[serde(rename = "DELETE_FILE", rename_all = "camelCase")]
    DeleteFile { virtual_path: String },

    /// Content request (`data` absent) or response (`data` present).
    #[serde(rename = "GET_FILE_CONTENT", rename_all = "camelCase")]
    GetFileContent {
        virtual_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },

    #[serde(rename = "MOVE_FILE", rename_all = "camelCase")]
    MoveFile {
        virtual_path: String,
        new_path: String,
    },

    /// Rename the last component of `virtual_path` to `new_name`.
    #[serde(rename = "RENAME_FILE", rename_all = "camelCase")]
    RenameFile {
        virtual_path: String,
        new_name: String,
    },

    #[serde(rename = "RESET_VIRTUAL_FILE")]
    ResetFiles {},

    #[serde(rename = "SET_FILE_CONTENT", rename_all = "camelCase")]
    SetFileContent {
        virtual_path: String,
        content: String,
    },
}

impl VfsEvent {
    pub fn create_dir(dir_path: impl Into<String>, dir_name: impl Into<String>) -> Self {
        VfsEvent::CreateDir {
            virtual_path: dir_path.into(),
            dir_name: dir_name.into(),
        }
    }

    pub fn create_file(dir_path: impl Into<String>, file_name: impl Into<String>) -> Self {
        VfsEvent::CreateFile {
            virtual_path: dir_path.into(),
            file_name: file_name.into(),
        }
    }

    pub fn change_file(file_path: impl Into<String>, data: serde_json::Value) -> Self {
        VfsEvent::ChangeFile {
            virtual_path: file_path.into(),
            data,
        }
    }

    pub fn delete_file(file_path: impl Into<String>) -> Self {
        VfsEvent::DeleteFile {
            virtual_path: file_path.into(),
        }
    }

    pub fn move_file(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        VfsEvent::MoveFile {
            virtual_path: old_path.into(),
            new_path: new_path.into(),
        }
    }

    /// Build a content request (`data: None`) or response (`data: Some(..)`).
    pub fn get_file_content(path: impl Into<String>, data: Option<String>) -> Self {
        VfsEvent::GetFileContent {
            virtual_path: path.into(),
            data,
        }
    }

    pub fn rename_file(path: impl Into<String>, new_name: impl Into<String>) -> Self {
        VfsEvent::RenameFile {
            virtual_path: path.into(),
            new_name: new_name.into(),
        }
    }

    pub fn set_file_content(file_path: impl Into<String>, content: impl Into<String>) -> Self {
        VfsEvent::SetFileContent {
            virtual_path: file_path.into(),
            content: content.into(),
        }
    }

    pub fn file_change(file_path: impl Into<String>) -> Self {
        VfsEvent::FileChange {
            virtual_path: file_path.into(),
        }
    }

    pub fn reset_files() -> Self {
        VfsEvent::ResetFiles {}
    }

    /// The kind of this event.
    pub fn event_type(&self) -> EventType {
        match self {
            VfsEvent::FileChange { .. } => EventType::FileChange,
            VfsEvent::ChangeFile { .. } => EventType::ChangeFile,
            VfsEvent::CreateFile { .. } => EventType::CreateFile,
            VfsEvent::CreateDir { .. } => EventType::CreateDir,
            VfsEvent::DeleteFile { .. } => EventType::DeleteFile,
            VfsEvent::GetFileContent { .. } => EventType::GetFileContent,
            VfsEvent::MoveFile { .. } => EventType::MoveFile,
            VfsEvent::RenameFile { .. } => EventType::RenameFile,
            VfsEvent::ResetFiles {} => EventType::ResetFiles,
            VfsEvent::SetFileContent { .. } => EventType::SetFileContent,
        }
    }

    /// The topic this event is published under.
    pub fn topic(&self) -> &'static str {
        self.event_type().topic()
    }

    /// The path the event targets. `None` only for resets.
    pub fn virtual_path(&self) -> Option<&str> {
        match self {
            VfsEvent::FileChange { virtual_path }
            | VfsEvent::ChangeFile { virtual_path, .. }
            | VfsEvent::CreateFile { virtual_path, .. }
            | VfsEvent::CreateDir { virtual_path, .. }
            | VfsEvent::DeleteFile { virtual_path }
            | VfsEvent::GetFileContent { virtual_path, .. }
            | VfsEvent::MoveFile { virtual_path, .. }
            | VfsEvent::RenameFile { virtual_path, .. }
            | VfsEvent::SetFileContent { virtual_path, .. } => Some(virtual_path),
            VfsEvent::ResetFiles {} => None,
        }
    }

    /// Serialize to the compact wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse an event from its wire form.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}
