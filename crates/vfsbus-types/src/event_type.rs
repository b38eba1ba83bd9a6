//! Event kinds and their topic strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a topic string doesn't name a known event kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

/// Kind of file-tree event.
///
/// The topic string doubles as the `eventType` field on the wire and as the
/// bus topic events are republished under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "FILE_CHANGE")]
    FileChange,
    #[serde(rename = "CHANGE_FILE")]
    ChangeFile,
    #[serde(rename = "CREATE_FILE")]
    CreateFile,
    #[serde(rename = "CREATE_DIR")]
    CreateDir,
    #[serde(rename = "DELETE_FILE")]
    DeleteFile,
    #[serde(rename = "GET_FILE_CONTENT")]
    GetFileContent,
    #[serde(rename = "MOVE_FILE")]
    MoveFile,
    #[serde(rename = "RENAME_FILE")]
    RenameFile,
    #[serde(rename = "RESET_VIRTUAL_FILE")]
    ResetFiles,
    #[serde(rename = "SET_FILE_CONTENT")]
    SetFileContent,
}

impl EventType {
    /// Every event kind, in declaration order.
    pub const ALL: [EventType; 10] = [
        EventType::FileChange,
        EventType::ChangeFile,
        EventType::CreateFile,
        EventType::CreateDir,
        EventType::DeleteFile,
        EventType::GetFileContent,
        EventType::MoveFile,
        EventType::RenameFile,
        EventType::ResetFiles,
        EventType::SetFileContent,
    ];

    /// The topic string for this kind.
    pub fn topic(self) -> &'static str {
        match self {
            EventType::FileChange => "FILE_CHANGE",
            EventType::ChangeFile => "CHANGE_FILE",
            EventType::CreateFile => "CREATE_FILE",
            EventType::CreateDir => "CREATE_DIR",
            EventType::DeleteFile => "DELETE_FILE",
            EventType::GetFileContent => "GET_FILE_CONTENT",
            EventType::MoveFile => "MOVE_FILE",
            EventType::RenameFile => "RENAME_FILE",
            EventType::ResetFiles => "RESET_VIRTUAL_FILE",
            EventType::SetFileContent => "SET_FILE_CONTENT",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.topic())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|kind| kind.topic() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}
