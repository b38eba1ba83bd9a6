//! Event dispatch — apply an incoming event, then republish it.
//!
//! Two peers share a file tree: the **server** owns the authoritative copy
//! and answers content requests; the **client** mirrors it and accepts
//! content pushed back to it. Both sides follow the same two steps:
//!
//! 1. Apply the event to the [`VirtualFile`].
//! 2. Publish the event on the tree's bus under its topic. This always
//!    happens, whether the event was applied, ignored, or failed, so
//!    subscribers observe the tree after the event landed.
//!
//! | event              | server                          | client                    |
//! |--------------------|---------------------------------|---------------------------|
//! | `CREATE_DIR`       | `create_dir`                    | `create_dir`              |
//! | `CREATE_FILE`      | `create_file`                   | `create_file`             |
//! | `RENAME_FILE`      | `rename_file`                   | `rename_file`             |
//! | `DELETE_FILE`      | `delete_file`                   | `delete_file`             |
//! | `SET_FILE_CONTENT` | `change_file_content`           | `change_file_content`     |
//! | `MOVE_FILE`        | `move_file`                     | —                         |
//! | `GET_FILE_CONTENT` | read, emit response             | `set_file_content(data)`  |
//! | anything else      | —                               | —                         |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vfsbus_types::{EventType, VfsEvent};

use crate::vfs::{VfsError, VirtualFile};

/// What dispatch did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The event mutated the virtual file.
    Applied,
    /// The event was a request and a response was emitted.
    Responded,
    /// Published only; this role doesn't act on the kind.
    Ignored,
}

/// Applying an event to the virtual file failed.
///
/// The event is still published after the failure.
#[derive(Debug, thiserror::Error)]
#[error("{role} failed to apply {event_type}: {source}")]
pub struct DispatchError {
    pub role: Role,
    pub event_type: EventType,
    #[source]
    pub source: VfsError,
}

/// Error for a role name that is neither `server` nor `client`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role {0:?} (expected \"server\" or \"client\")")]
pub struct UnknownRole(pub String);

/// Which side of the pair a dispatcher acts for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Server,
    Client,
}

impl Role {
    /// Dispatch `event` with this role's rules.
    pub async fn exec(
        self,
        event: &VfsEvent,
        vfs: &dyn VirtualFile,
    ) -> Result<Outcome, DispatchError> {
        match self {
            Role::Server => server_default_exec_event(event, vfs).await,
            Role::Client => client_default_exec_event(event, vfs).await,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => f.write_str("server"),
            Role::Client => f.write_str("client"),
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" => Ok(Role::Server),
            "client" => Ok(Role::Client),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Server-side dispatch: apply or answer, then republish.
pub async fn server_default_exec_event(
    event: &VfsEvent,
    vfs: &dyn VirtualFile,
) -> Result<Outcome, DispatchError> {
    let result = match event {
        VfsEvent::CreateDir { .. }
        | VfsEvent::CreateFile { .. }
        | VfsEvent::RenameFile { .. }
        | VfsEvent::DeleteFile { .. }
        | VfsEvent::SetFileContent { .. }
        | VfsEvent::MoveFile { .. } => apply(event, vfs).await,
        VfsEvent::GetFileContent { virtual_path, .. } => {
            vfs.get_file_content(virtual_path).await.map(|content| {
                vfs.emitter()
                    .emit_event(VfsEvent::get_file_content(virtual_path.clone(), Some(content)));
                Outcome::Responded
            })
        }
        _ => Ok(Outcome::Ignored),
    };

    publish(Role::Server, event, vfs);
    finish(Role::Server, event, result)
}

/// Client-side dispatch: apply or store pushed content, then republish.
///
/// Moves are published but not applied here.
pub async fn client_default_exec_event(
    event: &VfsEvent,
    vfs: &dyn VirtualFile,
) -> Result<Outcome, DispatchError> {
    let result = match event {
        VfsEvent::CreateDir { .. }
        | VfsEvent::CreateFile { .. }
        | VfsEvent::RenameFile { .. }
        | VfsEvent::DeleteFile { .. }
        | VfsEvent::SetFileContent { .. } => apply(event, vfs).await,
        VfsEvent::GetFileContent { virtual_path, data } => {
            let content = data.as_deref().unwrap_or_default();
            vfs.set_file_content(virtual_path, content)
                .await
                .map(|()| Outcome::Applied)
        }
        _ => Ok(Outcome::Ignored),
    };

    publish(Role::Client, event, vfs);
    finish(Role::Client, event, result)
}

fn publish(role: Role, event: &VfsEvent, vfs: &dyn VirtualFile) {
    let delivered = vfs.emitter().bus().publish(event.topic(), event);
    tracing::debug!(
        role = %role,
        event_type = %event.event_type(),
        path = event.virtual_path().unwrap_or(""),
        delivered,
        "dispatching event"
    );
}

/// Mutations shared by both roles.
async fn apply(event: &VfsEvent, vfs: &dyn VirtualFile) -> Result<Outcome, VfsError> {
    match event {
        VfsEvent::CreateDir {
            virtual_path,
            dir_name,
        } => vfs.create_dir(virtual_path, dir_name).await?,
        VfsEvent::CreateFile {
            virtual_path,
            file_name,
        } => vfs.create_file(virtual_path, file_name).await?,
        VfsEvent::RenameFile {
            virtual_path,
            new_name,
        } => vfs.rename_file(virtual_path, new_name).await?,
        VfsEvent::DeleteFile { virtual_path } => vfs.delete_file(virtual_path).await?,
        VfsEvent::MoveFile {
            virtual_path,
            new_path,
        } => vfs.move_file(virtual_path, new_path).await?,
        VfsEvent::SetFileContent {
            virtual_path,
            content,
        } => vfs.change_file_content(virtual_path, content).await?,
        _ => return Ok(Outcome::Ignored),
    }
    Ok(Outcome::Applied)
}

fn finish(
    role: Role,
    event: &VfsEvent,
    result: Result<Outcome, VfsError>,
) -> Result<Outcome, DispatchError> {
    match result {
        Ok(Outcome::Ignored) => {
            tracing::trace!(role = %role, event_type = %event.event_type(), "event ignored");
            Ok(Outcome::Ignored)
        }
        Ok(outcome) => Ok(outcome),
        Err(source) => {
            tracing::warn!(
                role = %role,
                event_type = %event.event_type(),
                error = %source,
                "failed to apply event"
            );
            Err(DispatchError {
                role,
                event_type: event.event_type(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("server", Role::Server)]
    #[case("client", Role::Client)]
    fn test_role_parse(#[case] raw: &str, #[case] role: Role) {
        assert_eq!(raw.parse::<Role>().unwrap(), role);
        assert_eq!(role.to_string(), raw);
    }

    #[test]
    fn test_role_parse_unknown() {
        let err = "peer".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRole("peer".to_string()));
    }

    #[test]
    fn test_role_default_is_server() {
        assert_eq!(Role::default(), Role::Server);
    }

    #[test]
    fn test_dispatch_error_message() {
        let err = DispatchError {
            role: Role::Client,
            event_type: EventType::DeleteFile,
            source: VfsError::NotFound("/gone.txt".into()),
        };
        assert_eq!(
            err.to_string(),
            "client failed to apply DELETE_FILE: not found: /gone.txt"
        );
    }
}
