// Copyright 2026 The nioxide developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error conditions.

use nioxide_common::OwnedRoomId;
use thiserror::Error;

/// An error reported by a [`RoomSession`] implementation.
///
/// The session objects are opaque to this crate, so their failures are too:
/// a session error carries a message and nothing else.
///
/// [`RoomSession`]: crate::RoomSession
#[derive(Error, Debug)]
#[error("{0}")]
pub struct SessionError(String);

impl SessionError {
    /// Create a new session error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors raised by the encryption lifecycle machinery.
#[derive(Error, Debug)]
pub enum OlmError {
    /// An encryption or decryption was attempted for a room that has no
    /// established session.
    #[error("no established session for room {room_id}")]
    MissingSession {
        /// The room the operation was attempted for.
        room_id: OwnedRoomId,
    },

    /// The room has a session, but the session reports that it needs to be
    /// rotated before it may encrypt again.
    #[error("the session for room {room_id} needs to be rotated")]
    SessionExpired {
        /// The room whose session expired.
        room_id: OwnedRoomId,
    },

    /// The underlying session object failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}
