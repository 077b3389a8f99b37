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
//!
//! Three distinct channels, matching how recoverable each failure is:
//!
//! * [`LocalProtocolError`] — the caller invoked an operation whose
//!   precondition the local state machine knows is unmet. Nothing was sent
//!   anywhere; fix the call and retry.
//! * [`ResponseError::Server`] — the server answered with a non-2xx status.
//!   Carries the Matrix error code and message for the caller to branch on.
//! * [`ResponseError::Malformed`] — a 2xx response body failed validation.
//!   The response's effects were not applied; client state is unchanged.

use nioxide_common::OwnedRoomId;
use nioxide_crypto::OlmError;
use thiserror::Error;

use crate::responses::ErrorResponse;

/// A precondition for a local operation was unmet.
///
/// These errors are produced by the `build_*_request` methods before
/// anything reaches the network, and are always recoverable locally.
#[derive(Error, Debug)]
pub enum LocalProtocolError {
    /// The operation requires an authenticated session but no login has
    /// succeeded yet.
    #[error("the operation requires a logged in client")]
    NotLoggedIn,

    /// A previous sync returned a cursor token, but the new sync request
    /// didn't pass it back.
    #[error("a sync token exists but wasn't supplied; pass back the token of the previous sync")]
    MissingSyncToken,

    /// The supplied sync token isn't the one the client returned from the
    /// previous successful sync.
    #[error("sync token {supplied:?} isn't the one the previous sync returned")]
    StaleSyncToken {
        /// The token the caller supplied.
        supplied: String,
    },

    /// A key upload was requested although no upload is currently due.
    #[error("no key upload is needed, the account is shared and topped up")]
    KeysAlreadyUploaded,

    /// A key query was requested but no user's device list is pending.
    #[error("no device list changes are pending, there is nothing to query")]
    NoPendingDevices,

    /// A one-time key claim was requested but no device is missing a
    /// session, or no key query has completed yet.
    #[error("there are no established key query results to claim keys for")]
    NoKeysToClaim,

    /// A room-scoped operation referenced a room this client has never seen
    /// in a sync response.
    #[error("unknown room {room_id}")]
    UnknownRoom {
        /// The room the operation referenced.
        room_id: OwnedRoomId,
    },

    /// An encryption precondition failed, e.g. sending to an encrypted room
    /// without an established session.
    #[error(transparent)]
    Encryption(#[from] OlmError),
}

/// A response body failed schema validation.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The body couldn't be deserialized into the expected response shape.
    #[error("malformed {context} response: {source}")]
    Malformed {
        /// Which response kind was being parsed.
        context: &'static str,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A required field was missing or empty.
    #[error("missing or empty field `{field}` in {context} response")]
    MissingField {
        /// Which response kind was being parsed.
        context: &'static str,
        /// The offending field.
        field: &'static str,
    },
}

/// The failure channel of every `receive_*_response` method.
///
/// Both variants leave the client state exactly as it was before the
/// response was delivered.
#[derive(Error, Debug)]
pub enum ResponseError {
    /// The server returned a non-2xx status.
    #[error("{0}")]
    Server(ErrorResponse),

    /// The server returned a 2xx status but the body failed validation.
    #[error(transparent)]
    Malformed(#[from] ParseError),
}
