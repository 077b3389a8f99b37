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

//! The typed response model.
//!
//! Every supported endpoint has an immutable response type with a
//! `from_json` parser. Parsing is a pure transformation: a missing or
//! malformed required field yields a [`ParseError`] and nothing else
//! happens. Unknown sub-fields are ignored; unknown event types degrade to
//! [`UnknownEvent`][crate::events::UnknownEvent].

use std::{collections::BTreeMap, fmt};

use http::StatusCode;
use nioxide_common::{OwnedDeviceId, OwnedEventId, OwnedRoomId, OwnedUserId};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

use crate::{
    error::ParseError,
    events::{AnySyncRoomEvent, StrippedStateEvent},
};

fn from_json<T: DeserializeOwned>(context: &'static str, value: &Value) -> Result<T, ParseError> {
    serde_json::from_value(value.clone())
        .map_err(|source| ParseError::Malformed { context, source })
}

/// Deserialize a `{"events": [...]}` wrapper into the plain event list.
fn event_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(bound(deserialize = "T: Deserialize<'de>"))]
    struct Wrapper<T> {
        #[serde(default = "Vec::new")]
        events: Vec<T>,
    }

    Ok(Wrapper::deserialize(deserializer)?.events)
}

/// Deserialize the `device_one_time_keys_count` map down to the
/// `signed_curve25519` entry.
fn signed_key_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let counts = BTreeMap::<String, u64>::deserialize(deserializer)?;
    Ok(counts.get("signed_curve25519").copied())
}

/// The response to a successful login.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    /// The fully qualified ID of the user that logged in.
    pub user_id: OwnedUserId,
    /// The ID of the device the login created or reused.
    pub device_id: OwnedDeviceId,
    /// The access token authenticating all further requests.
    pub access_token: String,
}

impl LoginResponse {
    /// Parse a login response body.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        let response: Self = from_json("login", value)?;

        if response.access_token.is_empty() {
            return Err(ParseError::MissingField { context: "login", field: "access_token" });
        }

        Ok(response)
    }
}

/// The response to a logout.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LogoutResponse {}

impl LogoutResponse {
    /// Parse a logout response body.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        from_json("logout", value)
    }
}

/// Events in a room since the last sync.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Timeline {
    /// The events, in the order the server supplied them.
    #[serde(default)]
    pub events: Vec<AnySyncRoomEvent>,
    /// True if the event list was truncated by the server's limit.
    #[serde(default)]
    pub limited: bool,
    /// A token usable to paginate further back.
    #[serde(default)]
    pub prev_batch: Option<String>,
}

/// A snapshot of the counts and heroes used to render a room's display
/// summary.
///
/// The summary is a snapshot, not a delta: when a sync response carries one,
/// it replaces the previous summary wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RoomSummary {
    /// The number of joined members.
    #[serde(default, rename = "m.joined_member_count")]
    pub joined_member_count: u64,
    /// The number of invited members.
    #[serde(default, rename = "m.invited_member_count")]
    pub invited_member_count: u64,
    /// The users that make up the room's display name, in order.
    #[serde(default, rename = "m.heroes")]
    pub heroes: Vec<OwnedUserId>,
}

/// The updates to a joined room in a sync response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct JoinedRoomUpdate {
    /// New timeline events.
    #[serde(default)]
    pub timeline: Timeline,
    /// State changes between the previous sync and the start of the
    /// timeline.
    #[serde(default, deserialize_with = "event_list")]
    pub state: Vec<AnySyncRoomEvent>,
    /// A fresh display summary, if anything about it changed.
    #[serde(default)]
    pub summary: Option<RoomSummary>,
}

impl JoinedRoomUpdate {
    /// Does this update carry nothing at all?
    ///
    /// Empty updates for unknown rooms are not materialized; heartbeat syncs
    /// must not create phantom rooms.
    pub fn is_empty(&self) -> bool {
        self.timeline.events.is_empty() && self.state.is_empty() && self.summary.is_none()
    }
}

/// The updates to an invited room in a sync response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InvitedRoomUpdate {
    /// The stripped state of the room visible to the invitee.
    #[serde(default, deserialize_with = "event_list")]
    pub invite_state: Vec<StrippedStateEvent>,
}

impl InvitedRoomUpdate {
    /// Does this update carry nothing at all?
    pub fn is_empty(&self) -> bool {
        self.invite_state.is_empty()
    }
}

/// The updates to a left room in a sync response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LeftRoomUpdate {
    /// Timeline events up to the point of leaving.
    #[serde(default)]
    pub timeline: Timeline,
    /// State changes up to the point of leaving.
    #[serde(default, deserialize_with = "event_list")]
    pub state: Vec<AnySyncRoomEvent>,
}

impl LeftRoomUpdate {
    /// Does this update carry nothing at all?
    pub fn is_empty(&self) -> bool {
        self.timeline.events.is_empty() && self.state.is_empty()
    }
}

/// Updates to rooms, grouped by our own membership in them.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Rooms {
    /// Rooms the user is joined to.
    #[serde(default)]
    pub join: BTreeMap<OwnedRoomId, JoinedRoomUpdate>,
    /// Rooms the user has been invited to.
    #[serde(default)]
    pub invite: BTreeMap<OwnedRoomId, InvitedRoomUpdate>,
    /// Rooms the user has left or been banned from.
    #[serde(default)]
    pub leave: BTreeMap<OwnedRoomId, LeftRoomUpdate>,
}

/// Hints that the device lists of some users changed since the last sync.
///
/// Every listed user needs a fresh key query before we can trust what we
/// know about their devices.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeviceLists {
    /// Users with added or modified devices.
    #[serde(default)]
    pub changed: Vec<OwnedUserId>,
    /// Users we no longer share a room with.
    #[serde(default)]
    pub left: Vec<OwnedUserId>,
}

/// The response to a sync request.
#[derive(Clone, Debug, Deserialize)]
pub struct SyncResponse {
    /// The cursor token to pass back as `since` in the next sync request.
    pub next_batch: String,
    /// Updates to rooms.
    #[serde(default)]
    pub rooms: Rooms,
    /// The number of signed one-time keys the server holds for this device,
    /// if it reported one.
    #[serde(default, deserialize_with = "signed_key_count")]
    pub device_one_time_keys_count: Option<u64>,
    /// Users whose device lists changed.
    #[serde(default)]
    pub device_lists: DeviceLists,
    /// Messages sent directly to this device. Kept raw; decryption is the
    /// collaborator's job.
    #[serde(default, deserialize_with = "event_list")]
    pub to_device: Vec<Value>,
}

impl SyncResponse {
    /// Parse a sync response body.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        let response: Self = from_json("sync", value)?;

        if response.next_batch.is_empty() {
            return Err(ParseError::MissingField { context: "sync", field: "next_batch" });
        }

        Ok(response)
    }
}

/// The response to a key upload.
#[derive(Clone, Debug, Deserialize)]
pub struct KeysUploadResponse {
    /// The one-time key counts per algorithm after the upload.
    #[serde(default)]
    pub one_time_key_counts: BTreeMap<String, u64>,
}

impl KeysUploadResponse {
    /// Parse a key upload response body.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        from_json("keys_upload", value)
    }

    /// The count of signed curve25519 one-time keys, if reported.
    pub fn signed_curve25519(&self) -> Option<u64> {
        self.one_time_key_counts.get("signed_curve25519").copied()
    }
}

/// The response to a key query.
#[derive(Clone, Debug, Deserialize)]
pub struct KeysQueryResponse {
    /// The queried device keys, per user and device. The key objects are
    /// kept raw for the cryptographic collaborator to verify.
    #[serde(default)]
    pub device_keys: BTreeMap<OwnedUserId, BTreeMap<OwnedDeviceId, Value>>,
    /// Homeservers that couldn't be reached, with the failure reason.
    #[serde(default)]
    pub failures: BTreeMap<String, Value>,
}

impl KeysQueryResponse {
    /// Parse a key query response body.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        from_json("keys_query", value)
    }
}

/// The response to a one-time key claim.
#[derive(Clone, Debug, Deserialize)]
pub struct KeysClaimResponse {
    /// The claimed one-time keys, per user and device. Kept raw; session
    /// establishment from these keys is the collaborator's job.
    #[serde(default)]
    pub one_time_keys: BTreeMap<OwnedUserId, BTreeMap<OwnedDeviceId, Value>>,
    /// Homeservers that couldn't be reached, with the failure reason.
    #[serde(default)]
    pub failures: BTreeMap<String, Value>,
}

impl KeysClaimResponse {
    /// Parse a one-time key claim response body.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        from_json("keys_claim", value)
    }
}

/// The response to sending an event to a room.
#[derive(Clone, Debug, Deserialize)]
pub struct RoomSendResponse {
    /// The event ID the server assigned to the sent event.
    pub event_id: OwnedEventId,
}

impl RoomSendResponse {
    /// Parse a room send response body.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        from_json("room_send", value)
    }
}

/// A non-2xx answer from the server.
///
/// This is a value, not a fault: rate limits, invalid passwords and expired
/// tokens all arrive through here and the caller branches on the error code.
#[derive(Clone, Debug)]
pub struct ErrorResponse {
    /// The HTTP status the server answered with.
    pub status_code: StatusCode,
    /// The Matrix error code, e.g. `M_FORBIDDEN`, if the body carried one.
    pub errcode: Option<String>,
    /// The human readable error message, if the body carried one.
    pub error: Option<String>,
}

impl ErrorResponse {
    /// Build an error response from a status code and a best-effort look at
    /// the body.
    ///
    /// Error bodies are not required to be well-formed; an empty or
    /// unparsable body still produces a usable `ErrorResponse`.
    pub fn from_parts(status_code: StatusCode, body: &Value) -> Self {
        Self {
            status_code,
            errcode: body.get("errcode").and_then(Value::as_str).map(ToOwned::to_owned),
            error: body.get("error").and_then(Value::as_str).map(ToOwned::to_owned),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the server returned {}", self.status_code)?;
        if let Some(errcode) = &self.errcode {
            write!(f, " {errcode}")?;
        }
        if let Some(error) = &self.error {
            write!(f, ": {error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use http::StatusCode;
    use nioxide_common::OwnedRoomId;
    use serde_json::json;

    use super::{ErrorResponse, LoginResponse, SyncResponse};
    use crate::{error::ParseError, events::AnySyncRoomEvent};

    #[test]
    fn test_login_response_requires_an_access_token() {
        let body = json!({
            "user_id": "@alice:example.org",
            "device_id": "JLAFKJWSCS",
            "access_token": "",
        });

        assert_matches!(
            LoginResponse::from_json(&body),
            Err(ParseError::MissingField { field: "access_token", .. })
        );
    }

    #[test]
    fn test_sync_response_parses_rooms_and_device_fields() {
        let body = json!({
            "next_batch": "token123",
            "rooms": {
                "join": {
                    "!testroom:example.org": {
                        "timeline": {
                            "events": [
                                {
                                    "type": "m.room.member",
                                    "event_id": "$event_id_1",
                                    "sender": "@alice:example.org",
                                    "origin_server_ts": 1516809890615u64,
                                    "state_key": "@alice:example.org",
                                    "content": { "membership": "join" },
                                },
                                {
                                    "type": "org.example.heartbeat",
                                    "content": {},
                                },
                            ],
                            "limited": false,
                            "prev_batch": "prev_batch_token",
                        },
                        "summary": {
                            "m.joined_member_count": 1,
                            "m.invited_member_count": 2,
                        },
                    }
                }
            },
            "device_one_time_keys_count": { "signed_curve25519": 49 },
            "device_lists": { "changed": ["@alice:example.org"], "left": [] },
        });

        let response = SyncResponse::from_json(&body).unwrap();
        assert_eq!(response.next_batch, "token123");
        assert_eq!(response.device_one_time_keys_count, Some(49));
        assert_eq!(response.device_lists.changed.len(), 1);

        let update = &response.rooms.join[&OwnedRoomId::from("!testroom:example.org")];
        assert_eq!(update.timeline.events.len(), 2);
        assert_matches!(&update.timeline.events[1], AnySyncRoomEvent::Unknown(_));
        assert_eq!(update.summary.as_ref().unwrap().invited_member_count, 2);
    }

    #[test]
    fn test_sync_response_rejects_an_empty_cursor() {
        let body = json!({ "next_batch": "" });
        assert_matches!(
            SyncResponse::from_json(&body),
            Err(ParseError::MissingField { field: "next_batch", .. })
        );
    }

    #[test]
    fn test_sync_response_without_key_counts_reports_none() {
        let body = json!({ "next_batch": "token123" });
        let response = SyncResponse::from_json(&body).unwrap();
        assert_eq!(response.device_one_time_keys_count, None);
    }

    #[test]
    fn test_error_response_survives_an_unparsable_body() {
        let response = ErrorResponse::from_parts(StatusCode::BAD_REQUEST, &json!(""));
        assert_eq!(response.errcode, None);
        assert_eq!(response.status_code, StatusCode::BAD_REQUEST);

        let response = ErrorResponse::from_parts(
            StatusCode::FORBIDDEN,
            &json!({ "errcode": "M_FORBIDDEN", "error": "Invalid password" }),
        );
        assert_eq!(response.errcode.as_deref(), Some("M_FORBIDDEN"));
        assert_eq!(response.to_string(), "the server returned 403 Forbidden M_FORBIDDEN: Invalid password");
    }
}
