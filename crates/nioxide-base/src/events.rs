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

//! The typed room event model.
//!
//! Events arrive inside sync responses as JSON objects discriminated by
//! their `type` field. The set of types this client understands is closed;
//! everything else lands in [`UnknownEvent`] so that new server-side event
//! types never break deserialization of a whole sync response. A *known*
//! type with missing required fields is a hard deserialization error.

use nioxide_common::{OwnedEventId, OwnedUserId};
use serde::{de, Deserialize, Serialize};
use serde_json::Value;

/// The membership state of a user in a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipState {
    /// The user is joined.
    Join,
    /// The user has been invited.
    Invite,
    /// The user has left, or was never in the room.
    Leave,
    /// The user is banned.
    Ban,
    /// The user has knocked.
    Knock,
}

/// The content of an `m.room.member` event.
#[derive(Clone, Debug, Deserialize)]
pub struct RoomMemberEventContent {
    /// The membership the target user transitioned to.
    pub membership: MembershipState,
}

/// A state event changing the membership of a user in a room.
#[derive(Clone, Debug, Deserialize)]
pub struct RoomMemberEvent {
    /// The globally unique event ID.
    pub event_id: OwnedEventId,
    /// The user that sent the event.
    pub sender: OwnedUserId,
    /// The server timestamp of the event, in milliseconds since the epoch.
    pub origin_server_ts: u64,
    /// The user whose membership changed. For membership events the state
    /// key is the target user ID.
    pub state_key: OwnedUserId,
    /// The event content.
    pub content: RoomMemberEventContent,
}

impl RoomMemberEvent {
    /// The membership the target user transitioned to.
    pub fn membership(&self) -> MembershipState {
        self.content.membership
    }
}

/// The content of an `m.room.encryption` event.
#[derive(Clone, Debug, Deserialize)]
pub struct RoomEncryptionEventContent {
    /// The encryption algorithm the room uses.
    #[serde(default)]
    pub algorithm: Option<String>,
}

/// A state event enabling encryption in a room.
///
/// Once a room saw one of these, it is encrypted for good; there is no
/// event that turns encryption back off.
#[derive(Clone, Debug, Deserialize)]
pub struct RoomEncryptionEvent {
    /// The globally unique event ID.
    pub event_id: OwnedEventId,
    /// The user that sent the event.
    pub sender: OwnedUserId,
    /// The server timestamp of the event, in milliseconds since the epoch.
    pub origin_server_ts: u64,
    /// The event content.
    #[serde(default = "default_encryption_content")]
    pub content: RoomEncryptionEventContent,
}

fn default_encryption_content() -> RoomEncryptionEventContent {
    RoomEncryptionEventContent { algorithm: None }
}

/// The content of an `m.room.message` event.
#[derive(Clone, Debug, Deserialize)]
pub struct RoomMessageEventContent {
    /// The message type, e.g. `m.text`.
    pub msgtype: String,
    /// The textual body of the message.
    pub body: String,
}

/// A message sent to a room.
#[derive(Clone, Debug, Deserialize)]
pub struct RoomMessageEvent {
    /// The globally unique event ID.
    pub event_id: OwnedEventId,
    /// The user that sent the event.
    pub sender: OwnedUserId,
    /// The server timestamp of the event, in milliseconds since the epoch.
    pub origin_server_ts: u64,
    /// The event content.
    pub content: RoomMessageEventContent,
}

/// An event redacting another event.
#[derive(Clone, Debug, Deserialize)]
pub struct RoomRedactionEvent {
    /// The globally unique event ID.
    pub event_id: OwnedEventId,
    /// The user that sent the event.
    pub sender: OwnedUserId,
    /// The server timestamp of the event, in milliseconds since the epoch.
    pub origin_server_ts: u64,
    /// The event that was redacted.
    pub redacts: OwnedEventId,
}

/// An event of a type this client doesn't understand.
///
/// Kept around verbatim for forward compatibility; folding it into room
/// state is a no-op.
#[derive(Clone, Debug)]
pub struct UnknownEvent {
    /// The raw value of the `type` field.
    pub event_type: String,
    /// The raw event content.
    pub content: Value,
}

/// Any event that can appear in the state or timeline section of a sync
/// response.
#[derive(Clone, Debug)]
pub enum AnySyncRoomEvent {
    /// An `m.room.member` event.
    RoomMember(RoomMemberEvent),
    /// An `m.room.encryption` event.
    RoomEncryption(RoomEncryptionEvent),
    /// An `m.room.message` event.
    RoomMessage(RoomMessageEvent),
    /// An `m.room.redaction` event.
    RoomRedaction(RoomRedactionEvent),
    /// An event of an unrecognized type.
    Unknown(UnknownEvent),
}

impl AnySyncRoomEvent {
    /// The raw value of the event's `type` field.
    pub fn event_type(&self) -> &str {
        match self {
            AnySyncRoomEvent::RoomMember(_) => "m.room.member",
            AnySyncRoomEvent::RoomEncryption(_) => "m.room.encryption",
            AnySyncRoomEvent::RoomMessage(_) => "m.room.message",
            AnySyncRoomEvent::RoomRedaction(_) => "m.room.redaction",
            AnySyncRoomEvent::Unknown(e) => &e.event_type,
        }
    }

    /// The event ID, if this event type carries one.
    pub fn event_id(&self) -> Option<&OwnedEventId> {
        match self {
            AnySyncRoomEvent::RoomMember(e) => Some(&e.event_id),
            AnySyncRoomEvent::RoomEncryption(e) => Some(&e.event_id),
            AnySyncRoomEvent::RoomMessage(e) => Some(&e.event_id),
            AnySyncRoomEvent::RoomRedaction(e) => Some(&e.event_id),
            AnySyncRoomEvent::Unknown(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for AnySyncRoomEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let event_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| de::Error::missing_field("type"))?;

        match event_type {
            "m.room.member" => RoomMemberEvent::deserialize(&value)
                .map(AnySyncRoomEvent::RoomMember)
                .map_err(de::Error::custom),
            "m.room.encryption" => RoomEncryptionEvent::deserialize(&value)
                .map(AnySyncRoomEvent::RoomEncryption)
                .map_err(de::Error::custom),
            "m.room.message" => RoomMessageEvent::deserialize(&value)
                .map(AnySyncRoomEvent::RoomMessage)
                .map_err(de::Error::custom),
            "m.room.redaction" => RoomRedactionEvent::deserialize(&value)
                .map(AnySyncRoomEvent::RoomRedaction)
                .map_err(de::Error::custom),
            _ => Ok(AnySyncRoomEvent::Unknown(UnknownEvent {
                event_type: event_type.to_owned(),
                content: value.get("content").cloned().unwrap_or(Value::Null),
            })),
        }
    }
}

/// A state event of an invited room, as found in `invite_state`.
///
/// Stripped events carry no event ID or timestamp, so they get their own
/// lenient representation instead of reusing [`AnySyncRoomEvent`].
#[derive(Clone, Debug, Deserialize)]
pub struct StrippedStateEvent {
    /// The raw value of the `type` field.
    #[serde(rename = "type")]
    pub event_type: String,
    /// The user that sent the event, if present.
    #[serde(default)]
    pub sender: Option<OwnedUserId>,
    /// The state key, if present. For membership events this is the target
    /// user ID.
    #[serde(default)]
    pub state_key: Option<String>,
    /// The raw event content.
    #[serde(default)]
    pub content: Value,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::{AnySyncRoomEvent, MembershipState};

    #[test]
    fn test_member_event_deserializes() {
        let event: AnySyncRoomEvent = serde_json::from_value(json!({
            "type": "m.room.member",
            "event_id": "$event_id_1",
            "sender": "@alice:example.org",
            "origin_server_ts": 1516809890615u64,
            "state_key": "@alice:example.org",
            "content": { "membership": "join" },
        }))
        .unwrap();

        let event = assert_matches!(event, AnySyncRoomEvent::RoomMember(e) => e);
        assert_eq!(event.membership(), MembershipState::Join);
        assert_eq!(event.state_key, "@alice:example.org");
    }

    #[test]
    fn test_unrecognized_event_type_becomes_unknown() {
        let event: AnySyncRoomEvent = serde_json::from_value(json!({
            "type": "org.example.custom",
            "event_id": "$event_id_2",
            "sender": "@alice:example.org",
            "origin_server_ts": 1516809890615u64,
            "content": { "anything": "goes" },
        }))
        .unwrap();

        let event = assert_matches!(event, AnySyncRoomEvent::Unknown(e) => e);
        assert_eq!(event.event_type, "org.example.custom");
        assert_eq!(event.content["anything"], "goes");
    }

    #[test]
    fn test_known_event_with_missing_fields_is_an_error() {
        // An m.room.member event without a membership in its content.
        let result: Result<AnySyncRoomEvent, _> = serde_json::from_value(json!({
            "type": "m.room.member",
            "event_id": "$event_id_3",
            "sender": "@alice:example.org",
            "origin_server_ts": 1516809890615u64,
            "state_key": "@alice:example.org",
            "content": {},
        }));

        result.unwrap_err();
    }

    #[test]
    fn test_event_without_a_type_is_an_error() {
        let result: Result<AnySyncRoomEvent, _> =
            serde_json::from_value(json!({ "content": {} }));
        result.unwrap_err();
    }
}
