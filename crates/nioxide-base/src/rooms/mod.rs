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

//! Per-room state, folded incrementally from sync responses.

use std::collections::BTreeMap;

use nioxide_common::{OwnedRoomId, OwnedUserId};
use tracing::trace;

use crate::{
    events::{AnySyncRoomEvent, MembershipState, StrippedStateEvent},
    responses::{InvitedRoomUpdate, JoinedRoomUpdate, LeftRoomUpdate, RoomSummary},
};

/// Our own relationship to a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomState {
    /// We are joined to the room.
    Joined,
    /// We have been invited to the room.
    Invited,
    /// We have left (or been banned from) the room. The room's accumulated
    /// state is archived, not deleted.
    Left,
}

/// Whether end-to-end encryption is enabled in a room.
///
/// The flag is append-only: once a room saw an `m.room.encryption` event it
/// stays encrypted, no later sync batch can reset it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncryptionState {
    /// No encryption event was seen so far.
    #[default]
    Unknown,
    /// The room is end-to-end encrypted.
    Encrypted,
}

impl EncryptionState {
    /// Is the room known to be encrypted?
    pub fn is_encrypted(&self) -> bool {
        matches!(self, EncryptionState::Encrypted)
    }
}

/// The accumulated state of a single room.
///
/// Created when a sync response references the room for the first time with
/// a non-empty update, then mutated by every later sync batch that mentions
/// the room. Events are folded in the order the server supplied them; the
/// server's ordering is authoritative and never locally rearranged.
#[derive(Clone, Debug)]
pub struct Room {
    room_id: OwnedRoomId,
    state: RoomState,
    members: BTreeMap<OwnedUserId, MembershipState>,
    encryption: EncryptionState,
    summary: RoomSummary,
}

impl Room {
    /// Create an empty room in the given membership state.
    pub fn new(room_id: OwnedRoomId, state: RoomState) -> Self {
        Self {
            room_id,
            state,
            members: BTreeMap::new(),
            encryption: EncryptionState::default(),
            summary: RoomSummary::default(),
        }
    }

    /// The room's ID.
    pub fn room_id(&self) -> &OwnedRoomId {
        &self.room_id
    }

    /// Our own relationship to the room.
    pub fn state(&self) -> RoomState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: RoomState) {
        if self.state != state {
            trace!(room_id = %self.room_id, ?state, "Room changed state");
        }
        self.state = state;
    }

    /// The membership of every user the room has seen an event for.
    pub fn members(&self) -> &BTreeMap<OwnedUserId, MembershipState> {
        &self.members
    }

    /// The membership of a single user, if any event mentioned them.
    pub fn membership(&self, user_id: &OwnedUserId) -> Option<MembershipState> {
        self.members.get(user_id).copied()
    }

    /// Is the room end-to-end encrypted?
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_encrypted()
    }

    /// The room's encryption state.
    pub fn encryption_state(&self) -> EncryptionState {
        self.encryption
    }

    /// The latest display summary snapshot.
    pub fn summary(&self) -> &RoomSummary {
        &self.summary
    }

    /// Fold a joined-room sync update into the room.
    ///
    /// State events are applied first, then timeline events, each in server
    /// order. A summary, if present, replaces the previous one wholesale.
    pub fn receive_joined_update(&mut self, update: &JoinedRoomUpdate) {
        for event in &update.state {
            self.handle_event(event);
        }
        for event in &update.timeline.events {
            self.handle_event(event);
        }

        if let Some(summary) = &update.summary {
            self.summary = summary.clone();
        }
    }

    /// Fold an invited-room sync update into the room.
    pub fn receive_invited_update(&mut self, update: &InvitedRoomUpdate) {
        for event in &update.invite_state {
            self.handle_stripped_event(event);
        }
    }

    /// Fold a left-room sync update into the room.
    pub fn receive_left_update(&mut self, update: &LeftRoomUpdate) {
        for event in &update.state {
            self.handle_event(event);
        }
        for event in &update.timeline.events {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: &AnySyncRoomEvent) {
        match event {
            AnySyncRoomEvent::RoomMember(event) => {
                self.members.insert(event.state_key.clone(), event.membership());
            }
            AnySyncRoomEvent::RoomEncryption(_) => {
                self.encryption = EncryptionState::Encrypted;
            }
            // Messages, redactions and unknown events don't contribute to
            // the aggregate state at this layer.
            AnySyncRoomEvent::RoomMessage(_)
            | AnySyncRoomEvent::RoomRedaction(_)
            | AnySyncRoomEvent::Unknown(_) => {}
        }
    }

    fn handle_stripped_event(&mut self, event: &StrippedStateEvent) {
        match event.event_type.as_str() {
            "m.room.member" => {
                let membership = event
                    .content
                    .get("membership")
                    .and_then(|m| serde_json::from_value::<MembershipState>(m.clone()).ok());

                if let (Some(state_key), Some(membership)) = (&event.state_key, membership) {
                    self.members.insert(state_key.as_str().into(), membership);
                }
            }
            "m.room.encryption" => {
                self.encryption = EncryptionState::Encrypted;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Room, RoomState};
    use crate::{
        events::MembershipState,
        responses::{JoinedRoomUpdate, RoomSummary},
    };

    fn room() -> Room {
        Room::new("!testroom:example.org".into(), RoomState::Joined)
    }

    fn member_event(user: &str, membership: &str) -> serde_json::Value {
        json!({
            "type": "m.room.member",
            "event_id": format!("$member_{user}_{membership}"),
            "sender": user,
            "origin_server_ts": 1516809890615u64,
            "state_key": user,
            "content": { "membership": membership },
        })
    }

    fn update_with_timeline(events: Vec<serde_json::Value>) -> JoinedRoomUpdate {
        serde_json::from_value(json!({ "timeline": { "events": events } })).unwrap()
    }

    #[test]
    fn test_membership_events_update_the_roster() {
        let mut room = room();
        room.receive_joined_update(&update_with_timeline(vec![member_event(
            "@alice:example.org",
            "join",
        )]));

        assert_eq!(
            room.membership(&"@alice:example.org".into()),
            Some(MembershipState::Join)
        );

        // A later leave changes the value but doesn't clear other users.
        room.receive_joined_update(&update_with_timeline(vec![
            member_event("@bob:example.org", "join"),
            member_event("@alice:example.org", "leave"),
        ]));

        assert_eq!(room.membership(&"@alice:example.org".into()), Some(MembershipState::Leave));
        assert_eq!(room.membership(&"@bob:example.org".into()), Some(MembershipState::Join));
    }

    #[test]
    fn test_empty_updates_leave_the_roster_alone() {
        let mut room = room();
        room.receive_joined_update(&update_with_timeline(vec![member_event(
            "@alice:example.org",
            "join",
        )]));

        room.receive_joined_update(&JoinedRoomUpdate::default());
        assert_eq!(room.members().len(), 1);
    }

    #[test]
    fn test_encryption_is_permanent() {
        let mut room = room();
        assert!(!room.is_encrypted());

        room.receive_joined_update(&update_with_timeline(vec![json!({
            "type": "m.room.encryption",
            "event_id": "$event_id_2",
            "sender": "@alice:example.org",
            "origin_server_ts": 1516809890615u64,
            "content": { "algorithm": "m.megolm.v1.aes-sha2" },
        })]));
        assert!(room.is_encrypted());

        // Batches without an encryption event don't reset the flag.
        room.receive_joined_update(&update_with_timeline(vec![member_event(
            "@alice:example.org",
            "join",
        )]));
        assert!(room.is_encrypted());
    }

    #[test]
    fn test_summary_is_replaced_wholesale() {
        let mut room = room();
        let update: JoinedRoomUpdate = serde_json::from_value(json!({
            "summary": {
                "m.joined_member_count": 1,
                "m.invited_member_count": 2,
                "m.heroes": ["@alice:example.org"],
            }
        }))
        .unwrap();
        room.receive_joined_update(&update);
        assert_eq!(room.summary().heroes.len(), 1);

        // A new snapshot without heroes replaces the old one entirely.
        let update: JoinedRoomUpdate =
            serde_json::from_value(json!({ "summary": { "m.joined_member_count": 3 } })).unwrap();
        room.receive_joined_update(&update);

        assert_eq!(
            room.summary(),
            &RoomSummary { joined_member_count: 3, invited_member_count: 0, heroes: vec![] }
        );
    }
}
