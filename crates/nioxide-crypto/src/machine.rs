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

//! Device list tracking, one-time key counters and the "what should happen
//! next" decision logic for end-to-end encryption.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use nioxide_common::{OwnedDeviceId, OwnedRoomId, OwnedUserId};
use tracing::{debug, trace};

use crate::{error::OlmError, session::RoomSession};

/// The number of one-time keys we want the server to hold for our device.
///
/// As long as the server reports fewer keys than this, a key upload is due.
pub const ONE_TIME_KEY_TARGET: u64 = 50;

/// The last reported server-side one-time key count, next to the count we
/// aim for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneTimeKeyCounts {
    /// How many signed one-time keys the server currently holds for us.
    pub current: u64,
    /// The count we try to keep the server topped up to.
    pub target: u64,
}

impl Default for OneTimeKeyCounts {
    fn default() -> Self {
        Self { current: 0, target: ONE_TIME_KEY_TARGET }
    }
}

/// A derived snapshot of the cryptographic operations that are currently
/// due.
///
/// This is recomputed from the tracker's authoritative fields on every call
/// to [`OlmTracker::flags`]; it is never stored, so it can't go stale or be
/// toggled inconsistently from different call sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncryptionFlags {
    /// Has our own key material been uploaded to the server at least once?
    pub account_shared: bool,
    /// Should we upload (more) keys for our own device?
    pub should_upload_keys: bool,
    /// Should we query the keys of users whose device lists changed?
    pub should_query_keys: bool,
    /// Should we claim one-time keys to establish missing sessions?
    pub should_claim_keys: bool,
}

/// The encryption lifecycle state machine.
///
/// The tracker is fed observations (`observe_*`) by the protocol state
/// machine whenever a sync or key-related response was applied, and answers
/// the question "which cryptographic operation is due next" through
/// [`OlmTracker::flags`]. It also owns the established outbound room
/// sessions, guaranteeing that nothing is ever encrypted before a session
/// exists.
pub struct OlmTracker {
    user_id: OwnedUserId,
    device_id: OwnedDeviceId,

    /// Whether our own device keys have been uploaded to the server.
    account_shared: bool,
    key_counts: OneTimeKeyCounts,

    /// Users whose device list changed since the last completed key query.
    ///
    /// Grows by union on every sync; shrinks only when a key query response
    /// answers for a user. Users the server never answers for stay pending
    /// indefinitely.
    pending_devices: BTreeSet<OwnedUserId>,

    /// Whether at least one key query completed since this tracker was
    /// created. Before that, no one-time key claim makes sense: we don't
    /// know any devices yet.
    initial_query_done: bool,

    /// Devices we learned about from key queries that have no established
    /// session yet.
    missing_sessions: BTreeMap<OwnedUserId, BTreeSet<OwnedDeviceId>>,

    room_sessions: BTreeMap<OwnedRoomId, Box<dyn RoomSession>>,
}

#[cfg(not(tarpaulin_include))]
impl fmt::Debug for OlmTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OlmTracker")
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .field("account_shared", &self.account_shared)
            .field("key_counts", &self.key_counts)
            .field("pending_devices", &self.pending_devices)
            .field("initial_query_done", &self.initial_query_done)
            .field("missing_sessions", &self.missing_sessions)
            .finish_non_exhaustive()
    }
}

impl OlmTracker {
    /// Create a new tracker for our own device.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The user the device belongs to.
    ///
    /// * `device_id` - Our own device ID; its key-query entries are skipped
    ///   when collecting devices that need sessions.
    pub fn new(user_id: OwnedUserId, device_id: OwnedDeviceId) -> Self {
        Self {
            user_id,
            device_id,
            account_shared: false,
            key_counts: OneTimeKeyCounts::default(),
            pending_devices: BTreeSet::new(),
            initial_query_done: false,
            missing_sessions: BTreeMap::new(),
            room_sessions: BTreeMap::new(),
        }
    }

    /// The user this tracker belongs to.
    pub fn user_id(&self) -> &OwnedUserId {
        &self.user_id
    }

    /// Our own device ID.
    pub fn device_id(&self) -> &OwnedDeviceId {
        &self.device_id
    }

    /// Has our own key material been uploaded to the server?
    pub fn account_shared(&self) -> bool {
        self.account_shared
    }

    /// The last reported one-time key counts.
    pub fn one_time_key_counts(&self) -> OneTimeKeyCounts {
        self.key_counts
    }

    /// The users whose device lists are stale and await a key query.
    pub fn pending_devices(&self) -> &BTreeSet<OwnedUserId> {
        &self.pending_devices
    }

    /// The devices that still lack an established session, per user.
    pub fn missing_sessions(&self) -> &BTreeMap<OwnedUserId, BTreeSet<OwnedDeviceId>> {
        &self.missing_sessions
    }

    /// Feed the device-list and key-count portions of a sync response into
    /// the tracker.
    ///
    /// Changed and left users are merged into the pending set by union; the
    /// one-time key count, if the server reported one, overwrites the
    /// previous snapshot (latest wins). Left users additionally lose any
    /// recorded missing-session entries, there is no point in establishing
    /// sessions with devices of users that left.
    pub fn observe_sync(
        &mut self,
        changed: &[OwnedUserId],
        left: &[OwnedUserId],
        one_time_key_count: Option<u64>,
    ) {
        for user in changed {
            if self.pending_devices.insert(user.clone()) {
                trace!(user_id = %user, "Device list changed, user is pending a key query");
            }
        }

        for user in left {
            self.pending_devices.insert(user.clone());
            self.missing_sessions.remove(user);
        }

        if let Some(count) = one_time_key_count {
            // Some servers repeat the count in every sync response; don't
            // log noop changes.
            if count != self.key_counts.current {
                debug!(
                    old_count = self.key_counts.current,
                    new_count = count,
                    "Updated the one-time key count"
                );
            }
            self.key_counts.current = count;
        }
    }

    /// Record that a key upload request succeeded.
    ///
    /// Marks the account as shared and overwrites the key count with the
    /// count the upload response reported, if any.
    pub fn observe_key_upload_success(&mut self, one_time_key_count: Option<u64>) {
        if !self.account_shared {
            debug!("Marking the olm account as shared");
        }
        self.account_shared = true;

        if let Some(count) = one_time_key_count {
            self.key_counts.current = count;
        }
    }

    /// Record that a key query response answered for the given devices.
    ///
    /// Exactly the answered users are removed from the pending set; a
    /// partial response leaves the omitted users pending. Every answered
    /// device other than our own that has no session yet is recorded as a
    /// claim candidate.
    pub fn observe_key_query_success(
        &mut self,
        device_keys: &BTreeMap<OwnedUserId, BTreeSet<OwnedDeviceId>>,
    ) {
        for (user, devices) in device_keys {
            self.pending_devices.remove(user);

            for device in devices {
                if user == &self.user_id && device == &self.device_id {
                    continue;
                }

                self.missing_sessions.entry(user.clone()).or_default().insert(device.clone());
            }
        }

        self.initial_query_done = true;

        debug!(
            answered_users = device_keys.len(),
            still_pending = self.pending_devices.len(),
            "Received a key query response"
        );
    }

    /// Record that one-time keys were claimed for the given devices.
    ///
    /// The claimed devices no longer count as missing a session; the
    /// embedding application is expected to establish sessions from the
    /// claimed keys and register the room sessions it derives via
    /// [`OlmTracker::add_room_session`].
    pub fn observe_key_claim_success(
        &mut self,
        claimed: &BTreeMap<OwnedUserId, BTreeSet<OwnedDeviceId>>,
    ) {
        for (user, devices) in claimed {
            if let Some(missing) = self.missing_sessions.get_mut(user) {
                for device in devices {
                    missing.remove(device);
                }

                if missing.is_empty() {
                    self.missing_sessions.remove(user);
                }
            }
        }
    }

    /// Register an established outbound session for a room.
    ///
    /// Replaces any previous session for the room; rotating a session is
    /// just registering its successor.
    pub fn add_room_session(&mut self, room_id: OwnedRoomId, session: Box<dyn RoomSession>) {
        debug!(room_id = %room_id, "Registered an outbound room session");
        self.room_sessions.insert(room_id, session);
    }

    /// Does the given room have an established outbound session?
    pub fn has_room_session(&self, room_id: &OwnedRoomId) -> bool {
        self.room_sessions.contains_key(room_id)
    }

    /// Encrypt a plaintext for the given room.
    ///
    /// Fails if no session was established for the room, or if the session
    /// reports that it needs to be rotated first.
    pub fn encrypt(&mut self, room_id: &OwnedRoomId, plaintext: &str) -> Result<String, OlmError> {
        let session = self
            .room_sessions
            .get_mut(room_id)
            .ok_or_else(|| OlmError::MissingSession { room_id: room_id.clone() })?;

        if session.needs_rotation() {
            return Err(OlmError::SessionExpired { room_id: room_id.clone() });
        }

        Ok(session.encrypt(plaintext))
    }

    /// Decrypt a ciphertext that was encrypted for the given room.
    pub fn decrypt(&mut self, room_id: &OwnedRoomId, ciphertext: &str) -> Result<String, OlmError> {
        let session = self
            .room_sessions
            .get_mut(room_id)
            .ok_or_else(|| OlmError::MissingSession { room_id: room_id.clone() })?;

        Ok(session.decrypt(ciphertext)?)
    }

    /// Recompute the derived "what should happen next" flags.
    pub fn flags(&self) -> EncryptionFlags {
        EncryptionFlags {
            account_shared: self.account_shared,
            should_upload_keys: !self.account_shared
                || self.key_counts.current < self.key_counts.target,
            should_query_keys: !self.pending_devices.is_empty(),
            should_claim_keys: self.initial_query_done && !self.missing_sessions.is_empty(),
        }
    }
}
