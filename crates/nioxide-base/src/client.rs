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

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use http::StatusCode;
use nioxide_common::{OwnedDeviceId, OwnedRoomId, OwnedUserId};
use nioxide_crypto::{EncryptionFlags, OlmTracker, RoomSession};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::{
    api::{self, Request},
    error::{LocalProtocolError, ResponseError},
    responses::{
        ErrorResponse, KeysClaimResponse, KeysQueryResponse, KeysUploadResponse, LoginResponse,
        LogoutResponse, RoomSendResponse, SyncResponse,
    },
    rooms::{Room, RoomState},
    session::Session,
};

/// A no I/O client implementation.
///
/// This client is a state machine that builds request descriptions and
/// receives raw responses, updating its state accordingly. It never executes
/// a request itself; a transport does, and hands the result back through the
/// matching `receive_*_response` method.
///
/// All mutation happens inside `receive_*_response`. The client has no
/// internal locking, so at most one response may be applied at a time;
/// callers sharing a client between concurrent transports must serialize
/// access themselves. A request that was built but whose response was never
/// delivered leaves the state unchanged.
#[derive(Default)]
pub struct BaseClient {
    session: Option<Session>,
    sync_token: Option<String>,
    rooms: BTreeMap<OwnedRoomId, Room>,
    /// Created together with the session on login; `None` exactly while
    /// logged out.
    olm: Option<OlmTracker>,
}

#[cfg(not(tarpaulin_include))]
impl fmt::Debug for BaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseClient")
            .field("session", &self.session)
            .field("sync_token", &self.sync_token)
            .field("rooms", &self.rooms.keys())
            .finish_non_exhaustive()
    }
}

impl BaseClient {
    /// Create a new, logged out client.
    pub fn new() -> Self {
        Self::default()
    }

    fn access_token_or_err(&self) -> Result<&str, LocalProtocolError> {
        self.session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .ok_or(LocalProtocolError::NotLoggedIn)
    }

    fn check_error_status(status: StatusCode, body: &Value) -> Result<(), ResponseError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(ResponseError::Server(ErrorResponse::from_parts(status, body)))
        }
    }

    /// Is the client logged in?
    pub fn logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// The access token of the current session, if logged in.
    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    /// The user ID of the current session, if logged in.
    pub fn user_id(&self) -> Option<&OwnedUserId> {
        self.session.as_ref().map(|s| &s.user_id)
    }

    /// The device ID of the current session, if logged in.
    pub fn device_id(&self) -> Option<&OwnedDeviceId> {
        self.session.as_ref().map(|s| &s.device_id)
    }

    /// The cursor token of the last successful sync, if any.
    pub fn sync_token(&self) -> Option<&str> {
        self.sync_token.as_deref()
    }

    /// All rooms this client knows about.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Get a room by its ID.
    pub fn get_room(&self, room_id: &OwnedRoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// The encryption lifecycle tracker, if logged in.
    pub fn olm(&self) -> Option<&OlmTracker> {
        self.olm.as_ref()
    }

    /// The derived encryption flags, if logged in.
    pub fn encryption_flags(&self) -> Option<EncryptionFlags> {
        self.olm.as_ref().map(OlmTracker::flags)
    }

    /// Has our own key material been uploaded to the server?
    pub fn olm_account_shared(&self) -> bool {
        self.encryption_flags().is_some_and(|f| f.account_shared)
    }

    /// Should our own device keys or one-time keys be uploaded?
    pub fn should_upload_keys(&self) -> bool {
        self.encryption_flags().is_some_and(|f| f.should_upload_keys)
    }

    /// Should the keys of users with changed device lists be queried?
    pub fn should_query_keys(&self) -> bool {
        self.encryption_flags().is_some_and(|f| f.should_query_keys)
    }

    /// Should one-time keys be claimed to establish missing sessions?
    pub fn should_claim_keys(&self) -> bool {
        self.encryption_flags().is_some_and(|f| f.should_claim_keys)
    }

    /// Register an established outbound session for a room.
    ///
    /// Called by the embedding application once its cryptographic
    /// collaborator derived a session from claimed one-time keys.
    pub fn add_room_session(
        &mut self,
        room_id: OwnedRoomId,
        session: Box<dyn RoomSession>,
    ) -> Result<(), LocalProtocolError> {
        let Some(olm) = &mut self.olm else {
            return Err(LocalProtocolError::NotLoggedIn);
        };

        olm.add_room_session(room_id, session);
        Ok(())
    }

    /// Build a password login request.
    ///
    /// The only operation that is valid while logged out.
    pub fn build_login_request(
        &self,
        user: &str,
        password: &str,
        device_id: Option<&str>,
    ) -> Request {
        api::login(user, password, device_id)
    }

    /// Receive the response to a login request.
    ///
    /// On success the session is populated atomically and the encryption
    /// tracker is (re)created for the session's device.
    pub fn receive_login_response(
        &mut self,
        status: StatusCode,
        body: &Value,
    ) -> Result<LoginResponse, ResponseError> {
        Self::check_error_status(status, body)?;
        let response = LoginResponse::from_json(body)?;

        let session = Session::from(&response);
        debug!(user_id = %session.user_id, device_id = %session.device_id, "Logged in");

        // Keep the tracker when the same device logs in again; a different
        // user or device gets a fresh one.
        let reusable = self
            .olm
            .as_ref()
            .is_some_and(|olm| {
                olm.user_id() == &session.user_id && olm.device_id() == &session.device_id
            });
        if !reusable {
            self.olm =
                Some(OlmTracker::new(session.user_id.clone(), session.device_id.clone()));
        }

        self.session = Some(session);
        Ok(response)
    }

    /// Build a logout request.
    pub fn build_logout_request(&self) -> Result<Request, LocalProtocolError> {
        Ok(api::logout(self.access_token_or_err()?))
    }

    /// Receive the response to a logout request.
    ///
    /// On success the session is dropped and the client transitions back to
    /// the logged out state. Accumulated room state is kept.
    pub fn receive_logout_response(
        &mut self,
        status: StatusCode,
        body: &Value,
    ) -> Result<LogoutResponse, ResponseError> {
        Self::check_error_status(status, body)?;
        let response = LogoutResponse::from_json(body)?;

        debug!("Logged out");
        self.session = None;
        self.olm = None;

        Ok(response)
    }

    /// Build a sync request.
    ///
    /// Once a sync has succeeded, `since` must be exactly the token the
    /// previous successful sync returned; anything else fails with a
    /// [`LocalProtocolError`] before hitting the network. This enforces the
    /// long-poll contract: each batch of events is applied exactly once.
    pub fn build_sync_request(
        &self,
        since: Option<&str>,
        timeout: Option<u64>,
    ) -> Result<Request, LocalProtocolError> {
        let token = self.access_token_or_err()?;

        match (self.sync_token.as_deref(), since) {
            (Some(_), None) => return Err(LocalProtocolError::MissingSyncToken),
            (stored, Some(supplied)) if stored != Some(supplied) => {
                return Err(LocalProtocolError::StaleSyncToken { supplied: supplied.to_owned() })
            }
            _ => {}
        }

        Ok(api::sync(token, since, timeout))
    }

    /// Receive the response to a sync request.
    ///
    /// On success the cursor advances, every referenced room folds in its
    /// update and the device-list/key-count fields feed the encryption
    /// tracker. An error or malformed response leaves all of that untouched.
    pub fn receive_sync_response(
        &mut self,
        status: StatusCode,
        body: &Value,
    ) -> Result<SyncResponse, ResponseError> {
        Self::check_error_status(status, body)?;
        let response = SyncResponse::from_json(body)?;

        debug!(next_batch = %response.next_batch, "Advancing the sync cursor");
        self.sync_token = Some(response.next_batch.clone());

        for (room_id, update) in &response.rooms.join {
            if let Some(room) =
                self.get_or_create_room(room_id, RoomState::Joined, update.is_empty())
            {
                room.receive_joined_update(update);
            }
        }

        for (room_id, update) in &response.rooms.invite {
            if let Some(room) =
                self.get_or_create_room(room_id, RoomState::Invited, update.is_empty())
            {
                room.receive_invited_update(update);
            }
        }

        for (room_id, update) in &response.rooms.leave {
            if let Some(room) =
                self.get_or_create_room(room_id, RoomState::Left, update.is_empty())
            {
                room.receive_left_update(update);
            }
        }

        if let Some(olm) = &mut self.olm {
            olm.observe_sync(
                &response.device_lists.changed,
                &response.device_lists.left,
                response.device_one_time_keys_count,
            );
        }

        Ok(response)
    }

    /// Get a room for folding a sync update into, creating it on first
    /// reference.
    ///
    /// A room that was never seen before and whose update carries nothing is
    /// not materialized.
    fn get_or_create_room(
        &mut self,
        room_id: &OwnedRoomId,
        state: RoomState,
        update_is_empty: bool,
    ) -> Option<&mut Room> {
        if !self.rooms.contains_key(room_id) {
            if update_is_empty {
                trace!(room_id = %room_id, "Ignoring an empty update for an unknown room");
                return None;
            }

            self.rooms.insert(room_id.clone(), Room::new(room_id.clone(), state));
        }

        let room = self.rooms.get_mut(room_id)?;
        room.set_state(state);
        Some(room)
    }

    /// Build a key upload request from opaque key material.
    ///
    /// Fails fast when no upload is due; callers are expected to consult
    /// [`BaseClient::should_upload_keys`] first, and the check here prevents
    /// redundant network round-trips either way.
    pub fn build_keys_upload_request(
        &self,
        device_keys: Option<Value>,
        one_time_keys: Option<Value>,
    ) -> Result<Request, LocalProtocolError> {
        let token = self.access_token_or_err()?;
        let Some(olm) = &self.olm else {
            return Err(LocalProtocolError::NotLoggedIn);
        };

        if !olm.flags().should_upload_keys {
            return Err(LocalProtocolError::KeysAlreadyUploaded);
        }

        Ok(api::keys_upload(token, device_keys, one_time_keys))
    }

    /// Receive the response to a key upload request.
    pub fn receive_keys_upload_response(
        &mut self,
        status: StatusCode,
        body: &Value,
    ) -> Result<KeysUploadResponse, ResponseError> {
        Self::check_error_status(status, body)?;
        let response = KeysUploadResponse::from_json(body)?;

        if let Some(olm) = &mut self.olm {
            olm.observe_key_upload_success(response.signed_curve25519());
        }

        Ok(response)
    }

    /// Build a key query request for every user whose device list is
    /// pending.
    pub fn build_keys_query_request(&self) -> Result<Request, LocalProtocolError> {
        let token = self.access_token_or_err()?;
        let Some(olm) = &self.olm else {
            return Err(LocalProtocolError::NotLoggedIn);
        };

        if olm.pending_devices().is_empty() {
            return Err(LocalProtocolError::NoPendingDevices);
        }

        Ok(api::keys_query(token, olm.pending_devices()))
    }

    /// Receive the response to a key query request.
    ///
    /// Exactly the users present in the response are settled; a partial
    /// response leaves the omitted users pending for the next query.
    pub fn receive_keys_query_response(
        &mut self,
        status: StatusCode,
        body: &Value,
    ) -> Result<KeysQueryResponse, ResponseError> {
        Self::check_error_status(status, body)?;
        let response = KeysQueryResponse::from_json(body)?;

        if let Some(olm) = &mut self.olm {
            olm.observe_key_query_success(&device_map(&response.device_keys));
        }

        Ok(response)
    }

    /// Build a one-time key claim request for every device that still lacks
    /// a session.
    pub fn build_keys_claim_request(&self) -> Result<Request, LocalProtocolError> {
        let token = self.access_token_or_err()?;
        let Some(olm) = &self.olm else {
            return Err(LocalProtocolError::NotLoggedIn);
        };

        if !olm.flags().should_claim_keys {
            return Err(LocalProtocolError::NoKeysToClaim);
        }

        Ok(api::keys_claim(token, olm.missing_sessions()))
    }

    /// Receive the response to a one-time key claim request.
    pub fn receive_keys_claim_response(
        &mut self,
        status: StatusCode,
        body: &Value,
    ) -> Result<KeysClaimResponse, ResponseError> {
        Self::check_error_status(status, body)?;
        let response = KeysClaimResponse::from_json(body)?;

        if let Some(olm) = &mut self.olm {
            olm.observe_key_claim_success(&device_map(&response.one_time_keys));
        }

        Ok(response)
    }

    /// Build a request sending an event to a room.
    ///
    /// For a room that is known to be encrypted the content is encrypted
    /// through the established room session and sent as `m.room.encrypted`;
    /// without an established (or with an expired) session the build fails
    /// locally instead of leaking plaintext.
    pub fn build_room_send_request(
        &mut self,
        room_id: &OwnedRoomId,
        event_type: &str,
        content: Value,
        txn_id: &str,
    ) -> Result<Request, LocalProtocolError> {
        let token = self.access_token_or_err()?.to_owned();

        let Some(room) = self.rooms.get(room_id) else {
            return Err(LocalProtocolError::UnknownRoom { room_id: room_id.clone() });
        };

        if room.is_encrypted() {
            let Some(olm) = &mut self.olm else {
                return Err(LocalProtocolError::NotLoggedIn);
            };

            let ciphertext = olm.encrypt(room_id, &content.to_string())?;
            let content = json!({
                "algorithm": "m.megolm.v1.aes-sha2",
                "ciphertext": ciphertext,
                "device_id": olm.device_id(),
            });

            Ok(api::room_send(&token, room_id, "m.room.encrypted", content, txn_id))
        } else {
            Ok(api::room_send(&token, room_id, event_type, content, txn_id))
        }
    }

    /// Receive the response to sending an event to a room.
    pub fn receive_room_send_response(
        &mut self,
        status: StatusCode,
        body: &Value,
    ) -> Result<RoomSendResponse, ResponseError> {
        Self::check_error_status(status, body)?;
        Ok(RoomSendResponse::from_json(body)?)
    }
}

/// Collapse a per-user, per-device response map down to the device IDs.
fn device_map(
    keys: &BTreeMap<OwnedUserId, BTreeMap<OwnedDeviceId, Value>>,
) -> BTreeMap<OwnedUserId, BTreeSet<OwnedDeviceId>> {
    keys.iter()
        .map(|(user, devices)| (user.clone(), devices.keys().cloned().collect()))
        .collect()
}
