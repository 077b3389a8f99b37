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

//! Request descriptions for the client-server API.
//!
//! The builders in this module are pure: they turn arguments into a
//! [`Request`] and never consult client state. Precondition checks (login
//! gating, cursor echoing, flag checks) live in
//! [`BaseClient`][crate::BaseClient]; a transport executes the description
//! however it likes.

use std::collections::{BTreeMap, BTreeSet};

use http::Method;
use nioxide_common::{OwnedDeviceId, OwnedRoomId, OwnedUserId};
use serde_json::{json, Value};

/// The path prefix of the client-server API.
pub const CLIENT_API_PREFIX: &str = "/_matrix/client/r0";

/// A transport-agnostic description of an HTTP request.
///
/// This is the only thing the client core ever hands to a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method.
    pub method: Method,
    /// The request path, including the client API prefix.
    pub path: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// The JSON request body, if the endpoint takes one.
    pub body: Option<Value>,
}

fn authenticated(method: Method, path: String, access_token: &str) -> Request {
    Request {
        method,
        path,
        query: vec![("access_token".to_owned(), access_token.to_owned())],
        body: None,
    }
}

/// Build a password login request.
pub fn login(user: &str, password: &str, device_id: Option<&str>) -> Request {
    let mut body = json!({
        "type": "m.login.password",
        "user": user,
        "password": password,
    });

    if let Some(device_id) = device_id {
        body["device_id"] = device_id.into();
    }

    Request {
        method: Method::POST,
        path: format!("{CLIENT_API_PREFIX}/login"),
        query: Vec::new(),
        body: Some(body),
    }
}

/// Build a logout request.
pub fn logout(access_token: &str) -> Request {
    let mut request =
        authenticated(Method::POST, format!("{CLIENT_API_PREFIX}/logout"), access_token);
    request.body = Some(json!({}));
    request
}

/// Build a sync request.
///
/// # Arguments
///
/// * `since` - The cursor token returned by the previous sync, absent for
///   the initial sync.
///
/// * `timeout` - The long-poll timeout in milliseconds.
pub fn sync(access_token: &str, since: Option<&str>, timeout: Option<u64>) -> Request {
    let mut request = authenticated(Method::GET, format!("{CLIENT_API_PREFIX}/sync"), access_token);

    if let Some(since) = since {
        request.query.push(("since".to_owned(), since.to_owned()));
    }
    if let Some(timeout) = timeout {
        request.query.push(("timeout".to_owned(), timeout.to_string()));
    }

    request
}

/// Build a key upload request from opaque key material.
///
/// The device and one-time keys are produced by the cryptographic
/// collaborator; this crate doesn't inspect them.
pub fn keys_upload(access_token: &str, device_keys: Option<Value>, one_time_keys: Option<Value>) -> Request {
    let mut body = json!({});
    if let Some(device_keys) = device_keys {
        body["device_keys"] = device_keys;
    }
    if let Some(one_time_keys) = one_time_keys {
        body["one_time_keys"] = one_time_keys;
    }

    let mut request =
        authenticated(Method::POST, format!("{CLIENT_API_PREFIX}/keys/upload"), access_token);
    request.body = Some(body);
    request
}

/// Build a key query request for the given users.
///
/// An empty device list per user asks the server for all of the user's
/// devices.
pub fn keys_query(access_token: &str, users: &BTreeSet<OwnedUserId>) -> Request {
    let device_keys: BTreeMap<&OwnedUserId, [&str; 0]> = users.iter().map(|u| (u, [])).collect();

    let mut request =
        authenticated(Method::POST, format!("{CLIENT_API_PREFIX}/keys/query"), access_token);
    request.body = Some(json!({ "device_keys": device_keys }));
    request
}

/// Build a one-time key claim request for the given devices.
pub fn keys_claim(
    access_token: &str,
    devices: &BTreeMap<OwnedUserId, BTreeSet<OwnedDeviceId>>,
) -> Request {
    let one_time_keys: BTreeMap<&OwnedUserId, BTreeMap<&OwnedDeviceId, &str>> = devices
        .iter()
        .map(|(user, devices)| {
            (user, devices.iter().map(|d| (d, "signed_curve25519")).collect())
        })
        .collect();

    let mut request =
        authenticated(Method::POST, format!("{CLIENT_API_PREFIX}/keys/claim"), access_token);
    request.body = Some(json!({ "one_time_keys": one_time_keys }));
    request
}

/// Build a request sending an event to a room.
///
/// # Arguments
///
/// * `txn_id` - A client-chosen transaction ID making the send idempotent on
///   the server side.
pub fn room_send(
    access_token: &str,
    room_id: &OwnedRoomId,
    event_type: &str,
    content: Value,
    txn_id: &str,
) -> Request {
    let mut request = authenticated(
        Method::PUT,
        format!("{CLIENT_API_PREFIX}/rooms/{room_id}/send/{event_type}/{txn_id}"),
        access_token,
    );
    request.body = Some(content);
    request
}
