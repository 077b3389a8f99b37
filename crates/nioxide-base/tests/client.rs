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

use assert_matches::assert_matches;
use http::StatusCode;
use nioxide_base::{
    events::MembershipState, rooms::RoomState, BaseClient, LocalProtocolError, OwnedRoomId,
    OwnedUserId, ResponseError,
};
use nioxide_crypto::OlmError;
use nioxide_test::{
    test_json, EchoSession, ALICE_DEVICE_ID, ALICE_ID, EXAMPLE_DEVICE_ID, EXAMPLE_ID, TEST_ROOM_ID,
};
use serde_json::json;

fn logged_in_client() -> BaseClient {
    let mut client = BaseClient::new();
    client.receive_login_response(StatusCode::OK, &test_json::LOGIN).unwrap();
    client
}

fn test_room_id() -> OwnedRoomId {
    TEST_ROOM_ID.into()
}

#[test]
fn test_login() {
    let mut client = BaseClient::new();

    assert!(client.access_token().is_none());
    assert!(!client.logged_in());

    let request = client.build_login_request("example", "wordpass", None);
    assert_eq!(request.path, "/_matrix/client/r0/login");

    let response = client.receive_login_response(StatusCode::OK, &test_json::LOGIN).unwrap();

    assert_eq!(response.user_id, EXAMPLE_ID);
    assert!(client.logged_in());
    assert_eq!(client.access_token(), Some("abc123"));
    assert_eq!(client.device_id().unwrap().as_str(), EXAMPLE_DEVICE_ID);
}

#[test]
fn test_failed_login() {
    let mut client = BaseClient::new();

    let error = client
        .receive_login_response(StatusCode::FORBIDDEN, &test_json::LOGIN_RESPONSE_ERR)
        .unwrap_err();

    let error = assert_matches!(error, ResponseError::Server(e) => e);
    assert_eq!(error.status_code, StatusCode::FORBIDDEN);
    assert_eq!(error.errcode.as_deref(), Some("M_FORBIDDEN"));

    assert!(!client.logged_in());
    assert!(client.access_token().is_none());
}

#[test]
fn test_operations_require_a_login() {
    let mut client = BaseClient::new();

    assert_matches!(
        client.build_sync_request(None, None),
        Err(LocalProtocolError::NotLoggedIn)
    );
    assert_matches!(
        client.build_keys_upload_request(None, None),
        Err(LocalProtocolError::NotLoggedIn)
    );
    assert_matches!(client.build_keys_query_request(), Err(LocalProtocolError::NotLoggedIn));
    assert_matches!(client.build_keys_claim_request(), Err(LocalProtocolError::NotLoggedIn));
    assert_matches!(client.build_logout_request(), Err(LocalProtocolError::NotLoggedIn));
    assert_matches!(
        client.build_room_send_request(&test_room_id(), "m.room.message", json!({}), "txn1"),
        Err(LocalProtocolError::NotLoggedIn)
    );
}

#[test]
fn test_sync_advances_the_cursor() {
    let mut client = logged_in_client();

    client.build_sync_request(None, Some(30000)).unwrap();
    let response = client.receive_sync_response(StatusCode::OK, &test_json::SYNC).unwrap();

    assert_eq!(response.next_batch, "token123");
    assert_eq!(client.sync_token(), Some("token123"));

    // The next sync must echo the cursor back.
    assert_matches!(
        client.build_sync_request(None, None),
        Err(LocalProtocolError::MissingSyncToken)
    );
    assert_matches!(
        client.build_sync_request(Some("something_else"), None),
        Err(LocalProtocolError::StaleSyncToken { .. })
    );

    let request = client.build_sync_request(Some("token123"), None).unwrap();
    assert!(request.query.contains(&("since".to_owned(), "token123".to_owned())));
}

#[test]
fn test_error_and_malformed_syncs_leave_state_untouched() {
    let mut client = logged_in_client();
    client.receive_sync_response(StatusCode::OK, &test_json::SYNC).unwrap();

    let error = client
        .receive_sync_response(StatusCode::TOO_MANY_REQUESTS, &json!({ "errcode": "M_LIMIT_EXCEEDED" }))
        .unwrap_err();
    assert_matches!(error, ResponseError::Server(_));
    assert_eq!(client.sync_token(), Some("token123"));

    let error = client.receive_sync_response(StatusCode::OK, &json!({})).unwrap_err();
    assert_matches!(error, ResponseError::Malformed(_));
    assert_eq!(client.sync_token(), Some("token123"));
}

#[test]
fn test_empty_sync_materializes_no_rooms() {
    let mut client = logged_in_client();
    client.receive_sync_response(StatusCode::OK, &test_json::SYNC_EMPTY).unwrap();

    assert_eq!(client.rooms().count(), 0);
}

#[test]
fn test_sync_materializes_referenced_rooms() {
    let mut client = logged_in_client();
    client.receive_sync_response(StatusCode::OK, &test_json::SYNC).unwrap();

    let room = client.get_room(&test_room_id()).unwrap();
    assert_eq!(room.membership(&ALICE_ID.into()), Some(MembershipState::Join));
    assert!(room.is_encrypted());
    assert_eq!(room.summary().invited_member_count, 2);

    // A later sync without an encryption event leaves the flag set.
    let mut client2 = client;
    client2
        .receive_sync_response(
            StatusCode::OK,
            &json!({
                "next_batch": "token125",
                "rooms": { "join": { TEST_ROOM_ID: {
                    "timeline": { "events": [ {
                        "type": "m.room.message",
                        "event_id": "$event_id_9",
                        "sender": ALICE_ID,
                        "origin_server_ts": 1516809890615u64,
                        "content": { "msgtype": "m.text", "body": "hello" },
                    } ] }
                } } }
            }),
        )
        .unwrap();
    assert!(client2.get_room(&test_room_id()).unwrap().is_encrypted());
}

#[test]
fn test_invited_rooms_materialize_from_stripped_state() {
    let mut client = logged_in_client();
    client.receive_sync_response(StatusCode::OK, &test_json::SYNC_INVITE).unwrap();

    let room = client.get_room(&test_room_id()).unwrap();
    assert_eq!(room.state(), RoomState::Invited);
    assert_eq!(room.membership(&EXAMPLE_ID.into()), Some(MembershipState::Invite));
}

#[test]
fn test_leaving_a_room_archives_its_state() {
    let mut client = logged_in_client();
    client.receive_sync_response(StatusCode::OK, &test_json::SYNC).unwrap();
    assert_eq!(client.get_room(&test_room_id()).unwrap().state(), RoomState::Joined);

    client.receive_sync_response(StatusCode::OK, &test_json::SYNC_LEAVE).unwrap();

    let room = client.get_room(&test_room_id()).unwrap();
    assert_eq!(room.state(), RoomState::Left);
    // The leave event itself is folded in.
    assert_eq!(room.membership(&EXAMPLE_ID.into()), Some(MembershipState::Leave));
    // Accumulated state is archived, not deleted.
    assert_eq!(room.membership(&ALICE_ID.into()), Some(MembershipState::Join));
    assert!(room.is_encrypted());
}

#[test]
fn test_keys_upload_lifecycle() {
    let mut client = logged_in_client();

    assert!(client.should_upload_keys());
    assert!(!client.olm_account_shared());

    client.build_keys_upload_request(Some(json!({})), None).unwrap();
    client.receive_keys_upload_response(StatusCode::OK, &test_json::KEYS_UPLOAD).unwrap();

    assert!(client.olm_account_shared());
    // 20 signed keys on the server is still short of the target.
    assert!(client.should_upload_keys());

    client
        .receive_keys_upload_response(
            StatusCode::OK,
            &json!({ "one_time_key_counts": { "signed_curve25519": 50 } }),
        )
        .unwrap();
    assert!(!client.should_upload_keys());
    assert_matches!(
        client.build_keys_upload_request(None, None),
        Err(LocalProtocolError::KeysAlreadyUploaded)
    );
}

#[test]
fn test_keys_query_lifecycle() {
    let mut client = logged_in_client();

    assert!(!client.should_query_keys());
    assert_matches!(client.build_keys_query_request(), Err(LocalProtocolError::NoPendingDevices));

    client.receive_sync_response(StatusCode::OK, &test_json::SYNC).unwrap();
    assert!(client.should_query_keys());

    let request = client.build_keys_query_request().unwrap();
    assert_eq!(request.body.unwrap()["device_keys"][ALICE_ID], json!([]));

    client.receive_keys_query_response(StatusCode::OK, &test_json::KEYS_QUERY).unwrap();
    assert!(!client.should_query_keys());
}

#[test]
fn test_partial_keys_query_leaves_users_pending() {
    let mut client = logged_in_client();

    client
        .receive_sync_response(
            StatusCode::OK,
            &json!({
                "next_batch": "token123",
                "device_lists": { "changed": [ALICE_ID, "@bob:example.org"], "left": [] }
            }),
        )
        .unwrap();
    assert!(client.should_query_keys());

    // The response only answers for alice; bob stays pending.
    client.receive_keys_query_response(StatusCode::OK, &test_json::KEYS_QUERY).unwrap();

    assert!(client.should_query_keys());
    let pending = client.olm().unwrap().pending_devices();
    assert!(pending.contains(&OwnedUserId::from("@bob:example.org")));
    assert!(!pending.contains(&OwnedUserId::from(ALICE_ID)));
}

#[test]
fn test_keys_claim_lifecycle() {
    let mut client = logged_in_client();

    // No query has completed yet, claiming is premature.
    assert_matches!(client.build_keys_claim_request(), Err(LocalProtocolError::NoKeysToClaim));

    client.receive_sync_response(StatusCode::OK, &test_json::SYNC).unwrap();
    client.receive_keys_query_response(StatusCode::OK, &test_json::KEYS_QUERY).unwrap();
    assert!(client.should_claim_keys());

    let request = client.build_keys_claim_request().unwrap();
    assert_eq!(
        request.body.unwrap()["one_time_keys"][ALICE_ID][ALICE_DEVICE_ID],
        json!("signed_curve25519")
    );

    client.receive_keys_claim_response(StatusCode::OK, &test_json::KEYS_CLAIM).unwrap();
    assert!(!client.should_claim_keys());
}

#[test]
fn test_sending_to_an_encrypted_room_requires_a_session() {
    let mut client = logged_in_client();
    client.receive_sync_response(StatusCode::OK, &test_json::SYNC).unwrap();

    let content = json!({ "msgtype": "m.text", "body": "it's a secret to everybody" });

    assert!(!client.olm().unwrap().has_room_session(&test_room_id()));
    let error = client
        .build_room_send_request(&test_room_id(), "m.room.message", content.clone(), "txn1")
        .unwrap_err();
    assert_matches!(
        error,
        LocalProtocolError::Encryption(OlmError::MissingSession { .. })
    );

    client.add_room_session(test_room_id(), Box::new(EchoSession::new())).unwrap();
    assert!(client.olm().unwrap().has_room_session(&test_room_id()));
    let request = client
        .build_room_send_request(&test_room_id(), "m.room.message", content.clone(), "txn1")
        .unwrap();

    assert!(request.path.contains("/send/m.room.encrypted/"));
    let body = request.body.unwrap();
    assert_eq!(body["algorithm"], "m.megolm.v1.aes-sha2");
    assert!(body["ciphertext"].as_str().unwrap().starts_with("echo:"));

    // A session that needs rotation refuses to encrypt.
    client.add_room_session(test_room_id(), Box::new(EchoSession::expired())).unwrap();
    let error = client
        .build_room_send_request(&test_room_id(), "m.room.message", content, "txn2")
        .unwrap_err();
    assert_matches!(
        error,
        LocalProtocolError::Encryption(OlmError::SessionExpired { .. })
    );
}

#[test]
fn test_sending_to_an_unknown_room_fails_locally() {
    let mut client = logged_in_client();

    assert_matches!(
        client.build_room_send_request(&test_room_id(), "m.room.message", json!({}), "txn1"),
        Err(LocalProtocolError::UnknownRoom { .. })
    );
}

#[test]
fn test_room_send_response_returns_the_event_id() {
    let mut client = logged_in_client();

    let response =
        client.receive_room_send_response(StatusCode::OK, &test_json::ROOM_SEND).unwrap();
    assert_eq!(response.event_id.as_str(), "$h29iv0s8:example.com");
}

#[test]
fn test_logout_resets_the_session() {
    let mut client = logged_in_client();
    client.receive_sync_response(StatusCode::OK, &test_json::SYNC).unwrap();

    client.build_logout_request().unwrap();
    client.receive_logout_response(StatusCode::OK, &test_json::LOGOUT).unwrap();

    assert!(!client.logged_in());
    assert!(client.access_token().is_none());
    assert!(!client.should_upload_keys());

    // Accumulated room state survives the logout.
    assert!(client.get_room(&test_room_id()).is_some());

    assert_matches!(
        client.build_sync_request(Some("token123"), None),
        Err(LocalProtocolError::NotLoggedIn)
    );
}
