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

//! Response bodies matching the reference test data, as a single source of
//! truth for all nioxide tests.

use once_cell::sync::Lazy;
use serde_json::{json, Value as JsonValue};

/// `POST /_matrix/client/r0/login`
pub static LOGIN: Lazy<JsonValue> = Lazy::new(|| {
    json!({
        "access_token": "abc123",
        "device_id": "GHTYAJCE",
        "home_server": "localhost",
        "user_id": "@example:localhost"
    })
});

/// A failed login attempt.
pub static LOGIN_RESPONSE_ERR: Lazy<JsonValue> = Lazy::new(|| {
    json!({
        "errcode": "M_FORBIDDEN",
        "error": "Invalid password"
    })
});

/// `POST /_matrix/client/r0/logout`
pub static LOGOUT: Lazy<JsonValue> = Lazy::new(|| json!({}));

/// `GET /_matrix/client/r0/sync`, one joined room with a member join and an
/// encryption event.
pub static SYNC: Lazy<JsonValue> = Lazy::new(|| {
    json!({
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
                                "content": { "membership": "join" }
                            },
                            {
                                "type": "m.room.encryption",
                                "event_id": "$event_id_2",
                                "sender": "@alice:example.org",
                                "origin_server_ts": 1516809890615u64,
                                "state_key": "",
                                "content": { "algorithm": "m.megolm.v1.aes-sha2" }
                            }
                        ],
                        "limited": false,
                        "prev_batch": "prev_batch_token"
                    },
                    "state": { "events": [] },
                    "summary": {
                        "m.joined_member_count": 1,
                        "m.invited_member_count": 2,
                        "m.heroes": []
                    }
                }
            },
            "invite": {},
            "leave": {}
        },
        "device_one_time_keys_count": {
            "curve25519": 49,
            "signed_curve25519": 49
        },
        "device_lists": {
            "changed": ["@alice:example.org"],
            "left": []
        },
        "to_device": { "events": [] }
    })
});

/// A sync inviting the logged in user to the test room, with stripped
/// state.
pub static SYNC_INVITE: Lazy<JsonValue> = Lazy::new(|| {
    json!({
        "next_batch": "token126",
        "rooms": {
            "join": {},
            "invite": {
                "!testroom:example.org": {
                    "invite_state": {
                        "events": [
                            {
                                "type": "m.room.name",
                                "sender": "@alice:example.org",
                                "state_key": "",
                                "content": { "name": "Test room" }
                            },
                            {
                                "type": "m.room.member",
                                "sender": "@alice:example.org",
                                "state_key": "@example:localhost",
                                "content": { "membership": "invite" }
                            }
                        ]
                    }
                }
            },
            "leave": {}
        }
    })
});

/// A sync in which the logged in user has left the test room.
pub static SYNC_LEAVE: Lazy<JsonValue> = Lazy::new(|| {
    json!({
        "next_batch": "token125",
        "rooms": {
            "join": {},
            "invite": {},
            "leave": {
                "!testroom:example.org": {
                    "timeline": {
                        "events": [
                            {
                                "type": "m.room.member",
                                "event_id": "$event_id_3",
                                "sender": "@example:localhost",
                                "origin_server_ts": 1516809890615u64,
                                "state_key": "@example:localhost",
                                "content": { "membership": "leave" }
                            }
                        ],
                        "limited": false,
                        "prev_batch": "prev_batch_token"
                    },
                    "state": { "events": [] }
                }
            }
        }
    })
});

/// A heartbeat sync: a fresh cursor and nothing else.
pub static SYNC_EMPTY: Lazy<JsonValue> = Lazy::new(|| {
    json!({
        "next_batch": "token124",
        "rooms": { "join": {}, "invite": {}, "leave": {} }
    })
});

/// `POST /_matrix/client/r0/keys/upload`
pub static KEYS_UPLOAD: Lazy<JsonValue> = Lazy::new(|| {
    json!({
        "one_time_key_counts": {
            "curve25519": 10,
            "signed_curve25519": 20
        }
    })
});

/// `POST /_matrix/client/r0/keys/query`
pub static KEYS_QUERY: Lazy<JsonValue> = Lazy::new(|| {
    json!({
        "device_keys": {
            "@alice:example.org": {
                "JLAFKJWSCS": {
                    "algorithms": [
                        "m.olm.v1.curve25519-aes-sha2",
                        "m.megolm.v1.aes-sha2"
                    ],
                    "device_id": "JLAFKJWSCS",
                    "user_id": "@alice:example.org",
                    "keys": {
                        "curve25519:JLAFKJWSCS": "wjLpTLRqbqBzLs63aYaEv2Boi6cFEbbM/sSRQ2oAKk4",
                        "ed25519:JLAFKJWSCS": "nE6W2fCblxDcOFmeEtCHNl8/l8bXcu7GKyAswA4r3mM"
                    },
                    "signatures": {
                        "@alice:example.org": {
                            "ed25519:JLAFKJWSCS": "m53Wkbh2HXkc3vFApZvCrfXcX3AI51GsDHustMhKwlv3TuOJMj4wistcOTM8q2+e/Ro7rWFUb9ZfnNbwptSUBA"
                        }
                    }
                }
            }
        },
        "failures": {}
    })
});

/// `POST /_matrix/client/r0/keys/claim`
pub static KEYS_CLAIM: Lazy<JsonValue> = Lazy::new(|| {
    json!({
        "one_time_keys": {
            "@alice:example.org": {
                "JLAFKJWSCS": {
                    "signed_curve25519:AAAAAQ": {
                        "key": "zKbLg+NrIjpnagy+pIY6uPL4ZwEG2v+8F9lmgsnlZzs",
                        "signatures": {
                            "@alice:example.org": {
                                "ed25519:JLAFKJWSCS": "FLWxXqGbwrb8SM3Y795eB6OA8bwBcoMZFXBqnTn58AYWZSqiD45tlBVcDa2L7RwdKXebW/VzDlnfVJ+9jok1Bw"
                            }
                        }
                    }
                }
            }
        },
        "failures": {}
    })
});

/// `PUT /_matrix/client/r0/rooms/{roomId}/send/{eventType}/{txnId}`
pub static ROOM_SEND: Lazy<JsonValue> = Lazy::new(|| {
    json!({
        "event_id": "$h29iv0s8:example.com"
    })
});
