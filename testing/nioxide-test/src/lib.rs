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

//! Helpers and JSON fixtures to write tests for the nioxide crates.

#![warn(missing_docs)]

pub mod test_json;

use nioxide_crypto::{RoomSession, SessionError};

/// The room ID used throughout the fixtures.
pub const TEST_ROOM_ID: &str = "!testroom:example.org";

/// The user logging in throughout the fixtures.
pub const EXAMPLE_ID: &str = "@example:localhost";

/// The device the fixture login creates.
pub const EXAMPLE_DEVICE_ID: &str = "GHTYAJCE";

/// The other user appearing in the fixtures.
pub const ALICE_ID: &str = "@alice:example.org";

/// Alice's device ID.
pub const ALICE_DEVICE_ID: &str = "JLAFKJWSCS";

/// A reversible marker "encryption" for tests.
///
/// Prefixes the plaintext on encrypt and strips the prefix again on decrypt;
/// `needs_rotation` is fixed at construction.
#[derive(Debug)]
pub struct EchoSession {
    expired: bool,
}

impl EchoSession {
    /// Create a fresh session.
    pub fn new() -> Self {
        Self { expired: false }
    }

    /// Create a session that already needs rotation.
    pub fn expired() -> Self {
        Self { expired: true }
    }
}

impl Default for EchoSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomSession for EchoSession {
    fn encrypt(&mut self, plaintext: &str) -> String {
        format!("echo:{plaintext}")
    }

    fn decrypt(&mut self, ciphertext: &str) -> Result<String, SessionError> {
        ciphertext
            .strip_prefix("echo:")
            .map(ToOwned::to_owned)
            .ok_or_else(|| SessionError::new("not an echo ciphertext"))
    }

    fn needs_rotation(&self) -> bool {
        self.expired
    }
}
