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

//! The opaque cryptographic session capability.

use crate::error::SessionError;

/// An established outbound encryption session for a room.
///
/// The double-ratchet math lives entirely behind this trait; implementations
/// are supplied by the embedding application, typically wrapping a megolm
/// session from an olm library. The [`OlmTracker`] only cares that a session
/// can transform plaintext to ciphertext and back, and that it can tell when
/// it has reached the end of its useful life.
///
/// [`OlmTracker`]: crate::OlmTracker
pub trait RoomSession: Send {
    /// Encrypt a plaintext with this session, advancing the ratchet.
    fn encrypt(&mut self, plaintext: &str) -> String;

    /// Decrypt a ciphertext that was produced by the matching session.
    fn decrypt(&mut self, ciphertext: &str) -> Result<String, SessionError>;

    /// Does this session need to be replaced before it may encrypt again?
    ///
    /// Sessions expire after a message count or wall-clock limit; once this
    /// returns `true` the tracker refuses to encrypt with the session.
    fn needs_rotation(&self) -> bool;
}
