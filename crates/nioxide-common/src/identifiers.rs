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

//! Opaque Matrix identifier newtypes.
//!
//! These are thin wrappers around `String` that exist so that a user ID can't
//! accidentally be used where a room ID is expected. They don't validate the
//! identifier grammar; the server is authoritative for that.

use std::{fmt, ops::Deref};

use serde::{Deserialize, Serialize};

macro_rules! owned_identifier {
    ($(#[doc = $doc:literal] $name:ident),* $(,)?) => {
        $(
            #[doc = $doc]
            #[derive(
                Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                /// Access the identifier as a string slice.
                pub fn as_str(&self) -> &str {
                    &self.0
                }

                /// Consume the identifier, returning the inner string.
                pub fn into_string(self) -> String {
                    self.0
                }
            }

            impl Deref for $name {
                type Target = str;

                fn deref(&self) -> &str {
                    &self.0
                }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }

            impl From<&str> for $name {
                fn from(s: &str) -> Self {
                    Self(s.to_owned())
                }
            }

            impl From<String> for $name {
                fn from(s: String) -> Self {
                    Self(s)
                }
            }

            impl PartialEq<&str> for $name {
                fn eq(&self, other: &&str) -> bool {
                    self.0 == *other
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}({:?})", stringify!($name), self.0)
                }
            }
        )*
    };
}

owned_identifier! {
    /// A Matrix user ID, e.g. `@alice:example.org`.
    OwnedUserId,
    /// A Matrix device ID, e.g. `JLAFKJWSCS`.
    OwnedDeviceId,
    /// A Matrix room ID, e.g. `!testroom:example.org`.
    OwnedRoomId,
    /// A Matrix event ID, e.g. `$event_id_1`.
    OwnedEventId,
}
