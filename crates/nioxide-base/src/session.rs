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

//! User sessions.

use std::fmt;

use nioxide_common::{OwnedDeviceId, OwnedUserId};

use crate::responses::LoginResponse;

/// An authenticated user session.
///
/// All fields are required; the "not logged in" state is represented by the
/// client holding no session at all, so a session can never be half
/// populated. A successful login response produces one atomically and a
/// logout drops it as a whole.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// The user the session belongs to.
    pub user_id: OwnedUserId,
    /// The ID of the client device.
    pub device_id: OwnedDeviceId,
    /// The access token authenticating requests.
    pub access_token: String,
}

#[cfg(not(tarpaulin_include))]
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

impl From<&LoginResponse> for Session {
    fn from(response: &LoginResponse) -> Self {
        Self {
            user_id: response.user_id.clone(),
            device_id: response.device_id.clone(),
            access_token: response.access_token.clone(),
        }
    }
}
