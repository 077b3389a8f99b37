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

#![doc = include_str!("../README.md")]
#![warn(missing_docs, missing_debug_implementations)]

pub use nioxide_common::*;
pub use nioxide_crypto as crypto;

pub mod api;
mod client;
mod error;
pub mod events;
pub mod responses;
pub mod rooms;
mod session;

pub use client::BaseClient;
pub use error::{LocalProtocolError, ParseError, ResponseError};
pub use session::Session;
