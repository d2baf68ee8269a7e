// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! User profiles.
//!
//! Passwords are stored and compared in clear text, which is what the
//! existing `usuarios` collection holds. They are kept out of `Debug` output
//! and logs.

use crate::base::UserId;
use crate::error::DecodeError;
use crate::store::{Document, RawDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A registered user.
///
/// The id is store metadata: it is never written into the document body and
/// must be hydrated from [`RawDocument::id`] on every read.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(skip)]
    pub id: UserId,
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub password: String,
}

impl User {
    /// Creates an unpersisted user.
    pub fn new(
        name: impl Into<String>,
        nickname: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::default(),
            name: name.into(),
            nickname: nickname.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Document body, without the id.
    pub fn to_document(&self) -> Document {
        match serde_json::to_value(self) {
            Ok(Value::Object(doc)) => doc,
            // Four string fields always serialize to an object.
            _ => Document::new(),
        }
    }

    /// Decodes a stored user and sets its id from the document metadata.
    pub fn from_document(raw: &RawDocument) -> Result<Self, DecodeError> {
        let mut user: User = serde_json::from_value(Value::Object(raw.fields.clone()))
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;
        user.id = UserId::new(raw.id.clone());
        Ok(user)
    }

    /// Applies a profile update, keeping this user's id.
    pub fn updated_with(&self, update: &ProfileUpdate) -> Self {
        Self {
            id: self.id.clone(),
            name: update.name.clone(),
            nickname: update.nickname.clone(),
            email: update.email.clone(),
            password: update.password.clone(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Editable profile fields.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub password: String,
}

impl ProfileUpdate {
    pub fn new(
        name: impl Into<String>,
        nickname: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            nickname: nickname.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("name", &self.name)
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
