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

//! Session configuration.
//!
//! Every field has a default matching the deployed app, so an empty JSON
//! object is a valid configuration:
//!
//! ```json
//! {
//!   "transactionsCollection": "transacoes",
//!   "usersCollection": "usuarios",
//!   "minPasswordLen": 6,
//!   "adoptAssignedUserId": false
//! }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Collection holding ledger entries.
    pub transactions_collection: String,
    /// Collection holding user profiles.
    pub users_collection: String,
    /// Shortest password accepted at registration.
    pub min_password_len: usize,
    /// After registration, adopt the id the store returned instead of
    /// keeping the locally built record with a blank id.
    pub adopt_assigned_user_id: bool,
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transactions_collection: "transacoes".to_string(),
            users_collection: "usuarios".to_string(),
            min_password_len: 6,
            adopt_assigned_user_id: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        assert_eq!(SessionConfig::from_json("{}").unwrap(), SessionConfig::default());
    }

    #[test]
    fn fields_are_camel_case() {
        let config =
            SessionConfig::from_json(r#"{"minPasswordLen": 8, "adoptAssignedUserId": true}"#)
                .unwrap();
        assert_eq!(config.min_password_len, 8);
        assert!(config.adopt_assigned_user_id);
        assert_eq!(config.users_collection, "usuarios");
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(SessionConfig::from_json(r#"{"minPasswordLen": "six"}"#).is_err());
    }
}
