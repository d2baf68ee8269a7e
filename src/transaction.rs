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

//! Ledger entries.
//!
//! A [`Transaction`] stores its amount as a non-negative magnitude; the sign
//! comes from its [`TransactionKind`]. Entries are created client-side,
//! written once, and never updated. The store assigns the id.
//!
//! Documents are decoded field by field with [`Transaction::from_document`].
//! Missing fields fall back to defaults, while a field of the wrong type is a
//! [`DecodeError`].

use crate::base::{TransactionId, UserId};
use crate::error::DecodeError;
use crate::store::{Document, RawDocument};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Document field names.
pub(crate) mod fields {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const AMOUNT: &str = "amount";
    pub const KIND: &str = "kind";
    pub const OCCURRED_AT: &str = "occurredAt";
    pub const OWNER_ID: &str = "ownerId";
}

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Inflow, increases the balance.
    Credit,
    /// Outflow, decreases the balance.
    #[default]
    Debit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
        }
    }

    /// Parses a stored kind. Unknown values read as [`TransactionKind::Debit`].
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for TransactionKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The Portuguese names are what older documents carry.
        match s {
            "CREDIT" | "CREDITO" => Ok(Self::Credit),
            "DEBIT" | "DEBITO" => Ok(Self::Debit),
            other => Err(DecodeError::InvalidValue {
                field: fields::KIND,
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Store-assigned id; blank until persisted.
    pub id: TransactionId,
    pub title: String,
    pub description: String,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
    pub kind: TransactionKind,
    pub owner_id: UserId,
}

impl Transaction {
    /// Creates an unpersisted, unowned entry dated now.
    pub fn new(title: impl Into<String>, amount: Decimal, kind: TransactionKind) -> Self {
        Self {
            id: TransactionId::default(),
            title: title.into(),
            description: String::new(),
            amount,
            occurred_at: Utc::now(),
            kind,
            owner_id: UserId::default(),
        }
    }

    pub fn credit(title: impl Into<String>, amount: Decimal) -> Self {
        Self::new(title, amount, TransactionKind::Credit)
    }

    pub fn debit(title: impl Into<String>, amount: Decimal) -> Self {
        Self::new(title, amount, TransactionKind::Debit)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    /// Returns `+amount` for credits and `-amount` for debits.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Credit => self.amount,
            TransactionKind::Debit => -self.amount,
        }
    }

    /// Builds the document body written on creation. The id is not part of it.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(fields::TITLE.into(), Value::from(self.title.clone()));
        doc.insert(
            fields::DESCRIPTION.into(),
            Value::from(self.description.clone()),
        );
        doc.insert(fields::AMOUNT.into(), Value::from(self.amount.to_string()));
        doc.insert(fields::KIND.into(), Value::from(self.kind.as_str()));
        doc.insert(
            fields::OCCURRED_AT.into(),
            Value::from(self.occurred_at.to_rfc3339()),
        );
        doc.insert(
            fields::OWNER_ID.into(),
            Value::from(self.owner_id.as_str()),
        );
        doc
    }

    /// Decodes a stored document, taking the id from the document metadata.
    ///
    /// | Field | Missing | Accepted |
    /// |-------|---------|----------|
    /// | `title`, `description`, `ownerId` | `""` | string |
    /// | `amount` | `0` | integer, float, decimal string; never negative |
    /// | `kind` | DEBIT | string; unknown values read as DEBIT |
    /// | `occurredAt` | now | RFC 3339 string |
    pub fn from_document(raw: &RawDocument) -> Result<Self, DecodeError> {
        let doc = &raw.fields;
        let kind = match optional_str(doc, fields::KIND)? {
            Some(kind) => TransactionKind::parse_lenient(kind),
            None => TransactionKind::Debit,
        };
        let occurred_at = match optional_str(doc, fields::OCCURRED_AT)? {
            Some(text) => DateTime::parse_from_rfc3339(text)
                .map_err(|_| DecodeError::InvalidValue {
                    field: fields::OCCURRED_AT,
                    value: text.to_string(),
                })?
                .with_timezone(&Utc),
            None => Utc::now(),
        };

        Ok(Self {
            id: TransactionId::new(raw.id.clone()),
            title: string_or_empty(doc, fields::TITLE)?,
            description: string_or_empty(doc, fields::DESCRIPTION)?,
            amount: decode_amount(doc.get(fields::AMOUNT))?,
            occurred_at,
            kind,
            owner_id: UserId::new(string_or_empty(doc, fields::OWNER_ID)?),
        })
    }
}

fn optional_str<'a>(doc: &'a Document, field: &'static str) -> Result<Option<&'a str>, DecodeError> {
    match doc.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(DecodeError::WrongType {
            field,
            expected: "string",
        }),
    }
}

fn string_or_empty(doc: &Document, field: &'static str) -> Result<String, DecodeError> {
    Ok(optional_str(doc, field)?.unwrap_or_default().to_string())
}

fn decode_amount(value: Option<&Value>) -> Result<Decimal, DecodeError> {
    let invalid = |value: &dyn fmt::Display| DecodeError::InvalidValue {
        field: fields::AMOUNT,
        value: value.to_string(),
    };

    let amount = match value {
        None | Some(Value::Null) => Decimal::ZERO,
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Decimal::from(i),
            (None, Some(f)) => Decimal::try_from(f).map_err(|_| invalid(n))?,
            (None, None) => return Err(invalid(n)),
        },
        Some(Value::String(s)) => Decimal::from_str(s.trim()).map_err(|_| invalid(s))?,
        Some(_) => {
            return Err(DecodeError::WrongType {
                field: fields::AMOUNT,
                expected: "number",
            });
        }
    };

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DecodeError::NegativeAmount(amount.to_string()));
    }
    Ok(amount)
}
