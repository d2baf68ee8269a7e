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

//! Ledger aggregation.
//!
//! Pure functions over a slice of [`Transaction`]s. Totals are always
//! recomputed from the full list; there are no running counters to drift.
//!
//! # Example
//!
//! ```
//! use caesarcoin::{LedgerTotals, Transaction};
//! use rust_decimal_macros::dec;
//!
//! let ledger = vec![
//!     Transaction::credit("salary", dec!(100)),
//!     Transaction::debit("groceries", dec!(40)),
//!     Transaction::debit("bus", dec!(10)),
//! ];
//!
//! let totals = LedgerTotals::from_transactions(&ledger);
//! assert_eq!(totals.credits, dec!(100));
//! assert_eq!(totals.debits, dec!(50));
//! assert_eq!(totals.balance, dec!(50));
//! ```

use crate::transaction::{Transaction, TransactionKind};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Sums the amounts of all transactions of `kind`. Empty input sums to zero.
pub fn sum_by_kind(transactions: &[Transaction], kind: TransactionKind) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.kind == kind)
        .map(|tx| tx.amount)
        .sum()
}

/// Total credits minus total debits.
pub fn net_balance(transactions: &[Transaction]) -> Decimal {
    sum_by_kind(transactions, TransactionKind::Credit)
        - sum_by_kind(transactions, TransactionKind::Debit)
}

/// The first `n` entries in ledger order.
pub fn recent(transactions: &[Transaction], n: usize) -> &[Transaction] {
    &transactions[..n.min(transactions.len())]
}

/// Derived totals of a ledger. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub credits: Decimal,
    pub debits: Decimal,
    /// `credits - debits`
    pub balance: Decimal,
}

impl LedgerTotals {
    const DECIMAL_PRECISION: u32 = 2;

    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let credits = sum_by_kind(transactions, TransactionKind::Credit);
        let debits = sum_by_kind(transactions, TransactionKind::Debit);
        Self {
            credits,
            debits,
            balance: credits - debits,
        }
    }
}

impl Serialize for LedgerTotals {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("LedgerTotals", 3)?;
        state.serialize_field(
            "credits",
            &self.credits.round_dp(LedgerTotals::DECIMAL_PRECISION),
        )?;
        state.serialize_field(
            "debits",
            &self.debits.round_dp(LedgerTotals::DECIMAL_PRECISION),
        )?;
        state.serialize_field(
            "balance",
            &self.balance.round_dp(LedgerTotals::DECIMAL_PRECISION),
        )?;
        state.end()
    }
}

/// Credit and debit sums for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub credits: Decimal,
    pub debits: Decimal,
}

/// Per-day sums for the `days` calendar days ending at `last_day`, oldest
/// first. Days are taken from `occurred_at` in UTC.
pub fn daily_totals(transactions: &[Transaction], last_day: NaiveDate, days: u32) -> Vec<DailyTotals> {
    (0..days)
        .rev()
        .filter_map(|offset| last_day.checked_sub_days(Days::new(u64::from(offset))))
        .map(|date| {
            let on_day: Vec<&Transaction> = transactions
                .iter()
                .filter(|tx| tx.occurred_at.date_naive() == date)
                .collect();
            let sum = |kind: TransactionKind| -> Decimal {
                on_day
                    .iter()
                    .filter(|tx| tx.kind == kind)
                    .map(|tx| tx.amount)
                    .sum()
            };
            DailyTotals {
                date,
                credits: sum(TransactionKind::Credit),
                debits: sum(TransactionKind::Debit),
            }
        })
        .collect()
}
