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

//! Benchmarks for ledger aggregation and document decoding.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Totals over ledgers of growing size
//! - Daily totals over a trailing window
//! - Decoding stored documents
//! - Session add/load round trips against the in-memory store

use caesarcoin::ledger::daily_totals;
use caesarcoin::{
    LedgerSession, LedgerTotals, MemoryStore, RawDocument, SessionConfig, Transaction,
    TransactionKind, UserId,
};
use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::executor::block_on;
use rust_decimal::Decimal;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn make_ledger(count: usize) -> Vec<Transaction> {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let kind = if i % 3 == 0 {
                TransactionKind::Credit
            } else {
                TransactionKind::Debit
            };
            Transaction::new(format!("entry {i}"), Decimal::new(1_000 + i as i64, 2), kind)
                .with_occurred_at(start + Duration::hours(i as i64))
        })
        .collect()
}

fn make_documents(count: usize) -> Vec<RawDocument> {
    make_ledger(count)
        .iter()
        .enumerate()
        .map(|(i, tx)| RawDocument {
            id: format!("doc{i:06}"),
            fields: tx.to_document(),
        })
        .collect()
}

// =============================================================================
// Aggregation Benchmarks
// =============================================================================

fn bench_totals(c: &mut Criterion) {
    let mut group = c.benchmark_group("totals");

    for count in [10, 100, 1_000, 10_000].iter() {
        let ledger = make_ledger(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &ledger, |b, ledger| {
            b.iter(|| LedgerTotals::from_transactions(black_box(ledger)));
        });
    }

    group.finish();
}

fn bench_daily_totals(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_totals");
    let last_day = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap().date_naive();

    for count in [100, 1_000].iter() {
        let ledger = make_ledger(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("week", count), &ledger, |b, ledger| {
            b.iter(|| daily_totals(black_box(ledger), last_day, 7));
        });
        group.bench_with_input(BenchmarkId::new("month", count), &ledger, |b, ledger| {
            b.iter(|| daily_totals(black_box(ledger), last_day, 30));
        });
    }

    group.finish();
}

// =============================================================================
// Decoding Benchmarks
// =============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for count in [100, 1_000].iter() {
        let docs = make_documents(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &docs, |b, docs| {
            b.iter(|| {
                docs.iter()
                    .filter_map(|raw| Transaction::from_document(black_box(raw)).ok())
                    .count()
            });
        });
    }

    group.finish();
}

// =============================================================================
// Session Benchmarks
// =============================================================================

fn bench_session_add(c: &mut Criterion) {
    c.bench_function("session_add", |b| {
        let store = Arc::new(MemoryStore::new());
        let session = LedgerSession::new(store, &SessionConfig::default());
        let owner = UserId::from("bench");
        b.iter(|| {
            let tx = Transaction::credit("bench", Decimal::new(100, 2));
            block_on(session.add(black_box(tx), &owner)).ok();
        });
    });
}

fn bench_session_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_load");

    for count in [10, 100, 1_000].iter() {
        let store = Arc::new(MemoryStore::new());
        let owner = UserId::from("bench");
        for mut tx in make_ledger(*count) {
            tx.owner_id = owner.clone();
            store.insert_raw("transacoes", tx.to_document());
        }
        let session = LedgerSession::new(store, &SessionConfig::default());

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &owner, |b, owner| {
            b.iter(|| block_on(session.load(black_box(owner), true)).ok());
        });
    }

    group.finish();
}

criterion_group!(aggregation, bench_totals, bench_daily_totals);
criterion_group!(decoding, bench_decode);
criterion_group!(session, bench_session_add, bench_session_load);
criterion_main!(aggregation, decoding, session);
