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

//! Benchmarks for the ledger engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Single-threaded deposits, withdrawals, and loan lifecycles
//! - Multi-threaded concurrent operations on one or many accounts
//! - Transfers between random account pairs
//! - Report generation as the ledger grows

use bank_ledger::{AccountNumber, AccountType, DateRange, Engine, NewAccount, Owner};
use chrono::Utc;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn amount(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn engine_with_accounts(count: u32) -> Engine {
    let engine = Engine::new();
    for number in 1..=count {
        engine
            .open_account(NewAccount {
                number: AccountNumber(number),
                owner: Owner::new(format!("holder {number}"), format!("{number}@example.com")),
                account_type: AccountType::Savings,
            })
            .unwrap();
    }
    engine
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_single_deposit(c: &mut Criterion) {
    let engine = engine_with_accounts(1);
    c.bench_function("single_deposit", |b| {
        b.iter(|| {
            engine
                .deposit(black_box(AccountNumber(1)), black_box(amount(100)))
                .unwrap();
        })
    });
}

fn bench_single_withdrawal(c: &mut Criterion) {
    c.bench_function("single_withdrawal", |b| {
        b.iter_batched(
            || {
                let engine = engine_with_accounts(1);
                engine.deposit(AccountNumber(1), amount(10_000)).unwrap();
                engine
            },
            |engine| {
                engine
                    .withdraw(black_box(AccountNumber(1)), black_box(amount(5_000)))
                    .unwrap();
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_deposit_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("deposit_throughput");

    for count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = engine_with_accounts(1);
                for _ in 0..count {
                    engine.deposit(AccountNumber(1), amount(100)).unwrap();
                }
                black_box(&engine);
            })
        });
    }
    group.finish();
}

fn bench_loan_lifecycle(c: &mut Criterion) {
    c.bench_function("loan_lifecycle", |b| {
        b.iter_batched(
            || {
                let engine = engine_with_accounts(1);
                engine.deposit(AccountNumber(1), amount(100_000)).unwrap();
                engine
            },
            |engine| {
                let loan = engine.request_loan(AccountNumber(1), amount(50_000)).unwrap();
                engine.approve_loan(loan.id).unwrap();
                black_box(engine.pay_loan(AccountNumber(1), loan.id).unwrap());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_deposits_same_account(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_deposits_same_account");

    for count in [1_000, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = Arc::new(engine_with_accounts(1));

                (0..count).into_par_iter().for_each(|_| {
                    let _ = engine.deposit(AccountNumber(1), amount(100));
                });

                black_box(&engine);
            })
        });
    }
    group.finish();
}

fn bench_parallel_deposits_different_accounts(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_deposits_different_accounts");

    for count in [1_000, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let engine = Arc::new(engine_with_accounts(1_000));
            b.iter(|| {
                (0..count).into_par_iter().for_each(|i: u32| {
                    let account = AccountNumber(i % 1_000 + 1);
                    engine.deposit(account, amount(1)).unwrap();
                });

                black_box(&engine);
            })
        });
    }
    group.finish();
}

fn bench_parallel_transfers(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_transfers");

    for num_accounts in [2, 10, 100, 1_000].iter() {
        let total_ops = 10_000u32;
        group.throughput(Throughput::Elements(total_ops as u64));
        group.bench_with_input(
            BenchmarkId::new("accounts", num_accounts),
            num_accounts,
            |b, &num_accounts| {
                b.iter_batched(
                    || {
                        let engine = engine_with_accounts(num_accounts);
                        for number in 1..=num_accounts {
                            engine.deposit(AccountNumber(number), amount(1_000_000)).unwrap();
                        }
                        Arc::new(engine)
                    },
                    |engine| {
                        // Opposing directions on the same pairs exercise lock ordering.
                        (0..total_ops).into_par_iter().for_each(|i| {
                            let from = i % num_accounts + 1;
                            let to = (i + 1) % num_accounts + 1;
                            let _ = engine.transfer(AccountNumber(from), AccountNumber(to), amount(1));
                        });
                        black_box(&engine);
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

// =============================================================================
// Scaling Benchmarks
// =============================================================================

fn bench_thread_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_scaling");
    let total_operations = 100_000u32;

    for num_threads in [1, 2, 4, 8].iter() {
        group.throughput(Throughput::Elements(total_operations as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            num_threads,
            |b, &num_threads| {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .unwrap();

                b.iter(|| {
                    let engine = Arc::new(engine_with_accounts(1_000));

                    pool.install(|| {
                        (0..total_operations).into_par_iter().for_each(|i| {
                            let account = AccountNumber(i % 1_000 + 1);
                            engine.deposit(account, amount(100)).unwrap();
                        });
                    });

                    black_box(&engine);
                })
            },
        );
    }
    group.finish();
}

// =============================================================================
// Report Benchmarks
// =============================================================================

fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");
    let today = Utc::now().date_naive();
    let range = DateRange::new(today, today);

    for history_size in [100, 1_000, 10_000].iter() {
        let engine = engine_with_accounts(10);
        for i in 0..*history_size {
            engine.deposit(AccountNumber(i % 10 + 1), amount(100)).unwrap();
        }

        group.bench_with_input(
            BenchmarkId::new("full", history_size),
            history_size,
            |b, _| b.iter(|| black_box(engine.report(AccountNumber(1), None).unwrap())),
        );
        group.bench_with_input(
            BenchmarkId::new("range", history_size),
            history_size,
            |b, _| b.iter(|| black_box(engine.report(AccountNumber(1), Some(range)).unwrap())),
        );
    }
    group.finish();
}

// =============================================================================
// Criterion Groups
// =============================================================================

criterion_group!(
    single_threaded,
    bench_single_deposit,
    bench_single_withdrawal,
    bench_deposit_throughput,
    bench_loan_lifecycle,
);

criterion_group!(
    multi_threaded,
    bench_parallel_deposits_same_account,
    bench_parallel_deposits_different_accounts,
    bench_parallel_transfers,
);

criterion_group!(scaling, bench_thread_scaling,);

criterion_group!(reports, bench_report,);

criterion_main!(single_threaded, multi_threaded, scaling, reports);
