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

//! Deadlock detection tests using parking_lot's built-in deadlock detector.
//!
//! These tests drive the real engine from many threads while a background
//! detector looks for cycles in the lock graph. The account mutexes and the
//! status lock are parking_lot locks, so with the `deadlock_detection`
//! feature enabled any cycle between them is reported.

use bank_ledger::{AccountNumber, AccountType, Engine, NewAccount, Owner, Outbox};
use parking_lot::deadlock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn engine_with_accounts(count: u32, balance: Decimal) -> Arc<Engine> {
    let engine = Engine::new();
    for number in 1..=count {
        engine
            .open_account(NewAccount {
                number: AccountNumber(number),
                owner: Owner::new(format!("holder {number}"), format!("{number}@example.com")),
                account_type: AccountType::Savings,
            })
            .unwrap();
        engine.deposit(AccountNumber(number), balance).unwrap();
    }
    Arc::new(engine)
}

fn total_balance(engine: &Engine) -> Decimal {
    engine.accounts().iter().map(|a| a.balance()).sum()
}

// === Deadlock Detection Infrastructure ===

/// Background thread that checks for deadlocks until stopped.
struct Detector {
    running: Arc<AtomicBool>,
    found: Arc<AtomicBool>,
}

fn start_deadlock_detector() -> Detector {
    let running = Arc::new(AtomicBool::new(true));
    let found = Arc::new(AtomicBool::new(false));
    let (running_clone, found_clone) = (running.clone(), found.clone());

    thread::spawn(move || {
        while running_clone.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(100));
            let deadlocks = deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                eprintln!("\n=== DEADLOCK DETECTED ===");
                for (i, threads) in deadlocks.iter().enumerate() {
                    eprintln!("\nDeadlock #{}", i + 1);
                    for t in threads {
                        eprintln!("Thread ID: {:?}", t.thread_id());
                        eprintln!("Backtrace:\n{:#?}", t.backtrace());
                    }
                }
                found_clone.store(true, Ordering::SeqCst);
                return;
            }
        }
    });

    Detector { running, found }
}

/// Stops the detector and fails the test if it saw a deadlock.
fn stop_deadlock_detector(detector: Detector) {
    detector.running.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(150));
    assert!(
        !detector.found.load(Ordering::SeqCst),
        "Deadlock detected! See output above for details."
    );
}

// === Tests ===

/// Opposite transfers between the same pair lock in the same order.
#[test]
fn no_deadlock_opposing_transfers() {
    let detector = start_deadlock_detector();
    let engine = engine_with_accounts(2, dec!(1000.00));

    const NUM_THREADS: usize = 16;
    const OPS_PER_THREAD: usize = 500;

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let engine = engine.clone();
            thread::spawn(move || {
                let (from, to) = if t % 2 == 0 { (1, 2) } else { (2, 1) };
                for _ in 0..OPS_PER_THREAD {
                    let _ = engine.transfer(AccountNumber(from), AccountNumber(to), dec!(1.00));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);
    assert_eq!(total_balance(&engine), dec!(2000.00));
}

/// Transfers around a ring of accounts cannot form a wait cycle.
#[test]
fn no_deadlock_transfer_ring() {
    let detector = start_deadlock_detector();
    const NUM_ACCOUNTS: u32 = 5;
    let engine = engine_with_accounts(NUM_ACCOUNTS, dec!(500.00));

    let handles: Vec<_> = (1..=NUM_ACCOUNTS)
        .map(|from| {
            let engine = engine.clone();
            thread::spawn(move || {
                let to = from % NUM_ACCOUNTS + 1;
                for _ in 0..1_000 {
                    let _ = engine.transfer(AccountNumber(from), AccountNumber(to), dec!(0.50));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);
    assert_eq!(total_balance(&engine), dec!(2500.00));
}

/// Loan approval and payment take the account lock before the ledger.
#[test]
fn no_deadlock_loan_lifecycle_with_transfers() {
    let detector = start_deadlock_detector();
    let engine = engine_with_accounts(2, dec!(10000.00));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                if let Ok(loan) = engine.request_loan(AccountNumber(1), dec!(1.00)) {
                    let _ = engine.approve_loan(loan.id);
                    let _ = engine.pay_loan(AccountNumber(1), loan.id);
                }
            }
        }));
    }
    for t in 0..4 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            let (from, to) = if t % 2 == 0 { (1, 2) } else { (2, 1) };
            for _ in 0..200 {
                let _ = engine.transfer(AccountNumber(from), AccountNumber(to), dec!(1.00));
                let _ = engine.list_loans(AccountNumber(1));
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);
    assert!(engine.accounts().iter().all(|a| a.balance() >= Decimal::ZERO));
}

/// Suspension toggles while withdrawals hold the status read lock.
#[test]
fn no_deadlock_suspend_during_withdrawals() {
    let detector = start_deadlock_detector();
    let engine = engine_with_accounts(4, dec!(1000.00));

    let mut handles = Vec::new();
    for number in 1..=4 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                let _ = engine.withdraw(AccountNumber(number), dec!(0.10));
            }
        }));
    }
    {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                engine.suspend();
                thread::yield_now();
                engine.resume();
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);
    assert!(!engine.status().is_suspended());
}

/// Iterating accounts while mutating them does not hold map and account
/// locks in conflicting orders.
#[test]
fn no_deadlock_iteration_during_mutation() {
    let detector = start_deadlock_detector();
    let engine = engine_with_accounts(50, dec!(100.00));

    let mut handles = Vec::new();
    for t in 0..4u32 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for i in 0..500u32 {
                let from = (i + t) % 50 + 1;
                let to = (i + t + 7) % 50 + 1;
                let _ = engine.transfer(AccountNumber(from), AccountNumber(to), dec!(1.00));
            }
        }));
    }
    for _ in 0..2 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                let _ = total_balance(&engine);
                let _ = engine.report(AccountNumber(1), None);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);
    assert_eq!(total_balance(&engine), dec!(5000.00));
}

/// Notifications are queued after locks are released, so a slow consumer
/// never blocks the engine.
#[test]
fn no_deadlock_with_live_dispatcher() {
    let detector = start_deadlock_detector();
    let (outbox, dispatcher) = Outbox::channel();
    let mailer = Arc::new(bank_ledger::MemoryMailer::new());
    let worker = dispatcher.spawn(mailer.clone());

    let engine = Engine::new().with_outbox(outbox);
    for number in 1..=2 {
        engine
            .open_account(NewAccount {
                number: AccountNumber(number),
                owner: Owner::new("holder", "holder@example.com"),
                account_type: AccountType::Current,
            })
            .unwrap();
    }
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    engine.deposit(AccountNumber(t % 2 + 1), dec!(2.00)).unwrap();
                    let _ = engine.transfer(AccountNumber(1), AccountNumber(2), dec!(1.00));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    drop(engine);

    let stats = worker.join().expect("Dispatcher panicked");
    stop_deadlock_detector(detector);
    assert!(stats.delivered >= 400);
    assert_eq!(stats.delivered, mailer.sent().len());
}
