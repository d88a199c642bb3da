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

//! Account holder notifications.
//!
//! The engine never talks to a mail server directly. After an operation has
//! committed it drops an [`Email`] into an [`Outbox`]; a [`Dispatcher`]
//! drains the queue on its own thread and hands each message to a
//! [`Mailer`]. A failed delivery is logged and dropped, it never undoes the
//! financial operation that produced it.

use crate::account::Owner;
use crate::amount::format_amount;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn deposit(owner: &Owner, amount: Decimal) -> Self {
        Self::new(
            &owner.email,
            "Deposit Message",
            format!(
                "Dear {}, {}$ was deposited to your account successfully.",
                owner.name,
                format_amount(amount)
            ),
        )
    }

    pub fn withdrawal(owner: &Owner, amount: Decimal) -> Self {
        Self::new(
            &owner.email,
            "Withdrawal Message",
            format!(
                "Dear {}, you have successfully withdrawn {}$ from your account.",
                owner.name,
                format_amount(amount)
            ),
        )
    }

    pub fn loan_request(owner: &Owner, amount: Decimal) -> Self {
        Self::new(
            &owner.email,
            "Loan Request Message",
            format!(
                "Dear {}, your loan request for {}$ was submitted successfully.",
                owner.name,
                format_amount(amount)
            ),
        )
    }

    pub fn transfer_sent(sender: &Owner, recipient: &Owner, amount: Decimal) -> Self {
        Self::new(
            &sender.email,
            "Money Transfer Notification",
            format!(
                "Dear {}, you sent {}$ to {}.",
                sender.name,
                format_amount(amount),
                recipient.name
            ),
        )
    }

    pub fn transfer_received(sender: &Owner, recipient: &Owner, amount: Decimal) -> Self {
        Self::new(
            &recipient.email,
            "Money Transfer Notification",
            format!(
                "Dear {}, you received {}$ from {}.",
                recipient.name,
                format_amount(amount),
                sender.name
            ),
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// Delivers rendered emails.
pub trait Mailer: Send + Sync {
    fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Writes every email to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &Email) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "{}", email.body);
        Ok(())
    }
}

/// Keeps delivered emails in memory.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<Email>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every email delivered so far, in delivery order.
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().clone()
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, email: &Email) -> Result<(), MailError> {
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

/// Sending side of the notification queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: Sender<Email>,
}

impl Outbox {
    /// Creates a connected outbox/dispatcher pair.
    pub fn channel() -> (Outbox, Dispatcher) {
        let (sender, receiver) = channel::unbounded();
        (Outbox { sender }, Dispatcher { receiver })
    }

    /// An outbox with nobody listening. Enqueued emails are dropped.
    pub fn discard() -> Outbox {
        let (outbox, _dispatcher) = Self::channel();
        outbox
    }

    /// Queues an email. Never blocks and never fails the caller.
    pub fn enqueue(&self, email: Email) {
        if let Err(err) = self.sender.send(email) {
            tracing::trace!(to = %err.0.to, subject = %err.0.subject, "no dispatcher, email dropped");
        }
    }
}

/// Totals reported by a dispatcher when it stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub failed: usize,
}

/// Receiving side of the notification queue.
#[derive(Debug)]
pub struct Dispatcher {
    receiver: Receiver<Email>,
}

impl Dispatcher {
    /// Delivers everything queued right now without waiting for more.
    pub fn drain(&self, mailer: &dyn Mailer) -> DispatchStats {
        let mut stats = DispatchStats::default();
        for email in self.receiver.try_iter() {
            deliver(mailer, &email, &mut stats);
        }
        stats
    }

    /// Delivers emails until every [`Outbox`] has been dropped.
    pub fn run(self, mailer: &dyn Mailer) -> DispatchStats {
        let mut stats = DispatchStats::default();
        for email in self.receiver.iter() {
            deliver(mailer, &email, &mut stats);
        }
        tracing::debug!(
            delivered = stats.delivered,
            failed = stats.failed,
            "notification dispatcher stopped"
        );
        stats
    }

    /// Runs the dispatcher on a dedicated thread.
    pub fn spawn(self, mailer: Arc<dyn Mailer>) -> JoinHandle<DispatchStats> {
        thread::spawn(move || self.run(mailer.as_ref()))
    }
}

fn deliver(mailer: &dyn Mailer, email: &Email, stats: &mut DispatchStats) {
    match mailer.send(email) {
        Ok(()) => {
            stats.delivered += 1;
            tracing::debug!(to = %email.to, subject = %email.subject, "email delivered");
        }
        Err(err) => {
            stats.failed += 1;
            tracing::warn!(to = %email.to, subject = %email.subject, error = %err, "email delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct FailingMailer;

    impl Mailer for FailingMailer {
        fn send(&self, _email: &Email) -> Result<(), MailError> {
            Err(MailError::Delivery("smtp unavailable".into()))
        }
    }

    fn ada() -> Owner {
        Owner::new("Ada", "ada@example.com")
    }

    #[test]
    fn deposit_email_formats_amount() {
        let email = Email::deposit(&ada(), dec!(1234.5));
        assert_eq!(email.to, "ada@example.com");
        assert_eq!(email.subject, "Deposit Message");
        assert!(email.body.contains("1,234.50$"));
    }

    #[test]
    fn transfer_emails_address_both_parties() {
        let grace = Owner::new("Grace", "grace@example.com");
        let sent = Email::transfer_sent(&ada(), &grace, dec!(40));
        let received = Email::transfer_received(&ada(), &grace, dec!(40));

        assert_eq!(sent.to, "ada@example.com");
        assert_eq!(received.to, "grace@example.com");
        assert_eq!(sent.subject, received.subject);
        assert!(received.body.contains("from Ada"));
    }

    #[test]
    fn drain_delivers_queued_emails_in_order() {
        let (outbox, dispatcher) = Outbox::channel();
        outbox.enqueue(Email::deposit(&ada(), dec!(1)));
        outbox.enqueue(Email::withdrawal(&ada(), dec!(2)));

        let mailer = MemoryMailer::new();
        let stats = dispatcher.drain(&mailer);

        assert_eq!(stats, DispatchStats { delivered: 2, failed: 0 });
        let subjects: Vec<String> = mailer.sent().into_iter().map(|e| e.subject).collect();
        assert_eq!(subjects, vec!["Deposit Message", "Withdrawal Message"]);
    }

    #[test]
    fn failures_are_counted_not_propagated() {
        let (outbox, dispatcher) = Outbox::channel();
        outbox.enqueue(Email::deposit(&ada(), dec!(1)));

        let stats = dispatcher.drain(&FailingMailer);
        assert_eq!(stats, DispatchStats { delivered: 0, failed: 1 });
    }

    #[test]
    fn spawned_dispatcher_stops_when_outboxes_drop() {
        let (outbox, dispatcher) = Outbox::channel();
        let mailer = Arc::new(MemoryMailer::new());
        let handle = dispatcher.spawn(mailer.clone());

        let second = outbox.clone();
        outbox.enqueue(Email::deposit(&ada(), dec!(1)));
        second.enqueue(Email::loan_request(&ada(), dec!(2)));
        drop(outbox);
        drop(second);

        let stats = handle.join().unwrap();
        assert_eq!(stats.delivered, 2);
        assert_eq!(mailer.sent().len(), 2);
    }

    #[test]
    fn discard_outbox_accepts_and_drops() {
        let outbox = Outbox::discard();
        outbox.enqueue(Email::deposit(&ada(), dec!(1)));
    }
}
