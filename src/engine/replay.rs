use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use anyhow::anyhow;
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinError, JoinHandle, JoinSet};
use tracing::{error, info, warn};

use crate::engine::TransferEngine;
use crate::models::{Command, CommandKind, LedgerError, Transaction, TransferRequest};
use crate::storage::{AccountStorage, AccountStore};

type TransferOutcome = Result<Result<Transaction, LedgerError>, JoinError>;

/// Counters describing what a replay run did.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct ReplaySummary {
    pub opened: usize,
    pub disabled: usize,
    pub closed: usize,
    pub completed: usize,
    /// Commands the ledger refused (validation or business rule).
    pub rejected: usize,
    /// Transfers that reached the balance writes and were aborted.
    pub failed: usize,
    /// Rows that could not be parsed or were missing required columns.
    pub skipped: usize
}

/// Replays a CSV file of ledger commands against a [`TransferEngine`].
///
/// Transfers between two account-level commands (`open`, `disable`, `close`)
/// are executed concurrently, while account-level commands wait for every
/// in-flight transfer before running.
pub struct CommandReplayer<S: AccountStore = AccountStorage> {
    engine: Arc<TransferEngine<S>>,
    max_in_flight: usize
}

impl<S: AccountStore> CommandReplayer<S> {
    pub fn new(engine: Arc<TransferEngine<S>>) -> Self {
        Self {
            engine,
            max_in_flight: 256
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Orchestrates the end-to-end replay pipeline for a CSV file.
    pub async fn run(&self, path: &str) -> anyhow::Result<ReplaySummary> {
        let (sender, receiver) = mpsc::channel::<Command>(self.max_in_flight);
        let csv_handle = Self::spawn_csv_reader(path.to_string(), sender);
        let mut summary = self.process_commands(receiver).await?;

        match csv_handle.await {
            Ok(malformed) => summary.skipped += malformed,
            Err(error) => error!("CSV ingestion failed: {error}")
        }

        info!(
            "Replay finished: opened [{}] disabled [{}] closed [{}] completed [{}] rejected [{}] failed [{}] skipped [{}]",
            summary.opened, summary.disabled, summary.closed, summary.completed, summary.rejected, summary.failed, summary.skipped
        );

        Ok(summary)
    }

    fn spawn_csv_reader(path: String, sender: mpsc::Sender<Command>) -> JoinHandle<usize> {
        spawn_blocking(move || {
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(error) => {
                    error!("Error opening CSV at path: {path} | {error}");
                    return 0;
                }
            };

            let mut reader = ReaderBuilder::new()
                .trim(Trim::All)
                .flexible(true)
                .from_reader(BufReader::new(file));

            let mut malformed = 0;

            for result in reader.deserialize::<Command>() {
                match result {
                    Ok(command) => {
                        if sender.blocking_send(command).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        error!("CSV deserialization error: {error}");
                        malformed += 1;
                    }
                }
            }

            malformed
        })
    }

    async fn process_commands(&self, mut receiver: mpsc::Receiver<Command>) -> anyhow::Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        let mut in_flight = JoinSet::new();

        while let Some(command) = receiver.recv().await {
            if command.kind != CommandKind::Transfer {
                Self::drain(&mut in_flight, &mut summary).await;
                self.apply_account_command(&command, &mut summary).await;
                continue;
            }

            let request = match Self::transfer_request(&command) {
                Ok(request) => request,
                Err(error) => {
                    warn!("Skipping transfer row for account [{}]: {error}", command.account);
                    summary.skipped += 1;
                    continue;
                }
            };

            while in_flight.len() >= self.max_in_flight {
                if let Some(outcome) = in_flight.join_next().await {
                    Self::record(outcome, &mut summary);
                }
            }

            let engine = self.engine.clone();
            in_flight.spawn(async move { engine.transfer(request).await });
        }

        Self::drain(&mut in_flight, &mut summary).await;

        Ok(summary)
    }

    async fn apply_account_command(&self, command: &Command, summary: &mut ReplaySummary) {
        let account_id = command.account.as_str();

        let result = match command.kind {
            CommandKind::Open => {
                let balance = command.amount.unwrap_or(Decimal::ZERO);
                let currency = command.currency.unwrap_or_default();

                self.engine.create_account(account_id, balance, currency).map(|_| summary.opened += 1)
            },
            CommandKind::Disable => self.engine.disable_account(account_id).await.map(|_| summary.disabled += 1),
            CommandKind::Close => self.engine.close_account(account_id).await.map(|_| summary.closed += 1),
            CommandKind::Transfer => return
        };

        if let Err(error) = result {
            warn!("{:?} command for account [{account_id}] rejected: {error}", command.kind);
            summary.rejected += 1;
        }
    }

    fn transfer_request(command: &Command) -> anyhow::Result<TransferRequest> {
        let receiver = command.counterparty.as_ref()
            .ok_or_else(|| anyhow!("counterparty is required"))?;
        let amount = command.amount
            .ok_or_else(|| anyhow!("amount is required"))?;

        let mut request = TransferRequest::new(command.account.clone(), receiver.clone(), amount, command.currency.unwrap_or_default());

        if let Some(description) = &command.description {
            request = request.with_description(description.clone());
        }

        Ok(request)
    }

    async fn drain(in_flight: &mut JoinSet<Result<Transaction, LedgerError>>, summary: &mut ReplaySummary) {
        while let Some(outcome) = in_flight.join_next().await {
            Self::record(outcome, summary);
        }
    }

    fn record(outcome: TransferOutcome, summary: &mut ReplaySummary) {
        match outcome {
            Ok(Ok(_)) => summary.completed += 1,
            Ok(Err(LedgerError::TransferAborted { .. } | LedgerError::InternalInconsistency { .. })) => summary.failed += 1,
            Ok(Err(_)) => summary.rejected += 1,
            Err(error) => {
                error!("Transfer task did not finish: {error}");
                summary.failed += 1;
            }
        }
    }
}
