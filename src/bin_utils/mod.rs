//! Bootstraps a [`Ledger`] from client, word list and movement files. It sits in the
//! library rather than in the binary so the integration tests can drive it.

use std::io::{Read, Write};

use crate::{
    account::{AccountError, Identifier, ValidationError},
    audit::{AuditError, AuditRecorder},
    command::MovementCommand,
    ledger::{Ledger, LedgerError},
};
use anyhow::{Context, Result};
use csv_parser::{CsvClientParser, CsvMovementParser};
use csv_printer::{AccountSummary, print_accounts};
use rust_decimal::Decimal;
use thiserror::Error;
pub mod csv_parser;
pub mod csv_printer;
pub mod word_list;

/// A rejected input row or alias assignment. None of these stop the run.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Client row at line {line} is malformed: {source}")]
    MalformedClient { line: u64, source: csv::Error },
    #[error("Client row at line {line} rejected: {source}")]
    RejectedClient { line: u64, source: ValidationError },
    #[error("Movement row at line {line} is malformed: {source}")]
    MalformedMovement { line: u64, source: csv::Error },
    #[error("Movement at line {line} failed: {source}")]
    FailedMovement { line: u64, source: LedgerError },
    /// The balance changed, but the recorder could not log it.
    #[error("Movement at line {line} applied but not recorded: {source}")]
    UnrecordedMovement { line: u64, source: AuditError },
    #[error("Alias not assigned to client {identifier}: {source}")]
    Alias {
        identifier: Identifier,
        source: LedgerError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable ledger report.
    #[default]
    Report,
    Csv,
}

pub struct Service<'w, R, W: 'w, A> {
    pub clients: R,
    pub word_list: Option<Vec<String>>,
    pub movements: Option<R>,
    pub audit: A,
    pub output: &'w mut W,
    pub format: OutputFormat,
    pub error_printer: Box<dyn FnMut(ServiceError)>,
}

impl<'w, R, W, A> Service<'w, R, W, A>
where
    R: Read,
    W: Write + 'w,
    A: AuditRecorder,
{
    pub fn run(mut self) -> Result<Ledger> {
        let mut ledger = Ledger::new();

        for (line, row) in CsvClientParser::new(self.clients) {
            let row = match row {
                Ok(row) => row,
                Err(source) => {
                    (self.error_printer)(ServiceError::MalformedClient { line, source });
                    continue;
                }
            };
            if let Err(source) = ledger.create_account(
                &row.given_name,
                &row.family_name,
                row.identifier,
                &row.email,
                Decimal::ZERO,
            ) {
                (self.error_printer)(ServiceError::RejectedClient { line, source });
            }
        }
        tracing::info!(accounts = ledger.len(), "clients loaded");

        if let Some(words) = &self.word_list {
            for id in 0..ledger.len() {
                if let Err(source) = ledger.assign_alias(id, words.as_slice()) {
                    let identifier = ledger.accounts()[id].identifier();
                    (self.error_printer)(ServiceError::Alias { identifier, source });
                }
            }
        }

        if let Some(movements) = self.movements {
            for (line, row) in CsvMovementParser::new(movements) {
                let row = match row {
                    Ok(row) => row,
                    Err(source) => {
                        (self.error_printer)(ServiceError::MalformedMovement { line, source });
                        continue;
                    }
                };
                let result = MovementCommand::parse(row.kind, row.client, row.amount, row.to)
                    .map_err(LedgerError::from)
                    .and_then(|command| ledger.execute(&command, &mut self.audit));
                match result {
                    Ok(()) => {}
                    Err(LedgerError::AccountErr(AccountError::Audit(source))) => {
                        (self.error_printer)(ServiceError::UnrecordedMovement { line, source })
                    }
                    Err(source) => {
                        (self.error_printer)(ServiceError::FailedMovement { line, source })
                    }
                }
            }
        }

        match self.format {
            OutputFormat::Report => {
                write!(self.output, "{ledger}").context("Failed to write ledger report")?;
                self.output.flush().context("Failed to flush ledger report")?;
            }
            OutputFormat::Csv => print_accounts(
                self.output,
                ledger.accounts().iter().map(AccountSummary::from),
            )?,
        }
        Ok(ledger)
    }
}
