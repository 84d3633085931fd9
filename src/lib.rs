/// A client's validated identity, contact data and balance, plus the
/// deposit, withdraw and transfer operations that mutate it.
pub mod account;

/// Movement log. Every successful balance mutation appends one line.
pub mod audit;

/// Movement commands parsed from input rows, later executed by [`ledger`].
pub mod command;

/// In-memory account repository: creation, search, aliases and reports.
pub mod ledger;

/// Loads clients, word lists and movements from files and runs them through
/// a [`ledger::Ledger`]. Used by the binary and by the integration tests.
pub mod bin_utils;
