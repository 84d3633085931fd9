use std::fmt;

use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    account::{Account, AccountError, Identifier, ValidationError},
    audit::AuditRecorder,
    command::{MovementAction, MovementCommand, MovementCommandError},
};

pub mod alias;

pub use alias::draw_alias;

/// Zero-based insertion position of an account in its ledger.
pub type AccountId = usize;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    CommandErr(#[from] MovementCommandError),
    #[error(transparent)]
    AccountErr(#[from] AccountError),
    #[error("No account with identifier {identifier}")]
    UnknownAccount { identifier: Identifier },
    #[error("Invalid transfer target: {reason}")]
    InvalidTarget { reason: String },
    #[error("Word list needs at least 3 words to build an alias, found {available}")]
    InsufficientWordList { available: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchQuery<'a> {
    /// Case-insensitive substring of the given or family name.
    Name(&'a str),
    Identifier(Identifier),
}

impl<'a> From<&'a str> for SearchQuery<'a> {
    fn from(value: &'a str) -> Self {
        SearchQuery::Name(value)
    }
}

impl From<Identifier> for SearchQuery<'_> {
    fn from(value: Identifier) -> Self {
        SearchQuery::Identifier(value)
    }
}

impl SearchQuery<'_> {
    fn matches(&self, account: &Account) -> bool {
        match self {
            SearchQuery::Name(query) => {
                let query = query.to_lowercase();
                account.given_name().to_lowercase().contains(&query)
                    || account.family_name().to_lowercase().contains(&query)
            }
            SearchQuery::Identifier(identifier) => account.identifier() == *identifier,
        }
    }
}

/// In-memory repository of accounts, kept in insertion order.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: Vec<Account>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a validated account. A rejected account is reported through the
    /// returned error and a warning, and leaves the ledger untouched.
    pub fn create_account(
        &mut self,
        given_name: &str,
        family_name: &str,
        identifier: Identifier,
        email: &str,
        balance: Decimal,
    ) -> Result<AccountId, ValidationError> {
        match Account::new(given_name, family_name, identifier, email, balance) {
            Ok(account) => {
                self.accounts.push(account);
                Ok(self.accounts.len() - 1)
            }
            Err(err) => {
                tracing::warn!(identifier, "account rejected: {err}");
                Err(err)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn get_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.accounts.get_mut(id)
    }

    /// All matching accounts, in insertion order.
    pub fn find_accounts<'q>(&self, query: impl Into<SearchQuery<'q>>) -> Vec<&Account> {
        let query = query.into();
        self.accounts
            .iter()
            .filter(|account| query.matches(account))
            .collect()
    }

    pub fn find_by_identifier(&self, identifier: Identifier) -> Option<AccountId> {
        self.accounts
            .iter()
            .position(|account| account.identifier() == identifier)
    }

    pub fn assign_alias<S: AsRef<str>>(
        &mut self,
        id: AccountId,
        words: &[S],
    ) -> Result<(), LedgerError> {
        self.assign_alias_with(id, words, &mut rand::thread_rng())
    }

    pub fn assign_alias_with<S, R>(
        &mut self,
        id: AccountId,
        words: &[S],
        rng: &mut R,
    ) -> Result<(), LedgerError>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let alias = draw_alias(words, rng)?;
        let account = self.accounts.get_mut(id).ok_or_else(|| missing(id))?;
        account.set_alias(alias);
        Ok(())
    }

    /// Transfer between two accounts of this ledger.
    pub fn transfer<A>(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        audit: &mut A,
    ) -> Result<(), LedgerError>
    where
        A: AuditRecorder + ?Sized,
    {
        let (sender, recipient) = self.pair_mut(from, to)?;
        sender.transfer(amount, recipient, audit)?;
        Ok(())
    }

    /// Applies a movement to the account holding `command.client`.
    pub fn execute<A>(&mut self, command: &MovementCommand, audit: &mut A) -> Result<(), LedgerError>
    where
        A: AuditRecorder + ?Sized,
    {
        let id = self.require(command.client)?;
        match command.action {
            MovementAction::Deposit => self.accounts[id].deposit(command.amount, audit)?,
            MovementAction::Withdraw => self.accounts[id].withdraw(command.amount, audit)?,
            MovementAction::Transfer { recipient } => {
                let to = self.require(recipient)?;
                self.transfer(id, to, command.amount, audit)?;
            }
        }
        Ok(())
    }

    pub fn summarize(&self, id: AccountId) -> Option<String> {
        self.get(id).map(Account::render)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    fn require(&self, identifier: Identifier) -> Result<AccountId, LedgerError> {
        self.find_by_identifier(identifier)
            .ok_or(LedgerError::UnknownAccount { identifier })
    }

    fn pair_mut(
        &mut self,
        from: AccountId,
        to: AccountId,
    ) -> Result<(&mut Account, &mut Account), LedgerError> {
        if from == to {
            return Err(LedgerError::InvalidTarget {
                reason: format!("account Nº:{from} cannot transfer to itself"),
            });
        }
        let len = self.accounts.len();
        if from >= len {
            return Err(missing(from));
        }
        if to >= len {
            return Err(missing(to));
        }
        if from < to {
            let (head, tail) = self.accounts.split_at_mut(to);
            Ok((&mut head[from], &mut tail[0]))
        } else {
            let (head, tail) = self.accounts.split_at_mut(from);
            Ok((&mut tail[0], &mut head[to]))
        }
    }
}

fn missing(id: AccountId) -> LedgerError {
    LedgerError::InvalidTarget {
        reason: format!("no account at Nº:{id}"),
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cantidad de clientes: {}", self.accounts.len())?;
        for (index, account) in self.accounts.iter().enumerate() {
            writeln!(f, "Nº:{index}")?;
            writeln!(f, "{account}")?;
        }
        Ok(())
    }
}
