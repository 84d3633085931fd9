use std::fmt;

use lazy_static::lazy_static;
use rand::{Rng, SeedableRng, rngs::StdRng};
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    audit::{AuditError, AuditRecorder},
    command::MovementKind,
};

/// National identity number of an account holder.
pub type Identifier = u32;

pub const MAX_IDENTIFIER: Identifier = 99_999_999;

lazy_static! {
    static ref NAME_PATTERN: Regex = Regex::new(r"^[\p{L}\s]+$").unwrap();
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9_.+-]+@[A-Za-z0-9-]+\.[A-Za-z0-9.-]+$").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Given name may only contain letters and spaces, got `{0}`")]
    GivenName(String),
    #[error("Family name may only contain letters and spaces, got `{0}`")]
    FamilyName(String),
    #[error("Identifier must be between 1 and 99.999.999, got {0}")]
    Identifier(Identifier),
    #[error("Invalid email format `{0}`")]
    Email(String),
    #[error("Balance must be a non-negative amount of whole cents, got {0}")]
    Balance(Decimal),
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Amount must be a positive amount of whole cents, got {amount}")]
    InvalidAmount { amount: Decimal },
    #[error("Insufficient funds: requested {requested}, balance is {balance}")]
    InsufficientFunds { requested: Decimal, balance: Decimal },
    #[error("Crediting {amount} would overflow balance {balance}")]
    BalanceOverflow { amount: Decimal, balance: Decimal },
    /// The movement was applied, but could not be recorded.
    #[error("Movement applied but not recorded: {0}")]
    Audit(#[from] AuditError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    given_name: String,
    family_name: String,
    identifier: Identifier,
    email: String,
    balance: Decimal,
    routing_code: u32,
    alias: String,
}

impl Account {
    /// Validates fields in order: given name, family name, identifier, email,
    /// balance. The first invalid one is reported.
    pub fn new(
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        identifier: Identifier,
        email: impl Into<String>,
        balance: Decimal,
    ) -> Result<Self, ValidationError> {
        let given_name = validate_name(given_name.into(), ValidationError::GivenName)?;
        let family_name = validate_name(family_name.into(), ValidationError::FamilyName)?;
        validate_identifier(identifier)?;
        let email = validate_email(email.into())?;
        if balance.is_sign_negative() || !is_whole_cents(balance) {
            return Err(ValidationError::Balance(balance));
        }
        Ok(Self {
            given_name,
            family_name,
            identifier,
            email,
            balance,
            routing_code: routing_code_for(identifier),
            alias: String::new(),
        })
    }

    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn routing_code(&self) -> u32 {
        self.routing_code
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn set_given_name(&mut self, value: impl Into<String>) -> Result<(), ValidationError> {
        self.given_name = validate_name(value.into(), ValidationError::GivenName)?;
        Ok(())
    }

    pub fn set_family_name(&mut self, value: impl Into<String>) -> Result<(), ValidationError> {
        self.family_name = validate_name(value.into(), ValidationError::FamilyName)?;
        Ok(())
    }

    pub fn set_email(&mut self, value: impl Into<String>) -> Result<(), ValidationError> {
        self.email = validate_email(value.into())?;
        Ok(())
    }

    pub fn set_alias(&mut self, value: impl Into<String>) {
        self.alias = value.into();
    }

    pub fn deposit<A>(&mut self, amount: Decimal, audit: &mut A) -> Result<(), AccountError>
    where
        A: AuditRecorder + ?Sized,
    {
        self.balance = self.credited(amount)?;
        self.record(audit, MovementKind::Deposit, amount)
    }

    pub fn withdraw<A>(&mut self, amount: Decimal, audit: &mut A) -> Result<(), AccountError>
    where
        A: AuditRecorder + ?Sized,
    {
        self.balance = self.debited(amount)?;
        self.record(audit, MovementKind::Withdrawal, amount)
    }

    /// Moves `amount` to `recipient`. Both new balances are computed before
    /// either is stored, so a rejected transfer changes neither side.
    ///
    /// A single `Transfer` entry is recorded against the sender.
    pub fn transfer<A>(
        &mut self,
        amount: Decimal,
        recipient: &mut Account,
        audit: &mut A,
    ) -> Result<(), AccountError>
    where
        A: AuditRecorder + ?Sized,
    {
        let sender_balance = self.debited(amount)?;
        let recipient_balance = recipient.credited(amount)?;
        self.balance = sender_balance;
        recipient.balance = recipient_balance;
        self.record(audit, MovementKind::Transfer, amount)
    }

    /// Six-line summary, see [`fmt::Display`].
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Balance after withdrawing `amount`, without applying it.
    fn debited(&self, amount: Decimal) -> Result<Decimal, AccountError> {
        validate_amount(amount)?;
        if amount > self.balance {
            return Err(AccountError::InsufficientFunds {
                requested: amount,
                balance: self.balance,
            });
        }
        Ok(self.balance - amount)
    }

    /// Balance after depositing `amount`, without applying it.
    fn credited(&self, amount: Decimal) -> Result<Decimal, AccountError> {
        validate_amount(amount)?;
        self.balance
            .checked_add(amount)
            .ok_or(AccountError::BalanceOverflow {
                amount,
                balance: self.balance,
            })
    }

    fn record<A>(&self, audit: &mut A, kind: MovementKind, amount: Decimal) -> Result<(), AccountError>
    where
        A: AuditRecorder + ?Sized,
    {
        debug_assert!(!self.balance.is_sign_negative());
        tracing::debug!(
            identifier = self.identifier,
            %kind,
            %amount,
            balance = %self.balance,
            "movement applied"
        );
        audit
            .record_movement(self, kind, amount)
            .inspect_err(|err| tracing::error!(identifier = self.identifier, %kind, "{err}"))?;
        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cliente: {} {}", self.family_name, self.given_name)?;
        writeln!(f, "DNI: {}", self.identifier)?;
        writeln!(f, "Email: {}", self.email)?;
        writeln!(f, "Saldo: ${:.2}", self.balance)?;
        writeln!(f, "CBU: {}", self.routing_code)?;
        write!(f, "Alias: {}", self.alias)
    }
}

pub fn validate_identifier(identifier: Identifier) -> Result<(), ValidationError> {
    if (1..=MAX_IDENTIFIER).contains(&identifier) {
        Ok(())
    } else {
        Err(ValidationError::Identifier(identifier))
    }
}

/// Routing code derived from a generator seeded with the identifier, so the
/// same identifier always yields the same code.
pub fn routing_code_for(identifier: Identifier) -> u32 {
    StdRng::seed_from_u64(u64::from(identifier)).gen_range(10_000..=99_999)
}

fn validate_name(
    value: String,
    err: fn(String) -> ValidationError,
) -> Result<String, ValidationError> {
    if NAME_PATTERN.is_match(&value) {
        Ok(value)
    } else {
        Err(err(value))
    }
}

fn validate_email(value: String) -> Result<String, ValidationError> {
    if EMAIL_PATTERN.is_match(&value) {
        Ok(value)
    } else {
        Err(ValidationError::Email(value))
    }
}

fn validate_amount(amount: Decimal) -> Result<(), AccountError> {
    if amount > Decimal::ZERO && is_whole_cents(amount) {
        Ok(())
    } else {
        Err(AccountError::InvalidAmount { amount })
    }
}

fn is_whole_cents(value: Decimal) -> bool {
    value.normalize().scale() <= 2
}

#[cfg(test)]
mod tests {
    use crate::audit::MemoryAuditLog;

    use super::*;

    fn account(given: &str, family: &str, identifier: Identifier) -> Account {
        let email = format!("{}@{}.com", given.to_lowercase(), family.to_lowercase());
        Account::new(given, family, identifier, email, Decimal::ZERO).unwrap()
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn construction_reports_first_invalid_field() {
        let err = Account::new("Juan1", "P3rez", 0, "nope", dec(-1)).unwrap_err();
        assert_eq!(err, ValidationError::GivenName("Juan1".to_string()));

        let err = Account::new("Juan", "P3rez", 0, "nope", dec(-1)).unwrap_err();
        assert_eq!(err, ValidationError::FamilyName("P3rez".to_string()));

        let err = Account::new("Juan", "Perez", 0, "nope", dec(-1)).unwrap_err();
        assert_eq!(err, ValidationError::Identifier(0));

        let err = Account::new("Juan", "Perez", 100_000_000, "nope", dec(-1)).unwrap_err();
        assert_eq!(err, ValidationError::Identifier(100_000_000));

        let err = Account::new("Juan", "Perez", 1, "nope", dec(-1)).unwrap_err();
        assert_eq!(err, ValidationError::Email("nope".to_string()));
        assert!(err.to_string().contains("email"));

        let err = Account::new("Juan", "Perez", 1, "juan@perez.com", dec(-1)).unwrap_err();
        assert_eq!(err, ValidationError::Balance(dec(-1)));

        let err = Account::new("Juan", "Perez", 1, "juan@perez.com", Decimal::new(1, 3))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Balance(_)));

        let acc = Account::new("Juan", "Perez", MAX_IDENTIFIER, "juan@perez.com", dec(25)).unwrap();
        assert_eq!(acc.balance(), dec(25));
        assert_eq!(acc.alias(), "");
    }

    #[test]
    fn names_accept_accented_letters_and_spaces() {
        let mut acc = account("Juan", "Perez", 1);
        acc.set_given_name("José María").unwrap();
        acc.set_family_name("Muñoz Ìbañez").unwrap();
        assert_eq!(acc.given_name(), "José María");
        assert_eq!(acc.family_name(), "Muñoz Ìbañez");

        for bad in ["", "Ana-Luz", "O'Brien", "R2D2", "ana_luz"] {
            assert_eq!(
                acc.set_given_name(bad).unwrap_err(),
                ValidationError::GivenName(bad.to_string())
            );
        }
        assert_eq!(acc.given_name(), "José María");
    }

    #[test]
    fn email_shape() {
        let mut acc = account("Juan", "Perez", 1);
        for good in ["a.b+c_d-e@mail-server.co.uk", "x@y.z"] {
            acc.set_email(good).unwrap();
            assert_eq!(acc.email(), good);
        }
        let balance = acc.balance();
        for bad in ["not-an-email", "a@b", "@b.com", "a b@c.com", "a@b_c.com"] {
            let err = acc.set_email(bad).unwrap_err();
            assert_eq!(err, ValidationError::Email(bad.to_string()));
        }
        assert_eq!(acc.email(), "x@y.z");
        assert_eq!(acc.balance(), balance);
    }

    #[test]
    fn routing_code_depends_only_on_identifier() {
        let a = account("Ana", "Gomez", 30123456);
        let b = account("Luis", "Lopez", 30123456);
        let c = account("Ana", "Gomez", 30123457);
        assert_eq!(a.routing_code(), b.routing_code());
        assert_eq!(a.routing_code(), routing_code_for(30123456));
        assert!((10_000..=99_999).contains(&c.routing_code()));
        assert!(validate_identifier(1).is_ok());
        assert!(validate_identifier(0).is_err());
    }

    #[test]
    fn deposit_and_withdraw() {
        let mut audit = MemoryAuditLog::default();
        let mut acc = account("Juan", "Perez", 30123456);

        acc.deposit(dec(1000), &mut audit).unwrap();
        assert_eq!(acc.balance(), dec(1000));

        acc.withdraw(Decimal::new(25050, 2), &mut audit).unwrap();
        assert_eq!(acc.balance(), Decimal::new(74950, 2));

        let err = acc.withdraw(dec(-5), &mut audit).unwrap_err();
        assert!(matches!(err, AccountError::InvalidAmount { amount } if amount == dec(-5)));
        assert!(err.to_string().contains("-5"));

        let err = acc.deposit(Decimal::ZERO, &mut audit).unwrap_err();
        assert!(matches!(err, AccountError::InvalidAmount { .. }));

        let err = acc.deposit(Decimal::new(1, 3), &mut audit).unwrap_err();
        assert!(matches!(err, AccountError::InvalidAmount { .. }));

        let err = acc.withdraw(dec(750), &mut audit).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { .. }));
        assert_eq!(
            err.to_string(),
            "Insufficient funds: requested 750, balance is 749.50"
        );
        assert_eq!(acc.balance(), Decimal::new(74950, 2));

        // only successful calls are recorded
        let kinds: Vec<_> = audit.entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [MovementKind::Deposit, MovementKind::Withdrawal]);
        assert_eq!(audit.entries[1].amount, Decimal::new(25050, 2));
        assert_eq!(audit.entries[0].holder, "Juan Perez");
        assert_eq!(audit.entries[0].routing_code, acc.routing_code());
    }

    #[test]
    fn transfer_moves_funds_and_records_once() {
        let mut audit = MemoryAuditLog::default();
        let mut juan = account("Juan", "Perez", 30123456);
        let mut other = account("Ana", "Gomez", 28000111);

        juan.deposit(dec(1000), &mut audit).unwrap();
        juan.transfer(dec(500), &mut other, &mut audit).unwrap();
        assert_eq!(juan.balance(), dec(500));
        assert_eq!(other.balance(), dec(500));

        other.withdraw(dec(200), &mut audit).unwrap();
        assert_eq!(other.balance(), dec(300));

        let kinds: Vec<_> = audit.entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [
                MovementKind::Deposit,
                MovementKind::Transfer,
                MovementKind::Withdrawal
            ]
        );
        assert_eq!(audit.entries[1].holder, "Juan Perez");
    }

    #[test]
    fn failed_transfer_changes_nothing() {
        let mut audit = MemoryAuditLog::default();
        let mut juan = account("Juan", "Perez", 30123456);
        let mut other = account("Ana", "Gomez", 28000111);
        juan.deposit(dec(100), &mut audit).unwrap();

        let err = juan.transfer(dec(101), &mut other, &mut audit).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { requested, balance }
            if requested == dec(101) && balance == dec(100)));

        let err = juan.transfer(dec(-1), &mut other, &mut audit).unwrap_err();
        assert!(matches!(err, AccountError::InvalidAmount { .. }));

        assert_eq!(juan.balance(), dec(100));
        assert_eq!(other.balance(), Decimal::ZERO);
        assert_eq!(audit.entries.len(), 1);
    }

    #[test]
    fn deposit_overflow_is_rejected() {
        let mut audit = MemoryAuditLog::default();
        let mut acc =
            Account::new("Juan", "Perez", 1, "juan@perez.com", Decimal::ONE).unwrap();

        let err = acc.deposit(Decimal::MAX, &mut audit).unwrap_err();
        assert!(matches!(err, AccountError::BalanceOverflow { amount, balance }
            if amount == Decimal::MAX && balance == Decimal::ONE));
        assert_eq!(acc.balance(), Decimal::ONE);
        assert!(audit.entries.is_empty());
    }

    #[test]
    fn transfer_into_full_recipient_changes_nothing() {
        let mut audit = MemoryAuditLog::default();
        let mut sender =
            Account::new("Juan", "Perez", 1, "juan@perez.com", dec(10)).unwrap();
        let mut recipient =
            Account::new("Ana", "Gomez", 2, "ana@gomez.com", Decimal::MAX).unwrap();

        let err = sender
            .transfer(dec(10), &mut recipient, &mut audit)
            .unwrap_err();
        assert!(matches!(err, AccountError::BalanceOverflow { .. }));
        assert_eq!(sender.balance(), dec(10));
        assert_eq!(recipient.balance(), Decimal::MAX);
        assert!(audit.entries.is_empty());
    }

    #[test]
    fn balance_never_goes_negative() {
        let mut audit = MemoryAuditLog::default();
        let mut acc = account("Juan", "Perez", 1);
        let mut other = account("Ana", "Gomez", 2);
        let steps = [40, -3, 25, 70, 0, 65, 5, 1, 200];
        for (i, step) in steps.into_iter().enumerate() {
            let amount = dec(step);
            let _ = match i % 3 {
                0 => acc.deposit(amount, &mut audit),
                1 => acc.withdraw(amount, &mut audit),
                _ => acc.transfer(amount, &mut other, &mut audit),
            };
            assert!(!acc.balance().is_sign_negative());
            assert!(!other.balance().is_sign_negative());
        }
        assert_eq!(acc.balance(), dec(24));
        assert_eq!(other.balance(), dec(90));
    }

    #[test]
    fn render_fields_in_order() {
        let mut audit = MemoryAuditLog::default();
        let mut acc = account("Juan", "Perez", 30123456);
        acc.deposit(Decimal::new(123456, 2), &mut audit).unwrap();
        acc.set_alias("casa.perro.luna");

        let rendered = acc.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            [
                "Cliente: Perez Juan".to_string(),
                "DNI: 30123456".to_string(),
                "Email: juan@perez.com".to_string(),
                "Saldo: $1234.56".to_string(),
                format!("CBU: {}", acc.routing_code()),
                "Alias: casa.perro.luna".to_string(),
            ]
        );
    }

    #[test]
    fn render_reparses_to_same_fields() {
        let mut audit = MemoryAuditLog::default();
        let mut acc = account("Luis", "Gomez", 12);
        acc.deposit(dec(7), &mut audit).unwrap();
        acc.set_alias("uno.dos.tres");

        let rendered = acc.render();
        let values: Vec<&str> = rendered
            .lines()
            .map(|line| line.split_once(": ").unwrap().1)
            .collect();
        let (family, given) = values[0].split_once(' ').unwrap();
        assert_eq!(given, acc.given_name());
        assert_eq!(family, acc.family_name());
        assert_eq!(values[1].parse::<Identifier>().unwrap(), acc.identifier());
        assert_eq!(values[2], acc.email());
        let balance: Decimal = values[3].trim_start_matches('$').parse().unwrap();
        assert_eq!(balance, acc.balance());
        assert_eq!(values[4].parse::<u32>().unwrap(), acc.routing_code());
        assert_eq!(values[5], acc.alias());
    }
}
