use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::account::Identifier;

/// Balance-mutating operation, as named in movement rows and audit lines.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MovementKind::Deposit => "Deposit",
            MovementKind::Withdrawal => "Withdrawal",
            MovementKind::Transfer => "Transfer",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementAction {
    Deposit,
    Withdraw,
    Transfer { recipient: Identifier },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementCommand {
    pub client: Identifier,
    pub action: MovementAction,
    pub amount: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MovementCommandError {
    #[error("Amount is required for {kind:?}")]
    AmountRequired { kind: MovementKind },
    #[error("Recipient is required for {kind:?}")]
    RecipientRequired { kind: MovementKind },
    #[error("Recipient is not allowed for {kind:?}")]
    UnexpectedRecipient { kind: MovementKind },
}

impl MovementCommand {
    /// Checks the shape of a movement row. Amount values themselves are
    /// validated by the account when the command is executed.
    pub fn parse(
        kind: MovementKind,
        client: Identifier,
        amount: Option<Decimal>,
        recipient: Option<Identifier>,
    ) -> Result<Self, MovementCommandError> {
        let Some(amount) = amount else {
            return Err(MovementCommandError::AmountRequired { kind });
        };
        let action = match (kind, recipient) {
            (MovementKind::Deposit, None) => MovementAction::Deposit,
            (MovementKind::Withdrawal, None) => MovementAction::Withdraw,
            (MovementKind::Transfer, Some(recipient)) => MovementAction::Transfer { recipient },
            (MovementKind::Transfer, None) => {
                return Err(MovementCommandError::RecipientRequired { kind });
            }
            (_, Some(_)) => return Err(MovementCommandError::UnexpectedRecipient { kind }),
        };
        Ok(Self {
            client,
            action,
            amount,
        })
    }

    pub fn kind(&self) -> MovementKind {
        match self.action {
            MovementAction::Deposit => MovementKind::Deposit,
            MovementAction::Withdraw => MovementKind::Withdrawal,
            MovementAction::Transfer { .. } => MovementKind::Transfer,
        }
    }
}
