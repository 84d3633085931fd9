use std::io::Write;

use crate::account::{self, Identifier};
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub dni: Identifier,
    pub apellido: String,
    pub nombre: String,
    pub email: String,
    pub saldo: Decimal,
    pub cbu: u32,
    pub alias: String,
}

impl From<&account::Account> for AccountSummary {
    fn from(acc: &account::Account) -> Self {
        Self {
            dni: acc.identifier(),
            apellido: acc.family_name().to_string(),
            nombre: acc.given_name().to_string(),
            email: acc.email().to_string(),
            saldo: acc.balance().round_dp(2),
            cbu: acc.routing_code(),
            alias: acc.alias().to_string(),
        }
    }
}

pub fn print_accounts<W>(
    output: &mut W,
    accounts: impl Iterator<Item = AccountSummary>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for acc in accounts {
        if let Err(err) = writer.serialize(acc) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
