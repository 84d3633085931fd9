use std::io::Read;

use crate::{account::Identifier, command::MovementKind};
use csv::{DeserializeRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, de::DeserializeOwned};

/// Client row, headers `nombre,apellido,dni,email`.
#[derive(Debug, Deserialize)]
pub struct ClientRow {
    #[serde(rename = "nombre")]
    pub given_name: String,
    #[serde(rename = "apellido")]
    pub family_name: String,
    #[serde(rename = "dni")]
    pub identifier: Identifier,
    pub email: String,
}

/// Movement row, headers `type,client,amount,to`.
#[derive(Debug, Deserialize)]
pub struct MovementRow {
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub client: Identifier,
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub to: Option<Identifier>,
}

/// Reads CSV rows of type `T`, yielding each with the line it started on.
pub struct CsvRowParser<R, T> {
    iter: DeserializeRecordsIntoIter<R, T>,
}

pub type CsvClientParser<R> = CsvRowParser<R, ClientRow>;
pub type CsvMovementParser<R> = CsvRowParser<R, MovementRow>;

impl<R, T> CsvRowParser<R, T>
where
    R: Read,
    T: DeserializeOwned,
{
    pub fn new(source: R) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);
        // read headers up front, so reported lines point at data rows;
        // a header error surfaces again on the first row
        let _ = reader.headers();

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R, T> Iterator for CsvRowParser<R, T>
where
    R: Read,
    T: DeserializeOwned,
{
    type Item = (u64, Result<T, csv::Error>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row))
    }
}
