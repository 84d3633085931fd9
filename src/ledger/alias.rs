use rand::{Rng, seq::SliceRandom};

use super::LedgerError;

pub const ALIAS_WORDS: usize = 3;

/// Joins [`ALIAS_WORDS`] entries drawn without replacement from `words`
/// with `.`. Blank entries are never drawn.
pub fn draw_alias<S, R>(words: &[S], rng: &mut R) -> Result<String, LedgerError>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    let available: Vec<&str> = words
        .iter()
        .map(|word| word.as_ref().trim())
        .filter(|word| !word.is_empty())
        .collect();
    if available.len() < ALIAS_WORDS {
        return Err(LedgerError::InsufficientWordList {
            available: available.len(),
        });
    }
    let drawn: Vec<&str> = available
        .choose_multiple(rng, ALIAS_WORDS)
        .copied()
        .collect();
    Ok(drawn.join("."))
}
