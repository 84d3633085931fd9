use std::io::{BufRead, BufReader, Read};

/// One word per line; surrounding whitespace is trimmed and blank lines are
/// skipped.
pub fn load_word_list<R: Read>(source: R) -> std::io::Result<Vec<String>> {
    let mut words = Vec::new();
    for line in BufReader::new(source).lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            words.push(word.to_string());
        }
    }
    Ok(words)
}
