//! CSV parsing: the external collaborator that turns `id,name,bio,manager_id`
//! rows into already-typed [`Record`] values before they reach the index.
//! Deliberately kept out of the core; it must not shape the core's types.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::record::Record;

#[derive(Debug, Deserialize)]
struct CsvRow {
    id: i64,
    name: String,
    bio: String,
    manager_id: i64,
}

/// Read every row of a headerless `id,name,bio,manager_id` CSV file,
/// rejecting any row whose `name` or `bio` contains the index's `~`
/// delimiter (such rows cannot be stored, per the record wire format).
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())
        .with_context(|| format!("opening CSV source {}", path.as_ref().display()))?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result.context("decoding CSV row")?;
        if row.name.contains(crate::record::DELIM as char) || row.bio.contains(crate::record::DELIM as char) {
            bail!(
                "record {} contains the reserved '{}' delimiter in name or bio",
                row.id,
                crate::record::DELIM as char
            );
        }
        records.push(Record::new(row.id, row.name, row.bio, row.manager_id));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_well_formed_rows() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "1,Ada Lovelace,Mathematician,0").unwrap();
        writeln!(tmp, "2,Alan Turing,Computer scientist,1").unwrap();
        let records = read_records(tmp.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].manager_id, 1);
    }

    #[test]
    fn rejects_embedded_delimiter() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "1,Ada~Lovelace,Mathematician,0").unwrap();
        assert!(read_records(tmp.path()).is_err());
    }
}
