use super::traits::StructureFile;
use crate::core::models::builder::{BuildError, StructureBuilder};
use crate::core::models::structure::Structure;
use serde::Deserialize;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AtomTableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed record on line {line}: {source}")]
    Record {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("Non-finite value in column '{column}' on line {line}")]
    NonFinite { line: u64, column: &'static str },
    #[error("Invalid chain identifier '{value}' on line {line}; expected a single character")]
    InvalidChain { line: u64, value: String },
    #[error("Inconsistent record on line {line}: {source}")]
    Build {
        line: u64,
        #[source]
        source: BuildError,
    },
}

/// One exported atom row: `object,chain,resi,resn,name,b,q[,serial]`.
#[derive(Debug, Deserialize)]
struct AtomRecord {
    object: String,
    chain: String,
    resi: isize,
    resn: String,
    name: String,
    b: f64,
    q: f64,
    #[serde(default)]
    serial: Option<usize>,
}

/// Comma-separated per-atom attribute table.
pub struct AtomTable;

impl StructureFile for AtomTable {
    type Error = AtomTableError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| AtomTableError::Record { line: 1, source: e })?
            .clone();

        let mut builder = StructureBuilder::new();
        let mut rows = 0usize;

        for result in csv_reader.records() {
            let record = result.map_err(|e| AtomTableError::Record {
                line: e.position().map_or(0, |p| p.line()),
                source: e,
            })?;
            let line = record.position().map_or(0, |p| p.line());
            let row: AtomRecord = record
                .deserialize(Some(&headers))
                .map_err(|e| AtomTableError::Record { line, source: e })?;

            if !row.b.is_finite() {
                return Err(AtomTableError::NonFinite { line, column: "b" });
            }
            if !row.q.is_finite() {
                return Err(AtomTableError::NonFinite { line, column: "q" });
            }
            let mut chars = row.chain.chars();
            let chain_id = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                (None, _) => ' ',
                _ => {
                    return Err(AtomTableError::InvalidChain {
                        line,
                        value: row.chain,
                    });
                }
            };

            rows += 1;
            let serial = row.serial.unwrap_or(rows);
            builder.start_object(&row.object);
            builder
                .start_chain(chain_id)
                .and_then(|b| b.start_residue(row.resi, &row.resn))
                .and_then(|b| b.add_atom(serial, &row.name, row.b, row.q))
                .map_err(|source| AtomTableError::Build { line, source })?;
        }

        debug!("Loaded {} atom record(s) from atom table.", rows);
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TABLE: &str = "\
object,chain,resi,resn,name,b,q
model,A,1,MET,N,40.0,1.0
model,A,1,MET,CA,40.0,1.0
model,A,2,ASP,CA,60.0,9.5
# trailing comment
model,B,1,GLY,CA,95.0,0.0
";

    fn read(text: &str) -> Result<Structure, AtomTableError> {
        AtomTable::read_from(&mut Cursor::new(text.as_bytes()))
    }

    #[test]
    fn reads_atoms_into_hierarchy() {
        let s = read(TABLE).unwrap();
        assert_eq!(s.atom_count(), 4);
        let object_id = s.find_object_by_name("model").unwrap();
        assert!(s.find_chain(object_id, 'A').is_some());
        assert!(s.find_chain(object_id, 'B').is_some());
        let asp = s
            .atoms_iter()
            .find(|(_, a)| a.occupancy > 9.0)
            .map(|(_, a)| a.clone())
            .unwrap();
        assert_eq!(asp.b_factor, 60.0);
        assert_eq!(asp.serial, 3);
    }

    #[test]
    fn header_only_table_is_empty_structure() {
        let s = read("object,chain,resi,resn,name,b,q\n").unwrap();
        assert_eq!(s.atom_count(), 0);
    }

    #[test]
    fn explicit_serial_column_is_used() {
        let s = read("object,chain,resi,resn,name,b,q,serial\nm,A,1,ALA,CA,70,1,42\n").unwrap();
        let (_, atom) = s.atoms_iter().next().unwrap();
        assert_eq!(atom.serial, 42);
    }

    #[test]
    fn non_numeric_score_reports_line() {
        let err = read("object,chain,resi,resn,name,b,q\nm,A,1,ALA,CA,high,1\n").unwrap_err();
        assert!(matches!(err, AtomTableError::Record { line: 2, .. }));
    }

    #[test]
    fn nan_score_is_rejected() {
        let err = read("object,chain,resi,resn,name,b,q\nm,A,1,ALA,CA,NaN,1\n").unwrap_err();
        assert!(matches!(err, AtomTableError::NonFinite { line: 2, column: "b" }));
    }

    #[test]
    fn multi_character_chain_is_rejected() {
        let err = read("object,chain,resi,resn,name,b,q\nm,AB,1,ALA,CA,70,1\n").unwrap_err();
        assert!(matches!(err, AtomTableError::InvalidChain { line: 2, .. }));
    }

    #[test]
    fn read_from_path_loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atoms.csv");
        std::fs::write(&path, TABLE).unwrap();
        let s = AtomTable::read_from_path(&path).unwrap();
        assert_eq!(s.atom_count(), 4);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AtomTable::read_from_path("/nonexistent/atoms.csv").unwrap_err();
        assert!(matches!(err, AtomTableError::Io(_)));
    }
}
