//! Roster reader for the participant export of the course management system.
//!
//! The export is a semicolon-delimited CSV file, quoted with `"`, encoded as
//! ISO-8859-1, with a header row. Only the columns below are used; any other
//! column is ignored.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::RosterError;
use crate::types::StudentRecord;

pub const COLUMN_USERNAME: &str = "Nutzernamen";
pub const COLUMN_EMAIL: &str = "E-Mail";
pub const COLUMN_FIRST_NAME: &str = "Vorname";
pub const COLUMN_LAST_NAME: &str = "Nachname";
pub const COLUMN_GROUP: &str = "Gruppe";

/// Read and parse the roster at `path`.
pub fn read_roster(path: &Path) -> Result<Vec<StudentRecord>, RosterError> {
    let bytes = std::fs::read(path).map_err(|source| RosterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_roster(&bytes)
}

/// Parse a Latin-1 encoded roster export.
pub fn parse_roster(bytes: &[u8]) -> Result<Vec<StudentRecord>, RosterError> {
    let text = decode_latin1(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .quote(b'"')
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(RosterError::MissingColumn { column: name })
    };
    let username = column(COLUMN_USERNAME)?;
    let email = column(COLUMN_EMAIL)?;
    let first_name = column(COLUMN_FIRST_NAME)?;
    let last_name = column(COLUMN_LAST_NAME)?;
    let group = column(COLUMN_GROUP)?;

    let mut students = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or_default().to_string();

        // Trailing rows of exports sometimes carry only separators.
        if field(username).is_empty() {
            continue;
        }

        let full_name = format!("{} {}", field(first_name), field(last_name))
            .trim()
            .to_string();
        students.push(StudentRecord {
            username: field(username),
            email: field(email),
            full_name,
            tutorial_group: field(group),
        });
    }
    Ok(students)
}

/// ISO-8859-1 maps every byte to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Distinct short tutorial group names in the roster, sorted.
pub fn tutorial_groups(students: &[StudentRecord]) -> Vec<String> {
    students
        .iter()
        .filter_map(StudentRecord::tutorial_group_short)
        .map(str::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
