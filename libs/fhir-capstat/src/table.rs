//! Tab-separated conformance tables.
//!
//! One table per actor, named `<actor>.tsv`. The header row is [`COLUMNS`],
//! rows end in `\r\n`, and a field is quoted only when it contains a tab,
//! a double quote or a line break (embedded quotes are doubled).

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::extract::{ConformanceRecord, COLUMNS};

pub const DELIMITER: char = '\t';
pub const LINE_TERMINATOR: &str = "\r\n";
pub const EXTENSION: &str = "tsv";

/// Path of the table for `actor` inside `output_dir`.
pub fn table_path(output_dir: impl AsRef<Path>, actor: &str) -> PathBuf {
    output_dir.as_ref().join(format!("{actor}.{EXTENSION}"))
}

/// Write the table for `actor` into `output_dir`, replacing any previous one.
///
/// The directory must already exist.
pub fn emit(
    actor: &str,
    records: &[ConformanceRecord],
    output_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let path = table_path(output_dir, actor);
    let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
    let mut writer = BufWriter::new(file);
    write_table(&mut writer, records)
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(&path, e))?;
    Ok(path)
}

pub fn write_table<W: Write>(writer: &mut W, records: &[ConformanceRecord]) -> io::Result<()> {
    write_row(writer, COLUMNS)?;
    for record in records {
        write_row(writer, record.fields())?;
    }
    Ok(())
}

fn write_row<W: Write>(writer: &mut W, fields: [&str; 9]) -> io::Result<()> {
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            write!(writer, "{DELIMITER}")?;
        }
        if needs_quoting(field) {
            write!(writer, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            writer.write_all(field.as_bytes())?;
        }
    }
    writer.write_all(LINE_TERMINATOR.as_bytes())
}

fn needs_quoting(field: &str) -> bool {
    field.contains([DELIMITER, '"', '\r', '\n'])
}

/// Read a table file written by [`emit`].
pub fn read_table_file(path: impl AsRef<Path>) -> Result<Vec<ConformanceRecord>> {
    let path = path.as_ref();
    let input = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    read_table(&input)
}

/// Parse a table produced by [`write_table`].
pub fn read_table(input: &str) -> Result<Vec<ConformanceRecord>> {
    let mut rows = parse_rows(input)?.into_iter();
    let header = rows.next().ok_or_else(|| Error::Table {
        line: 1,
        message: "missing header row".into(),
    })?;
    if header != COLUMNS {
        return Err(Error::Table {
            line: 1,
            message: format!("unexpected header: {}", header.join(",")),
        });
    }

    rows.enumerate()
        .map(|(idx, row)| {
            let line = idx + 2;
            let fields: [String; 9] = row.try_into().map_err(|row: Vec<String>| Error::Table {
                line,
                message: format!("expected {} fields, found {}", COLUMNS.len(), row.len()),
            })?;
            Ok(ConformanceRecord::from_fields(fields))
        })
        .collect()
}

fn parse_rows(input: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;
    let mut in_quotes = false;
    let mut row_started = false;

    while let Some(c) = chars.next() {
        row_started = true;
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            DELIMITER => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                row_started = false;
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(Error::Table {
            line,
            message: "unterminated quoted field".into(),
        });
    }
    if row_started {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}
