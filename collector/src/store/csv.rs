//! Flat tabular mirror of the result set.

use std::collections::BTreeSet;
use std::io::{self, Write};

use super::ExtractedRecord;
use crate::extract::RESERVED_FIELD;

/// Separator between values of a list field inside one cell.
pub const VALUE_DELIMITER: &str = "; ";

fn needs_quotes(cell: &str) -> bool {
    cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r')
}

/// Writes one comma-separated row, quoting cells where needed.
pub fn write_row<W: Write>(w: &mut W, row: &[String]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    writeln!(w)
}

/// Column names: [`RESERVED_FIELD`] followed by the sorted union of field names.
#[must_use]
pub fn header(records: &[ExtractedRecord]) -> Vec<String> {
    let fields: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.fields.keys().map(String::as_str))
        .collect();
    std::iter::once(RESERVED_FIELD.to_string())
        .chain(fields.into_iter().map(String::from))
        .collect()
}

/// Writes the header and one row per record.
pub fn write_records<W: Write>(w: &mut W, records: &[ExtractedRecord]) -> io::Result<()> {
    let header = header(records);
    write_row(w, &header)?;

    for record in records {
        let mut row = Vec::with_capacity(header.len());
        row.push(record.topic.to_string());
        for field in &header[1..] {
            let cell = record
                .fields
                .get(field)
                .map(|values| values.join(VALUE_DELIMITER))
                .unwrap_or_default();
            row.push(cell);
        }
        write_row(w, &row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::Topic;
    use pretty_assertions::assert_eq;

    fn record(topic: &str, fields: &[(&str, &[&str])]) -> ExtractedRecord {
        let mut record = ExtractedRecord::new(Topic::new(topic));
        for (field, values) in fields {
            record
                .fields
                .insert((*field).to_string(), values.iter().map(|v| (*v).to_string()).collect());
        }
        record
    }

    #[test]
    fn test_write_row_quotes() {
        let mut out = Vec::new();
        write_row(&mut out, &["a".to_string(), "b,c".to_string(), "say \"hi\"".to_string()]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a,\"b,c\",\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_write_records() {
        let records = vec![
            record("Arizona", &[("requirements", &["must include name", "required fields"])]),
            record("Ohio", &[("forms", &["trust name"]), ("requirements", &[])]),
        ];
        let mut out = Vec::new();
        write_records(&mut out, &records).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "topic,forms,requirements\n\
             Arizona,,must include name; required fields\n\
             Ohio,trust name,\n"
        );
    }

    #[test]
    fn test_empty_records_write_header_only() {
        let mut out = Vec::new();
        write_records(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "topic\n");
    }
}
