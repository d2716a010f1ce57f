use csv::{ReaderBuilder, Writer};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::column::Column;
use crate::error::{Error, Result};
use crate::na::NA;
use crate::DataFrame;

/// Cell texts read as missing
pub const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

fn is_null_token(cell: &str) -> bool {
    NULL_TOKENS.contains(&cell)
}

/// Read a CSV file with a header row into a DataFrame
///
/// Column types are inferred per column: Int64 if every present cell parses
/// as an integer, Float64 if every present cell parses as a float, String
/// otherwise. A column with no present cells becomes Float64. A repeated
/// header name is suffixed with `.1`, `.2` and so on.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let file = File::open(path.as_ref()).map_err(Error::Io)?;
    read_csv_from_reader(file)
}

/// Read CSV text with a header row from any reader
pub fn read_csv_from_reader<R: Read>(reader: R) -> Result<DataFrame> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = dedup_headers(
        rdr.headers()
            .map_err(Error::Csv)?
            .iter()
            .map(|h| h.to_string())
            .collect(),
    );

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in rdr.records() {
        let record = result.map_err(Error::Csv)?;
        for (i, column) in cells.iter_mut().enumerate() {
            // short rows are padded with missing cells
            let cell = record.get(i).filter(|c| !is_null_token(c));
            column.push(cell.map(|c| c.to_string()));
        }
    }

    let mut df = DataFrame::new();
    for (header, column) in headers.into_iter().zip(cells) {
        df.add_column(header, infer_column(column))?;
    }
    Ok(df)
}

/// Repeated header names get a numeric suffix: `x`, `x.1`, `x.2`
fn dedup_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|header| {
            if seen.insert(header.clone()) {
                return header;
            }
            let suffix = suffixes.entry(header.clone()).or_insert(0);
            loop {
                *suffix += 1;
                let candidate = format!("{}.{}", header, suffix);
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

fn infer_column(cells: Vec<Option<String>>) -> Column {
    let present = || cells.iter().flatten();

    if present().next().is_none() {
        return Column::Float64(vec![NA::NA; cells.len()]);
    }

    if present().all(|c| c.parse::<i64>().is_ok()) {
        return Column::Int64(
            cells
                .iter()
                .map(|c| NA::from(c.as_ref().and_then(|s| s.parse::<i64>().ok())))
                .collect(),
        );
    }

    if present().all(|c| c.parse::<f64>().is_ok()) {
        return Column::Float64(
            cells
                .iter()
                .map(|c| NA::from(c.as_ref().and_then(|s| s.parse::<f64>().ok())))
                .collect(),
        );
    }

    Column::String(cells.into_iter().map(NA::from).collect())
}

/// Write a DataFrame to a CSV file with a header row
pub fn write_csv<P: AsRef<Path>>(df: &DataFrame, path: P) -> Result<()> {
    let file = File::create(path.as_ref()).map_err(Error::Io)?;
    write_csv_to_writer(df, file)
}

/// Write a DataFrame as CSV to any writer; missing cells are written empty
pub fn write_csv_to_writer<W: Write>(df: &DataFrame, writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(df.column_names()).map_err(Error::Csv)?;

    for row in 0..df.row_count() {
        let record: Vec<String> = df
            .column_names()
            .iter()
            .map(|name| {
                df.column(name)
                    .and_then(|c| c.display_value(row))
                    .unwrap_or_default()
            })
            .collect();
        wtr.write_record(&record).map_err(Error::Csv)?;
    }

    wtr.flush().map_err(Error::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;

    #[test]
    fn test_type_inference() {
        let text = "a,b,c,d\n1,1.5,x,\n2,NA,y,\n,3,z,N/A\n";
        let df = read_csv_from_reader(text.as_bytes()).unwrap();
        assert_eq!(df.row_count(), 3);
        assert_eq!(df.column("a").unwrap().column_type(), ColumnType::Int64);
        assert_eq!(df.column("b").unwrap().column_type(), ColumnType::Float64);
        assert_eq!(df.column("c").unwrap().column_type(), ColumnType::String);
        assert_eq!(df.column("d").unwrap().column_type(), ColumnType::Float64);
        assert_eq!(df.column("a").unwrap().null_count(), 1);
        assert_eq!(df.column("b").unwrap().null_count(), 1);
        assert_eq!(df.column("d").unwrap().null_count(), 3);
    }

    #[test]
    fn test_duplicate_headers_renamed() {
        let text = "x,y,x,x.1,x\n1,2,3,4,5\n";
        let df = read_csv_from_reader(text.as_bytes()).unwrap();
        assert_eq!(df.column_names(), &["x", "y", "x.1", "x.1.1", "x.2"]);
        assert_eq!(df.get_column_numeric_values("x.1").unwrap(), vec![3.0]);
        assert_eq!(df.get_column_numeric_values("x.2").unwrap(), vec![5.0]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let text = "a,b\n1,2\n3\n";
        let df = read_csv_from_reader(text.as_bytes()).unwrap();
        assert!(df.column("b").unwrap().is_na_at(1));
    }

    #[test]
    fn test_write_missing_as_empty() {
        let mut df = DataFrame::new();
        df.add_column("x", Column::Float64(vec![NA::Value(1.5), NA::NA]))
            .unwrap();
        df.add_column("y", Column::from_strings(vec!["a", "b"]))
            .unwrap();
        let mut buf = Vec::new();
        write_csv_to_writer(&df, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "x,y\n1.5,a\n,b\n");
    }
}
