// Primitives for reading CSV files.

use crate::radar::*;

/// Exports are either semicolon-separated (Dutch locale) or comma-separated.
const CANDIDATE_DELIMITERS: [u8; 3] = [b';', b',', b'\t'];

pub fn parse_delimiter(delimiter: Option<&str>) -> RadarResult<Option<u8>> {
    match delimiter {
        None => Ok(None),
        Some("\\t") | Some("tab") => Ok(Some(b'\t')),
        Some(s) if s.len() == 1 => Ok(Some(s.as_bytes()[0])),
        Some(s) => whatever!("the CSV delimiter must be a single character, got {:?}", s),
    }
}

/// Picks the candidate delimiter that appears most often in the header line.
pub fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    let mut best = b',';
    let mut best_count = 0;
    for d in CANDIDATE_DELIMITERS.iter() {
        let count = first_line.bytes().filter(|b| b == d).count();
        if count > best_count {
            best = *d;
            best_count = count;
        }
    }
    debug!("sniff_delimiter: {:?}", best as char);
    best
}

pub fn read_csv_table(path: &str, delimiter: Option<u8>) -> RadarResult<RawTable> {
    let bytes = fs::read(path).context(ReadingInputSnafu { path })?;
    decode_csv_bytes(bytes, delimiter, path)
}

/// Exports must be UTF-8. Anything else is refused rather than patched with
/// replacement characters, which would end up in headers and category names.
pub fn decode_csv_bytes(bytes: Vec<u8>, delimiter: Option<u8>, path: &str) -> RadarResult<RawTable> {
    let text = String::from_utf8(bytes).context(InvalidEncodingSnafu { path })?;
    parse_csv_text(&text, delimiter, path)
}

/// Decodes the text of a CSV export. The first line holds the headers.
pub fn parse_csv_text(text: &str, delimiter: Option<u8>, path: &str) -> RadarResult<RawTable> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(text));
    let mut records = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes())
        .into_records();

    let headers: Vec<String> = match records.next() {
        Some(line_r) => line_r
            .context(CsvLineParseSnafu { path, lineno: 1_usize })?
            .iter()
            .map(|s| s.to_string())
            .collect(),
        None => return EmptyInputSnafu { path }.fail(),
    };
    debug!("parse_csv_text: header: {:?}", headers);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("parse_csv_text: lineno: {:?} row: {:?}", lineno, line);
        rows.push(line.iter().map(Cell::from).collect());
    }
    Ok(RawTable::new(headers, rows))
}
