use calamine::{open_workbook_auto, DataType, Range, Reader};

use crate::radar::*;
use crate::radar::io_common::simplify_file_name;

pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> RadarResult<RawTable> {
    let wrange = get_range(path, worksheet_name)?;
    range_to_table(&wrange, path)
}

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> RadarResult<Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let available = workbook.sheet_names().to_vec();
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name,
                available,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu { path }.fail(),
            [(worksheet_name, wrange)] => {
                debug!("get_range: using the only worksheet {:?}", worksheet_name);
                Ok(wrange.clone())
            }
            [(worksheet_name, wrange), ..] => {
                warn!(
                    "{} has {} worksheets, using the first one ({:?}); use --excel-worksheet-name to pick another",
                    simplify_file_name(path),
                    all_worksheets.len(),
                    worksheet_name
                );
                Ok(wrange.clone())
            }
        }
    }
}

fn read_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(s) if s.is_empty() => Cell::Empty,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(b) => Cell::Text(b.to_string()),
        DataType::Empty => Cell::Empty,
        // Dates and cell errors only show up in columns that are ignored.
        other => Cell::Text(format!("{:?}", other)),
    }
}

fn range_to_table(wrange: &Range<DataType>, path: &str) -> RadarResult<RawTable> {
    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyInputSnafu { path })?;
    debug!("range_to_table: header: {:?}", header);
    let headers: Vec<String> = header
        .iter()
        .map(|c| read_cell(c).as_text().unwrap_or_default())
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        debug!("range_to_table: idx: {:?} row: {:?}", idx, row);
        rows.push(row.iter().map(read_cell).collect());
    }
    Ok(RawTable::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(rows: Vec<Vec<DataType>>) -> Range<DataType> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut wrange = Range::new((0, 0), (rows.len() as u32 - 1, width as u32 - 1));
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                wrange.set_value((r as u32, c as u32), value);
            }
        }
        wrange
    }

    #[test]
    fn cells_from_workbook() {
        let wrange = range(vec![
            vec![
                DataType::String("Wie ben jij?".to_string()),
                DataType::String("Voor welke collega vul je dit formulier in?".to_string()),
                DataType::String("**TEAMSPELER** [a]".to_string()),
                DataType::Int(2025),
            ],
            vec![
                DataType::String("Stan ".to_string()),
                DataType::String("Tom".to_string()),
                DataType::String("Vaak".to_string()),
                DataType::Float(3.5),
            ],
            vec![
                DataType::String("Tom".to_string()),
                DataType::String("Anne".to_string()),
                DataType::Empty,
                DataType::Bool(true),
            ],
        ]);
        let table = range_to_table(&wrange, "mem.xlsx").unwrap();
        assert_eq!(table.headers[3], "2025");
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.cell(0, 2), &Cell::Text("Vaak".to_string()));
        assert_eq!(table.cell(0, 3), &Cell::Number(3.5));
        assert_eq!(table.cell(1, 2), &Cell::Empty);
        assert_eq!(table.cell(1, 3), &Cell::Text("true".to_string()));
    }

    #[test]
    fn missing_workbook() {
        assert!(matches!(
            read_excel_table("/does/not/exist.xlsx", None),
            Err(RadarError::OpeningExcel { .. })
        ));
    }
}
