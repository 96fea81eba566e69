// Primitives for reading answer sheets from Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use crate::survey::answers::ParsedAnswer;
use crate::survey::{
    DostupResult, EmptyExcelSnafu, MissingWorksheetSnafu, OpeningExcelSnafu,
};

/// Reads the same `question_id,row,value,followup` table from a worksheet.
/// Without a worksheet name, the first sheet of the workbook is used.
pub fn read_xlsx_answers(path: &str, worksheet: Option<&str>) -> DostupResult<Vec<ParsedAnswer>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };

    let mut iter = wrange.rows();
    // The first row is the header.
    iter.next();
    let mut res: Vec<ParsedAnswer> = Vec::new();
    for row in iter {
        debug!("read_xlsx_answers: row: {:?}", row);
        let question_id = read_cell(row.first());
        if question_id.trim().is_empty() {
            continue;
        }
        res.push(ParsedAnswer {
            question_id: question_id.trim().to_string(),
            row: read_cell(row.get(1)).trim().to_string(),
            value: read_cell(row.get(2)).trim().to_string(),
            followup: read_cell(row.get(3)).trim().to_string(),
        });
    }
    Ok(res)
}

fn read_cell(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(s)) => s.clone(),
        // Whole numbers (years, counts) come back as floats.
        Some(DataType::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
        Some(DataType::Float(f)) => f.to_string(),
        Some(DataType::Int(i)) => i.to_string(),
        Some(DataType::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
