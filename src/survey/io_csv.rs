// Primitives for reading answer sheets from CSV files.

use log::debug;
use snafu::prelude::*;

use crate::survey::answers::ParsedAnswer;
use crate::survey::{CsvLineParseSnafu, CsvLineTooShortSnafu, CsvOpenSnafu, DostupResult};

/// Reads a `question_id,row,value,followup` table. The first line is a
/// header; `row` and `followup` may be empty, and the `followup` column may
/// be missing entirely.
pub fn read_csv_answers(path: &str) -> DostupResult<Vec<ParsedAnswer>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut res: Vec<ParsedAnswer> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // 1-based, counting the header line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_csv_answers: lineno: {:?} row: {:?}", lineno, line);

        let question_id = line.get(0).context(CsvLineTooShortSnafu { lineno })?.trim();
        if question_id.is_empty() {
            continue;
        }
        let row = line.get(1).context(CsvLineTooShortSnafu { lineno })?.trim();
        let value = line.get(2).context(CsvLineTooShortSnafu { lineno })?.trim();
        let followup = line.get(3).unwrap_or("").trim();

        res.push(ParsedAnswer {
            question_id: question_id.to_string(),
            row: row.to_string(),
            value: value.to_string(),
            followup: followup.to_string(),
        });
    }
    Ok(res)
}
