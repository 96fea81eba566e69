use crate::survey::*;

use log::{debug, info, warn};
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use access_survey::{AnswerSet, AnswerValue, Catalog, QuestionKind};

use crate::survey::config_reader::AnswerSource;

/// One row of a tabular answers input (CSV or Excel), before assembly into
/// the store.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedAnswer {
    pub question_id: String,
    /// Grid row label; empty for scalar answers.
    pub row: String,
    pub value: String,
    /// Content of the follow-up text field; empty when not applicable.
    pub followup: String,
}

/// Reads one answer source into the store. Later sources override earlier
/// answers for the same question.
pub fn read_answer_source(
    root: &Path,
    source: &AnswerSource,
    catalog: &Catalog,
    store: &mut AnswerSet,
) -> DostupResult<()> {
    let p = root.join(&source.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read answers file {:?}", p2);
    match source.provider.as_str() {
        "json" => read_json_answers(&p2, catalog, store),
        "csv" => {
            let rows = io_csv::read_csv_answers(&p2)?;
            assemble_answers(&rows, catalog, store);
            Ok(())
        }
        "xlsx" => {
            let rows = io_xlsx::read_xlsx_answers(&p2, source.worksheet_name.as_deref())?;
            assemble_answers(&rows, catalog, store);
            Ok(())
        }
        x => whatever!("Answer provider not implemented {:?}", x),
    }
}

/// Reads a legacy answers snapshot: one JSON object mapping question ids to
/// untyped answer values, as persisted by the questionnaire form.
fn read_json_answers(path: &str, catalog: &Catalog, store: &mut AnswerSet) -> DostupResult<()> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let map = match js {
        JSValue::Object(m) => m,
        _ => whatever!("Expected a JSON object of question id to answer in {}", path),
    };
    for (question_id, value) in &map {
        if value.is_null() {
            continue;
        }
        let question = catalog.question(question_id);
        if question.is_none() {
            warn!(
                "read_json_answers: answer for unknown question {:?}",
                question_id
            );
        }
        let shaped = legacy_answer_value(value, question.map(|q| q.kind));
        debug!("read_json_answers: {} -> {:?}", question_id, shaped);
        store.record(question_id, shaped);
    }
    Ok(())
}

/// Maps a legacy untyped storage value onto the closed answer variant. This
/// is the only place shape sniffing happens; the engines never see raw JSON.
pub fn legacy_answer_value(value: &JSValue, kind: Option<QuestionKind>) -> AnswerValue {
    match value {
        JSValue::String(s) => match kind {
            Some(QuestionKind::FreeText) => AnswerValue::Text(s.clone()),
            _ => AnswerValue::Choice(s.clone()),
        },
        JSValue::Array(items) => AnswerValue::Selections(items.iter().map(json_text).collect()),
        JSValue::Object(fields) => match fields.get("main") {
            Some(JSValue::String(main)) => {
                let followup = match fields.get("conditional") {
                    Some(JSValue::String(s)) => s.clone(),
                    _ => String::new(),
                };
                AnswerValue::ChoiceWithFollowup {
                    main: main.clone(),
                    followup,
                }
            }
            // No `main` key: a row-to-column grid selection.
            _ => AnswerValue::Grid(
                fields
                    .iter()
                    .map(|(row, v)| (row.clone(), json_text(v)))
                    .collect(),
            ),
        },
        other => AnswerValue::Opaque(json_text(other)),
    }
}

fn json_text(value: &JSValue) -> String {
    match value {
        JSValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds answer values out of tabular rows. Rows with a row label assemble
/// into a grid; repeated scalar rows for one question accumulate into a
/// multi-choice selection.
pub fn assemble_answers(rows: &[ParsedAnswer], catalog: &Catalog, store: &mut AnswerSet) {
    let mut grouped: BTreeMap<&str, Vec<&ParsedAnswer>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.question_id.as_str()).or_default().push(row);
    }

    for (question_id, rows) in &grouped {
        let kind = catalog.question(question_id).map(|q| q.kind);
        if kind.is_none() {
            warn!(
                "assemble_answers: answer rows for unknown question {:?}",
                question_id
            );
        }

        let grid_rows: Vec<&&ParsedAnswer> = rows.iter().filter(|r| !r.row.is_empty()).collect();
        let value = if !grid_rows.is_empty() {
            if grid_rows.len() < rows.len() {
                debug!(
                    "assemble_answers: question {}: dropping {} rows without a row label",
                    question_id,
                    rows.len() - grid_rows.len()
                );
            }
            AnswerValue::Grid(
                grid_rows
                    .iter()
                    .map(|r| (r.row.clone(), r.value.clone()))
                    .collect(),
            )
        } else if rows.len() > 1 || kind == Some(QuestionKind::MultiChoice) {
            AnswerValue::Selections(rows.iter().map(|r| r.value.clone()).collect())
        } else {
            let row = rows[0];
            if !row.followup.is_empty() {
                AnswerValue::ChoiceWithFollowup {
                    main: row.value.clone(),
                    followup: row.followup.clone(),
                }
            } else {
                match kind {
                    Some(QuestionKind::FreeText) => AnswerValue::Text(row.value.clone()),
                    _ => AnswerValue::Choice(row.value.clone()),
                }
            }
        };
        store.record(question_id, value);
    }
}
