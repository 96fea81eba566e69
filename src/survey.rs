use log::{info, warn};

use access_survey::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod answers;
pub mod config_reader;
pub mod io_csv;
pub mod io_xlsx;

use crate::args::Args;
use crate::survey::config_reader::{AnswerSource, AssessmentConfig, OutputSettings};

/// Placeholder centre name when the configuration does not provide one.
const DEFAULT_CENTER_NAME: &str = "Молодіжний центр";

#[derive(Debug, Snafu)]
pub enum DostupError {
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No readable worksheet in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} is missing in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display(""))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("The question catalog is invalid"))]
    InvalidCatalog { source: SurveyError },
    #[snafu(display("Error writing report to {path}"))]
    WritingReport {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DostupResult<T> = Result<T, DostupError>;

fn recommendation_to_json(rec: &Recommendation) -> JSValue {
    json!({
        "priority": rec.priority.label(),
        "area": rec.area,
        "issue": rec.issue,
        "currentState": rec.current_state,
        "recommendation": rec.advice,
        "explanation": rec.explanation,
    })
}

fn category_scores_to_json(report: &ScoreReport, catalog: &Catalog) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (category_id, result) in &report.by_category {
        m.insert(
            category_id.clone(),
            json!({
                "name": catalog.category_name(category_id),
                "score": result.score,
                "total": result.total,
                "positive": result.positive,
                "level": result.level.as_str(),
                "issueCount": result.issues.len(),
            }),
        );
    }
    JSValue::Object(m)
}

fn section_scores_to_json(report: &ScoreReport) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (section_id, result) in &report.by_section {
        m.insert(
            section_id.clone(),
            json!({
                "title": result.title,
                "score": result.score,
                "total": result.total,
                "positive": result.positive,
                "level": result.level.as_str(),
            }),
        );
    }
    JSValue::Object(m)
}

fn recommendations_to_json(groups: &[CategoryRecommendations]) -> JSValue {
    let mut l: Vec<JSValue> = Vec::new();
    for group in groups {
        let items: Vec<JSValue> = group
            .recommendations
            .iter()
            .map(recommendation_to_json)
            .collect();
        l.push(json!({
            "categoryId": group.category_id,
            "categoryName": group.category_name,
            "score": group.score,
            "level": group.level.as_str(),
            "issueCount": group.issue_count,
            "recommendations": items,
        }));
    }
    JSValue::Array(l)
}

fn summary_to_json(entries: &[SummaryRecommendation]) -> JSValue {
    let mut l: Vec<JSValue> = Vec::new();
    for entry in entries {
        let mut rec = match recommendation_to_json(&entry.recommendation) {
            JSValue::Object(m) => m,
            _ => unreachable!("recommendation_to_json builds an object"),
        };
        rec.insert(
            "categoryName".to_string(),
            json!(entry.category_name.clone()),
        );
        l.push(JSValue::Object(rec));
    }
    JSValue::Array(l)
}

/// Assembles the report view model handed to rendering and distribution.
fn build_report_js(
    settings: &OutputSettings,
    catalog: &Catalog,
    report: &ScoreReport,
    groups: &[CategoryRecommendations],
    summary: &[SummaryRecommendation],
    progress: &Completion,
) -> JSValue {
    json!({
        "config": {
            "centerName": settings
                .center_name
                .clone()
                .unwrap_or_else(|| DEFAULT_CENTER_NAME.to_string()),
            "completedAt": settings.completed_at,
        },
        "completion": {
            "answered": progress.answered,
            "total": progress.total,
            "percentage": progress.percentage,
        },
        "overall": {
            "score": report.overall.score,
            "level": report.overall.level.as_str(),
            "label": report.overall.level.label(),
            "description": report.overall.level.description(),
        },
        "byCategory": category_scores_to_json(report, catalog),
        "bySection": section_scores_to_json(report),
        "totalAccessibilityQuestions": report.total_accessibility_questions,
        "answeredQuestions": report.answered_question_count,
        "recommendations": recommendations_to_json(groups),
        "summary": summary_to_json(summary),
    })
}

/// File-name-safe rendering of a centre name: alphanumerics kept, runs of
/// anything else collapsed to a single underscore.
fn sanitize_file_name(name: &str) -> String {
    let mut out = String::new();
    let mut last_underscore = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.push(c);
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// Ships the assembled report: an explicit `--out` path wins, then the
/// configured output directory, then stdout. Email or link distribution is a
/// separate collaborator consuming the written file.
fn deliver_report(
    pretty_report: &str,
    out: &Option<String>,
    settings: &OutputSettings,
) -> DostupResult<()> {
    let target: Option<PathBuf> = match out.as_deref() {
        Some("stdout") => None,
        Some(p) => Some(PathBuf::from(p)),
        None => settings.output_directory.as_ref().map(|dir| {
            let center = settings.center_name.as_deref().unwrap_or(DEFAULT_CENTER_NAME);
            Path::new(dir).join(format!("{}_звіт.json", sanitize_file_name(center)))
        }),
    };
    match target {
        Some(path) => {
            let p = path.display().to_string();
            fs::write(&path, pretty_report).context(WritingReportSnafu { path: p.clone() })?;
            info!("Report written to {:?}", p);
        }
        None => println!("{}", pretty_report),
    }
    Ok(())
}

fn read_reference(path: &str) -> DostupResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

fn resolve_config(args: &Args) -> DostupResult<(AssessmentConfig, PathBuf)> {
    if let Some(config_path) = &args.config {
        let config = config_reader::read_config(config_path)?;
        let root = Path::new(config_path)
            .parent()
            .context(MissingParentDirSnafu {})?;
        return Ok((config, root.to_path_buf()));
    }
    match (&args.input, &args.questions) {
        (Some(input), Some(questions)) => {
            let config = AssessmentConfig {
                output_settings: OutputSettings {
                    center_name: None,
                    completed_at: None,
                    output_directory: None,
                },
                questions_file: questions.clone(),
                answer_sources: vec![AnswerSource {
                    provider: args
                        .input_type
                        .clone()
                        .unwrap_or_else(|| "json".to_string()),
                    file_path: input.clone(),
                    worksheet_name: args.excel_worksheet_name.clone(),
                }],
            };
            Ok((config, PathBuf::from(".")))
        }
        _ => whatever!("Provide --config, or --input together with --questions"),
    }
}

pub fn run_assessment(args: &Args) -> DostupResult<()> {
    let (config, root) = resolve_config(args)?;
    info!("config: {:?}", config);

    if config.answer_sources.is_empty() {
        whatever!("no answer sources detected");
    }

    let catalog = config_reader::read_catalog(&root.join(&config.questions_file))?;
    catalog.validate().context(InvalidCatalogSnafu {})?;
    info!(
        "catalog: {} questions in {} sections, {} categories",
        catalog.question_count(),
        catalog.sections.len(),
        catalog.categories.len()
    );

    let mut store = AnswerSet::new();
    for source in &config.answer_sources {
        answers::read_answer_source(&root, source, &catalog, &mut store)?;
    }
    info!("answers: {} recorded", store.len());

    let report = compute_scores(&store, &catalog);
    let groups = generate_recommendations(&report.by_category, &catalog);
    let summary = summary_recommendations(&groups);
    let progress = completion(&store, &catalog);

    let report_js = build_report_js(
        &config.output_settings,
        &catalog,
        &report,
        &groups,
        &summary,
        &progress,
    );
    let pretty_js_report = serde_json::to_string_pretty(&report_js).context(ParsingJsonSnafu {})?;
    deliver_report(&pretty_js_report, &args.out, &config.output_settings)?;

    // The reference report, if provided for comparison
    if let Some(reference_p) = &args.reference {
        let reference = read_reference(reference_p)?;
        let pretty_js_reference =
            serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
        if pretty_js_reference != pretty_js_report {
            warn!("Found differences with the reference report");
            print_diff(
                pretty_js_reference.as_str(),
                pretty_js_report.as_ref(),
                "\n",
            );
            whatever!("Difference detected between assembled report and reference report")
        }
    }

    Ok(())
}
