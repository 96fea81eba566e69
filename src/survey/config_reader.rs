use crate::survey::*;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use access_survey::{
    Catalog, FollowupField, Question, QuestionKind, Section, Subsection, UserCategory,
};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "centerName")]
    pub center_name: Option<String>,
    #[serde(rename = "completedAt")]
    pub completed_at: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "questionsFile")]
    pub questions_file: String,
    #[serde(rename = "answerSources")]
    pub answer_sources: Vec<AnswerSource>,
}

pub fn read_config(path: &str) -> DostupResult<AssessmentConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

// The question catalog, in the JSON layout exported by the questionnaire
// authoring pipeline.

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsFile {
    pub sections: Vec<SectionJson>,
    #[serde(rename = "userCategories", default)]
    pub user_categories: BTreeMap<String, UserCategoryJson>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SectionJson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub subsections: Vec<SubsectionJson>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SubsectionJson {
    pub id: String,
    pub title: String,
    pub questions: Vec<QuestionJson>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionJson {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// A list of labels for choice questions, or a generator description for
    /// dropdowns (`{"type": "yearRange", ...}`).
    #[serde(default)]
    pub options: Option<JSValue>,
    #[serde(default)]
    pub rows: Option<Vec<String>>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(rename = "isAccessibilityQuestion", default)]
    pub is_accessibility_question: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(rename = "recommendationTrigger", default)]
    pub recommendation_trigger: Vec<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(rename = "conditionalField", default)]
    pub conditional_field: Option<ConditionalFieldJson>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalFieldJson {
    pub trigger: String,
    pub field: ConditionalFieldSpecJson,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalFieldSpecJson {
    pub label: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct UserCategoryJson {
    pub id: String,
    pub name: String,
}

pub fn read_catalog(path: &Path) -> DostupResult<Catalog> {
    let p = path.display().to_string();
    info!("Attempting to read question catalog {:?}", p);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: p })?;
    let file: QuestionsFile = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    convert_catalog(&file)
}

pub fn convert_catalog(file: &QuestionsFile) -> DostupResult<Catalog> {
    let mut sections: Vec<Section> = Vec::new();
    for section in &file.sections {
        let mut subsections: Vec<Subsection> = Vec::new();
        for subsection in &section.subsections {
            let mut questions: Vec<Question> = Vec::new();
            for question in &subsection.questions {
                questions.push(convert_question(question)?);
            }
            subsections.push(Subsection {
                id: subsection.id.clone(),
                title: subsection.title.clone(),
                questions,
            });
        }
        sections.push(Section {
            id: section.id.clone(),
            title: section.title.clone(),
            description: section.description.clone(),
            subsections,
        });
    }
    // The map key is the canonical category id; the embedded id must agree
    // but is not trusted.
    let categories: Vec<UserCategory> = file
        .user_categories
        .iter()
        .map(|(id, c)| UserCategory {
            id: id.clone(),
            name: c.name.clone(),
        })
        .collect();
    Ok(Catalog {
        sections,
        categories,
    })
}

fn convert_question(question: &QuestionJson) -> DostupResult<Question> {
    let kind = match question.kind.as_str() {
        "text" | "textarea" => QuestionKind::FreeText,
        "radio" => QuestionKind::SingleChoice,
        "checkbox" => QuestionKind::MultiChoice,
        "matrix" => QuestionKind::Grid,
        "dropdown" => QuestionKind::Dropdown,
        x => whatever!("Unknown question type {:?} for question {}", x, question.id),
    };
    let choices = match &question.options {
        Some(JSValue::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        Some(JSValue::Object(spec)) => dropdown_choices(spec),
        _ => vec![],
    };
    Ok(Question {
        id: question.id.clone(),
        text: question.text.clone(),
        kind,
        choices,
        rows: question.rows.clone().unwrap_or_default(),
        columns: question.columns.clone().unwrap_or_default(),
        accessibility: question.is_accessibility_question,
        categories: question.categories.clone(),
        triggers: question.recommendation_trigger.clone(),
        explanation: question.explanation.clone(),
        followup: question.conditional_field.as_ref().map(|c| FollowupField {
            trigger_choice: c.trigger.clone(),
            label: c.field.label.clone(),
        }),
    })
}

/// Expands a dropdown generator description into concrete choice labels.
/// Region lists and other form-side vocabularies stay empty here: the engine
/// only needs labels that can appear in trigger lists, and generated ones
/// never do.
fn dropdown_choices(spec: &JSMap<String, JSValue>) -> Vec<String> {
    match spec.get("type").and_then(|v| v.as_str()) {
        Some("yearRange") => {
            let from = spec.get("from").and_then(|v| v.as_i64());
            let to = spec.get("to").and_then(|v| v.as_i64());
            match (from, to) {
                (Some(from), Some(to)) if from <= to => {
                    (from..=to).map(|year| year.to_string()).collect()
                }
                _ => vec![],
            }
        }
        _ => vec![],
    }
}
