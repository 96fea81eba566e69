// ********* Catalog data structures ***********

use std::error::Error;
use std::fmt::Display;

use crate::store::AnswerValue;

/// The shape of the value a question collects.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QuestionKind {
    /// Free-form text, a single field.
    FreeText,
    /// One choice among the `choices` labels.
    SingleChoice,
    /// Any number of choices among the `choices` labels.
    MultiChoice,
    /// One choice per row, all rows sharing the `columns` vocabulary.
    Grid,
    /// A single choice picked from a generated list (years, regions).
    Dropdown,
}

/// A free-text field attached to one choice of a single-choice question.
///
/// The field is shown by the form when `trigger_choice` is selected. Its
/// content travels with the answer but is never matched against triggers.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FollowupField {
    pub trigger_choice: String,
    pub label: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    /// Choice labels for single- and multi-choice questions, empty otherwise.
    pub choices: Vec<String>,
    /// Row labels for grid questions.
    pub rows: Vec<String>,
    /// Column labels for grid questions.
    pub columns: Vec<String>,
    /// Whether the question contributes to accessibility scoring.
    pub accessibility: bool,
    /// Identifiers of the user categories this question affects.
    pub categories: Vec<String>,
    /// Answer values that mark this question as a shortfall. A question with
    /// an empty trigger list never records an issue, whatever the answer.
    pub triggers: Vec<String>,
    /// Explanatory note surfaced next to the generated recommendation.
    pub explanation: Option<String>,
    pub followup: Option<FollowupField>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Subsection {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub subsections: Vec<Subsection>,
}

/// A user category is a pure grouping key for scores and recommendations.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UserCategory {
    pub id: String,
    pub name: String,
}

/// The question catalog: ordered sections of subsections of questions, plus
/// the flat user-category table. Loaded once, read-only afterwards.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Catalog {
    pub sections: Vec<Section>,
    pub categories: Vec<UserCategory>,
}

/// A question together with its owning section, as iterated by the scorer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionRef<'a> {
    pub question: &'a Question,
    pub section_id: &'a str,
    pub section_title: &'a str,
}

impl Catalog {
    /// Checks the structural invariants the engines rely on. Question ids
    /// must be unique across the whole catalog; an empty catalog is rejected
    /// here rather than producing empty reports downstream.
    pub fn validate(&self) -> Result<(), SurveyError> {
        let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
        let mut count = 0usize;
        for section in &self.sections {
            for subsection in &section.subsections {
                for question in &subsection.questions {
                    count += 1;
                    if !seen.insert(question.id.as_str()) {
                        return Err(SurveyError::DuplicateQuestionId {
                            id: question.id.clone(),
                        });
                    }
                }
            }
        }
        if count == 0 {
            return Err(SurveyError::EmptyCatalog);
        }
        Ok(())
    }

    /// Linear lookup by question id. Ids are unique by construction.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.sections
            .iter()
            .flat_map(|s| &s.subsections)
            .flat_map(|sub| &sub.questions)
            .find(|q| q.id == question_id)
    }

    /// The display name of a category, falling back to the raw id for
    /// identifiers missing from the category table.
    pub fn category_name<'a>(&'a self, category_id: &'a str) -> &'a str {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.name.as_str())
            .unwrap_or(category_id)
    }

    /// Flattens the catalog into the ordered list of accessibility-relevant
    /// questions. This list, not the section tree, is the unit of iteration
    /// for scoring; its order follows the catalog and is deterministic.
    pub fn accessibility_questions(&self) -> Vec<QuestionRef<'_>> {
        let mut questions = Vec::new();
        for section in &self.sections {
            for subsection in &section.subsections {
                for question in &subsection.questions {
                    if question.accessibility {
                        questions.push(QuestionRef {
                            question,
                            section_id: section.id.as_str(),
                            section_title: section.title.as_str(),
                        });
                    }
                }
            }
        }
        questions
    }

    /// Total number of questions, accessibility-relevant or not.
    pub fn question_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.subsections)
            .map(|sub| sub.questions.len())
            .sum()
    }
}

// ******** Score data structures *********

/// Qualitative reading of a percentage score. Thresholds are fixed and
/// inclusive: 80 and above is high, 50 to 79 is medium, below 50 is low.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ScoreLevel {
    Low,
    Medium,
    High,
}

impl ScoreLevel {
    pub fn from_score(score: u32) -> ScoreLevel {
        if score >= 80 {
            ScoreLevel::High
        } else if score >= 50 {
            ScoreLevel::Medium
        } else {
            ScoreLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreLevel::High => "high",
            ScoreLevel::Medium => "medium",
            ScoreLevel::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreLevel::High => "Висока доступність",
            ScoreLevel::Medium => "Середня доступність",
            ScoreLevel::Low => "Низька доступність",
        }
    }

    /// The one-paragraph reading of the overall result shown in reports.
    pub fn description(&self) -> &'static str {
        match self {
            ScoreLevel::High => {
                "Ваш молодіжний центр демонструє сильну відданість доступності, але деякі зони можуть бути покращені."
            }
            ScoreLevel::Medium => {
                "Ваш молодіжний центр має базовий рівень доступності, але є значні можливості для покращення."
            }
            ScoreLevel::Low => {
                "Ваш молодіжний центр потребує суттєвих покращень у доступності для забезпечення інклюзивності."
            }
        }
    }
}

/// A recorded negative answer, attributed to a category. Carries enough
/// context to generate a recommendation without going back to the store.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Issue {
    pub question_id: String,
    pub question_text: String,
    pub answer: AnswerValue,
    pub section_title: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CategoryScore {
    pub score: u32,
    pub total: u32,
    pub positive: u32,
    pub level: ScoreLevel,
    /// Issues in catalog traversal order.
    pub issues: Vec<Issue>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SectionScore {
    pub title: String,
    pub score: u32,
    pub total: u32,
    pub positive: u32,
    pub level: ScoreLevel,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OverallScore {
    pub score: u32,
    pub level: ScoreLevel,
}

/// The full output of one scoring pass. Recomputed on demand, never stored.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScoreReport {
    pub overall: OverallScore,
    /// Category id to score, only for categories with at least one answered
    /// question. A missing key means "nothing answered for this category".
    pub by_category: std::collections::BTreeMap<String, CategoryScore>,
    pub by_section: std::collections::BTreeMap<String, SectionScore>,
    pub total_accessibility_questions: usize,
    pub answered_question_count: usize,
}

/// Answered-versus-total progress over a set of questions.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Completion {
    pub answered: usize,
    pub total: usize,
    pub percentage: u32,
}

/// Errors for structurally unusable catalogs. Everything that can degrade
/// locally (malformed answers, unknown ids, empty trigger lists) does so and
/// never surfaces as an error.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SurveyError {
    EmptyCatalog,
    DuplicateQuestionId { id: String },
}

impl Error for SurveyError {}

impl Display for SurveyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyError::EmptyCatalog => write!(f, "the question catalog has no questions"),
            SurveyError::DuplicateQuestionId { id } => {
                write!(f, "duplicate question id in catalog: {}", id)
            }
        }
    }
}
