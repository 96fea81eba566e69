use std::collections::BTreeMap;

/// A recorded answer, shaped once at the collection boundary.
///
/// Legacy storage kept answers as untyped values and the engines sniffed
/// their shape at every use. Here the shape is decided exactly once, by the
/// collaborator that reads the storage, and carried as a closed variant.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AnswerValue {
    /// Free-form text.
    Text(String),
    /// A single selected choice label.
    Choice(String),
    /// A selected choice plus the content of its follow-up text field. Only
    /// `main` is ever matched against triggers.
    ChoiceWithFollowup { main: String, followup: String },
    /// The selected labels of a multi-choice question, treated as a set for
    /// trigger matching.
    Selections(Vec<String>),
    /// One selected column label per row of a grid question.
    Grid(BTreeMap<String, String>),
    /// A value the collection boundary did not recognize. It still counts as
    /// an answer but can never match a trigger.
    Opaque(String),
}

impl AnswerValue {
    /// Human-readable rendering of the current state, as shown in reports.
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Text(s) | AnswerValue::Choice(s) | AnswerValue::Opaque(s) => s.clone(),
            AnswerValue::ChoiceWithFollowup { main, followup } if followup.is_empty() => {
                main.clone()
            }
            AnswerValue::ChoiceWithFollowup { main, followup } => {
                format!("{} ({})", main, followup)
            }
            AnswerValue::Selections(labels) => labels.join(", "),
            AnswerValue::Grid(rows) => rows
                .iter()
                .map(|(row, column)| format!("{}: {}", row, column))
                .collect::<Vec<String>>()
                .join("; "),
        }
    }
}

/// The answer store: at most one value per question id.
///
/// The store is the only mutable input to scoring. Persistence is a
/// collaborator concern: load a snapshot into the store, record into it as
/// the operator progresses, hand it to the engines whenever results are
/// displayed. A missing key means "unanswered" and keeps the question out of
/// every score denominator.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AnswerSet {
    answers: BTreeMap<String, AnswerValue>,
}

impl AnswerSet {
    pub fn new() -> AnswerSet {
        AnswerSet {
            answers: BTreeMap::new(),
        }
    }

    /// Records an answer, replacing any previous value for the question.
    pub fn record(&mut self, question_id: &str, value: AnswerValue) {
        self.answers.insert(question_id.to_string(), value);
    }

    /// Removes a recorded answer, returning the question to "unanswered".
    pub fn erase(&mut self, question_id: &str) {
        self.answers.remove(question_id);
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answers.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.answers.iter().map(|(id, v)| (id.as_str(), v))
    }
}
