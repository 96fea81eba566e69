mod catalog;
mod recommend;
mod store;

use log::{debug, info};

use std::collections::BTreeMap;

pub use crate::catalog::*;
pub use crate::recommend::*;
pub use crate::store::*;

// **** Private accumulators ****

#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct CategoryBucket {
    total: u32,
    positive: u32,
    issues: Vec<Issue>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct SectionBucket {
    title: String,
    total: u32,
    positive: u32,
}

/// Computes per-category, per-section and overall accessibility scores for
/// the given answers.
///
/// Unanswered questions are skipped entirely: partial completion shrinks the
/// denominators instead of counting as failures. Buckets are keyed lazily,
/// so a category or section nobody answered for is absent from the result
/// maps rather than carrying a fabricated 0% score.
///
/// The overall score is the unweighted mean of the present category scores,
/// not a mean over questions: a category with a single answered question
/// weighs as much as one with thirty.
pub fn compute_scores(answers: &AnswerSet, catalog: &Catalog) -> ScoreReport {
    let scored_questions = catalog.accessibility_questions();
    info!(
        "compute_scores: {} accessibility questions, {} recorded answers",
        scored_questions.len(),
        answers.len()
    );

    let mut category_buckets: BTreeMap<String, CategoryBucket> = BTreeMap::new();
    let mut section_buckets: BTreeMap<String, SectionBucket> = BTreeMap::new();

    for entry in &scored_questions {
        let question = entry.question;
        let answer = match answers.get(&question.id) {
            Some(a) => a,
            None => continue,
        };

        let has_issue = is_negative_answer(answer, question);
        debug!(
            "compute_scores: question {}: has_issue {}",
            question.id, has_issue
        );

        for category_id in &question.categories {
            let bucket = category_buckets.entry(category_id.clone()).or_default();
            bucket.total += 1;
            if has_issue {
                bucket.issues.push(Issue {
                    question_id: question.id.clone(),
                    question_text: question.text.clone(),
                    answer: answer.clone(),
                    section_title: entry.section_title.to_string(),
                });
            } else {
                bucket.positive += 1;
            }
        }

        // A question contributes once to its section, however many
        // categories it tags.
        let bucket = section_buckets
            .entry(entry.section_id.to_string())
            .or_insert_with(|| SectionBucket {
                title: entry.section_title.to_string(),
                total: 0,
                positive: 0,
            });
        bucket.total += 1;
        if !has_issue {
            bucket.positive += 1;
        }
    }

    let by_category: BTreeMap<String, CategoryScore> = category_buckets
        .into_iter()
        .map(|(category_id, bucket)| {
            let score = percent(bucket.positive as u64, bucket.total as u64);
            let result = CategoryScore {
                score,
                total: bucket.total,
                positive: bucket.positive,
                level: ScoreLevel::from_score(score),
                issues: bucket.issues,
            };
            (category_id, result)
        })
        .collect();

    let by_section: BTreeMap<String, SectionScore> = section_buckets
        .into_iter()
        .map(|(section_id, bucket)| {
            let score = percent(bucket.positive as u64, bucket.total as u64);
            let result = SectionScore {
                title: bucket.title,
                score,
                total: bucket.total,
                positive: bucket.positive,
                level: ScoreLevel::from_score(score),
            };
            (section_id, result)
        })
        .collect();

    let overall_score = mean_score(&by_category);
    ScoreReport {
        overall: OverallScore {
            score: overall_score,
            level: ScoreLevel::from_score(overall_score),
        },
        by_category,
        by_section,
        total_accessibility_questions: scored_questions.len(),
        answered_question_count: answers.len(),
    }
}

/// Whether an answer marks its question as an accessibility shortfall.
///
/// A question without trigger values never records an issue: this is the
/// documented fallback for always-positive questions, not a data error. A
/// grid answer fails as a whole as soon as one row matches a trigger.
fn is_negative_answer(answer: &AnswerValue, question: &Question) -> bool {
    if question.triggers.is_empty() {
        return false;
    }
    let triggers = &question.triggers;
    match answer {
        AnswerValue::Text(value) | AnswerValue::Choice(value) => triggers.contains(value),
        AnswerValue::ChoiceWithFollowup { main, .. } => triggers.contains(main),
        AnswerValue::Selections(values) => values.iter().any(|v| triggers.contains(v)),
        AnswerValue::Grid(rows) => rows.values().any(|v| triggers.contains(v)),
        AnswerValue::Opaque(_) => false,
    }
}

fn percent(part: u64, whole: u64) -> u32 {
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

fn mean_score(by_category: &BTreeMap<String, CategoryScore>) -> u32 {
    if by_category.is_empty() {
        return 0;
    }
    let sum: u64 = by_category.values().map(|c| c.score as u64).sum();
    (sum as f64 / by_category.len() as f64).round() as u32
}

/// Answered-versus-total progress over the whole catalog. All questions
/// count here, accessibility-relevant or not.
pub fn completion(answers: &AnswerSet, catalog: &Catalog) -> Completion {
    let total = catalog.question_count();
    let answered = answers.len();
    Completion {
        answered,
        total,
        percentage: if total == 0 {
            0
        } else {
            percent(answered as u64, total as u64)
        },
    }
}

/// Progress over one section, or `None` for an unknown section id.
pub fn section_completion(
    answers: &AnswerSet,
    catalog: &Catalog,
    section_id: &str,
) -> Option<Completion> {
    let section = catalog.sections.iter().find(|s| s.id == section_id)?;
    let questions: Vec<&Question> = section
        .subsections
        .iter()
        .flat_map(|sub| &sub.questions)
        .collect();
    let total = questions.len();
    let answered = questions
        .iter()
        .filter(|q| answers.is_answered(&q.id))
        .count();
    Some(Completion {
        answered,
        total,
        percentage: if total == 0 {
            0
        } else {
            percent(answered as u64, total as u64)
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn question(id: &str, text: &str, categories: &[&str], triggers: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            text: text.to_string(),
            kind: QuestionKind::SingleChoice,
            choices: vec!["Так".to_string(), "Ні".to_string()],
            rows: vec![],
            columns: vec![],
            accessibility: true,
            categories: categories.iter().map(|c| c.to_string()).collect(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            explanation: None,
            followup: None,
        }
    }

    fn catalog(questions: Vec<Question>) -> Catalog {
        catalog_in_sections(vec![("section1", "Фізична доступність", questions)])
    }

    fn catalog_in_sections(sections: Vec<(&str, &str, Vec<Question>)>) -> Catalog {
        Catalog {
            sections: sections
                .into_iter()
                .enumerate()
                .map(|(idx, (id, title, questions))| Section {
                    id: id.to_string(),
                    title: title.to_string(),
                    description: None,
                    subsections: vec![Subsection {
                        id: format!("{}_sub{}", id, idx + 1),
                        title: title.to_string(),
                        questions,
                    }],
                })
                .collect(),
            categories: vec![
                UserCategory {
                    id: "wheelchair".to_string(),
                    name: "Люди на інвалідному кріслі".to_string(),
                },
                UserCategory {
                    id: "stroller".to_string(),
                    name: "Батьки з дитячим візочком".to_string(),
                },
            ],
        }
    }

    fn choice(value: &str) -> AnswerValue {
        AnswerValue::Choice(value.to_string())
    }

    #[test]
    fn scores_are_deterministic() {
        init_logs();
        let catalog = catalog(vec![
            question("q1", "Чи є пандус?", &["wheelchair"], &["Ні"]),
            question("q2", "Чи є поручні?", &["wheelchair", "stroller"], &["Ні"]),
        ]);
        let mut answers = AnswerSet::new();
        answers.record("q1", choice("Так"));
        answers.record("q2", choice("Ні"));

        let first = compute_scores(&answers, &catalog);
        let second = compute_scores(&answers, &catalog);
        assert_eq!(first, second);
    }

    #[test]
    fn denominators_count_only_answered_questions() {
        let catalog = catalog(vec![
            question("q1", "Питання 1", &["wheelchair"], &["Ні"]),
            question("q2", "Питання 2", &["wheelchair"], &["Ні"]),
            question("q3", "Питання 3", &["wheelchair"], &["Ні"]),
        ]);
        let mut answers = AnswerSet::new();
        answers.record("q1", choice("Так"));
        answers.record("q3", choice("Ні"));

        let report = compute_scores(&answers, &catalog);
        let wheelchair = &report.by_category["wheelchair"];
        assert_eq!(wheelchair.total, 2);
        assert_eq!(wheelchair.positive, 1);
        assert_eq!(wheelchair.score, 50);
        assert_eq!(wheelchair.level, ScoreLevel::Medium);
        assert_eq!(report.total_accessibility_questions, 3);
        assert_eq!(report.answered_question_count, 2);
    }

    #[test]
    fn empty_buckets_are_omitted_not_zeroed() {
        let catalog = catalog(vec![
            question("q1", "Питання 1", &["wheelchair"], &["Ні"]),
            question("q2", "Питання 2", &["stroller"], &["Ні"]),
        ]);
        let mut answers = AnswerSet::new();
        answers.record("q1", choice("Так"));

        let report = compute_scores(&answers, &catalog);
        assert!(report.by_category.contains_key("wheelchair"));
        assert!(!report.by_category.contains_key("stroller"));
    }

    #[test]
    fn all_unanswered_yields_empty_maps_and_zero_overall() {
        let catalog = catalog(vec![
            question("q1", "Питання 1", &["wheelchair"], &["Ні"]),
            question("q2", "Питання 2", &["stroller"], &["Ні"]),
        ]);
        let answers = AnswerSet::new();

        let report = compute_scores(&answers, &catalog);
        assert!(report.by_category.is_empty());
        assert!(report.by_section.is_empty());
        assert_eq!(report.overall.score, 0);
        assert_eq!(report.overall.level, ScoreLevel::Low);
    }

    #[test]
    fn score_bounds_hold_for_scored_buckets() {
        let catalog = catalog(vec![
            question("q1", "Питання 1", &["wheelchair"], &["Ні"]),
            question("q2", "Питання 2", &["wheelchair"], &["Ні"]),
        ]);
        let mut answers = AnswerSet::new();
        answers.record("q1", choice("Ні"));
        answers.record("q2", choice("Ні"));

        let report = compute_scores(&answers, &catalog);
        for result in report.by_category.values() {
            assert!(result.score <= 100);
        }
        assert_eq!(report.by_category["wheelchair"].score, 0);
    }

    #[test]
    fn overall_is_mean_of_category_scores() {
        let catalog = catalog(vec![
            question("q1", "Питання 1", &["wheelchair"], &["Ні"]),
            question("q2", "Питання 2", &["wheelchair"], &["Ні"]),
            question("q3", "Питання 3", &["stroller"], &["Ні"]),
        ]);
        let mut answers = AnswerSet::new();
        answers.record("q1", choice("Так"));
        answers.record("q2", choice("Ні"));
        answers.record("q3", choice("Так"));

        let report = compute_scores(&answers, &catalog);
        // wheelchair 50, stroller 100 -> mean 75.
        assert_eq!(report.by_category["wheelchair"].score, 50);
        assert_eq!(report.by_category["stroller"].score, 100);
        assert_eq!(report.overall.score, 75);
        assert_eq!(report.overall.level, ScoreLevel::Medium);
    }

    #[test]
    fn grid_fails_whole_question_on_one_bad_row() {
        let mut q = question(
            "q1",
            "Чи доступні різні види доступності?",
            &["wheelchair"],
            &["Ні"],
        );
        q.kind = QuestionKind::Grid;
        q.rows = (1..=6).map(|i| format!("Рядок {}", i)).collect();
        q.columns = vec!["Так".to_string(), "Ні".to_string()];
        let catalog = catalog(vec![q]);

        let mut rows = BTreeMap::new();
        for i in 1..=3 {
            rows.insert(format!("Рядок {}", i), "Ні".to_string());
        }
        for i in 4..=6 {
            rows.insert(format!("Рядок {}", i), "Так".to_string());
        }
        let mut answers = AnswerSet::new();
        answers.record("q1", AnswerValue::Grid(rows));

        let report = compute_scores(&answers, &catalog);
        let wheelchair = &report.by_category["wheelchair"];
        // One question, one issue: grid failure is all-or-nothing.
        assert_eq!(wheelchair.total, 1);
        assert_eq!(wheelchair.positive, 0);
        assert_eq!(wheelchair.issues.len(), 1);
        assert_eq!(wheelchair.issues[0].question_id, "q1");
    }

    #[test]
    fn multi_category_issue_lands_in_every_bucket() {
        let catalog = catalog(vec![question(
            "q1",
            "Чи є пандус?",
            &["wheelchair", "stroller"],
            &["Ні"],
        )]);
        let mut answers = AnswerSet::new();
        answers.record("q1", choice("Ні"));

        let report = compute_scores(&answers, &catalog);
        for category_id in ["wheelchair", "stroller"] {
            let bucket = &report.by_category[category_id];
            assert_eq!(bucket.positive, 0);
            assert_eq!(bucket.issues.len(), 1);
            assert_eq!(bucket.issues[0].question_id, "q1");
        }
        // The section counts the question once.
        assert_eq!(report.by_section["section1"].total, 1);
    }

    #[test]
    fn followup_content_never_matches_triggers() {
        let catalog = catalog(vec![question("q1", "Питання 1", &["wheelchair"], &["Ні"])]);
        let mut answers = AnswerSet::new();
        answers.record(
            "q1",
            AnswerValue::ChoiceWithFollowup {
                main: "Так".to_string(),
                followup: "Ні, деталі".to_string(),
            },
        );

        let report = compute_scores(&answers, &catalog);
        assert_eq!(report.by_category["wheelchair"].positive, 1);
        assert!(report.by_category["wheelchair"].issues.is_empty());
    }

    #[test]
    fn selections_fail_on_any_trigger_member() {
        let catalog = catalog(vec![question(
            "q1",
            "Які формати доступні?",
            &["wheelchair"],
            &["Жодного"],
        )]);
        let mut answers = AnswerSet::new();
        answers.record(
            "q1",
            AnswerValue::Selections(vec!["Аудіо".to_string(), "Жодного".to_string()]),
        );

        let report = compute_scores(&answers, &catalog);
        assert_eq!(report.by_category["wheelchair"].issues.len(), 1);
    }

    #[test]
    fn empty_trigger_list_is_always_positive() {
        let catalog = catalog(vec![question("q1", "Питання 1", &["wheelchair"], &[])]);
        let mut answers = AnswerSet::new();
        answers.record("q1", choice("Ні"));

        let report = compute_scores(&answers, &catalog);
        assert_eq!(report.by_category["wheelchair"].positive, 1);
    }

    #[test]
    fn opaque_answers_count_but_never_fail() {
        let catalog = catalog(vec![question("q1", "Питання 1", &["wheelchair"], &["5"])]);
        let mut answers = AnswerSet::new();
        answers.record("q1", AnswerValue::Opaque("5".to_string()));

        let report = compute_scores(&answers, &catalog);
        let wheelchair = &report.by_category["wheelchair"];
        assert_eq!(wheelchair.total, 1);
        assert_eq!(wheelchair.positive, 1);
    }

    #[test]
    fn unknown_category_ids_get_their_own_bucket() {
        let catalog = catalog(vec![question("q1", "Питання 1", &["guideDog"], &["Ні"])]);
        let mut answers = AnswerSet::new();
        answers.record("q1", choice("Ні"));

        let report = compute_scores(&answers, &catalog);
        assert_eq!(report.by_category["guideDog"].issues.len(), 1);
    }

    #[test]
    fn section_scores_follow_section_boundaries() {
        let catalog = catalog_in_sections(vec![
            (
                "section1",
                "Фізична доступність",
                vec![
                    question("q1", "Питання 1", &["wheelchair"], &["Ні"]),
                    question("q2", "Питання 2", &["wheelchair"], &["Ні"]),
                ],
            ),
            (
                "section2",
                "Інформаційна доступність",
                vec![question("q3", "Питання 3", &["stroller"], &["Ні"])],
            ),
        ]);
        let mut answers = AnswerSet::new();
        answers.record("q1", choice("Так"));
        answers.record("q2", choice("Ні"));
        answers.record("q3", choice("Так"));

        let report = compute_scores(&answers, &catalog);
        assert_eq!(report.by_section["section1"].score, 50);
        assert_eq!(report.by_section["section1"].title, "Фізична доступність");
        assert_eq!(report.by_section["section2"].score, 100);
    }

    #[test]
    fn level_thresholds_are_inclusive() {
        assert_eq!(ScoreLevel::from_score(0), ScoreLevel::Low);
        assert_eq!(ScoreLevel::from_score(49), ScoreLevel::Low);
        assert_eq!(ScoreLevel::from_score(50), ScoreLevel::Medium);
        assert_eq!(ScoreLevel::from_score(79), ScoreLevel::Medium);
        assert_eq!(ScoreLevel::from_score(80), ScoreLevel::High);
        assert_eq!(ScoreLevel::from_score(100), ScoreLevel::High);
    }

    #[test]
    fn completion_covers_all_questions() {
        let mut informational = question("q0", "Назва центру", &[], &[]);
        informational.accessibility = false;
        informational.kind = QuestionKind::FreeText;
        let catalog = catalog(vec![
            informational,
            question("q1", "Питання 1", &["wheelchair"], &["Ні"]),
            question("q2", "Питання 2", &["wheelchair"], &["Ні"]),
        ]);
        let mut answers = AnswerSet::new();
        answers.record("q0", AnswerValue::Text("Центр".to_string()));
        answers.record("q1", choice("Так"));

        let progress = completion(&answers, &catalog);
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.percentage, 67);

        let section = section_completion(&answers, &catalog, "section1").unwrap();
        assert_eq!(section.answered, 2);
        assert_eq!(section.total, 3);
        assert!(section_completion(&answers, &catalog, "missing").is_none());
    }

    #[test]
    fn catalog_validation_flags_duplicates_and_emptiness() {
        let empty = Catalog {
            sections: vec![],
            categories: vec![],
        };
        assert_eq!(empty.validate(), Err(SurveyError::EmptyCatalog));

        let duplicated = catalog(vec![
            question("q1", "Питання 1", &["wheelchair"], &["Ні"]),
            question("q1", "Питання 1 ще раз", &["stroller"], &["Ні"]),
        ]);
        assert_eq!(
            duplicated.validate(),
            Err(SurveyError::DuplicateQuestionId {
                id: "q1".to_string()
            })
        );

        let valid = catalog(vec![question("q1", "Питання 1", &["wheelchair"], &["Ні"])]);
        assert_eq!(valid.validate(), Ok(()));
    }

    #[test]
    fn answer_display_formats_every_shape() {
        assert_eq!(choice("Так").display(), "Так");
        assert_eq!(
            AnswerValue::ChoiceWithFollowup {
                main: "Ні".to_string(),
                followup: "немає місця".to_string(),
            }
            .display(),
            "Ні (немає місця)"
        );
        assert_eq!(
            AnswerValue::ChoiceWithFollowup {
                main: "Так".to_string(),
                followup: String::new(),
            }
            .display(),
            "Так"
        );
        assert_eq!(
            AnswerValue::Selections(vec!["Аудіо".to_string(), "Брайль".to_string()]).display(),
            "Аудіо, Брайль"
        );
        let mut rows = BTreeMap::new();
        rows.insert("Фізична".to_string(), "Так".to_string());
        rows.insert("Цифрова".to_string(), "Ні".to_string());
        assert_eq!(
            AnswerValue::Grid(rows).display(),
            "Фізична: Так; Цифрова: Ні"
        );
    }
}
