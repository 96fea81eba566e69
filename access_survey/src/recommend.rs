use log::{debug, warn};

use std::collections::BTreeMap;

use crate::catalog::{Catalog, CategoryScore, Question, ScoreLevel};

/// Urgency tier of a recommendation. The tier is a function of the owning
/// category's score, not of the individual issue: every issue of a badly
/// scoring category is urgent.
///
/// The variant order is the sort order, most urgent first.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub enum Priority {
    Critical,
    Important,
    Recommended,
}

impl Priority {
    pub fn from_score(score: u32) -> Priority {
        if score < 50 {
            Priority::Critical
        } else if score < 80 {
            Priority::Important
        } else {
            Priority::Recommended
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Critical => "Критично",
            Priority::Important => "Важливо",
            Priority::Recommended => "Рекомендовано",
        }
    }
}

/// One remediation entry, derived from exactly one issue.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Recommendation {
    pub priority: Priority,
    /// Title of the section the offending question belongs to.
    pub area: String,
    /// The offending question's text.
    pub issue: String,
    /// The current answer, formatted for display.
    pub current_state: String,
    /// Generated remediation guidance.
    pub advice: String,
    /// The question's explanatory note, empty when it has none.
    pub explanation: String,
}

/// All recommendations for one category, worst categories sorted first.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CategoryRecommendations {
    pub category_id: String,
    pub category_name: String,
    pub score: u32,
    pub level: ScoreLevel,
    pub issue_count: usize,
    pub recommendations: Vec<Recommendation>,
}

/// A recommendation tagged with its category name, as used by the top
/// priorities summary.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SummaryRecommendation {
    pub category_name: String,
    pub recommendation: Recommendation,
}

/// How many entries the top priorities summary keeps.
const SUMMARY_LIMIT: usize = 5;

// The remediation rule table: ordered, first match wins, matched against the
// lowercased question text. The guidance texts cite the Ukrainian building
// norms (ДБН) and related standards; they are data and can be localized
// without touching the dispatch.
const REMEDIATION_RULES: &[(&[&str], &str)] = &[
    (
        &["пандус"],
        "Встановіть нормативний пандус з поручнями відповідно до ДБН В.2.2-17:2006. Кут нахилу не більше 4,5°, ширина мінімум 1,2 м.",
    ),
    (
        &["двер", "вхід"],
        "Забезпечте мінімальну ширину дверних прорізів 90 см. Встановіть дверні ручки натискного типу на висоті 80-110 см.",
    ),
    (
        &["поручн"],
        "Встановіть поручні на висоті 0,7 та 0,9 м з обох сторін. Поручні мають бути круглими (діаметр 40-45 мм), контрастного кольору.",
    ),
    (
        &["освітлен"],
        "Забезпечте достатнє освітлення (мінімум 200 люкс) у всіх зонах. Уникайте бліків та різких тіней.",
    ),
    (
        &["табличк", "навігац"],
        "Розмістіть контрастні таблички на висоті 1,5 м. Дублюйте інформацію шрифтом Брайля та піктограмами.",
    ),
    (
        &["брайл"],
        "Додайте тактильні таблички зі шрифтом Брайля до всіх інформаційних елементів відповідно до ДСТУ ISO 17049:2016.",
    ),
    (
        &["піктограм", "іконк"],
        "Використовуйте універсальні піктограми відповідно до ISO 7001. Розмір піктограм мінімум 10x10 см.",
    ),
    (
        &["контраст"],
        "Забезпечте коефіцієнт контрастності мінімум 4,5:1 для тексту та 3:1 для великих елементів (WCAG 2.1 AA).",
    ),
    (
        &["сурдоперекладач", "слух"],
        "Організуйте послуги сурдоперекладача або відеозв'язок з сурдоперекладачем для заходів.",
    ),
    (
        &["англійськ", "мов"],
        "Додайте англомовний переклад до всієї ключової інформації (вивіски, правила, програми).",
    ),
    (
        &["туалет", "санвузол"],
        "Обладнайте мінімум один санвузол для людей з інвалідністю: простір 1,8x2,2 м, поручні, дзеркало на висоті 90 см.",
    ),
    (
        &["паркування", "паркомісц"],
        "Виділіть 10% паркомісць (мінімум 1) для людей з інвалідністю. Розмір: 3,5x5 м, розмітка синім кольором, знак 6.3.1.",
    ),
];

const GENERIC_REMEDIATION: &str = "Впровадьте зміни відповідно до ДБН В.2.2-17:2006 та Конвенції про права осіб з інвалідністю. Проконсультуйтеся з експертами з доступності.";

/// Builds the ranked remediation list from the per-category scores.
///
/// Categories without issues produce no group. Groups are ordered by
/// ascending score, worst first; within a group the issues keep their
/// discovery order, which follows the catalog. An issue whose question id is
/// missing from the catalog is skipped silently rather than failing the
/// batch.
pub fn generate_recommendations(
    by_category: &BTreeMap<String, CategoryScore>,
    catalog: &Catalog,
) -> Vec<CategoryRecommendations> {
    let mut groups: Vec<CategoryRecommendations> = Vec::new();

    for (category_id, score_data) in by_category {
        if score_data.issues.is_empty() {
            continue;
        }
        let priority = Priority::from_score(score_data.score);
        let mut recommendations: Vec<Recommendation> = Vec::new();
        for issue in &score_data.issues {
            let question = match catalog.question(&issue.question_id) {
                Some(q) => q,
                None => {
                    warn!(
                        "generate_recommendations: issue references unknown question {}",
                        issue.question_id
                    );
                    continue;
                }
            };
            recommendations.push(Recommendation {
                priority,
                area: issue.section_title.clone(),
                issue: issue.question_text.clone(),
                current_state: issue.answer.display(),
                advice: remediation_text(question),
                explanation: question.explanation.clone().unwrap_or_default(),
            });
        }
        debug!(
            "generate_recommendations: category {}: {} issues",
            category_id,
            score_data.issues.len()
        );
        groups.push(CategoryRecommendations {
            category_id: category_id.clone(),
            category_name: catalog.category_name(category_id).to_string(),
            score: score_data.score,
            level: score_data.level,
            issue_count: score_data.issues.len(),
            recommendations,
        });
    }

    // Worst categories first. The sort is stable, so equal scores keep the
    // category-id order of the input map.
    groups.sort_by_key(|g| g.score);
    groups
}

/// Remediation guidance for a question, keyword-matched against its text.
pub fn remediation_text(question: &Question) -> String {
    let text = question.text.to_lowercase();
    for (keywords, advice) in REMEDIATION_RULES {
        if keywords.iter().any(|keyword| text.contains(keyword)) {
            return (*advice).to_string();
        }
    }
    GENERIC_REMEDIATION.to_string()
}

/// Flattens all groups into the top priorities list: most urgent tiers
/// first, ties keeping their group order, capped at five entries. This feeds
/// a summary view; the exhaustive report is the groups themselves.
pub fn summary_recommendations(groups: &[CategoryRecommendations]) -> Vec<SummaryRecommendation> {
    let mut entries: Vec<SummaryRecommendation> = groups
        .iter()
        .flat_map(|group| {
            group.recommendations.iter().map(|r| SummaryRecommendation {
                category_name: group.category_name.clone(),
                recommendation: r.clone(),
            })
        })
        .collect();
    entries.sort_by_key(|e| e.recommendation.priority);
    entries.truncate(SUMMARY_LIMIT);
    entries
}
