use std::collections::{HashMap, HashSet};

use crate::db::models::Question;
use crate::db::types::PointValue;

/// Per-request index of candidate questions keyed by (theme, point value).
#[derive(Debug, Default)]
pub(crate) struct QuestionPool {
    themes: HashMap<String, HashMap<PointValue, Vec<Question>>>,
}

impl QuestionPool {
    /// Indexes `questions`, keeping the first copy of any repeated question id.
    pub(crate) fn build(questions: impl IntoIterator<Item = Question>) -> Self {
        let mut seen = HashSet::new();
        let mut themes: HashMap<String, HashMap<PointValue, Vec<Question>>> = HashMap::new();

        for question in questions {
            if !seen.insert(question.id.clone()) {
                continue;
            }
            themes
                .entry(question.theme_id.clone())
                .or_default()
                .entry(question.points)
                .or_default()
                .push(question);
        }

        Self { themes }
    }

    pub(crate) fn get(&self, theme_id: &str, points: PointValue) -> &[Question] {
        self.themes
            .get(theme_id)
            .and_then(|by_points| by_points.get(&points))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn len(&self) -> usize {
        self.themes.values().flat_map(HashMap::values).map(Vec::len).sum()
    }
}
