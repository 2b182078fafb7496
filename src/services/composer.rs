//! Turns declarative theme filters into a concrete question list.
//!
//! Walks filters, then theme filters, then point values in [`POINT_VALUES`]
//! order. The first shortfall aborts composition; nothing partial escapes.
//! A question drawn once is never offered again, so a theme referenced by
//! several filters still yields distinct questions.
//!
//! [`POINT_VALUES`]: crate::db::types::POINT_VALUES

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use thiserror::Error;

use crate::db::models::Question;
use crate::db::types::PointValue;
use crate::services::question_pool::QuestionPool;
use crate::services::sampler;

/// How many questions of each point value to draw from one theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ThemeFilter {
    pub(crate) theme_id: String,
    pub(crate) counts: BTreeMap<PointValue, u32>,
}

impl ThemeFilter {
    pub(crate) fn requested(&self, points: PointValue) -> u32 {
        self.counts.get(&points).copied().unwrap_or(0)
    }

    fn total(&self) -> u64 {
        self.counts.values().map(|count| u64::from(*count)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExamCreationFilter {
    pub(crate) theme_filters: Vec<ThemeFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "theme {theme_id} has {available} questions worth {point_value} points, {requested} requested"
)]
pub(crate) struct InsufficientQuestions {
    pub(crate) theme_id: String,
    pub(crate) point_value: PointValue,
    pub(crate) requested: u32,
    pub(crate) available: usize,
}

pub(crate) fn total_requested(filters: &[ExamCreationFilter]) -> u64 {
    filters.iter().flat_map(|filter| &filter.theme_filters).map(ThemeFilter::total).sum()
}

pub(crate) fn compose(
    filters: &[ExamCreationFilter],
    pool: &QuestionPool,
) -> Result<Vec<Question>, InsufficientQuestions> {
    compose_with(filters, pool, &mut rand::thread_rng())
}

pub(crate) fn compose_with<R: Rng + ?Sized>(
    filters: &[ExamCreationFilter],
    pool: &QuestionPool,
    rng: &mut R,
) -> Result<Vec<Question>, InsufficientQuestions> {
    let mut composed: Vec<Question> = Vec::new();
    let mut drawn: HashSet<&str> = HashSet::new();

    for theme_filter in filters.iter().flat_map(|filter| &filter.theme_filters) {
        for points in PointValue::all() {
            let requested = theme_filter.requested(points);
            if requested == 0 {
                continue;
            }

            let available: Vec<&Question> = pool
                .get(&theme_filter.theme_id, points)
                .iter()
                .filter(|question| !drawn.contains(question.id.as_str()))
                .collect();
            if available.len() < requested as usize {
                return Err(InsufficientQuestions {
                    theme_id: theme_filter.theme_id.clone(),
                    point_value: points,
                    requested,
                    available: available.len(),
                });
            }

            for question in sampler::sample_with(&available, requested as usize, rng) {
                drawn.insert(question.id.as_str());
                composed.push(question.clone());
            }
        }
    }

    Ok(composed)
}
