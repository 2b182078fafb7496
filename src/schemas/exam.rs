use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};
use validator::{Validate, ValidationError};

use crate::core::time::{format_primitive, to_primitive_utc};
use crate::db::models::{Answer, Exam, GradeBoundary, Question, Specialty};
use crate::db::types::PointValue;
use crate::services::composer::{ExamCreationFilter, ThemeFilter};
use crate::services::exam_creation::ExamDraft;

/// Themes are resolved by id alone; a display name sent alongside is ignored.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct ThemeRef {
    #[validate(length(min = 1, message = "theme id must not be empty"))]
    pub(crate) id: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct ThemeFilterCreate {
    #[validate(nested)]
    pub(crate) theme: ThemeRef,
    /// Requested question count per point value; missing values mean zero.
    #[serde(default)]
    pub(crate) counts: BTreeMap<PointValue, u32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct ExamCreationFilterCreate {
    #[serde(alias = "themeFilters")]
    #[validate(length(min = 1, message = "theme_filters must not be empty"), nested)]
    pub(crate) theme_filters: Vec<ThemeFilterCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SpecialtyRef {
    #[validate(length(min = 1, message = "specialty id must not be empty"))]
    pub(crate) id: String,
    pub(crate) name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeBoundaryCreate {
    #[validate(nested)]
    pub(crate) specialty: SpecialtyRef,
    #[serde(alias = "minScore")]
    #[validate(range(min = 0.0, message = "min_score must be non-negative"))]
    pub(crate) min_score: f64,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_schedule"))]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(alias = "startDate", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) start_date: OffsetDateTime,
    #[serde(alias = "endDate", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) end_date: OffsetDateTime,
    #[serde(alias = "timeToSolveMinutes")]
    #[validate(range(min = 1, message = "time_to_solve_minutes must be positive"))]
    pub(crate) time_to_solve_minutes: i32,
    #[validate(length(min = 1, message = "at least one filter is required"), nested)]
    pub(crate) filters: Vec<ExamCreationFilterCreate>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) boundaries: Vec<GradeBoundaryCreate>,
}

fn validate_schedule(exam: &ExamCreate) -> Result<(), ValidationError> {
    if exam.start_date > exam.end_date {
        let mut error = ValidationError::new("schedule");
        error.message = Some("end_date must not be before start_date".into());
        return Err(error);
    }
    Ok(())
}

impl From<ExamCreate> for ExamDraft {
    fn from(payload: ExamCreate) -> Self {
        let filters = payload
            .filters
            .into_iter()
            .map(|filter| ExamCreationFilter {
                theme_filters: filter
                    .theme_filters
                    .into_iter()
                    .map(|theme_filter| ThemeFilter {
                        theme_id: theme_filter.theme.id,
                        counts: theme_filter.counts,
                    })
                    .collect(),
            })
            .collect();

        let grade_boundaries = payload
            .boundaries
            .into_iter()
            .map(|boundary| GradeBoundary {
                specialty: Specialty { id: boundary.specialty.id, name: boundary.specialty.name },
                min_score: boundary.min_score,
            })
            .collect();

        ExamDraft {
            name: payload.name,
            start_date: to_primitive_utc(payload.start_date),
            end_date: to_primitive_utc(payload.end_date),
            time_to_solve_minutes: payload.time_to_solve_minutes,
            filters,
            grade_boundaries,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamCreatedResponse {
    pub(crate) exam_id: String,
    pub(crate) question_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct GradeBoundaryView {
    pub(crate) specialty: Specialty,
    pub(crate) min_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuestionView {
    pub(crate) id: String,
    pub(crate) theme_id: String,
    pub(crate) text: String,
    pub(crate) answers: Vec<Answer>,
    pub(crate) points: PointValue,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            theme_id: question.theme_id.clone(),
            text: question.text.clone(),
            answers: question.answers.clone(),
            points: question.points,
        }
    }
}

/// Exam header shared by every non-empty view; never carries creator or questions.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExamSummary {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) time_to_solve_minutes: i32,
    pub(crate) grade_boundaries: Vec<GradeBoundaryView>,
}

impl From<&Exam> for ExamSummary {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id.clone(),
            name: exam.name.clone(),
            start_date: format_primitive(exam.start_date),
            end_date: format_primitive(exam.end_date),
            time_to_solve_minutes: exam.time_to_solve_minutes,
            grade_boundaries: exam
                .grade_boundaries
                .iter()
                .map(|boundary| GradeBoundaryView {
                    specialty: boundary.specialty.clone(),
                    min_score: boundary.min_score,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminExamView {
    #[serde(flatten)]
    pub(crate) summary: ExamSummary,
    pub(crate) creator: String,
    pub(crate) questions: Vec<QuestionView>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherExamView {
    #[serde(flatten)]
    pub(crate) summary: ExamSummary,
    pub(crate) questions: Vec<QuestionView>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentExamView {
    #[serde(flatten)]
    pub(crate) summary: ExamSummary,
    /// `None` until the exam starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) questions: Option<Vec<QuestionView>>,
    pub(crate) has_submitted: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmptyExamView {}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum ExamView {
    Admin(AdminExamView),
    Teacher(TeacherExamView),
    Student(StudentExamView),
    Empty(EmptyExamView),
}

fn parse_offset_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // datetime-local inputs arrive without an offset; treat them as UTC.
    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value.assume_utc());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value.assume_utc());
    }

    None
}

fn deserialize_offset_datetime_flexible<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_offset_datetime_flexible(&raw)
        .ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}")))
}
