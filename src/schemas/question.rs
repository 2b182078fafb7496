use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Answer, Question};
use crate::db::types::PointValue;
use crate::services::catalog::{QuestionChanges, QuestionDraft};

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionListQuery {
    #[serde(default, alias = "themeId")]
    pub(crate) theme_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "themeId")]
    #[validate(length(min = 1, message = "theme_id must not be empty"))]
    pub(crate) theme_id: String,
    #[validate(length(min = 1, max = 4000, message = "text must be 1-4000 characters"))]
    pub(crate) text: String,
    #[validate(length(min = 1, message = "at least one answer is required"))]
    pub(crate) answers: Vec<String>,
    pub(crate) points: PointValue,
}

impl From<QuestionCreate> for QuestionDraft {
    fn from(payload: QuestionCreate) -> Self {
        QuestionDraft {
            theme_id: payload.theme_id,
            text: payload.text,
            answers: payload.answers,
            points: payload.points,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 4000, message = "text must be 1-4000 characters"))]
    pub(crate) text: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one answer is required"))]
    pub(crate) answers: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) points: Option<PointValue>,
}

impl From<QuestionUpdate> for QuestionChanges {
    fn from(payload: QuestionUpdate) -> Self {
        QuestionChanges { text: payload.text, answers: payload.answers, points: payload.points }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) theme_id: String,
    pub(crate) text: String,
    pub(crate) answers: Vec<Answer>,
    pub(crate) points: PointValue,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Question> for QuestionResponse {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            theme_id: question.theme_id,
            text: question.text,
            answers: question.answers,
            points: question.points,
            created_at: format_primitive(question.created_at),
            updated_at: format_primitive(question.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ThemeCreate {
    #[serde(alias = "subjectId")]
    #[validate(length(min = 1, message = "subject_id must not be empty"))]
    pub(crate) subject_id: String,
    #[validate(length(min = 1, max = 128, message = "name must be 1-128 characters"))]
    pub(crate) name: String,
}

