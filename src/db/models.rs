use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::PointValue;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Subject {
    pub(crate) id: String,
    pub(crate) name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Theme {
    pub(crate) id: String,
    pub(crate) subject_id: String,
    pub(crate) name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Answer {
    pub(crate) id: String,
    pub(crate) text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) theme_id: String,
    pub(crate) text: String,
    pub(crate) answers: Vec<Answer>,
    pub(crate) points: PointValue,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub(crate) struct Specialty {
    pub(crate) id: String,
    pub(crate) name: String,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) specialty_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradeBoundary {
    pub(crate) specialty: Specialty,
    pub(crate) min_score: f64,
}

/// A composed exam that has not been stored yet.
#[derive(Debug, Clone)]
pub(crate) struct NewExam {
    pub(crate) name: String,
    pub(crate) start_date: PrimitiveDateTime,
    pub(crate) end_date: PrimitiveDateTime,
    pub(crate) time_to_solve_minutes: i32,
    pub(crate) questions: Vec<Question>,
    pub(crate) creator: String,
    pub(crate) grade_boundaries: Vec<GradeBoundary>,
}

#[derive(Debug, Clone)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_date: PrimitiveDateTime,
    pub(crate) end_date: PrimitiveDateTime,
    pub(crate) time_to_solve_minutes: i32,
    pub(crate) questions: Vec<Question>,
    pub(crate) creator: String,
    pub(crate) grade_boundaries: Vec<GradeBoundary>,
    pub(crate) created_at: PrimitiveDateTime,
}

impl Exam {
    pub(crate) fn from_new(id: String, exam: NewExam, created_at: PrimitiveDateTime) -> Self {
        Self {
            id,
            name: exam.name,
            start_date: exam.start_date,
            end_date: exam.end_date,
            time_to_solve_minutes: exam.time_to_solve_minutes,
            questions: exam.questions,
            creator: exam.creator,
            grade_boundaries: exam.grade_boundaries,
            created_at,
        }
    }

    pub(crate) fn has_started(&self, now: PrimitiveDateTime) -> bool {
        now >= self.start_date
    }

    pub(crate) fn has_ended(&self, now: PrimitiveDateTime) -> bool {
        self.end_date < now
    }
}
