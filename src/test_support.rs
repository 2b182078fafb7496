use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, OnceLock};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use time::{Duration, PrimitiveDateTime};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::{config::Settings, security, state::AppState, time::primitive_now_utc};
use crate::db::models::{Answer, Exam, NewExam, Question, Specialty, Student, Subject, Theme};
use crate::db::types::PointValue;
use crate::services::catalog::{
    CatalogError, ExamCatalog, Page, QuestionBank, QuestionChanges, QuestionDraft,
};
use crate::services::composer::ThemeFilter;

const TEST_SECRET_KEY: &str = "test-secret";
const TEST_DATABASE_URL_VAR: &str = "EXAM_SERVICE_TEST_DATABASE_URL";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) catalog: Arc<MemoryCatalog>,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("EXAM_SERVICE_ENV", "test");
    std::env::set_var("EXAM_SERVICE_STRICT_CONFIG", "0");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("ALGORITHM", "HS256");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::set_var("MAX_QUESTIONS_PER_EXAM", "50");
    std::env::remove_var("API_V1_STR");
}

/// Router wired to a fresh in-memory catalog.
pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let catalog = Arc::new(MemoryCatalog::default());
    let state = AppState::new(settings, catalog.clone(), catalog.clone());
    let app = api::router::router(state.clone());

    TestContext { state, app, catalog, _guard: guard }
}

/// Migrated, empty schema on the database named by `EXAM_SERVICE_TEST_DATABASE_URL`.
/// `None` when the variable is unset; Postgres-backed tests return early then.
pub(crate) async fn prepare_db() -> Option<(OwnedMutexGuard<()>, PgPool)> {
    let Some(url) = std::env::var(TEST_DATABASE_URL_VAR).ok().filter(|url| !url.trim().is_empty())
    else {
        eprintln!("{TEST_DATABASE_URL_VAR} is not set, skipping Postgres test");
        return None;
    };

    let guard = env_lock().await;
    let pool = PgPoolOptions::new().max_connections(2).connect(&url).await.expect("db pool");
    reset_public_schema(&pool).await.expect("reset schema");
    crate::db::run_migrations(&pool).await.expect("migrations");
    Some((guard, pool))
}

async fn reset_public_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("DROP SCHEMA IF EXISTS public CASCADE").execute(pool).await?;
    sqlx::query("CREATE SCHEMA public").execute(pool).await?;
    Ok(())
}

pub(crate) fn bearer_token(account_id: &str, roles: &[&str], settings: &Settings) -> String {
    security::create_access_token(account_id, roles, settings, Duration::minutes(30))
        .expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}

pub(crate) fn question(id: &str, theme_id: &str, points: i64) -> Question {
    let now = primitive_now_utc();
    Question {
        id: id.to_string(),
        theme_id: theme_id.to_string(),
        text: format!("Question {id}"),
        answers: vec![
            Answer { id: format!("{id}-a"), text: "first".to_string() },
            Answer { id: format!("{id}-b"), text: "second".to_string() },
        ],
        points: PointValue::try_from(points).expect("point value"),
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn theme_filter(theme_id: &str, counts: &[(i64, u32)]) -> ThemeFilter {
    ThemeFilter {
        theme_id: theme_id.to_string(),
        counts: counts
            .iter()
            .map(|(points, count)| (PointValue::try_from(*points).expect("point value"), *count))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// A stored-looking exam with two questions, lasting two hours from `start`.
pub(crate) fn exam_starting_at(start: PrimitiveDateTime) -> Exam {
    Exam {
        id: Uuid::new_v4().to_string(),
        name: "Fixture exam".to_string(),
        start_date: start,
        end_date: start + Duration::hours(2),
        time_to_solve_minutes: 60,
        questions: vec![question("fx-1", "T", 1), question("fx-2", "T", 5)],
        creator: "creator-1".to_string(),
        grade_boundaries: Vec::new(),
        created_at: primitive_now_utc(),
    }
}

#[derive(Default)]
struct MemoryState {
    subjects: Vec<Subject>,
    themes: Vec<Theme>,
    questions: Vec<Question>,
    specialties: Vec<Specialty>,
    students: Vec<Student>,
    submissions: HashSet<(String, String)>,
    exams: Vec<Exam>,
    theme_fetches: Vec<String>,
    failing_themes: HashSet<String>,
}

/// In-memory stand-in for the Postgres store.
#[derive(Default)]
pub(crate) struct MemoryCatalog {
    state: StdMutex<MemoryState>,
}

impl MemoryCatalog {
    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut state = self.state.lock().expect("memory catalog lock");
        f(&mut state)
    }

    pub(crate) fn add_subject(&self, id: &str, name: &str) {
        self.with_state(|state| {
            state.subjects.push(Subject { id: id.to_string(), name: name.to_string() })
        });
    }

    pub(crate) fn add_theme(&self, id: &str, subject_id: &str, name: &str) {
        self.with_state(|state| {
            state.themes.push(Theme {
                id: id.to_string(),
                subject_id: subject_id.to_string(),
                name: name.to_string(),
            })
        });
    }

    pub(crate) fn add_question(&self, question: Question) {
        self.with_state(|state| state.questions.push(question));
    }

    pub(crate) fn add_specialty(&self, id: &str, name: &str) {
        self.with_state(|state| {
            state.specialties.push(Specialty { id: id.to_string(), name: name.to_string() })
        });
    }

    pub(crate) fn add_student(&self, id: &str, account_id: &str, specialty_id: &str) {
        self.with_state(|state| {
            state.students.push(Student {
                id: id.to_string(),
                account_id: account_id.to_string(),
                specialty_id: specialty_id.to_string(),
            })
        });
    }

    pub(crate) fn add_submission(&self, exam_id: &str, student_id: &str) {
        self.with_state(|state| {
            state.submissions.insert((exam_id.to_string(), student_id.to_string()));
        });
    }

    pub(crate) fn add_exam(&self, exam: Exam) {
        self.with_state(|state| state.exams.push(exam));
    }

    pub(crate) fn fail_theme(&self, theme_id: &str) {
        self.with_state(|state| {
            state.failing_themes.insert(theme_id.to_string());
        });
    }

    pub(crate) fn theme_fetches(&self) -> Vec<String> {
        self.with_state(|state| state.theme_fetches.clone())
    }

    pub(crate) fn exam_count(&self) -> usize {
        self.with_state(|state| state.exams.len())
    }
}

#[async_trait]
impl ExamCatalog for MemoryCatalog {
    async fn questions_by_theme(&self, theme_id: &str) -> Result<Vec<Question>, CatalogError> {
        self.with_state(|state| {
            state.theme_fetches.push(theme_id.to_string());
            if state.failing_themes.contains(theme_id) {
                return Err(CatalogError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(state.questions.iter().filter(|q| q.theme_id == theme_id).cloned().collect())
        })
    }

    async fn all_specialties(&self) -> Result<Vec<Specialty>, CatalogError> {
        Ok(self.with_state(|state| state.specialties.clone()))
    }

    async fn student_for_account(
        &self,
        account_id: &str,
    ) -> Result<Option<Student>, CatalogError> {
        Ok(self.with_state(|state| {
            state.students.iter().find(|student| student.account_id == account_id).cloned()
        }))
    }

    async fn has_student_submitted(
        &self,
        exam_id: &str,
        student_id: &str,
    ) -> Result<bool, CatalogError> {
        Ok(self.with_state(|state| {
            state.submissions.contains(&(exam_id.to_string(), student_id.to_string()))
        }))
    }

    async fn persist_exam(&self, exam: &NewExam) -> Result<String, CatalogError> {
        let id = Uuid::new_v4().to_string();
        let stored = Exam::from_new(id.clone(), exam.clone(), primitive_now_utc());
        self.with_state(|state| state.exams.push(stored));
        Ok(id)
    }

    async fn find_exam(&self, exam_id: &str) -> Result<Option<Exam>, CatalogError> {
        Ok(self.with_state(|state| state.exams.iter().find(|exam| exam.id == exam_id).cloned()))
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, CatalogError> {
        Ok(self.with_state(|state| {
            let mut exams = state.exams.clone();
            exams.sort_by(|a, b| a.start_date.cmp(&b.start_date));
            exams
        }))
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

#[async_trait]
impl QuestionBank for MemoryCatalog {
    async fn list_questions(
        &self,
        theme_id: Option<&str>,
        page: Page,
    ) -> Result<(Vec<Question>, i64), CatalogError> {
        Ok(self.with_state(|state| {
            let matching: Vec<&Question> = state
                .questions
                .iter()
                .filter(|q| theme_id.map_or(true, |theme| q.theme_id == theme))
                .collect();
            let total = matching.len() as i64;
            let items = matching
                .into_iter()
                .skip(page.skip as usize)
                .take(page.limit as usize)
                .cloned()
                .collect();
            (items, total)
        }))
    }

    async fn find_question(&self, id: &str) -> Result<Option<Question>, CatalogError> {
        Ok(self.with_state(|state| state.questions.iter().find(|q| q.id == id).cloned()))
    }

    async fn create_question(&self, draft: QuestionDraft) -> Result<Question, CatalogError> {
        let now = primitive_now_utc();
        let question = Question {
            id: Uuid::new_v4().to_string(),
            theme_id: draft.theme_id,
            text: draft.text,
            answers: answers_from(draft.answers),
            points: draft.points,
            created_at: now,
            updated_at: now,
        };
        self.with_state(|state| state.questions.push(question.clone()));
        Ok(question)
    }

    async fn update_question(
        &self,
        id: &str,
        changes: QuestionChanges,
    ) -> Result<Option<Question>, CatalogError> {
        Ok(self.with_state(|state| {
            let question = state.questions.iter_mut().find(|q| q.id == id)?;
            if let Some(text) = changes.text {
                question.text = text;
            }
            if let Some(answers) = changes.answers {
                question.answers = answers_from(answers);
            }
            if let Some(points) = changes.points {
                question.points = points;
            }
            question.updated_at = primitive_now_utc();
            Some(question.clone())
        }))
    }

    async fn delete_question(&self, id: &str) -> Result<Option<Question>, CatalogError> {
        self.with_state(|state| {
            let referenced = state
                .exams
                .iter()
                .any(|exam| exam.questions.iter().any(|question| question.id == id));
            if referenced {
                return Err(CatalogError::InUse(format!("question {id}")));
            }
            let position = state.questions.iter().position(|q| q.id == id);
            Ok(position.map(|index| state.questions.remove(index)))
        })
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, CatalogError> {
        Ok(self.with_state(|state| state.subjects.clone()))
    }

    async fn list_themes(&self) -> Result<Vec<Theme>, CatalogError> {
        Ok(self.with_state(|state| state.themes.clone()))
    }

    async fn find_theme(&self, id: &str) -> Result<Option<Theme>, CatalogError> {
        Ok(self.with_state(|state| state.themes.iter().find(|theme| theme.id == id).cloned()))
    }

    async fn create_theme(&self, subject_id: &str, name: &str) -> Result<Theme, CatalogError> {
        let theme = Theme {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.to_string(),
            name: name.to_string(),
        };
        self.with_state(|state| state.themes.push(theme.clone()));
        Ok(theme)
    }

    async fn find_subject(&self, id: &str) -> Result<Option<Subject>, CatalogError> {
        Ok(self.with_state(|state| state.subjects.iter().find(|subject| subject.id == id).cloned()))
    }
}

fn answers_from(texts: Vec<String>) -> Vec<Answer> {
    texts.into_iter().map(|text| Answer { id: Uuid::new_v4().to_string(), text }).collect()
}
