use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::quiz::{Quiz, QuizAttempt, QuizOption, QuizQuestion, QuizResult};
use crate::database::Database;
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::Role;
use crate::middleware::auth::AuthUser;
use crate::services::site_service::SiteService;
use crate::services::ServiceError;

#[derive(Debug, Deserialize)]
pub struct CreateQuiz {
    pub title: String,
    pub description: Option<String>,
    pub site_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuiz {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuestion {
    pub prompt: String,
    pub position: Option<i32>,
    pub options: Vec<CreateOption>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOption {
    pub label: String,
    pub is_correct: bool,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAttempt {
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerInput {
    pub question_id: Uuid,
    pub option_id: Uuid,
}

/// Option as shown to quiz takers: the answer key is only present for
/// the quiz owner and admins.
#[derive(Debug, Serialize)]
pub struct OptionView {
    pub id: Uuid,
    pub label: String,
    pub position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub prompt: String,
    pub position: i32,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<QuestionView>,
}

pub struct QuizService {
    pool: PgPool,
}

impl QuizService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = Database::pool().await?;
        Ok(Self { pool })
    }

    // ---- quiz management ----

    pub async fn create(&self, auth: &AuthUser, input: CreateQuiz) -> Result<Quiz, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::validation("Quiz title is required"));
        }

        if let Some(site_id) = input.site_id {
            let sites = SiteService::new().await?;
            if !sites.exists_active(site_id).await? {
                return Err(ServiceError::not_found("Heritage site not found"));
            }
        }

        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (site_id, title, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(input.site_id)
        .bind(input.title.trim())
        .bind(input.description.unwrap_or_default())
        .bind(auth.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(quiz)
    }

    pub async fn get(&self, auth: &AuthUser, id: Uuid) -> Result<Quiz, ServiceError> {
        let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Quiz not found"))?;

        if !quiz.is_published && !Self::can_manage(auth, &quiz) {
            return Err(ServiceError::not_found("Quiz not found"));
        }
        Ok(quiz)
    }

    pub async fn get_detail(&self, auth: &AuthUser, id: Uuid) -> Result<QuizDetail, ServiceError> {
        let quiz = self.get(auth, id).await?;
        let reveal_answers = Self::can_manage(auth, &quiz);

        let questions = sqlx::query_as::<_, QuizQuestion>(
            "SELECT * FROM quiz_questions WHERE quiz_id = $1 AND is_active ORDER BY position ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut views = Vec::with_capacity(questions.len());
        for question in questions {
            let options = sqlx::query_as::<_, QuizOption>(
                "SELECT * FROM quiz_options WHERE question_id = $1 ORDER BY position ASC",
            )
            .bind(question.id)
            .fetch_all(&self.pool)
            .await?;

            views.push(QuestionView {
                id: question.id,
                prompt: question.prompt,
                position: question.position,
                options: options
                    .into_iter()
                    .map(|o| OptionView {
                        id: o.id,
                        label: o.label,
                        position: o.position,
                        is_correct: reveal_answers.then_some(o.is_correct),
                    })
                    .collect(),
            });
        }

        Ok(QuizDetail { quiz, questions: views })
    }

    pub async fn list(
        &self,
        auth: &AuthUser,
        site_id: Option<Uuid>,
        params: PageParams,
    ) -> Result<Page<Quiz>, ServiceError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM quizzes WHERE is_active");
        let mut query = QueryBuilder::new("SELECT * FROM quizzes WHERE is_active");

        for builder in [&mut count, &mut query] {
            if let Some(site_id) = site_id {
                builder.push(" AND site_id = ").push_bind(site_id);
            }
            if auth.role < Role::Admin {
                builder
                    .push(" AND (is_published OR created_by = ")
                    .push_bind(auth.user_id)
                    .push(")");
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(params.limit());
        query.push(" OFFSET ");
        query.push_bind(params.offset());

        let items = query.build_query_as::<Quiz>().fetch_all(&self.pool).await?;

        Ok(Page::new(items, params, total))
    }

    pub async fn update(&self, auth: &AuthUser, id: Uuid, input: UpdateQuiz) -> Result<Quiz, ServiceError> {
        let quiz = self.require_manageable(auth, id).await?;

        let updated = sqlx::query_as::<_, Quiz>(
            r#"
            UPDATE quizzes
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(quiz.id)
        .bind(input.title)
        .bind(input.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Publishing freezes the quiz for editing and opens it for attempts.
    /// Requires at least one question, each with exactly one correct option.
    pub async fn publish(&self, auth: &AuthUser, id: Uuid) -> Result<Quiz, ServiceError> {
        let quiz = self.require_manageable(auth, id).await?;

        let questions = sqlx::query_as::<_, QuizQuestion>(
            "SELECT * FROM quiz_questions WHERE quiz_id = $1 AND is_active",
        )
        .bind(quiz.id)
        .fetch_all(&self.pool)
        .await?;

        if questions.is_empty() {
            return Err(ServiceError::validation("A quiz needs at least one question to publish"));
        }

        for question in &questions {
            let correct = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM quiz_options WHERE question_id = $1 AND is_correct",
            )
            .bind(question.id)
            .fetch_one(&self.pool)
            .await?;

            if correct != 1 {
                return Err(ServiceError::validation(format!(
                    "question '{}' must have exactly one correct option",
                    question.prompt
                )));
            }
        }

        let published = sqlx::query_as::<_, Quiz>(
            "UPDATE quizzes SET is_published = TRUE, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(quiz.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(published)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE quizzes SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("Quiz not found"));
        }
        Ok(())
    }

    // ---- questions ----

    pub async fn add_question(
        &self,
        auth: &AuthUser,
        quiz_id: Uuid,
        input: CreateQuestion,
    ) -> Result<QuestionView, ServiceError> {
        let quiz = self.require_manageable(auth, quiz_id).await?;
        validate_question(&input)?;

        let mut tx = self.pool.begin().await?;

        let question = sqlx::query_as::<_, QuizQuestion>(
            r#"
            INSERT INTO quiz_questions (quiz_id, prompt, position)
            VALUES ($1, $2, COALESCE($3,
                (SELECT COALESCE(MAX(position), 0) + 1 FROM quiz_questions WHERE quiz_id = $1)))
            RETURNING *
            "#,
        )
        .bind(quiz.id)
        .bind(input.prompt.trim())
        .bind(input.position)
        .fetch_one(&mut *tx)
        .await?;

        let mut options = Vec::with_capacity(input.options.len());
        for (index, option) in input.options.iter().enumerate() {
            let row = sqlx::query_as::<_, QuizOption>(
                r#"
                INSERT INTO quiz_options (question_id, label, is_correct, position)
                VALUES ($1, $2, $3, COALESCE($4, $5))
                RETURNING *
                "#,
            )
            .bind(question.id)
            .bind(option.label.trim())
            .bind(option.is_correct)
            .bind(option.position)
            .bind(index as i32)
            .fetch_one(&mut *tx)
            .await?;
            options.push(row);
        }

        tx.commit().await?;

        Ok(QuestionView {
            id: question.id,
            prompt: question.prompt,
            position: question.position,
            options: options
                .into_iter()
                .map(|o| OptionView {
                    id: o.id,
                    label: o.label,
                    position: o.position,
                    is_correct: Some(o.is_correct),
                })
                .collect(),
        })
    }

    /// Replaces the question's prompt and full option set.
    pub async fn update_question(
        &self,
        auth: &AuthUser,
        question_id: Uuid,
        input: CreateQuestion,
    ) -> Result<QuestionView, ServiceError> {
        let question = sqlx::query_as::<_, QuizQuestion>(
            "SELECT * FROM quiz_questions WHERE id = $1 AND is_active",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Question not found"))?;

        self.require_manageable(auth, question.quiz_id).await?;
        validate_question(&input)?;

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, QuizQuestion>(
            r#"
            UPDATE quiz_questions
            SET prompt = $2, position = COALESCE($3, position)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(question_id)
        .bind(input.prompt.trim())
        .bind(input.position)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM quiz_options WHERE question_id = $1")
            .bind(question_id)
            .execute(&mut *tx)
            .await?;

        let mut options = Vec::with_capacity(input.options.len());
        for (index, option) in input.options.iter().enumerate() {
            let row = sqlx::query_as::<_, QuizOption>(
                r#"
                INSERT INTO quiz_options (question_id, label, is_correct, position)
                VALUES ($1, $2, $3, COALESCE($4, $5))
                RETURNING *
                "#,
            )
            .bind(question_id)
            .bind(option.label.trim())
            .bind(option.is_correct)
            .bind(option.position)
            .bind(index as i32)
            .fetch_one(&mut *tx)
            .await?;
            options.push(row);
        }

        tx.commit().await?;

        Ok(QuestionView {
            id: updated.id,
            prompt: updated.prompt,
            position: updated.position,
            options: options
                .into_iter()
                .map(|o| OptionView {
                    id: o.id,
                    label: o.label,
                    position: o.position,
                    is_correct: Some(o.is_correct),
                })
                .collect(),
        })
    }

    pub async fn delete_question(&self, auth: &AuthUser, question_id: Uuid) -> Result<(), ServiceError> {
        let question = sqlx::query_as::<_, QuizQuestion>(
            "SELECT * FROM quiz_questions WHERE id = $1 AND is_active",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Question not found"))?;

        self.require_manageable(auth, question.quiz_id).await?;

        sqlx::query("UPDATE quiz_questions SET is_active = FALSE WHERE id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ---- attempts and scoring ----

    pub async fn start_attempt(&self, auth: &AuthUser, quiz_id: Uuid) -> Result<QuizAttempt, ServiceError> {
        let quiz = self.get(auth, quiz_id).await?;
        if !quiz.is_published {
            return Err(ServiceError::conflict("Quiz is not open for attempts"));
        }

        let open = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1 AND user_id = $2 AND completed_at IS NULL",
        )
        .bind(quiz_id)
        .bind(auth.user_id)
        .fetch_one(&self.pool)
        .await?;

        if open > 0 {
            return Err(ServiceError::conflict("An attempt is already in progress"));
        }

        let attempt = sqlx::query_as::<_, QuizAttempt>(
            "INSERT INTO quiz_attempts (quiz_id, user_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(quiz_id)
        .bind(auth.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(attempt)
    }

    /// Grade an open attempt: one point per question whose selected
    /// option is that question's correct answer. Unanswered questions
    /// score zero; answers for foreign questions are ignored.
    pub async fn submit_attempt(
        &self,
        auth: &AuthUser,
        attempt_id: Uuid,
        input: SubmitAttempt,
    ) -> Result<QuizResult, ServiceError> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(
            "SELECT * FROM quiz_attempts WHERE id = $1",
        )
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Attempt not found"))?;

        if attempt.user_id != auth.user_id {
            return Err(ServiceError::not_found("Attempt not found"));
        }
        if attempt.completed_at.is_some() {
            return Err(ServiceError::conflict("Attempt has already been submitted"));
        }

        let questions = sqlx::query_as::<_, QuizQuestion>(
            "SELECT * FROM quiz_questions WHERE quiz_id = $1 AND is_active",
        )
        .bind(attempt.quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let correct_options = sqlx::query_as::<_, QuizOption>(
            r#"
            SELECT o.* FROM quiz_options o
            JOIN quiz_questions q ON q.id = o.question_id
            WHERE q.quiz_id = $1 AND q.is_active AND o.is_correct
            "#,
        )
        .bind(attempt.quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let score = grade(&questions, &correct_options, &input.answers);
        let total = questions.len() as i32;

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE quiz_attempts SET completed_at = now() WHERE id = $1")
            .bind(attempt_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query_as::<_, QuizResult>(
            "INSERT INTO quiz_results (attempt_id, score, total) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(attempt_id)
        .bind(score)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result)
    }

    pub async fn own_results(&self, auth: &AuthUser, quiz_id: Uuid) -> Result<Vec<QuizResult>, ServiceError> {
        let rows = sqlx::query_as::<_, QuizResult>(
            r#"
            SELECT r.* FROM quiz_results r
            JOIN quiz_attempts a ON a.id = r.attempt_id
            WHERE a.quiz_id = $1 AND a.user_id = $2
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(quiz_id)
        .bind(auth.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// All results for a quiz: only the quiz owner and admins.
    pub async fn all_results(&self, auth: &AuthUser, quiz_id: Uuid) -> Result<Vec<QuizResult>, ServiceError> {
        let quiz = self.get(auth, quiz_id).await?;
        if !Self::can_manage(auth, &quiz) {
            return Err(ServiceError::forbidden("Only the quiz owner may view all results"));
        }

        let rows = sqlx::query_as::<_, QuizResult>(
            r#"
            SELECT r.* FROM quiz_results r
            JOIN quiz_attempts a ON a.id = r.attempt_id
            WHERE a.quiz_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    fn can_manage(auth: &AuthUser, quiz: &Quiz) -> bool {
        quiz.created_by == auth.user_id || auth.role >= Role::Admin
    }

    async fn require_manageable(&self, auth: &AuthUser, quiz_id: Uuid) -> Result<Quiz, ServiceError> {
        let quiz = self.get(auth, quiz_id).await?;
        if !Self::can_manage(auth, &quiz) {
            return Err(ServiceError::forbidden("Only the quiz owner may modify it"));
        }
        if quiz.is_published {
            return Err(ServiceError::conflict("Published quizzes cannot be modified"));
        }
        Ok(quiz)
    }
}

fn validate_question(input: &CreateQuestion) -> Result<(), ServiceError> {
    if input.prompt.trim().is_empty() {
        return Err(ServiceError::validation("Question prompt is required"));
    }
    if input.options.len() < 2 {
        return Err(ServiceError::validation("A question needs at least two options"));
    }
    if input.options.iter().filter(|o| o.is_correct).count() != 1 {
        return Err(ServiceError::validation("A question needs exactly one correct option"));
    }
    if input.options.iter().any(|o| o.label.trim().is_empty()) {
        return Err(ServiceError::validation("Option labels are required"));
    }
    Ok(())
}

/// Pure scoring over the loaded question/answer-key rows. First answer
/// per question wins; anything referencing an unknown question or option
/// is ignored.
fn grade(questions: &[QuizQuestion], correct_options: &[QuizOption], answers: &[AnswerInput]) -> i32 {
    let correct_by_question: HashMap<Uuid, Uuid> =
        correct_options.iter().map(|o| (o.question_id, o.id)).collect();

    let mut seen: HashMap<Uuid, Uuid> = HashMap::new();
    for answer in answers {
        seen.entry(answer.question_id).or_insert(answer.option_id);
    }

    questions
        .iter()
        .filter(|q| {
            matches!(
                (seen.get(&q.id), correct_by_question.get(&q.id)),
                (Some(selected), Some(correct)) if selected == correct
            )
        })
        .count() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: Uuid, quiz_id: Uuid) -> QuizQuestion {
        QuizQuestion { id, quiz_id, prompt: "q".into(), position: 0, is_active: true }
    }

    fn option(id: Uuid, question_id: Uuid, is_correct: bool) -> QuizOption {
        QuizOption { id, question_id, label: "o".into(), is_correct, position: 0 }
    }

    #[test]
    fn grading_counts_correct_answers() {
        let quiz_id = Uuid::new_v4();
        let (q1, q2) = (Uuid::new_v4(), Uuid::new_v4());
        let (right1, right2, wrong1) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let questions = vec![question(q1, quiz_id), question(q2, quiz_id)];
        let key = vec![option(right1, q1, true), option(right2, q2, true)];
        let _ = option(wrong1, q1, false);

        let answers = vec![
            AnswerInput { question_id: q1, option_id: right1 },
            AnswerInput { question_id: q2, option_id: wrong1 },
        ];
        assert_eq!(grade(&questions, &key, &answers), 1);
    }

    #[test]
    fn grading_ignores_duplicates_and_unknowns() {
        let quiz_id = Uuid::new_v4();
        let q1 = Uuid::new_v4();
        let right = Uuid::new_v4();
        let wrong = Uuid::new_v4();

        let questions = vec![question(q1, quiz_id)];
        let key = vec![option(right, q1, true)];

        // First answer wins; later correction does not count
        let answers = vec![
            AnswerInput { question_id: q1, option_id: wrong },
            AnswerInput { question_id: q1, option_id: right },
            AnswerInput { question_id: Uuid::new_v4(), option_id: right },
        ];
        assert_eq!(grade(&questions, &key, &answers), 0);
    }

    #[test]
    fn unanswered_questions_score_zero() {
        let quiz_id = Uuid::new_v4();
        let questions = vec![question(Uuid::new_v4(), quiz_id), question(Uuid::new_v4(), quiz_id)];
        assert_eq!(grade(&questions, &[], &[]), 0);
    }

    #[test]
    fn question_validation() {
        let bad = CreateQuestion {
            prompt: "What era?".into(),
            position: None,
            options: vec![
                CreateOption { label: "Bronze".into(), is_correct: true, position: None },
                CreateOption { label: "Iron".into(), is_correct: true, position: None },
            ],
        };
        assert!(validate_question(&bad).is_err());

        let good = CreateQuestion {
            prompt: "What era?".into(),
            position: None,
            options: vec![
                CreateOption { label: "Bronze".into(), is_correct: true, position: None },
                CreateOption { label: "Iron".into(), is_correct: false, position: None },
            ],
        };
        assert!(validate_question(&good).is_ok());
    }
}
