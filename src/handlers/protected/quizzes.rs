use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::quiz::{Quiz, QuizAttempt, QuizResult};
use crate::domain::pagination::{Page, PageParams};
use crate::domain::rbac::{self, Action, Resource};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::quiz_service::{
    CreateQuestion, CreateQuiz, QuestionView, QuizDetail, QuizService, SubmitAttempt, UpdateQuiz,
};

#[derive(Debug, Deserialize)]
pub struct QuizListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub site_id: Option<Uuid>,
}

/// GET /api/quizzes - Published quizzes, plus the caller's own drafts.
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<QuizListQuery>,
) -> ApiResult<Page<Quiz>> {
    rbac::require(auth.role, Resource::Quizzes, Action::Read)?;

    let params = PageParams { page: query.page, limit: query.limit };
    let service = QuizService::new().await?;
    let page = service.list(&auth, query.site_id, params).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/quizzes
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateQuiz>,
) -> ApiResult<Quiz> {
    rbac::require(auth.role, Resource::Quizzes, Action::Create)?;

    let service = QuizService::new().await?;
    let quiz = service.create(&auth, payload).await?;
    Ok(ApiResponse::created(quiz))
}

/// GET /api/quizzes/:id - Quiz with questions and options. The answer
/// key is only included for the owner and admins.
pub async fn get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<QuizDetail> {
    rbac::require(auth.role, Resource::Quizzes, Action::Read)?;

    let service = QuizService::new().await?;
    let detail = service.get_detail(&auth, id).await?;
    Ok(ApiResponse::success(detail))
}

/// PUT /api/quizzes/:id - Owner edits while unpublished.
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuiz>,
) -> ApiResult<Quiz> {
    rbac::require(auth.role, Resource::Quizzes, Action::Update)?;

    let service = QuizService::new().await?;
    let quiz = service.update(&auth, id, payload).await?;
    Ok(ApiResponse::success(quiz))
}

/// POST /api/quizzes/:id/publish
pub async fn publish(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Quiz> {
    rbac::require(auth.role, Resource::Quizzes, Action::Publish)?;

    let service = QuizService::new().await?;
    let quiz = service.publish(&auth, id).await?;
    Ok(ApiResponse::success(quiz))
}

/// DELETE /api/quizzes/:id - Soft delete (admin).
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    rbac::require(auth.role, Resource::Quizzes, Action::Delete)?;

    let service = QuizService::new().await?;
    service.soft_delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /api/quizzes/:id/questions
pub async fn add_question(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateQuestion>,
) -> ApiResult<QuestionView> {
    rbac::require(auth.role, Resource::Quizzes, Action::Update)?;

    let service = QuizService::new().await?;
    let question = service.add_question(&auth, id, payload).await?;
    Ok(ApiResponse::created(question))
}

/// PUT /api/quizzes/questions/:id - Replace prompt and option set.
pub async fn update_question(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateQuestion>,
) -> ApiResult<QuestionView> {
    rbac::require(auth.role, Resource::Quizzes, Action::Update)?;

    let service = QuizService::new().await?;
    let question = service.update_question(&auth, id, payload).await?;
    Ok(ApiResponse::success(question))
}

/// DELETE /api/quizzes/questions/:id
pub async fn delete_question(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    rbac::require(auth.role, Resource::Quizzes, Action::Update)?;

    let service = QuizService::new().await?;
    service.delete_question(&auth, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /api/quizzes/:id/attempts - Start an attempt.
pub async fn start_attempt(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<QuizAttempt> {
    rbac::require(auth.role, Resource::QuizAttempts, Action::Create)?;

    let service = QuizService::new().await?;
    let attempt = service.start_attempt(&auth, id).await?;
    Ok(ApiResponse::created(attempt))
}

/// POST /api/quizzes/attempts/:id/submit - Grade and close an attempt.
pub async fn submit_attempt(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAttempt>,
) -> ApiResult<QuizResult> {
    rbac::require(auth.role, Resource::QuizAttempts, Action::Create)?;

    let service = QuizService::new().await?;
    let result = service.submit_attempt(&auth, id, payload).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/quizzes/:id/results - Caller's own results.
pub async fn own_results(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<QuizResult>> {
    rbac::require(auth.role, Resource::QuizAttempts, Action::Read)?;

    let service = QuizService::new().await?;
    let results = service.own_results(&auth, id).await?;
    Ok(ApiResponse::success(results))
}

/// GET /api/quizzes/:id/results/all - Every result (owner or admin).
pub async fn all_results(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<QuizResult>> {
    rbac::require(auth.role, Resource::QuizAttempts, Action::Read)?;

    let service = QuizService::new().await?;
    let results = service.all_results(&auth, id).await?;
    Ok(ApiResponse::success(results))
}
