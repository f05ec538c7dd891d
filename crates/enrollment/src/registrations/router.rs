use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ExamDraft, ExamId, OutcomePatch, Professor, ProfessorId, RegistrationId, Student,
    StudentDraft, StudentId, SubjectDraft, SubjectId,
};
use super::repository::{EnrollmentStore, StoreError};
use super::service::{EnrollmentError, EnrollmentService};

/// Header carrying the authenticated student id, set by the upstream identity layer.
pub const STUDENT_HEADER: &str = "x-student-id";
/// Header carrying the authenticated professor id, set by the upstream identity layer.
pub const PROFESSOR_HEADER: &str = "x-professor-id";

type SharedService<S> = State<Arc<EnrollmentService<S>>>;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) exam_id: ExamId,
}

/// Router builder exposing the registration lifecycle and catalog endpoints.
pub fn registration_router<S>(service: Arc<EnrollmentService<S>>) -> Router
where
    S: EnrollmentStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/me/registrations",
            post(register_handler::<S>).get(my_registrations_handler::<S>),
        )
        .route("/api/v1/me/transcript", get(transcript_handler::<S>))
        .route("/api/v1/me/subjects", get(available_subjects_handler::<S>))
        .route("/api/v1/me/exams", get(available_exams_handler::<S>))
        .route(
            "/api/v1/registrations",
            get(professor_registrations_handler::<S>),
        )
        .route(
            "/api/v1/registrations/:registration_id",
            patch(update_outcome_handler::<S>),
        )
        .route(
            "/api/v1/exams",
            get(professor_exams_handler::<S>).post(create_exam_handler::<S>),
        )
        .route("/api/v1/exams/:exam_id", delete(delete_exam_handler::<S>))
        .route(
            "/api/v1/exams/:exam_id/registrations",
            get(exam_registrations_handler::<S>),
        )
        .route("/api/v1/subjects", post(create_subject_handler::<S>))
        .route(
            "/api/v1/subjects/:subject_id",
            delete(delete_subject_handler::<S>),
        )
        .route("/api/v1/students", post(create_student_handler::<S>))
        .route(
            "/api/v1/students/:student_id",
            put(update_student_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
    Json(request): Json<RegisterRequest>,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let student = match caller_student(&service, &headers) {
        Ok(student) => student,
        Err(response) => return response,
    };

    match service.register(&student, request.exam_id) {
        Ok(registration) => (StatusCode::CREATED, Json(registration)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn my_registrations_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let student = match caller_student(&service, &headers) {
        Ok(student) => student,
        Err(response) => return response,
    };
    respond(service.registrations_for_student(&student))
}

pub(crate) async fn transcript_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let student = match caller_student(&service, &headers) {
        Ok(student) => student,
        Err(response) => return response,
    };
    respond(service.transcript(&student))
}

pub(crate) async fn available_subjects_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let student = match caller_student(&service, &headers) {
        Ok(student) => student,
        Err(response) => return response,
    };
    respond(service.subjects_for_student(&student))
}

pub(crate) async fn available_exams_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let student = match caller_student(&service, &headers) {
        Ok(student) => student,
        Err(response) => return response,
    };
    respond(service.exams_for_student(&student))
}

pub(crate) async fn professor_registrations_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let professor = match caller_professor(&service, &headers) {
        Ok(professor) => professor,
        Err(response) => return response,
    };
    respond(service.registrations_for_professor(&professor))
}

pub(crate) async fn update_outcome_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
    Path(registration_id): Path<u64>,
    Json(patch): Json<OutcomePatch>,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let professor = match caller_professor(&service, &headers) {
        Ok(professor) => professor,
        Err(response) => return response,
    };
    respond(service.update_outcome(&professor, RegistrationId(registration_id), patch))
}

pub(crate) async fn professor_exams_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let professor = match caller_professor(&service, &headers) {
        Ok(professor) => professor,
        Err(response) => return response,
    };
    respond(service.exams_for_professor(&professor))
}

pub(crate) async fn create_exam_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
    Json(draft): Json<ExamDraft>,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let professor = match caller_professor(&service, &headers) {
        Ok(professor) => professor,
        Err(response) => return response,
    };
    match service.create_exam(&professor, draft) {
        Ok(exam) => (StatusCode::CREATED, Json(exam)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_exam_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
    Path(exam_id): Path<u64>,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let professor = match caller_professor(&service, &headers) {
        Ok(professor) => professor,
        Err(response) => return response,
    };
    match service.delete_exam(&professor, ExamId(exam_id)) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn exam_registrations_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
    Path(exam_id): Path<u64>,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let professor = match caller_professor(&service, &headers) {
        Ok(professor) => professor,
        Err(response) => return response,
    };
    respond(service.registrations_for_exam(&professor, ExamId(exam_id)))
}

pub(crate) async fn create_subject_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
    Json(draft): Json<SubjectDraft>,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let professor = match caller_professor(&service, &headers) {
        Ok(professor) => professor,
        Err(response) => return response,
    };
    match service.create_subject(&professor, draft) {
        Ok(subject) => (StatusCode::CREATED, Json(subject)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_subject_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
    Path(subject_id): Path<u64>,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    let professor = match caller_professor(&service, &headers) {
        Ok(professor) => professor,
        Err(response) => return response,
    };
    match service.delete_subject(&professor, SubjectId(subject_id)) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_student_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
    Json(draft): Json<StudentDraft>,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    if let Err(response) = caller_professor(&service, &headers) {
        return response;
    }
    match service.create_student(draft) {
        Ok(student) => (StatusCode::CREATED, Json(student)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_student_handler<S>(
    State(service): SharedService<S>,
    headers: HeaderMap,
    Path(student_id): Path<u64>,
    Json(draft): Json<StudentDraft>,
) -> Response
where
    S: EnrollmentStore + 'static,
{
    if let Err(response) = caller_professor(&service, &headers) {
        return response;
    }
    respond(service.update_student(StudentId(student_id), draft))
}

fn caller_id(headers: &HeaderMap, name: &'static str) -> Result<u64, Response> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            let payload = json!({
                "error": format!("missing or malformed {name} header"),
            });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })
}

fn caller_student<S>(service: &EnrollmentService<S>, headers: &HeaderMap) -> Result<Student, Response>
where
    S: EnrollmentStore + 'static,
{
    let id = caller_id(headers, STUDENT_HEADER)?;
    service.student(StudentId(id)).map_err(error_response)
}

fn caller_professor<S>(
    service: &EnrollmentService<S>,
    headers: &HeaderMap,
) -> Result<Professor, Response>
where
    S: EnrollmentStore + 'static,
{
    let id = caller_id(headers, PROFESSOR_HEADER)?;
    service.professor(ProfessorId(id)).map_err(error_response)
}

fn respond<T: serde::Serialize>(result: Result<T, EnrollmentError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Map service errors onto transport status codes.
pub(crate) fn error_response(err: EnrollmentError) -> Response {
    let status = match &err {
        EnrollmentError::NotFound { .. } | EnrollmentError::Store(StoreError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        EnrollmentError::Forbidden(_) => StatusCode::FORBIDDEN,
        EnrollmentError::Conflict(_) | EnrollmentError::Store(StoreError::Conflict(_)) => {
            StatusCode::CONFLICT
        }
        EnrollmentError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EnrollmentError::Store(StoreError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
