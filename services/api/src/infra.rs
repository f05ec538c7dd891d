use chrono::{Duration, NaiveDate};
use enrollment::error::AppError;
use enrollment::registrations::{
    EnrollmentError, EnrollmentService, EnrollmentStore, Exam, ExamDraft, ExamKind, Professor,
    ProfessorDraft, Student, StudentDraft, Subject, SubjectDraft,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Sample records written by `seed_catalog`.
#[derive(Debug, Clone)]
pub(crate) struct SampleCatalog {
    pub(crate) professor: Professor,
    pub(crate) subject: Subject,
    pub(crate) sittings: Vec<Exam>,
    pub(crate) student: Student,
}

/// Seed one second-year subject with a sitting every `SITTING_GAP_DAYS` days, plus a
/// first-year student in the same department.
pub(crate) fn seed_catalog<S>(
    service: &EnrollmentService<S>,
    first_sitting: NaiveDate,
) -> Result<SampleCatalog, AppError>
where
    S: EnrollmentStore + 'static,
{
    let professor = service
        .store()
        .insert_professor(ProfessorDraft {
            username: "prof.markovic".to_string(),
            name: "Zoran Markovic".to_string(),
        })
        .map_err(EnrollmentError::from)?;
    let subject = service.create_subject(
        &professor,
        SubjectDraft {
            name: "Operating Systems".to_string(),
            ects: 8,
            year: Some(2),
            department: Some("CS".to_string()),
        },
    )?;

    let mut sittings = Vec::with_capacity(SITTING_KINDS.len());
    for (offset, kind) in SITTING_KINDS.into_iter().enumerate() {
        sittings.push(service.create_exam(
            &professor,
            ExamDraft {
                subject_id: subject.id,
                date: first_sitting + Duration::days(offset as i64 * SITTING_GAP_DAYS),
                kind,
            },
        )?);
    }

    let student = service.create_student(StudentDraft {
        username: "ajankovic".to_string(),
        name: "Ana Jankovic".to_string(),
        index_number: "RN-42/2025".to_string(),
        year_of_study: 1,
        department: Some("CS".to_string()),
    })?;

    Ok(SampleCatalog {
        professor,
        subject,
        sittings,
        student,
    })
}

const SITTING_KINDS: [ExamKind; 3] = [ExamKind::Written, ExamKind::Oral, ExamKind::Written];
const SITTING_GAP_DAYS: i64 = 28;

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
