use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    Exam, ExamDraft, ExamId, ExamKind, ExamRegistration, NewRegistration, OutcomePatch,
    Professor, ProfessorDraft, ProfessorId, RegistrationId, Student, StudentDraft, StudentId,
    Subject, SubjectDraft, SubjectId,
};

/// Uniqueness and referential constraints a store must enforce atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// One registration per (student, exam).
    RegistrationPerSitting,
    /// One `applied` registration per (student, subject).
    OpenApplicationPerSubject,
    /// Attempt numbers are unique per (student, subject).
    AttemptPerSubject,
    UniqueUsername,
    UniqueIndexNumber,
    /// A referenced row still has dependents (exam with registrations, subject with exams).
    Dependents,
}

impl Constraint {
    pub const fn label(self) -> &'static str {
        match self {
            Constraint::RegistrationPerSitting => "registration_per_sitting",
            Constraint::OpenApplicationPerSubject => "open_application_per_subject",
            Constraint::AttemptPerSubject => "attempt_per_subject",
            Constraint::UniqueUsername => "unique_username",
            Constraint::UniqueIndexNumber => "unique_index_number",
            Constraint::Dependents => "dependents",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("constraint violated: {0}")]
    Conflict(Constraint),
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Registration lookup filter; unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationFilter {
    pub student_id: Option<StudentId>,
    pub subject_id: Option<SubjectId>,
    pub exam_id: Option<ExamId>,
}

impl RegistrationFilter {
    pub fn student(student_id: StudentId) -> Self {
        Self {
            student_id: Some(student_id),
            ..Self::default()
        }
    }

    pub fn exam(exam_id: ExamId) -> Self {
        Self {
            exam_id: Some(exam_id),
            ..Self::default()
        }
    }

    pub fn subject(mut self, subject_id: SubjectId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    /// Match against a registration whose exam belongs to `subject_id`.
    pub fn matches(&self, registration: &ExamRegistration, subject_id: SubjectId) -> bool {
        self.student_id.map_or(true, |id| registration.student_id == id)
            && self.exam_id.map_or(true, |id| registration.exam_id == id)
            && self.subject_id.map_or(true, |id| subject_id == id)
    }
}

/// Storage abstraction so the lifecycle and catalog services can be exercised in isolation.
///
/// `insert_registration` and `update_registration` must enforce the registration
/// constraints in [`Constraint`] in the same atomic step as the write; the services rely
/// on the store, not on their own reads, to close check-then-insert races.
pub trait EnrollmentStore: Send + Sync {
    fn student(&self, id: StudentId) -> Result<Option<Student>, StoreError>;
    fn professor(&self, id: ProfessorId) -> Result<Option<Professor>, StoreError>;
    fn subject(&self, id: SubjectId) -> Result<Option<Subject>, StoreError>;
    fn exam(&self, id: ExamId) -> Result<Option<Exam>, StoreError>;
    fn registration(&self, id: RegistrationId) -> Result<Option<ExamRegistration>, StoreError>;

    fn subjects(&self) -> Result<Vec<Subject>, StoreError>;
    fn exams(&self) -> Result<Vec<Exam>, StoreError>;
    /// Registrations matching `filter`, ordered by id (creation order).
    fn registrations(
        &self,
        filter: &RegistrationFilter,
    ) -> Result<Vec<ExamRegistration>, StoreError>;

    fn insert_registration(&self, record: NewRegistration)
        -> Result<ExamRegistration, StoreError>;
    fn update_registration(
        &self,
        id: RegistrationId,
        patch: &OutcomePatch,
    ) -> Result<ExamRegistration, StoreError>;

    fn insert_student(&self, draft: StudentDraft) -> Result<Student, StoreError>;
    fn update_student(&self, id: StudentId, draft: StudentDraft) -> Result<Student, StoreError>;
    fn insert_professor(&self, draft: ProfessorDraft) -> Result<Professor, StoreError>;
    fn insert_subject(
        &self,
        owner_id: ProfessorId,
        draft: SubjectDraft,
    ) -> Result<Subject, StoreError>;
    fn insert_exam(&self, draft: ExamDraft) -> Result<Exam, StoreError>;
    fn delete_exam(&self, id: ExamId) -> Result<(), StoreError>;
    fn delete_subject(&self, id: SubjectId) -> Result<(), StoreError>;
}

/// Graded registration joined with its catalog context for a student's transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub registration_id: RegistrationId,
    pub subject_name: String,
    pub exam_date: NaiveDate,
    pub exam_kind: ExamKind,
    pub grade: u8,
    pub points: u32,
    pub passed: bool,
    pub professor_name: String,
}
