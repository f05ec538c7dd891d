use std::cmp::Reverse;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{
    Exam, ExamId, ExamRegistration, NewRegistration, OutcomePatch, Professor, ProfessorId,
    RegistrationId, Student, StudentId, Subject, SubjectId,
};
use super::eligibility::{self, Verdict};
use super::ownership::{authorize_subject_owner, OwnershipViolation};
use super::repository::{
    Constraint, EnrollmentStore, RegistrationFilter, StoreError, TranscriptEntry,
};
use super::validation::{GradingPolicy, ValidationError};

/// Reason reported when the store rejects a registration that raced another one.
pub const RACED_REGISTRATION_REASON: &str = "already applied";

/// Service composing the eligibility rules, ownership guard, and store.
pub struct EnrollmentService<S> {
    store: Arc<S>,
    grading: GradingPolicy,
}

impl<S> EnrollmentService<S>
where
    S: EnrollmentStore + 'static,
{
    pub fn new(store: Arc<S>, grading: GradingPolicy) -> Self {
        Self { store, grading }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn grading(&self) -> &GradingPolicy {
        &self.grading
    }

    /// Register `student` for the exam sitting `exam_id`.
    ///
    /// Creates exactly one record with status `applied` and the next attempt number for
    /// the subject. Nothing is retried: a caller that wants to retry after a conflict
    /// must call `register` again so eligibility is re-evaluated.
    pub fn register(
        &self,
        student: &Student,
        exam_id: ExamId,
    ) -> Result<ExamRegistration, EnrollmentError> {
        let exam = self.require_exam(exam_id)?;
        let subject = self.require_subject(exam.subject_id)?;
        let prior = self
            .store
            .registrations(&RegistrationFilter::student(student.id).subject(subject.id))?;

        if let Verdict::Ineligible(reason) = eligibility::evaluate(student, &exam, &subject, &prior)
        {
            info!(
                student_id = %student.id,
                exam_id = %exam.id,
                subject_id = %subject.id,
                reason = %reason.detail(),
                "registration rejected"
            );
            return Err(EnrollmentError::Forbidden(reason.summary().to_string()));
        }

        let attempt_number = prior.len() as u32 + 1;
        let stored = self
            .store
            .insert_registration(NewRegistration {
                student_id: student.id,
                exam_id: exam.id,
                attempt_number,
            })
            .map_err(|err| match err {
                StoreError::Conflict(constraint) => {
                    warn!(
                        student_id = %student.id,
                        exam_id = %exam.id,
                        constraint = %constraint,
                        "registration lost a race against a concurrent request"
                    );
                    EnrollmentError::Forbidden(RACED_REGISTRATION_REASON.to_string())
                }
                other => EnrollmentError::from(other),
            })?;

        info!(
            registration_id = %stored.id,
            student_id = %student.id,
            exam_id = %exam.id,
            attempt = stored.attempt_number,
            "registration created"
        );
        Ok(stored)
    }

    /// Record grade, points, or status on a registration as the subject's owner.
    pub fn update_outcome(
        &self,
        professor: &Professor,
        registration_id: RegistrationId,
        patch: OutcomePatch,
    ) -> Result<ExamRegistration, EnrollmentError> {
        let registration = self
            .store
            .registration(registration_id)?
            .ok_or(EnrollmentError::NotFound {
                entity: "registration",
                id: registration_id.0,
            })?;
        let exam = self.require_exam(registration.exam_id)?;
        let subject = self.require_subject(exam.subject_id)?;
        self.authorize(professor, &subject)?;
        self.grading.validate_patch(&patch)?;

        if patch.is_empty() {
            debug!(registration_id = %registration.id, "empty outcome patch, nothing to record");
            return Ok(registration);
        }

        let updated = self
            .store
            .update_registration(registration_id, &patch)
            .map_err(|err| match err {
                StoreError::Conflict(Constraint::OpenApplicationPerSubject) => {
                    EnrollmentError::Conflict(
                        "student already has an open application for this subject".to_string(),
                    )
                }
                StoreError::Conflict(constraint) => EnrollmentError::Conflict(format!(
                    "outcome update violates {constraint}"
                )),
                other => EnrollmentError::from(other),
            })?;

        info!(
            registration_id = %updated.id,
            professor_id = %professor.id,
            status = updated.status.label(),
            grade = updated.grade,
            points = updated.points,
            "registration outcome recorded"
        );
        Ok(updated)
    }

    /// Registrations held by the calling student, in creation order.
    pub fn registrations_for_student(
        &self,
        student: &Student,
    ) -> Result<Vec<ExamRegistration>, EnrollmentError> {
        Ok(self
            .store
            .registrations(&RegistrationFilter::student(student.id))?)
    }

    /// Registrations on every exam of every subject owned by `professor`.
    pub fn registrations_for_professor(
        &self,
        professor: &Professor,
    ) -> Result<Vec<ExamRegistration>, EnrollmentError> {
        let mut registrations = Vec::new();
        for subject in self.owned_subjects(professor.id)? {
            let filter = RegistrationFilter::default().subject(subject.id);
            registrations.extend(self.store.registrations(&filter)?);
        }
        registrations.sort_by_key(|registration| registration.id);
        Ok(registrations)
    }

    pub fn registrations_for_exam(
        &self,
        professor: &Professor,
        exam_id: ExamId,
    ) -> Result<Vec<ExamRegistration>, EnrollmentError> {
        let exam = self.require_exam(exam_id)?;
        let subject = self.require_subject(exam.subject_id)?;
        self.authorize(professor, &subject)?;

        Ok(self.store.registrations(&RegistrationFilter::exam(exam_id))?)
    }

    /// Graded registrations with catalog context, newest exam first.
    pub fn transcript(&self, student: &Student) -> Result<Vec<TranscriptEntry>, EnrollmentError> {
        let mut entries = Vec::new();
        for registration in self.registrations_for_student(student)? {
            if registration.grade == 0 {
                continue;
            }
            let exam = self.require_exam(registration.exam_id)?;
            let subject = self.require_subject(exam.subject_id)?;
            let professor = self.require_professor(subject.owner_id)?;

            entries.push(TranscriptEntry {
                registration_id: registration.id,
                subject_name: subject.name,
                exam_date: exam.date,
                exam_kind: exam.kind,
                grade: registration.grade,
                points: registration.points,
                passed: self.grading.is_passing(registration.grade),
                professor_name: professor.name,
            });
        }

        entries.sort_by_key(|entry| (Reverse(entry.exam_date), entry.registration_id));
        debug!(student_id = %student.id, entries = entries.len(), "transcript assembled");
        Ok(entries)
    }

    /// Resolve an authenticated student id supplied by the identity layer.
    pub fn student(&self, id: StudentId) -> Result<Student, EnrollmentError> {
        self.store.student(id)?.ok_or(EnrollmentError::NotFound {
            entity: "student",
            id: id.0,
        })
    }

    pub fn professor(&self, id: ProfessorId) -> Result<Professor, EnrollmentError> {
        self.require_professor(id)
    }

    /// Ownership guard shared by every professor-side mutation.
    pub(crate) fn authorize(
        &self,
        professor: &Professor,
        subject: &Subject,
    ) -> Result<(), EnrollmentError> {
        authorize_subject_owner(professor, subject).map_err(|violation| {
            warn!(
                professor_id = %violation.professor_id,
                subject_id = %violation.subject_id,
                owner_id = %violation.owner_id,
                "ownership check failed"
            );
            EnrollmentError::from(violation)
        })
    }

    pub(crate) fn owned_subjects(
        &self,
        professor_id: ProfessorId,
    ) -> Result<Vec<Subject>, EnrollmentError> {
        Ok(self
            .store
            .subjects()?
            .into_iter()
            .filter(|subject| subject.owner_id == professor_id)
            .collect())
    }

    pub(crate) fn require_exam(&self, id: ExamId) -> Result<Exam, EnrollmentError> {
        self.store.exam(id)?.ok_or(EnrollmentError::NotFound {
            entity: "exam",
            id: id.0,
        })
    }

    pub(crate) fn require_subject(&self, id: SubjectId) -> Result<Subject, EnrollmentError> {
        self.store.subject(id)?.ok_or(EnrollmentError::NotFound {
            entity: "subject",
            id: id.0,
        })
    }

    fn require_professor(&self, id: ProfessorId) -> Result<Professor, EnrollmentError> {
        self.store.professor(id)?.ok_or(EnrollmentError::NotFound {
            entity: "professor",
            id: id.0,
        })
    }
}

/// Error raised by the enrollment service.
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<OwnershipViolation> for EnrollmentError {
    fn from(value: OwnershipViolation) -> Self {
        Self::Forbidden(value.to_string())
    }
}
