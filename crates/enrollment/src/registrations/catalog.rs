//! Subject, exam, and student catalog operations.
//!
//! Professor-side mutations go through the same ownership guard as outcome updates, and
//! student-facing listings reuse the eligibility placement rule so a student only sees
//! what they could register for on curriculum grounds.

use std::collections::BTreeSet;

use tracing::info;

use super::domain::{
    Exam, ExamDraft, ExamId, Professor, Student, StudentDraft, StudentId, Subject,
    SubjectDraft, SubjectId,
};
use super::eligibility::placement;
use super::repository::{Constraint, EnrollmentStore, StoreError};
use super::service::{EnrollmentError, EnrollmentService};
use super::validation::{validate_student, validate_subject};

impl<S> EnrollmentService<S>
where
    S: EnrollmentStore + 'static,
{
    /// Create a subject owned by the acting professor.
    pub fn create_subject(
        &self,
        professor: &Professor,
        draft: SubjectDraft,
    ) -> Result<Subject, EnrollmentError> {
        validate_subject(&draft)?;
        let subject = self.store().insert_subject(professor.id, draft)?;
        info!(subject_id = %subject.id, professor_id = %professor.id, "subject created");
        Ok(subject)
    }

    /// Create an exam sitting for a subject the acting professor owns.
    pub fn create_exam(
        &self,
        professor: &Professor,
        draft: ExamDraft,
    ) -> Result<Exam, EnrollmentError> {
        let subject = self.require_subject(draft.subject_id)?;
        self.authorize(professor, &subject)?;

        let exam = self.store().insert_exam(draft)?;
        info!(
            exam_id = %exam.id,
            subject_id = %subject.id,
            date = %exam.date,
            kind = exam.kind.label(),
            "exam created"
        );
        Ok(exam)
    }

    /// Delete an exam sitting; refused while registrations reference it.
    pub fn delete_exam(
        &self,
        professor: &Professor,
        exam_id: ExamId,
    ) -> Result<(), EnrollmentError> {
        let exam = self.require_exam(exam_id)?;
        let subject = self.require_subject(exam.subject_id)?;
        self.authorize(professor, &subject)?;

        self.store()
            .delete_exam(exam_id)
            .map_err(|err| match err {
                StoreError::Conflict(Constraint::Dependents) => EnrollmentError::Conflict(
                    format!("exam {exam_id} still has registrations"),
                ),
                other => EnrollmentError::from(other),
            })?;
        info!(exam_id = %exam_id, professor_id = %professor.id, "exam deleted");
        Ok(())
    }

    /// Delete a subject; refused while it still has exam sittings.
    pub fn delete_subject(
        &self,
        professor: &Professor,
        subject_id: SubjectId,
    ) -> Result<(), EnrollmentError> {
        let subject = self.require_subject(subject_id)?;
        self.authorize(professor, &subject)?;

        self.store()
            .delete_subject(subject_id)
            .map_err(|err| match err {
                StoreError::Conflict(Constraint::Dependents) => EnrollmentError::Conflict(
                    format!("subject '{}' still has exams", subject.name),
                ),
                other => EnrollmentError::from(other),
            })?;
        info!(subject_id = %subject_id, professor_id = %professor.id, "subject deleted");
        Ok(())
    }

    /// Subjects whose department and year placement admit `student`.
    pub fn subjects_for_student(&self, student: &Student) -> Result<Vec<Subject>, EnrollmentError> {
        Ok(self
            .store()
            .subjects()?
            .into_iter()
            .filter(|subject| placement(student, subject).is_ok())
            .collect())
    }

    /// Exam sittings of the subjects visible to `student`.
    pub fn exams_for_student(&self, student: &Student) -> Result<Vec<Exam>, EnrollmentError> {
        let visible: BTreeSet<SubjectId> = self
            .subjects_for_student(student)?
            .into_iter()
            .map(|subject| subject.id)
            .collect();
        self.exams_for_subjects(&visible)
    }

    /// Exam sittings of every subject the professor owns.
    pub fn exams_for_professor(&self, professor: &Professor) -> Result<Vec<Exam>, EnrollmentError> {
        let owned: BTreeSet<SubjectId> = self
            .owned_subjects(professor.id)?
            .into_iter()
            .map(|subject| subject.id)
            .collect();
        self.exams_for_subjects(&owned)
    }

    pub fn create_student(&self, draft: StudentDraft) -> Result<Student, EnrollmentError> {
        validate_student(&draft)?;
        let student = self
            .store()
            .insert_student(draft)
            .map_err(student_conflict)?;
        info!(student_id = %student.id, "student created");
        Ok(student)
    }

    /// Replace a student's record; year and department changes affect future eligibility only.
    pub fn update_student(
        &self,
        id: StudentId,
        draft: StudentDraft,
    ) -> Result<Student, EnrollmentError> {
        validate_student(&draft)?;
        let student = self
            .store()
            .update_student(id, draft)
            .map_err(|err| match err {
                StoreError::NotFound => EnrollmentError::NotFound {
                    entity: "student",
                    id: id.0,
                },
                other => student_conflict(other),
            })?;
        info!(
            student_id = %student.id,
            year_of_study = student.year_of_study,
            "student updated"
        );
        Ok(student)
    }

    fn exams_for_subjects(
        &self,
        subjects: &BTreeSet<SubjectId>,
    ) -> Result<Vec<Exam>, EnrollmentError> {
        Ok(self
            .store()
            .exams()?
            .into_iter()
            .filter(|exam| subjects.contains(&exam.subject_id))
            .collect())
    }
}

fn student_conflict(err: StoreError) -> EnrollmentError {
    match err {
        StoreError::Conflict(Constraint::UniqueUsername) => {
            EnrollmentError::Conflict("username already exists".to_string())
        }
        StoreError::Conflict(Constraint::UniqueIndexNumber) => {
            EnrollmentError::Conflict("index number already exists".to_string())
        }
        other => EnrollmentError::from(other),
    }
}
