use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Exam, ExamDraft, ExamId, ExamRegistration, NewRegistration, OutcomePatch, Professor,
    ProfessorDraft, ProfessorId, RegistrationId, RegistrationStatus, Student, StudentDraft,
    StudentId, Subject, SubjectDraft, SubjectId,
};
use super::repository::{Constraint, EnrollmentStore, RegistrationFilter, StoreError};

/// Process-local store used by the demo binary and tests.
///
/// Every write validates its constraints and commits while holding the same lock, so
/// concurrent registrations for one student and subject serialize here.
#[derive(Default, Clone)]
pub struct InMemoryEnrollmentStore {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    students: BTreeMap<StudentId, Student>,
    professors: BTreeMap<ProfessorId, Professor>,
    subjects: BTreeMap<SubjectId, Subject>,
    exams: BTreeMap<ExamId, Exam>,
    registrations: BTreeMap<RegistrationId, ExamRegistration>,
    sequences: Sequences,
}

#[derive(Default)]
struct Sequences {
    student: u64,
    professor: u64,
    subject: u64,
    exam: u64,
    registration: u64,
}

fn next(sequence: &mut u64) -> u64 {
    *sequence += 1;
    *sequence
}

impl Tables {
    fn subject_of(&self, exam_id: ExamId) -> Option<SubjectId> {
        self.exams.get(&exam_id).map(|exam| exam.subject_id)
    }

    fn check_registration(&self, candidate: &ExamRegistration) -> Result<(), StoreError> {
        let subject_id = self.subject_of(candidate.exam_id).ok_or(StoreError::NotFound)?;

        for existing in self.registrations.values() {
            if existing.id == candidate.id || existing.student_id != candidate.student_id {
                continue;
            }
            if existing.exam_id == candidate.exam_id {
                return Err(StoreError::Conflict(Constraint::RegistrationPerSitting));
            }
            if self.subject_of(existing.exam_id) != Some(subject_id) {
                continue;
            }
            if existing.status == RegistrationStatus::Applied
                && candidate.status == RegistrationStatus::Applied
            {
                return Err(StoreError::Conflict(Constraint::OpenApplicationPerSubject));
            }
            if existing.attempt_number == candidate.attempt_number {
                return Err(StoreError::Conflict(Constraint::AttemptPerSubject));
            }
        }

        Ok(())
    }

    fn check_student(&self, id: Option<StudentId>, draft: &StudentDraft) -> Result<(), StoreError> {
        for existing in self.students.values() {
            if Some(existing.id) == id {
                continue;
            }
            if existing.username == draft.username {
                return Err(StoreError::Conflict(Constraint::UniqueUsername));
            }
            if existing.index_number == draft.index_number {
                return Err(StoreError::Conflict(Constraint::UniqueIndexNumber));
            }
        }
        Ok(())
    }
}

impl InMemoryEnrollmentStore {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

impl EnrollmentStore for InMemoryEnrollmentStore {
    fn student(&self, id: StudentId) -> Result<Option<Student>, StoreError> {
        Ok(self.tables()?.students.get(&id).cloned())
    }

    fn professor(&self, id: ProfessorId) -> Result<Option<Professor>, StoreError> {
        Ok(self.tables()?.professors.get(&id).cloned())
    }

    fn subject(&self, id: SubjectId) -> Result<Option<Subject>, StoreError> {
        Ok(self.tables()?.subjects.get(&id).cloned())
    }

    fn exam(&self, id: ExamId) -> Result<Option<Exam>, StoreError> {
        Ok(self.tables()?.exams.get(&id).cloned())
    }

    fn registration(&self, id: RegistrationId) -> Result<Option<ExamRegistration>, StoreError> {
        Ok(self.tables()?.registrations.get(&id).cloned())
    }

    fn subjects(&self) -> Result<Vec<Subject>, StoreError> {
        Ok(self.tables()?.subjects.values().cloned().collect())
    }

    fn exams(&self) -> Result<Vec<Exam>, StoreError> {
        Ok(self.tables()?.exams.values().cloned().collect())
    }

    fn registrations(
        &self,
        filter: &RegistrationFilter,
    ) -> Result<Vec<ExamRegistration>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .registrations
            .values()
            .filter(|registration| {
                tables
                    .subject_of(registration.exam_id)
                    .is_some_and(|subject_id| filter.matches(registration, subject_id))
            })
            .cloned()
            .collect())
    }

    fn insert_registration(
        &self,
        record: NewRegistration,
    ) -> Result<ExamRegistration, StoreError> {
        let mut tables = self.tables()?;
        if !tables.students.contains_key(&record.student_id) {
            return Err(StoreError::NotFound);
        }

        let id = RegistrationId(tables.sequences.registration + 1);
        let registration = record.into_record(id);
        tables.check_registration(&registration)?;

        tables.sequences.registration = id.0;
        tables.registrations.insert(id, registration.clone());
        Ok(registration)
    }

    fn update_registration(
        &self,
        id: RegistrationId,
        patch: &OutcomePatch,
    ) -> Result<ExamRegistration, StoreError> {
        let mut tables = self.tables()?;
        let mut updated = tables
            .registrations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        patch.apply_to(&mut updated);
        tables.check_registration(&updated)?;

        tables.registrations.insert(id, updated.clone());
        Ok(updated)
    }

    fn insert_student(&self, draft: StudentDraft) -> Result<Student, StoreError> {
        let mut tables = self.tables()?;
        tables.check_student(None, &draft)?;

        let id = StudentId(next(&mut tables.sequences.student));
        let student = draft.into_student(id);
        tables.students.insert(id, student.clone());
        Ok(student)
    }

    fn update_student(&self, id: StudentId, draft: StudentDraft) -> Result<Student, StoreError> {
        let mut tables = self.tables()?;
        if !tables.students.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        tables.check_student(Some(id), &draft)?;

        let student = draft.into_student(id);
        tables.students.insert(id, student.clone());
        Ok(student)
    }

    fn insert_professor(&self, draft: ProfessorDraft) -> Result<Professor, StoreError> {
        let mut tables = self.tables()?;
        if tables
            .professors
            .values()
            .any(|existing| existing.username == draft.username)
        {
            return Err(StoreError::Conflict(Constraint::UniqueUsername));
        }

        let id = ProfessorId(next(&mut tables.sequences.professor));
        let professor = Professor {
            id,
            username: draft.username,
            name: draft.name,
        };
        tables.professors.insert(id, professor.clone());
        Ok(professor)
    }

    fn insert_subject(
        &self,
        owner_id: ProfessorId,
        draft: SubjectDraft,
    ) -> Result<Subject, StoreError> {
        let mut tables = self.tables()?;
        if !tables.professors.contains_key(&owner_id) {
            return Err(StoreError::NotFound);
        }

        let id = SubjectId(next(&mut tables.sequences.subject));
        let subject = draft.into_subject(id, owner_id);
        tables.subjects.insert(id, subject.clone());
        Ok(subject)
    }

    fn insert_exam(&self, draft: ExamDraft) -> Result<Exam, StoreError> {
        let mut tables = self.tables()?;
        if !tables.subjects.contains_key(&draft.subject_id) {
            return Err(StoreError::NotFound);
        }

        let id = ExamId(next(&mut tables.sequences.exam));
        let exam = draft.into_exam(id);
        tables.exams.insert(id, exam.clone());
        Ok(exam)
    }

    fn delete_exam(&self, id: ExamId) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if !tables.exams.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if tables
            .registrations
            .values()
            .any(|registration| registration.exam_id == id)
        {
            return Err(StoreError::Conflict(Constraint::Dependents));
        }

        tables.exams.remove(&id);
        Ok(())
    }

    fn delete_subject(&self, id: SubjectId) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if !tables.subjects.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if tables.exams.values().any(|exam| exam.subject_id == id) {
            return Err(StoreError::Conflict(Constraint::Dependents));
        }

        tables.subjects.remove(&id);
        Ok(())
    }
}
