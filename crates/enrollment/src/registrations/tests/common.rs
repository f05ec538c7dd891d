use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::registrations::domain::{
    Exam, ExamDraft, ExamId, ExamKind, ExamRegistration, NewRegistration, OutcomePatch,
    Professor, ProfessorDraft, ProfessorId, RegistrationId, RegistrationStatus, Student,
    StudentDraft, StudentId, Subject, SubjectDraft, SubjectId,
};
use crate::registrations::memory::InMemoryEnrollmentStore;
use crate::registrations::repository::{
    Constraint, EnrollmentStore, RegistrationFilter, StoreError,
};
use crate::registrations::{registration_router, EnrollmentService, GradingPolicy};

pub(super) fn student(department: Option<&str>, year_of_study: u8) -> Student {
    Student {
        id: StudentId(1),
        username: "jjovanovic".to_string(),
        name: "Jelena Jovanovic".to_string(),
        index_number: "RN-7/2024".to_string(),
        year_of_study,
        department: department.map(str::to_string),
    }
}

pub(super) fn subject(department: Option<&str>, year: Option<u8>) -> Subject {
    Subject {
        id: SubjectId(10),
        name: "Operating Systems".to_string(),
        ects: 8,
        year,
        department: department.map(str::to_string),
        owner_id: ProfessorId(3),
    }
}

pub(super) fn exam(id: u64) -> Exam {
    Exam {
        id: ExamId(id),
        subject_id: SubjectId(10),
        date: NaiveDate::from_ymd_opt(2025, 6, 14).expect("valid date"),
        kind: ExamKind::Written,
    }
}

pub(super) fn prior(id: u64, exam_id: u64, status: RegistrationStatus) -> ExamRegistration {
    ExamRegistration {
        id: RegistrationId(id),
        student_id: StudentId(1),
        exam_id: ExamId(exam_id),
        attempt_number: id as u32,
        grade: 0,
        points: 0,
        status,
    }
}

pub(super) fn owner() -> Professor {
    Professor {
        id: ProfessorId(3),
        username: "prof.nikolic".to_string(),
        name: "Dragan Nikolic".to_string(),
    }
}

pub(super) fn outsider() -> Professor {
    Professor {
        id: ProfessorId(4),
        username: "prof.ilic".to_string(),
        name: "Vesna Ilic".to_string(),
    }
}

pub(super) fn status_patch(status: RegistrationStatus) -> OutcomePatch {
    OutcomePatch {
        status: Some(status),
        ..OutcomePatch::default()
    }
}

/// Seeded catalog: one owning professor, an outsider, one subject with three sittings,
/// and a year-two computing student.
pub(super) struct Seeded {
    pub(super) service: EnrollmentService<InMemoryEnrollmentStore>,
    pub(super) store: Arc<InMemoryEnrollmentStore>,
    pub(super) owner: Professor,
    pub(super) outsider: Professor,
    pub(super) subject: Subject,
    pub(super) sittings: Vec<Exam>,
    pub(super) student: Student,
}

pub(super) fn seeded() -> Seeded {
    let store = Arc::new(InMemoryEnrollmentStore::default());
    let service = EnrollmentService::new(store.clone(), GradingPolicy::default());

    let owner = store
        .insert_professor(ProfessorDraft {
            username: "prof.nikolic".to_string(),
            name: "Dragan Nikolic".to_string(),
        })
        .expect("owner inserted");
    let outsider = store
        .insert_professor(ProfessorDraft {
            username: "prof.ilic".to_string(),
            name: "Vesna Ilic".to_string(),
        })
        .expect("outsider inserted");
    let subject = service
        .create_subject(
            &owner,
            SubjectDraft {
                name: "Operating Systems".to_string(),
                ects: 8,
                year: Some(2),
                department: Some("CS".to_string()),
            },
        )
        .expect("subject created");
    let sittings = [(1, 25), (4, 12), (6, 14)]
        .into_iter()
        .map(|(month, day)| {
            service
                .create_exam(
                    &owner,
                    ExamDraft {
                        subject_id: subject.id,
                        date: NaiveDate::from_ymd_opt(2025, month, day).expect("valid date"),
                        kind: ExamKind::Written,
                    },
                )
                .expect("exam created")
        })
        .collect();
    let student = service
        .create_student(StudentDraft {
            username: "jjovanovic".to_string(),
            name: "Jelena Jovanovic".to_string(),
            index_number: "RN-7/2024".to_string(),
            year_of_study: 2,
            department: Some("CS".to_string()),
        })
        .expect("student created");

    Seeded {
        service,
        store,
        owner,
        outsider,
        subject,
        sittings,
        student,
    }
}

/// Store whose every write loses a uniqueness race.
pub(super) struct RacingStore {
    pub(super) inner: InMemoryEnrollmentStore,
}

impl EnrollmentStore for RacingStore {
    fn student(&self, id: StudentId) -> Result<Option<Student>, StoreError> {
        self.inner.student(id)
    }

    fn professor(&self, id: ProfessorId) -> Result<Option<Professor>, StoreError> {
        self.inner.professor(id)
    }

    fn subject(&self, id: SubjectId) -> Result<Option<Subject>, StoreError> {
        self.inner.subject(id)
    }

    fn exam(&self, id: ExamId) -> Result<Option<Exam>, StoreError> {
        self.inner.exam(id)
    }

    fn registration(&self, id: RegistrationId) -> Result<Option<ExamRegistration>, StoreError> {
        self.inner.registration(id)
    }

    fn subjects(&self) -> Result<Vec<Subject>, StoreError> {
        self.inner.subjects()
    }

    fn exams(&self) -> Result<Vec<Exam>, StoreError> {
        self.inner.exams()
    }

    fn registrations(
        &self,
        filter: &RegistrationFilter,
    ) -> Result<Vec<ExamRegistration>, StoreError> {
        self.inner.registrations(filter)
    }

    fn insert_registration(
        &self,
        _record: NewRegistration,
    ) -> Result<ExamRegistration, StoreError> {
        Err(StoreError::Conflict(Constraint::OpenApplicationPerSubject))
    }

    fn update_registration(
        &self,
        _id: RegistrationId,
        _patch: &OutcomePatch,
    ) -> Result<ExamRegistration, StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }

    fn insert_student(&self, draft: StudentDraft) -> Result<Student, StoreError> {
        self.inner.insert_student(draft)
    }

    fn update_student(&self, id: StudentId, draft: StudentDraft) -> Result<Student, StoreError> {
        self.inner.update_student(id, draft)
    }

    fn insert_professor(&self, draft: ProfessorDraft) -> Result<Professor, StoreError> {
        self.inner.insert_professor(draft)
    }

    fn insert_subject(
        &self,
        owner_id: ProfessorId,
        draft: SubjectDraft,
    ) -> Result<Subject, StoreError> {
        self.inner.insert_subject(owner_id, draft)
    }

    fn insert_exam(&self, draft: ExamDraft) -> Result<Exam, StoreError> {
        self.inner.insert_exam(draft)
    }

    fn delete_exam(&self, id: ExamId) -> Result<(), StoreError> {
        self.inner.delete_exam(id)
    }

    fn delete_subject(&self, id: SubjectId) -> Result<(), StoreError> {
        self.inner.delete_subject(id)
    }
}

pub(super) fn router_for(seeded: Seeded) -> axum::Router {
    registration_router(Arc::new(seeded.service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
