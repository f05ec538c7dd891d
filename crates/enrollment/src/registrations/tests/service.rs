use std::sync::Arc;

use chrono::NaiveDate;

use super::common::*;
use crate::registrations::domain::{
    ExamDraft, ExamId, ExamKind, ExamRegistration, OutcomePatch, ProfessorDraft,
    RegistrationId, RegistrationStatus, StudentDraft, SubjectDraft,
};
use crate::registrations::memory::InMemoryEnrollmentStore;
use crate::registrations::repository::{EnrollmentStore, RegistrationFilter};
use crate::registrations::validation::ValidationError;
use crate::registrations::{
    EnrollmentError, EnrollmentService, GradingPolicy, RACED_REGISTRATION_REASON,
};

fn fail(seeded: &Seeded, registration: &ExamRegistration) {
    seeded
        .service
        .update_outcome(
            &seeded.owner,
            registration.id,
            OutcomePatch {
                grade: Some(5),
                status: Some(RegistrationStatus::Failed),
                ..OutcomePatch::default()
            },
        )
        .expect("owner records a failure");
}

#[test]
fn first_registration_is_applied_with_attempt_one() {
    let seeded = seeded();
    let registration = seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("eligible student is registered");

    assert_eq!(registration.attempt_number, 1);
    assert_eq!(registration.status, RegistrationStatus::Applied);
    assert_eq!(registration.grade, 0);
    assert_eq!(registration.points, 0);
    assert_eq!(registration.student_id, seeded.student.id);
}

#[test]
fn second_application_to_same_sitting_is_forbidden() {
    let seeded = seeded();
    seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("first registration accepted");

    match seeded.service.register(&seeded.student, seeded.sittings[0].id) {
        Err(EnrollmentError::Forbidden(reason)) => {
            assert_eq!(reason, "already applied to this sitting");
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn open_application_blocks_other_sittings_of_the_subject() {
    let seeded = seeded();
    seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("first registration accepted");

    match seeded.service.register(&seeded.student, seeded.sittings[1].id) {
        Err(EnrollmentError::Forbidden(reason)) => {
            assert_eq!(reason, "already has an open application for this subject");
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn failed_attempt_allows_next_sitting_with_next_attempt_number() {
    let seeded = seeded();
    let first = seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("first registration accepted");
    fail(&seeded, &first);

    let second = seeded
        .service
        .register(&seeded.student, seeded.sittings[1].id)
        .expect("retake on a new sitting accepted");
    assert_eq!(second.attempt_number, 2);
    assert_eq!(second.status, RegistrationStatus::Applied);

    match seeded.service.register(&seeded.student, seeded.sittings[0].id) {
        Err(EnrollmentError::Forbidden(reason)) => {
            assert_eq!(reason, "already failed this sitting, wait for new sitting");
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn attempt_numbers_are_contiguous_across_retakes() {
    let seeded = seeded();
    for sitting in &seeded.sittings {
        let registration = seeded
            .service
            .register(&seeded.student, sitting.id)
            .expect("retake accepted");
        fail(&seeded, &registration);
    }

    let mut attempts: Vec<u32> = seeded
        .store
        .registrations(&RegistrationFilter::student(seeded.student.id).subject(seeded.subject.id))
        .expect("registrations listed")
        .into_iter()
        .map(|registration| registration.attempt_number)
        .collect();
    attempts.sort_unstable();
    assert_eq!(attempts, vec![1, 2, 3]);
}

#[test]
fn passed_subject_cannot_be_registered_again() {
    let seeded = seeded();
    let registration = seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("registration accepted");
    seeded
        .service
        .update_outcome(
            &seeded.owner,
            registration.id,
            OutcomePatch {
                grade: Some(9),
                points: Some(88),
                status: Some(RegistrationStatus::Passed),
            },
        )
        .expect("owner records a pass");

    match seeded.service.register(&seeded.student, seeded.sittings[2].id) {
        Err(EnrollmentError::Forbidden(reason)) => assert_eq!(reason, "subject already passed"),
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn at_most_one_open_application_per_subject() {
    let seeded = seeded();
    for sitting in &seeded.sittings {
        let _ = seeded.service.register(&seeded.student, sitting.id);
    }

    let open = seeded
        .service
        .registrations_for_student(&seeded.student)
        .expect("registrations listed")
        .into_iter()
        .filter(|registration| registration.status == RegistrationStatus::Applied)
        .count();
    assert_eq!(open, 1);
}

#[test]
fn unknown_exam_is_not_found() {
    let seeded = seeded();
    match seeded.service.register(&seeded.student, ExamId(999)) {
        Err(EnrollmentError::NotFound { entity: "exam", id: 999 }) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn year_update_unlocks_registration() {
    let seeded = seeded();
    let freshman = seeded
        .service
        .create_student(StudentDraft {
            username: "mpetrovic".to_string(),
            name: "Marko Petrovic".to_string(),
            index_number: "RN-12/2025".to_string(),
            year_of_study: 1,
            department: Some("CS".to_string()),
        })
        .expect("student created");

    match seeded.service.register(&freshman, seeded.sittings[0].id) {
        Err(EnrollmentError::Forbidden(reason)) => assert_eq!(reason, "insufficient year"),
        other => panic!("expected forbidden, got {other:?}"),
    }

    let promoted = seeded
        .service
        .update_student(
            freshman.id,
            StudentDraft {
                username: freshman.username.clone(),
                name: freshman.name.clone(),
                index_number: freshman.index_number.clone(),
                year_of_study: 2,
                department: freshman.department.clone(),
            },
        )
        .expect("student promoted");

    let registration = seeded
        .service
        .register(&promoted, seeded.sittings[0].id)
        .expect("promoted student is registered");
    assert_eq!(registration.attempt_number, 1);
    assert_eq!(registration.status, RegistrationStatus::Applied);
}

#[test]
fn lost_race_surfaces_as_already_applied() {
    let inner = InMemoryEnrollmentStore::default();
    let fixture = EnrollmentService::new(Arc::new(inner.clone()), GradingPolicy::default());
    let owner = inner
        .insert_professor(ProfessorDraft {
            username: "prof.nikolic".to_string(),
            name: "Dragan Nikolic".to_string(),
        })
        .expect("owner inserted");
    let subject = fixture
        .create_subject(
            &owner,
            SubjectDraft {
                name: "Compilers".to_string(),
                ects: 6,
                year: None,
                department: None,
            },
        )
        .expect("subject created");
    let sitting = fixture
        .create_exam(
            &owner,
            ExamDraft {
                subject_id: subject.id,
                date: NaiveDate::from_ymd_opt(2025, 9, 2).expect("valid date"),
                kind: ExamKind::Oral,
            },
        )
        .expect("exam created");
    let learner = fixture
        .create_student(StudentDraft {
            username: "aristic".to_string(),
            name: "Ana Ristic".to_string(),
            index_number: "RN-3/2023".to_string(),
            year_of_study: 3,
            department: None,
        })
        .expect("student created");

    let racing = EnrollmentService::new(Arc::new(RacingStore { inner }), GradingPolicy::default());
    match racing.register(&learner, sitting.id) {
        Err(EnrollmentError::Forbidden(reason)) => {
            assert_eq!(reason, RACED_REGISTRATION_REASON);
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
}

fn off_scale(grade: u8) -> OutcomePatch {
    OutcomePatch {
        grade: Some(grade),
        ..OutcomePatch::default()
    }
}

#[test]
fn out_of_scale_grade_from_owner_is_invalid() {
    let seeded = seeded();
    let registration = seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("registration accepted");

    match seeded
        .service
        .update_outcome(&seeded.owner, registration.id, off_scale(3))
    {
        Err(EnrollmentError::Invalid(ValidationError::Grade { found: 3, .. })) => {}
        other => panic!("expected invalid grade, got {other:?}"),
    }
}

#[test]
fn lookup_and_ownership_are_checked_before_the_grade_scale() {
    let seeded = seeded();
    let registration = seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("registration accepted");

    match seeded
        .service
        .update_outcome(&seeded.outsider, registration.id, off_scale(11))
    {
        Err(EnrollmentError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    match seeded
        .service
        .update_outcome(&seeded.owner, RegistrationId(404), off_scale(11))
    {
        Err(EnrollmentError::NotFound {
            entity: "registration",
            id: 404,
        }) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn empty_patch_returns_the_registration_unchanged() {
    let seeded = seeded();
    let registration = seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("registration accepted");

    let unchanged = seeded
        .service
        .update_outcome(&seeded.owner, registration.id, OutcomePatch::default())
        .expect("empty patch is accepted");
    assert_eq!(unchanged, registration);

    match seeded
        .service
        .update_outcome(&seeded.outsider, registration.id, OutcomePatch::default())
    {
        Err(EnrollmentError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn reopening_a_failed_attempt_conflicts_with_an_open_one() {
    let seeded = seeded();
    let first = seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("first registration accepted");
    fail(&seeded, &first);
    seeded
        .service
        .register(&seeded.student, seeded.sittings[1].id)
        .expect("retake accepted");

    match seeded.service.update_outcome(
        &seeded.owner,
        first.id,
        status_patch(RegistrationStatus::Applied),
    ) {
        Err(EnrollmentError::Conflict(message)) => {
            assert_eq!(message, "student already has an open application for this subject");
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn transcript_lists_graded_attempts_newest_first() {
    let seeded = seeded();
    let first = seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("first registration accepted");
    fail(&seeded, &first);
    let second = seeded
        .service
        .register(&seeded.student, seeded.sittings[1].id)
        .expect("retake accepted");
    seeded
        .service
        .update_outcome(
            &seeded.owner,
            second.id,
            OutcomePatch {
                grade: Some(7),
                status: Some(RegistrationStatus::Passed),
                ..OutcomePatch::default()
            },
        )
        .expect("owner records a pass");

    let transcript = seeded
        .service
        .transcript(&seeded.student)
        .expect("transcript assembled");
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].registration_id, second.id);
    assert!(transcript[0].passed);
    assert_eq!(transcript[0].professor_name, seeded.owner.name);
    assert_eq!(transcript[1].registration_id, first.id);
    assert!(!transcript[1].passed);
    assert_eq!(transcript[1].subject_name, "Operating Systems");
}

#[test]
fn professor_sees_only_registrations_on_owned_subjects() {
    let seeded = seeded();
    let registration = seeded
        .service
        .register(&seeded.student, seeded.sittings[0].id)
        .expect("registration accepted");

    let owned = seeded
        .service
        .registrations_for_professor(&seeded.owner)
        .expect("owner listing");
    assert_eq!(owned, vec![registration.clone()]);

    let foreign = seeded
        .service
        .registrations_for_professor(&seeded.outsider)
        .expect("outsider listing");
    assert!(foreign.is_empty());

    let per_exam = seeded
        .service
        .registrations_for_exam(&seeded.owner, seeded.sittings[0].id)
        .expect("exam listing");
    assert_eq!(per_exam, vec![registration]);
}
