use crate::infra::{seed_catalog, SampleCatalog};
use chrono::{Local, NaiveDate};
use clap::Args;
use enrollment::config::ConfigError;
use enrollment::error::AppError;
use enrollment::registrations::{
    EnrollmentError, EnrollmentService, ExamRegistration, GradingPolicy, InMemoryEnrollmentStore,
    OutcomePatch, RegistrationStatus, StudentDraft,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date of the first exam sitting (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) first_sitting: Option<NaiveDate>,
    /// Passing grade for the demo grading scale.
    #[arg(long, default_value_t = GradingPolicy::default().passing_grade)]
    pub(crate) passing_grade: u8,
    /// Print the final transcript as JSON instead of a table.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        first_sitting,
        passing_grade,
        json,
    } = args;

    let grading = demo_grading(passing_grade)?;
    let service = EnrollmentService::new(Arc::new(InMemoryEnrollmentStore::default()), grading);
    let first_sitting = first_sitting.unwrap_or_else(|| Local::now().date_naive());
    let catalog = seed_catalog(&service, first_sitting)?;

    println!("Exam registration demo");
    println!(
        "- subject '{}' (year {}, department {}) owned by {}",
        catalog.subject.name,
        catalog.subject.year.unwrap_or_default(),
        catalog.subject.department.as_deref().unwrap_or("any"),
        catalog.professor.name
    );
    for exam in &catalog.sittings {
        println!("  - sitting {} on {} ({})", exam.id, exam.date, exam.kind.label());
    }

    let steps = walk_lifecycle(&service, &catalog)?;
    println!("\nLifecycle");
    for step in &steps {
        println!("- {step}");
    }

    let student = service.student(catalog.student.id)?;
    let transcript = service.transcript(&student)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&transcript)?);
        return Ok(());
    }

    println!("\nTranscript for {} ({})", student.name, student.index_number);
    for entry in &transcript {
        println!(
            "- {} | {} {} | grade {} | {} points | {}",
            entry.subject_name,
            entry.exam_date,
            entry.exam_kind.label(),
            entry.grade,
            entry.points,
            if entry.passed { "passed" } else { "failed" }
        );
    }

    Ok(())
}

/// Default scale with the requested passing grade; an off-scale value is a usage error.
fn demo_grading(passing_grade: u8) -> Result<GradingPolicy, AppError> {
    let defaults = GradingPolicy::default();
    GradingPolicy::new(defaults.lowest_grade, passing_grade, defaults.highest_grade)
        .ok_or(AppError::Config(ConfigError::InconsistentGrading {
            lowest: defaults.lowest_grade,
            passing: passing_grade,
            highest: defaults.highest_grade,
        }))
}

/// Reject, promote, fail, retake, and pass, returning one line per step.
fn walk_lifecycle(
    service: &EnrollmentService<InMemoryEnrollmentStore>,
    catalog: &SampleCatalog,
) -> Result<Vec<String>, AppError> {
    let mut steps = Vec::new();
    let first = catalog.sittings[0].id;
    let second = catalog.sittings[1].id;

    steps.push(refusal(service.register(&catalog.student, first), "first-year application"));

    let student = service.update_student(
        catalog.student.id,
        StudentDraft {
            username: catalog.student.username.clone(),
            name: catalog.student.name.clone(),
            index_number: catalog.student.index_number.clone(),
            year_of_study: catalog.student.year_of_study + 1,
            department: catalog.student.department.clone(),
        },
    )?;
    steps.push(format!("promoted to year {}", student.year_of_study));

    let attempt = service.register(&student, first)?;
    steps.push(applied(&attempt));
    let lowest = service.grading().lowest_grade;
    let failed = service.update_outcome(
        &catalog.professor,
        attempt.id,
        OutcomePatch {
            grade: Some(lowest),
            points: Some(38),
            status: Some(RegistrationStatus::Failed),
        },
    )?;
    steps.push(format!(
        "attempt {} marked {} with grade {}",
        failed.attempt_number,
        failed.status.label(),
        failed.grade
    ));

    steps.push(refusal(service.register(&student, first), "retake on the failed sitting"));

    let retake = service.register(&student, second)?;
    steps.push(applied(&retake));
    let passing = service.grading().passing_grade;
    let passed = service.update_outcome(
        &catalog.professor,
        retake.id,
        OutcomePatch {
            grade: Some(passing.saturating_add(2).min(service.grading().highest_grade)),
            points: Some(81),
            status: Some(RegistrationStatus::Passed),
        },
    )?;
    steps.push(format!(
        "attempt {} marked {} with grade {}",
        passed.attempt_number,
        passed.status.label(),
        passed.grade
    ));

    steps.push(refusal(
        service.register(&student, catalog.sittings[2].id),
        "application after passing",
    ));

    Ok(steps)
}

fn applied(registration: &ExamRegistration) -> String {
    format!(
        "registered for sitting {} as attempt {}",
        registration.exam_id, registration.attempt_number
    )
}

fn refusal(result: Result<ExamRegistration, EnrollmentError>, label: &str) -> String {
    match result {
        Ok(registration) => format!("{label}: unexpectedly accepted as {}", registration.id),
        Err(err) => format!("{label}: refused ({err})"),
    }
}
