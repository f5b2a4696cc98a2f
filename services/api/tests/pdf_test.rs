//! Integration tests for the PDF export adapter.

use api_lib::adapters::PrintPdfExporter;
use chrono::Utc;
use learnai_core::domain::{LearningPlanRecord, PlanProfile, SchoolLevel};
use learnai_core::ports::PlanExportService;
use uuid::Uuid;

fn record_with_plan(plan_text: &str) -> LearningPlanRecord {
    LearningPlanRecord {
        id: "plan_test".to_string(),
        owner_id: Uuid::new_v4(),
        created_at: Utc::now(),
        profile: PlanProfile {
            age: "16".to_string(),
            school_level: SchoolLevel::Lycee,
            average_grade: "14/20".to_string(),
            learning_difficulties: "concentration".to_string(),
            subject: "Mathématiques".to_string(),
            specific_requests: "plus d'exercices".to_string(),
        },
        generated_plan_text: Some(plan_text.to_string()),
        is_saved: false,
    }
}

#[test]
fn rendering_produces_a_pdf_document() {
    let exporter = PrintPdfExporter::new();
    let export = exporter
        .render_pdf(&record_with_plan(
            "Semaine 1: Algèbre\n• Réviser les équations\n\nObjectifs:\n1. Comprendre les bases",
        ))
        .unwrap();

    assert!(export.bytes.starts_with(b"%PDF"), "output must be a PDF document");
    assert!(export.file_name.starts_with("Plan_Math_matiques_"));
    assert!(export.file_name.ends_with(".pdf"));
}

#[test]
fn empty_plan_bodies_still_render() {
    let exporter = PrintPdfExporter::new();
    let mut record = record_with_plan("");
    record.generated_plan_text = None;
    record.profile.learning_difficulties = String::new();
    record.profile.specific_requests = String::new();
    record.profile.average_grade = String::new();

    let export = exporter.render_pdf(&record).unwrap();
    assert!(export.bytes.starts_with(b"%PDF"));
}

#[test]
fn long_plans_paginate() {
    let exporter = PrintPdfExporter::new();

    // Enough paragraphs to overflow a single A4 page.
    let long_plan = (1..=40)
        .map(|week| {
            format!(
                "Semaine {week}: Révisions\n• Relire le cours\n• Faire les exercices\nTravail personnel sur les notions vues en classe."
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let short = exporter.render_pdf(&record_with_plan("Une seule ligne")).unwrap();
    let long = exporter.render_pdf(&record_with_plan(&long_plan)).unwrap();

    // printpdf stores one /Page dictionary per page.
    let count_pages = |bytes: &[u8]| {
        let haystack = String::from_utf8_lossy(bytes).into_owned();
        haystack.matches("/Page").count()
    };
    assert!(
        count_pages(&long.bytes) > count_pages(&short.bytes),
        "a long plan must spill onto additional pages"
    );
}
