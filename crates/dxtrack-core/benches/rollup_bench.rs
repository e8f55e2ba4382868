//! Rollup benchmarks over a synthetic sector.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use dxtrack_core::committee::committee_average;
use dxtrack_core::rollup::{compute_dashboard, compute_department_stats, sector_average};
use dxtrack_core::{
    Assessment, Config, Department, Evaluation, EvaluatorAssessment, Project, StageId,
};
use std::collections::BTreeMap;
use std::hint::black_box;

const DEPARTMENTS: usize = 20;
const PROJECTS_PER_DEPARTMENT: usize = 50;

fn level(seed: usize) -> u8 {
    (seed % 5 + 1) as u8
}

fn sector() -> (Vec<Department>, Vec<Project>, Vec<Evaluation>) {
    let mut departments = Vec::new();
    let mut projects = Vec::new();
    let mut evaluations = Vec::new();
    for d in 0..DEPARTMENTS {
        departments.push(Department {
            id: format!("dept_{d}").into(),
            name: format!("Department {d}"),
            name_en: String::new(),
        });
        for p in 0..PROJECTS_PER_DEPARTMENT {
            let n = d * PROJECTS_PER_DEPARTMENT + p;
            projects.push(Project {
                id: format!("proj_{n}").into(),
                name: format!("Project {n}"),
                department_id: format!("dept_{d}").into(),
                program_manager: String::new(),
                city: "Riyadh".into(),
                submission_id: None,
                created_at: Utc::now(),
            });
            let mut evaluation =
                Evaluation::new(format!("eval_{n}").into(), format!("proj_{n}").into(), Utc::now());
            evaluation.stage = StageId::ALL[n % StageId::ALL.len()];
            evaluation.self_assessment = Assessment::from_levels([
                level(n),
                level(n + 1),
                level(n + 2),
                level(n + 3),
                level(n + 4),
            ])
            .unwrap();
            evaluations.push(evaluation);
        }
    }
    (departments, projects, evaluations)
}

fn bench_rollups(c: &mut Criterion) {
    let (departments, projects, evaluations) = sector();
    let config = Config::default();

    c.bench_function("rollup.department_stats_1000", |b| {
        b.iter(|| {
            let stats = compute_department_stats(
                black_box(&departments),
                black_box(&projects),
                black_box(&evaluations),
            );
            black_box(sector_average(&stats))
        });
    });

    c.bench_function("rollup.dashboard_1000", |b| {
        b.iter(|| compute_dashboard(black_box(&projects), black_box(&evaluations), &config));
    });
}

fn bench_committee(c: &mut Criterion) {
    let scores: Vec<EvaluatorAssessment> = (0..12)
        .map(|i| EvaluatorAssessment {
            evaluator_id: format!("user_{i}").into(),
            evaluator_name: format!("Evaluator {i}"),
            assessment: Assessment::from_levels([level(i); 5]).unwrap(),
            comments: BTreeMap::new(),
            submitted_at: Utc::now(),
        })
        .collect();

    c.bench_function("committee.average_12", |b| {
        b.iter(|| committee_average(black_box(&scores)));
    });
}

criterion_group!(benches, bench_rollups, bench_committee);
criterion_main!(benches);
