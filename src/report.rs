use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{CourseStatus, CurriculumPlan, ReconciliationResult, Stats};

pub fn format_average(stats: &Stats) -> String {
    match stats.average_score {
        Some(avg) => format!("{avg:.2}"),
        None => "n/a".to_string(),
    }
}

pub fn build_report(
    plan: &CurriculumPlan,
    result: &ReconciliationResult,
    generated_at: DateTime<Utc>,
) -> String {
    let stats = &result.stats;
    let mut output = String::new();

    let _ = writeln!(output, "# Transcript Progress Report");
    let _ = writeln!(
        output,
        "Major {} (plan {}), generated {}",
        plan.major,
        if plan.version.is_empty() { "unversioned" } else { plan.version.as_str() },
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(
        output,
        "- Credits earned: {} of {} in plan ({} passed)",
        stats.earned_credits, stats.total_credits, stats.passed_credits
    );
    let _ = writeln!(output, "- Average score: {}", format_average(stats));
    let _ = writeln!(
        output,
        "- Courses matched: {}, electives: {}, skipped rows: {}",
        result.matched.len(),
        result.unmapped.len(),
        result.skipped.len()
    );

    for semester in result.semester_view(plan) {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", semester.name);
        if semester.courses.is_empty() {
            let _ = writeln!(output, "No courses in this semester.");
            continue;
        }
        for course in semester.courses {
            let detail = course
                .row_index
                .and_then(|_| result.matched_for(&course.display_label))
                .map(|entry| {
                    let mut cell = entry.row.final_score.clone();
                    if !entry.row.letter_grade.is_empty() {
                        let _ = write!(cell, " {}", entry.row.letter_grade);
                    }
                    if entry.row.manually_edited {
                        cell.push_str(" (edited)");
                    }
                    cell
                });
            let marker = match course.status {
                CourseStatus::Passed => "x",
                _ => " ",
            };
            match detail {
                Some(detail) if course.status != CourseStatus::InProgress => {
                    let _ = writeln!(
                        output,
                        "- [{marker}] {} ({} credits): {}, {}",
                        course.name,
                        course.credits,
                        course.status.as_str(),
                        detail.trim()
                    );
                }
                _ => {
                    let _ = writeln!(
                        output,
                        "- [{marker}] {} ({} credits): {}",
                        course.name,
                        course.credits,
                        course.status.as_str()
                    );
                }
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Electives and Unclassified");
    if result.unmapped.is_empty() {
        let _ = writeln!(output, "No courses outside the plan.");
    } else {
        for entry in &result.unmapped {
            let score = if entry.row.final_score.trim().is_empty() {
                "in progress"
            } else {
                entry.row.final_score.trim()
            };
            let _ = writeln!(
                output,
                "- {} ({} credits): {}",
                entry.row.subject_name.trim(),
                entry.row.credit_count(),
                score
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::build_semester;
    use crate::models::TranscriptRow;
    use crate::reconcile::reconcile;

    #[test]
    fn report_lists_plan_and_electives() {
        let plan = CurriculumPlan {
            major: "cntt".to_string(),
            version: "K2023".to_string(),
            semesters: vec![build_semester(
                "Học kỳ 1",
                &[
                    "Lập trình căn bản (3 tín chỉ)".to_string(),
                    "Triết học (2 tín chỉ)".to_string(),
                ],
            )],
        };
        let mut passed = TranscriptRow::new("Lập trình căn bản");
        passed.final_score = "7.5".to_string();
        passed.letter_grade = "B".to_string();
        passed.credits = "3".to_string();
        let elective = TranscriptRow::new("Đồ án chuyên đề");

        let result = reconcile(&plan, &[passed, elective]);
        let report = build_report(&plan, &result, Utc::now());

        assert!(report.contains("Credits earned: 3 of 5 in plan (3 passed)"));
        assert!(report.contains("Average score: 7.50"));
        assert!(report.contains("- [x] Lập trình căn bản (3 credits): passed, 7.5 B"));
        assert!(report.contains("- [ ] Triết học (2 credits): not taken"));
        assert!(report.contains("- Đồ án chuyên đề (0 credits): in progress"));
    }

    #[test]
    fn missing_average_is_not_zero() {
        let stats = Stats::default();
        assert_eq!(format_average(&stats), "n/a");
    }
}
