use crate::models::{CurriculumPlan, ReconciliationResult, Stats, TranscriptRow};

/// Whole-plan progress figures.
///
/// `total_credits` comes from the plan labels alone. Earned credits count
/// every representative, electives included, so they may exceed the total.
/// Sums saturate at `u32::MAX` rather than overflow on garbage credit cells.
pub fn aggregate(plan: &CurriculumPlan, result: &ReconciliationResult) -> Stats {
    let total_credits = plan
        .courses()
        .map(|course| course.credits)
        .fold(0u32, u32::saturating_add);

    let representatives: Vec<&TranscriptRow> = result
        .matched
        .iter()
        .map(|entry| &entry.row)
        .chain(result.unmapped.iter().map(|entry| &entry.row))
        .collect();

    let earned_credits = representatives
        .iter()
        .map(|row| row.credit_count())
        .fold(0u32, u32::saturating_add);
    let passed_credits = representatives
        .iter()
        .filter(|row| row.score().is_some() && !row.is_fail())
        .map(|row| row.credit_count())
        .fold(0u32, u32::saturating_add);

    Stats {
        total_credits,
        earned_credits,
        passed_credits,
        average_score: average_score(&representatives),
    }
}

pub fn average_score(rows: &[&TranscriptRow]) -> Option<f64> {
    let scores: Vec<f64> = rows.iter().filter_map(|row| row.score()).collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::build_semester;
    use crate::reconcile::reconcile;

    fn sample_plan() -> CurriculumPlan {
        CurriculumPlan {
            major: "cntt".to_string(),
            version: "K2023".to_string(),
            semesters: vec![
                build_semester(
                    "Học kỳ 1",
                    &["Lập trình căn bản (3 tín chỉ)".to_string(), "Triết học (2 tín chỉ)".to_string()],
                ),
                build_semester("Học kỳ 2", &["Cấu trúc dữ liệu (4 tín chỉ)".to_string()]),
            ],
        }
    }

    fn graded(subject: &str, score: &str, letter: &str, credits: &str) -> TranscriptRow {
        let mut row = TranscriptRow::new(subject);
        row.final_score = score.to_string();
        row.letter_grade = letter.to_string();
        row.credits = credits.to_string();
        row
    }

    #[test]
    fn total_comes_from_plan_only() {
        let plan = sample_plan();
        let stats = reconcile(&plan, &[]).stats;
        assert_eq!(stats.total_credits, 9);
        assert_eq!(stats.earned_credits, 0);
        assert_eq!(stats.average_score, None);
    }

    #[test]
    fn electives_add_to_earned() {
        let plan = sample_plan();
        let rows = vec![
            graded("Lập trình căn bản", "8.0", "B+", "3"),
            graded("Đồ án chuyên đề", "9.0", "A", "2"),
        ];
        let stats = reconcile(&plan, &rows).stats;
        assert_eq!(stats.earned_credits, 5);
        assert_eq!(stats.passed_credits, 5);
        assert_eq!(stats.average_score, Some(8.5));
    }

    #[test]
    fn ungraded_rows_are_left_out_of_the_average() {
        let plan = sample_plan();
        let rows = vec![
            graded("Lập trình căn bản", "6.0", "C", "3"),
            graded("Cấu trúc dữ liệu", "", "", "4"),
            graded("Triết học", "2.0", "F", "bad"),
        ];
        let stats = reconcile(&plan, &rows).stats;
        assert_eq!(stats.earned_credits, 7);
        assert_eq!(stats.passed_credits, 3);
        assert_eq!(stats.average_score, Some(4.0));
    }

    #[test]
    fn huge_credit_cells_saturate() {
        let plan = sample_plan();
        let rows = vec![
            graded("Đồ án chuyên đề", "9.0", "A", "4294967295"),
            graded("Thực tập", "8.0", "B", "1"),
        ];
        let stats = reconcile(&plan, &rows).stats;
        assert_eq!(stats.earned_credits, u32::MAX);
        assert_eq!(stats.passed_credits, u32::MAX);
        assert_eq!(stats.total_credits, 9);
    }

    #[test]
    fn huge_plan_credits_saturate() {
        let plan = CurriculumPlan {
            major: "cntt".to_string(),
            version: "K2023".to_string(),
            semesters: vec![build_semester(
                "Học kỳ 1",
                &["A (4294967295 tín chỉ)".to_string(), "B (3 tín chỉ)".to_string()],
            )],
        };
        assert_eq!(reconcile(&plan, &[]).stats.total_credits, u32::MAX);
    }

    #[test]
    fn zero_score_is_not_missing_data() {
        let plan = sample_plan();
        let rows = vec![graded("Triết học", "0", "F", "2")];
        assert_eq!(reconcile(&plan, &rows).stats.average_score, Some(0.0));
    }
}
