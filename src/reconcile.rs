use std::collections::HashMap;
use std::sync::OnceLock;

use crate::aliases::AliasTable;
use crate::models::{
    CourseStatus, CourseView, CurriculumPlan, MatchedEntry, ReconciliationResult, SemesterView,
    TranscriptRow, UnmappedEntry,
};
use crate::normalize::{match_key, normalize};
use crate::scorer::best_index;
use crate::stats::aggregate;

/// Subject cells that are scraped table chrome rather than courses.
/// Compared after normalization.
const PLACEHOLDER_SUBJECTS: &[&str] = &[
    "-",
    "--",
    "...",
    "…",
    "tên môn học",
    "môn học",
    "tên học phần",
    "học phần",
    "subject",
    "subject name",
    "course",
    "course name",
    "tổng",
    "tổng cộng",
    "total",
];

fn builtin_aliases() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(AliasTable::builtin)
}

/// Matches transcript rows against a plan. Holds only the alias table, so
/// one instance can serve any number of passes.
#[derive(Debug, Clone)]
pub struct Reconciler {
    aliases: AliasTable,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(builtin_aliases().clone())
    }
}

impl Reconciler {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn reconcile(&self, plan: &CurriculumPlan, rows: &[TranscriptRow]) -> ReconciliationResult {
        reconcile_with(&self.aliases, plan, rows)
    }
}

/// [`Reconciler::reconcile`] with the built-in alias table.
pub fn reconcile(plan: &CurriculumPlan, rows: &[TranscriptRow]) -> ReconciliationResult {
    reconcile_with(builtin_aliases(), plan, rows)
}

pub fn is_placeholder_subject(subject: &str) -> bool {
    let key = normalize(subject);
    key.is_empty() || PLACEHOLDER_SUBJECTS.contains(&key.as_str())
}

fn reconcile_with(
    aliases: &AliasTable,
    plan: &CurriculumPlan,
    rows: &[TranscriptRow],
) -> ReconciliationResult {
    let mut skipped = Vec::new();
    let mut keys: Vec<Option<String>> = Vec::with_capacity(rows.len());
    let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();

    for (index, row) in rows.iter().enumerate() {
        if is_placeholder_subject(&row.subject_name) {
            skipped.push(index);
            keys.push(None);
            continue;
        }
        let key = match_key(&row.subject_name);
        by_key.entry(key.clone()).or_default().push(index);
        keys.push(Some(key));
    }

    let mut consumed = vec![false; rows.len()];
    let mut matched = Vec::new();

    for course in plan.courses() {
        let name = normalize(&course.parsed_name);
        let mut candidates: Vec<usize> = std::iter::once(&name)
            .chain(aliases.aliases_of(&name).iter())
            .filter_map(|key| by_key.get(key))
            .flatten()
            .copied()
            .filter(|&index| !consumed[index])
            .collect();
        if candidates.is_empty() {
            continue;
        }
        candidates.sort_unstable();
        candidates.dedup();

        let Some(best) = best_index(rows, &candidates) else {
            continue;
        };
        for &index in &candidates {
            consumed[index] = true;
        }
        matched.push(MatchedEntry {
            display_label: course.display_label.clone(),
            row: rows[best].clone(),
            row_index: best,
            consumed: candidates,
        });
    }

    let unmapped = collect_unmapped(rows, &keys, &consumed);

    tracing::debug!(
        major = plan.major.as_str(),
        rows = rows.len(),
        matched = matched.len(),
        unmapped = unmapped.len(),
        skipped = skipped.len(),
        "reconcile: pass complete"
    );

    let mut result = ReconciliationResult {
        matched,
        unmapped,
        skipped,
        stats: Default::default(),
    };
    result.stats = aggregate(plan, &result);
    result
}

/// Groups leftover rows by normalized name and keeps the best attempt of
/// each group, in order of first appearance.
fn collect_unmapped(
    rows: &[TranscriptRow],
    keys: &[Option<String>],
    consumed: &[bool],
) -> Vec<UnmappedEntry> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();

    for (index, key) in keys.iter().enumerate() {
        let Some(key) = key.as_deref() else {
            continue;
        };
        if consumed[index] {
            continue;
        }
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(index);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let members = groups.remove(key)?;
            let best = best_index(rows, &members)?;
            Some(UnmappedEntry {
                normalized_name: key.to_string(),
                row: rows[best].clone(),
                row_index: best,
                consumed: members,
            })
        })
        .collect()
}

impl ReconciliationResult {
    /// Per-semester listing of the plan with each course's status.
    pub fn semester_view(&self, plan: &CurriculumPlan) -> Vec<SemesterView> {
        plan.semesters
            .iter()
            .map(|semester| SemesterView {
                name: semester.name.clone(),
                courses: semester
                    .courses
                    .iter()
                    .map(|course| {
                        let entry = self.matched_for(&course.display_label);
                        CourseView {
                            display_label: course.display_label.clone(),
                            name: course.parsed_name.clone(),
                            credits: course.credits,
                            status: entry.map_or(CourseStatus::NotTaken, |e| status_of(&e.row)),
                            row_index: entry.map(|e| e.row_index),
                        }
                    })
                    .collect(),
            })
            .collect()
    }
}

pub fn status_of(row: &TranscriptRow) -> CourseStatus {
    match row.score() {
        None => CourseStatus::InProgress,
        Some(_) if row.is_fail() => CourseStatus::Failed,
        Some(_) => CourseStatus::Passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::build_semester;

    fn plan(labels: &[&str]) -> CurriculumPlan {
        let labels: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        CurriculumPlan {
            major: "cntt".to_string(),
            version: "test".to_string(),
            semesters: vec![build_semester("Học kỳ 1", &labels)],
        }
    }

    fn row(subject: &str, score: &str, letter: &str, credits: &str) -> TranscriptRow {
        let mut row = TranscriptRow::new(subject);
        row.final_score = score.to_string();
        row.letter_grade = letter.to_string();
        row.credits = credits.to_string();
        row
    }

    #[test]
    fn empty_inputs_give_empty_result() {
        let result = reconcile(&plan(&[]), &[]);
        assert!(result.matched.is_empty());
        assert!(result.unmapped.is_empty());
        assert!(result.skipped.is_empty());
        assert_eq!(result.stats.average_score, None);
    }

    #[test]
    fn transcript_suffix_is_stripped_before_matching() {
        let plan = plan(&["Lập trình căn bản (3 tín chỉ)"]);
        let rows = vec![row("lập trình  căn bản (3)", "8", "B+", "3")];
        let result = reconcile(&plan, &rows);
        assert_eq!(result.matched.len(), 1);
        assert!(result.unmapped.is_empty());
    }

    #[test]
    fn earlier_course_consumes_shared_rows() {
        let plan = plan(&["Toán cao cấp A3 (3 tín chỉ)", "Đại số tuyến tính (3 tín chỉ)"]);
        let rows = vec![row("Đại số tuyến tính", "6", "C", "3")];
        let result = reconcile(&plan, &rows);
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].display_label, "Toán cao cấp A3 (3 tín chỉ)");
    }

    #[test]
    fn placeholders_are_skipped() {
        let plan = plan(&["Lập trình căn bản (3 tín chỉ)"]);
        let rows = vec![
            row("Tên môn học", "", "", ""),
            row("   ", "9", "A", "3"),
            row("-", "", "", ""),
            row("Lập trình căn bản", "7", "B", "3"),
        ];
        let result = reconcile(&plan, &rows);
        assert_eq!(result.skipped, vec![0, 1, 2]);
        assert_eq!(result.matched[0].consumed, vec![3]);
    }

    #[test]
    fn alias_and_direct_rows_merge_in_input_order() {
        let plan = plan(&["Toán cao cấp A3 (3 tín chỉ)"]);
        let rows = vec![
            row("Đại số tuyến tính", "6.0", "C", "3"),
            row("Toán cao cấp A3", "6.0", "C", "3"),
        ];
        let result = reconcile(&plan, &rows);
        let entry = &result.matched[0];
        assert_eq!(entry.consumed, vec![0, 1]);
        assert_eq!(entry.row_index, 0);
    }

    #[test]
    fn custom_aliases_are_used() {
        let mut aliases = AliasTable::new();
        aliases.insert("Cấu trúc dữ liệu", "CTDL");
        let reconciler = Reconciler::new(aliases);
        let plan = plan(&["Cấu trúc dữ liệu (4 tín chỉ)"]);
        let rows = vec![row("ctdl", "9", "A", "4")];
        let result = reconciler.reconcile(&plan, &rows);
        assert_eq!(result.matched.len(), 1);
    }

    #[test]
    fn semester_view_reports_status() {
        let plan = plan(&[
            "Lập trình căn bản (3 tín chỉ)",
            "Cấu trúc dữ liệu (4 tín chỉ)",
            "Mạng máy tính (3 tín chỉ)",
            "Hệ điều hành (3 tín chỉ)",
        ]);
        let rows = vec![
            row("Lập trình căn bản", "7", "B", "3"),
            row("Cấu trúc dữ liệu", "", "", "4"),
            row("Mạng máy tính", "2", "F", "3"),
        ];
        let view = reconcile(&plan, &rows).semester_view(&plan);
        let statuses: Vec<_> = view[0].courses.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                CourseStatus::Passed,
                CourseStatus::InProgress,
                CourseStatus::Failed,
                CourseStatus::NotTaken
            ]
        );
        assert_eq!(view[0].courses[3].row_index, None);
    }
}
