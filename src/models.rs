use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::grades;

/// Stable handle assigned to a row when it enters the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(Uuid);

/// Namespace for ids derived from row content.
const ROW_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2d3e_8a47_4b5c_9e0f_1a2b_3c4d_5e6f);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Placeholder for rows loaded without an id; see [`RowId::derived`].
    pub fn unassigned() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_unassigned(&self) -> bool {
        self.0.is_nil()
    }

    /// Same position and cells always give the same id.
    pub fn derived(position: usize, cells: &[String]) -> Self {
        let mut name = position.to_string();
        for cell in cells {
            name.push('\u{1f}');
            name.push_str(cell);
        }
        Self(Uuid::new_v5(&ROW_NAMESPACE, name.as_bytes()))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RowId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RowId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// One exam record as scraped from the records portal.
///
/// Score and credit cells stay as strings so blank and `-` markers survive
/// a save/load cycle untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRow {
    #[serde(default = "RowId::unassigned")]
    pub id: RowId,
    #[serde(default)]
    pub academic_year: String,
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub subject_name: String,
    #[serde(default)]
    pub attempt_number: String,
    #[serde(default)]
    pub midterm_score: String,
    #[serde(default)]
    pub continuous_score: String,
    #[serde(default)]
    pub final_exam_score: String,
    #[serde(default)]
    pub final_score: String,
    #[serde(default)]
    pub letter_grade: String,
    #[serde(default)]
    pub credits: String,
    #[serde(default)]
    pub manually_edited: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

impl TranscriptRow {
    /// Empty row with a fresh id.
    pub fn new(subject_name: impl Into<String>) -> Self {
        Self {
            id: RowId::new(),
            academic_year: String::new(),
            term: String::new(),
            subject_name: subject_name.into(),
            attempt_number: String::new(),
            midterm_score: String::new(),
            continuous_score: String::new(),
            final_exam_score: String::new(),
            final_score: String::new(),
            letter_grade: String::new(),
            credits: String::new(),
            manually_edited: false,
            extra: Vec::new(),
        }
    }

    pub fn score(&self) -> Option<f64> {
        grades::parse_score(&self.final_score)
    }

    pub fn credit_count(&self) -> u32 {
        grades::parse_credits(&self.credits)
    }

    pub fn is_fail(&self) -> bool {
        grades::is_fail_grade(&self.letter_grade)
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::AcademicYear => &self.academic_year,
            Field::Term => &self.term,
            Field::SubjectName => &self.subject_name,
            Field::AttemptNumber => &self.attempt_number,
            Field::MidtermScore => &self.midterm_score,
            Field::ContinuousScore => &self.continuous_score,
            Field::FinalExamScore => &self.final_exam_score,
            Field::FinalScore => &self.final_score,
            Field::LetterGrade => &self.letter_grade,
            Field::Credits => &self.credits,
            Field::Extra(n) => return self.extra.get(n).map(String::as_str),
        };
        Some(value.as_str())
    }

    /// Writes one cell. Extra cells past the current width are padded with
    /// empty strings first.
    pub(crate) fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::AcademicYear => &mut self.academic_year,
            Field::Term => &mut self.term,
            Field::SubjectName => &mut self.subject_name,
            Field::AttemptNumber => &mut self.attempt_number,
            Field::MidtermScore => &mut self.midterm_score,
            Field::ContinuousScore => &mut self.continuous_score,
            Field::FinalExamScore => &mut self.final_exam_score,
            Field::FinalScore => &mut self.final_score,
            Field::LetterGrade => &mut self.letter_grade,
            Field::Credits => &mut self.credits,
            Field::Extra(n) => {
                if self.extra.len() <= n {
                    self.extra.resize(n + 1, String::new());
                }
                &mut self.extra[n]
            }
        };
        *slot = value;
    }
}

/// Editable cell of a [`TranscriptRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AcademicYear,
    Term,
    SubjectName,
    AttemptNumber,
    MidtermScore,
    ContinuousScore,
    FinalExamScore,
    FinalScore,
    LetterGrade,
    Credits,
    /// Unlabeled scraper column past the known layout, zero-based.
    Extra(usize),
}

impl Field {
    pub const NAMED: [Field; 10] = [
        Field::AcademicYear,
        Field::Term,
        Field::SubjectName,
        Field::AttemptNumber,
        Field::MidtermScore,
        Field::ContinuousScore,
        Field::FinalExamScore,
        Field::FinalScore,
        Field::LetterGrade,
        Field::Credits,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::AcademicYear => "academic_year",
            Field::Term => "term",
            Field::SubjectName => "subject_name",
            Field::AttemptNumber => "attempt_number",
            Field::MidtermScore => "midterm_score",
            Field::ContinuousScore => "continuous_score",
            Field::FinalExamScore => "final_exam_score",
            Field::FinalScore => "final_score",
            Field::LetterGrade => "letter_grade",
            Field::Credits => "credits",
            Field::Extra(_) => "extra",
        }
    }
}

impl FromStr for Field {
    type Err = EngineError;

    /// Accepts snake_case, camelCase and `extra:N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        if let Some(n) = key.strip_prefix("extra:") {
            return n
                .trim()
                .parse()
                .map(Field::Extra)
                .map_err(|_| EngineError::UnknownField(s.to_string()));
        }
        let folded: String = key
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        Field::NAMED
            .into_iter()
            .find(|field| field.as_str().replace('_', "") == folded)
            .ok_or_else(|| EngineError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Extra(n) => write!(f, "extra:{n}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// One line of a curriculum plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurriculumCourse {
    pub display_label: String,
    pub parsed_name: String,
    pub credits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurriculumSemester {
    pub name: String,
    pub courses: Vec<CurriculumCourse>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurriculumPlan {
    pub major: String,
    pub version: String,
    pub semesters: Vec<CurriculumSemester>,
}

impl CurriculumPlan {
    pub fn courses(&self) -> impl Iterator<Item = &CurriculumCourse> + '_ {
        self.semesters.iter().flat_map(|semester| semester.courses.iter())
    }
}

/// Representative attempt picked for a curriculum course.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedEntry {
    pub display_label: String,
    pub row: TranscriptRow,
    pub row_index: usize,
    /// Every row index this course consumed, representative included.
    pub consumed: Vec<usize>,
}

/// Representative attempt of a course found on the transcript but not in
/// the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmappedEntry {
    pub normalized_name: String,
    pub row: TranscriptRow,
    pub row_index: usize,
    pub consumed: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    pub total_credits: u32,
    pub earned_credits: u32,
    pub passed_credits: u32,
    /// `None` when no representative carries a numeric score.
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconciliationResult {
    /// Plan order, at most one entry per course label.
    pub matched: Vec<MatchedEntry>,
    /// First-seen order of the normalized subject name.
    pub unmapped: Vec<UnmappedEntry>,
    /// Rows dropped for an empty or placeholder subject name.
    pub skipped: Vec<usize>,
    pub stats: Stats,
}

impl ReconciliationResult {
    pub fn matched_for(&self, display_label: &str) -> Option<&MatchedEntry> {
        self.matched
            .iter()
            .find(|entry| entry.display_label == display_label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseStatus {
    Passed,
    Failed,
    InProgress,
    NotTaken,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Passed => "passed",
            CourseStatus::Failed => "failed",
            CourseStatus::InProgress => "in progress",
            CourseStatus::NotTaken => "not taken",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseView {
    pub display_label: String,
    pub name: String,
    pub credits: u32,
    pub status: CourseStatus,
    pub row_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemesterView {
    pub name: String,
    pub courses: Vec<CourseView>,
}
