use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::aliases::AliasTable;
use crate::error::EngineError;
use crate::models::{CurriculumCourse, CurriculumPlan, CurriculumSemester};
use crate::normalize::split_label;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    plans: Vec<PlanFile>,
    #[serde(default)]
    aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PlanFile {
    major: String,
    #[serde(default)]
    version: String,
    semesters: Vec<SemesterFile>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SemesterFile {
    Named { name: String, courses: Vec<String> },
    Bare(Vec<String>),
}

/// Curriculum plans by major, plus aliases layered over the built-in table.
#[derive(Debug, Clone)]
pub struct Catalog {
    plans: BTreeMap<String, CurriculumPlan>,
    aliases: AliasTable,
}

impl Catalog {
    pub fn from_json_str(text: &str) -> Result<Self, EngineError> {
        let file: CatalogFile =
            serde_json::from_str(text).map_err(|e| EngineError::json("parse curriculum", e))?;

        let mut aliases = AliasTable::builtin();
        for (canonical, names) in &file.aliases {
            for name in names {
                aliases.insert(canonical, name);
            }
        }

        let plans = file
            .plans
            .into_iter()
            .map(|plan| {
                let semesters = plan
                    .semesters
                    .into_iter()
                    .enumerate()
                    .map(|(i, semester)| match semester {
                        SemesterFile::Named { name, courses } => build_semester(name, &courses),
                        SemesterFile::Bare(courses) => {
                            build_semester(format!("Semester {}", i + 1), &courses)
                        }
                    })
                    .collect();
                let built = CurriculumPlan {
                    major: plan.major,
                    version: plan.version,
                    semesters,
                };
                (built.major.clone(), built)
            })
            .collect();

        Ok(Self { plans, aliases })
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| EngineError::io("read curriculum", e))?;
        Self::from_json_str(&text)
    }

    pub fn plan(&self, major: &str) -> Result<&CurriculumPlan, EngineError> {
        self.plans
            .get(major)
            .ok_or_else(|| EngineError::UnknownMajor(major.to_string()))
    }

    pub fn majors(&self) -> impl Iterator<Item = &str> + '_ {
        self.plans.keys().map(String::as_str)
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }
}

pub fn parse_course(label: &str) -> CurriculumCourse {
    let (parsed_name, credits) = split_label(label);
    CurriculumCourse {
        display_label: label.to_string(),
        parsed_name,
        credits,
    }
}

pub fn build_semester(name: impl Into<String>, labels: &[String]) -> CurriculumSemester {
    CurriculumSemester {
        name: name.into(),
        courses: labels.iter().map(|label| parse_course(label)).collect(),
    }
}
