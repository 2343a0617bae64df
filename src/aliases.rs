use std::collections::{BTreeSet, HashMap};

use crate::normalize::normalize;

static EMPTY: BTreeSet<String> = BTreeSet::new();

/// Known alternate transcript spellings, keyed by canonical course name.
/// Both sides are stored normalized.
const BUILTIN: &[(&str, &[&str])] = &[
    ("Toán cao cấp A3", &["Đại số tuyến tính"]),
    ("Toán cao cấp A1", &["Giải tích 1"]),
    ("Toán cao cấp A2", &["Giải tích 2"]),
    ("Anh văn 1", &["Tiếng Anh 1", "Anh văn căn bản 1"]),
    ("Anh văn 2", &["Tiếng Anh 2", "Anh văn căn bản 2"]),
    ("Giáo dục thể chất 1", &["Thể dục 1"]),
    ("Giáo dục thể chất 2", &["Thể dục 2"]),
    (
        "Triết học Mác - Lênin",
        &["Những nguyên lý cơ bản của chủ nghĩa Mác - Lênin"],
    ),
];

#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, BTreeSet<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (canonical, aliases) in BUILTIN {
            for alias in aliases.iter() {
                table.insert(canonical, alias);
            }
        }
        table
    }

    pub fn insert(&mut self, canonical: &str, alias: &str) {
        let alias = normalize(alias);
        if alias.is_empty() {
            return;
        }
        self.entries
            .entry(normalize(canonical))
            .or_default()
            .insert(alias);
    }

    /// Adds every pair of `other`, keeping existing aliases.
    pub fn extend(&mut self, other: &AliasTable) {
        for (canonical, aliases) in &other.entries {
            self.entries
                .entry(canonical.clone())
                .or_default()
                .extend(aliases.iter().cloned());
        }
    }

    /// `canonical` must already be normalized. Unknown names yield the
    /// empty set.
    pub fn aliases_of(&self, canonical: &str) -> &BTreeSet<String> {
        self.entries.get(canonical).unwrap_or(&EMPTY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_knows_linear_algebra() {
        let table = AliasTable::builtin();
        let aliases = table.aliases_of(&normalize("Toán cao cấp A3"));
        assert!(aliases.contains("đại số tuyến tính"));
    }

    #[test]
    fn missing_entry_is_empty_set() {
        let table = AliasTable::builtin();
        assert!(table.aliases_of("không có môn này").is_empty());
    }

    #[test]
    fn insert_normalizes_both_sides() {
        let mut table = AliasTable::new();
        table.insert("  Cấu trúc   DỮ LIỆU ", "CTDL  và Giải Thuật");
        table.insert("Cấu trúc dữ liệu", "   ");
        let aliases = table.aliases_of("cấu trúc dữ liệu");
        assert_eq!(aliases.len(), 1);
        assert!(aliases.contains("ctdl và giải thuật"));
    }

    #[test]
    fn extend_merges_sets() {
        let mut table = AliasTable::builtin();
        let mut extra = AliasTable::new();
        extra.insert("Toán cao cấp A3", "Linear Algebra");
        table.extend(&extra);
        let aliases = table.aliases_of("toán cao cấp a3");
        assert!(aliases.contains("đại số tuyến tính"));
        assert!(aliases.contains("linear algebra"));
    }
}
