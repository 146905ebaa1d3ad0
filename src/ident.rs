use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::records::PoiRecord;
use crate::{warn_time, Result, UNKNOWN_STATE_CODE};

/// States present in the source data and their postal codes.
const STATE_MAPPING: [(&str, &str); 9] = [
    ("California", "CA"),
    ("Nevada", "NV"),
    ("Arizona", "AZ"),
    ("Utah", "UT"),
    ("Colorado", "CO"),
    ("Montana", "MT"),
    ("South Dakota", "SD"),
    ("North Dakota", "ND"),
    ("Minnesota", "MN"),
];

static STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

/// A single attraction to fetch photos for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub interest: String,
    pub state_code: &'static str,
    /// `{state_code}_{ordinal:02}_{slug}`
    pub poi_id: String,
    pub output_dir: PathBuf,
}

/// Per-state running ordinals. Starts empty every run.
#[derive(Debug, Default, Clone)]
pub struct StateCounters {
    counts: HashMap<&'static str, u32>,
}

impl StateCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the counter for `code` and returns the new ordinal, starting at 1.
    pub fn next_ordinal(&mut self, code: &'static str) -> u32 {
        let count = self.counts.entry(code).or_insert(0);
        *count += 1;
        *count
    }
}

/// Exact (trimmed) lookup, `None` for states outside the table.
pub fn known_state_code(state_name: &str) -> Option<&'static str> {
    let name = state_name.trim();
    STATE_MAPPING
        .iter()
        .find(|(state, _)| *state == name)
        .map(|(_, code)| *code)
}

pub fn state_code(state_name: &str) -> &'static str {
    known_state_code(state_name).unwrap_or(UNKNOWN_STATE_CODE)
}

/// Turns a display name into a lowercase, underscore separated directory token.
pub fn slugify(name: &str) -> String {
    let clean = STRIP_RE.replace_all(name, "");
    let clean = clean.trim().to_lowercase();
    SEPARATOR_RE.replace_all(&clean, "_").into_owned()
}

pub fn build_task(
    counters: &mut StateCounters,
    base_dir: &Path,
    state_name: &str,
    interest: &str,
) -> Task {
    let code = state_code(state_name);
    let ordinal = counters.next_ordinal(code);
    let poi_id = format!("{code}_{ordinal:02}_{}", slugify(interest));
    let output_dir = base_dir.join(code).join(&poi_id);

    Task {
        interest: interest.to_string(),
        state_code: code,
        poi_id,
        output_dir,
    }
}

/// Consumes records in file order and builds tasks until `limit` is reached.
/// A limit of 0 means no limit.
pub fn build_tasks<I>(records: I, base_dir: &Path, limit: Option<usize>) -> Result<Vec<Task>>
where
    I: IntoIterator<Item = Result<PoiRecord>>,
{
    let limit = limit.filter(|l| *l > 0);
    let mut counters = StateCounters::new();
    let mut tasks = Vec::new();

    for record in records {
        let record = record?;
        if known_state_code(&record.state).is_none() {
            warn_time!("Unknown state '{}' in line: {}", record.state, record.line);
        }
        tasks.push(build_task(
            &mut counters,
            base_dir,
            &record.state,
            &record.interest,
        ));

        if limit.is_some_and(|l| tasks.len() >= l) {
            break;
        }
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::PoiRecords;
    use std::io::Cursor;

    #[test]
    fn known_states_map_to_codes() {
        assert_eq!(state_code("Utah"), "UT");
        assert_eq!(state_code("  South Dakota "), "SD");
        assert_eq!(state_code("Minnesota"), "MN");
    }

    #[test]
    fn unknown_states_use_sentinel() {
        assert_eq!(state_code("Nebraska"), UNKNOWN_STATE_CODE);
        assert_eq!(state_code("utah"), UNKNOWN_STATE_CODE);
        assert_eq!(known_state_code("Nebraska"), None);
    }

    #[test]
    fn slugify_strips_and_collapses() {
        assert_eq!(slugify("Zion National Park"), "zion_national_park");
        assert_eq!(slugify("  Mount Rushmore!  "), "mount_rushmore");
        assert_eq!(slugify("Bryce Canyon - Sunrise Point"), "bryce_canyon_sunrise_point");
        assert_eq!(slugify("Hoover Dam (Nevada side)"), "hoover_dam_nevada_side");
        assert_eq!(slugify("Lake--Tahoe"), "lake_tahoe");
    }

    #[test]
    fn slugify_is_idempotent() {
        for name in [
            "Zion National Park",
            "St. Mary's Falls -- Glacier",
            "  A  b\t-c ",
            "Théodore Roosevelt N.P.",
            "already_slugged_name",
        ] {
            let once = slugify(name);
            assert_eq!(slugify(&once), once, "input: {name:?}");
        }
    }

    #[test]
    fn builds_identifier_and_directory() {
        let mut counters = StateCounters::new();
        let task = build_task(&mut counters, Path::new("assets/poi"), "Utah", "Zion National Park");
        assert_eq!(task.poi_id, "UT_01_zion_national_park");
        assert_eq!(
            task.output_dir,
            Path::new("assets/poi/UT/UT_01_zion_national_park")
        );
        assert_eq!(task.state_code, "UT");
    }

    #[test]
    fn unknown_state_gets_sentinel_identifier() {
        let mut counters = StateCounters::new();
        let task = build_task(&mut counters, Path::new("assets/poi"), "Nebraska", "Chimney Rock");
        assert_eq!(task.poi_id, "UNK_01_chimney_rock");
    }

    #[test]
    fn ordinals_increase_per_state_in_file_order() {
        let input = "state||interest\nUtah||Arches\nNevada||Hoover Dam\nUtah||Zion\nUtah||Bryce\n";
        let tasks = build_tasks(
            PoiRecords::new(Cursor::new(input)),
            Path::new("out"),
            None,
        )
        .unwrap();
        let ids: Vec<_> = tasks.iter().map(|t| t.poi_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["UT_01_arches", "NV_01_hoover_dam", "UT_02_zion", "UT_03_bryce"]
        );
    }

    #[test]
    fn ordinal_keeps_two_digit_minimum() {
        let mut counters = StateCounters::new();
        let mut last = None;
        for _ in 0..12 {
            last = Some(build_task(&mut counters, Path::new("b"), "Colorado", "Peak"));
        }
        assert_eq!(last.unwrap().poi_id, "CO_12_peak");
        assert_eq!(counters.next_ordinal("CO"), 13);
        assert_eq!(counters.next_ordinal("UT"), 1);
    }

    #[test]
    fn limit_caps_tasks_and_zero_means_unlimited() {
        let input = "Utah||A\nUtah||B\nUtah||C\n";
        let capped = build_tasks(PoiRecords::new(Cursor::new(input)), Path::new("b"), Some(2)).unwrap();
        assert_eq!(capped.len(), 2);
        let all = build_tasks(PoiRecords::new(Cursor::new(input)), Path::new("b"), Some(0)).unwrap();
        assert_eq!(all.len(), 3);
    }
}
