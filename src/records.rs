use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::Result;

const FIELD_SEPARATOR: &str = "||";

/// One data row of the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoiRecord {
    pub state: String,
    pub interest: String,
    /// The raw line, trimmed, kept around for diagnostics.
    pub line: String,
}

/// Lazily reads `state||interest` rows.
///
/// Lines without the `||` marker are skipped. The first line is dropped when it
/// looks like a header, i.e. mentions both "state" and "interest".
pub struct PoiRecords<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl PoiRecords<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> PoiRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for PoiRecords<R> {
    type Item = Result<PoiRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            let line_no = self.line_no;
            self.line_no += 1;

            if !line.contains(FIELD_SEPARATOR) {
                continue;
            }
            if line_no == 0 && is_header(&line) {
                continue;
            }
            if let Some((state, interest)) = split_fields(&line) {
                return Some(Ok(PoiRecord {
                    state: state.to_string(),
                    interest: interest.to_string(),
                    line: line.trim().to_string(),
                }));
            }
        }
    }
}

#[inline]
fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("state") && lower.contains("interest")
}

/// Splits on `||` and returns the first two fields trimmed. Anything after the
/// second field is ignored.
fn split_fields(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(FIELD_SEPARATOR);
    let state = parts.next()?.trim();
    let interest = parts.next()?.trim();
    Some((state, interest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(input: &str) -> Vec<(String, String)> {
        PoiRecords::new(Cursor::new(input.to_string()))
            .map(|r| r.map(|r| (r.state, r.interest)))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn skips_header_and_blank_lines() {
        let rows = collect("State || Interest\nUtah||Zion National Park\n\nnot a row\nNevada || Hoover Dam \n");
        assert_eq!(
            rows,
            vec![
                ("Utah".to_string(), "Zion National Park".to_string()),
                ("Nevada".to_string(), "Hoover Dam".to_string()),
            ]
        );
    }

    #[test]
    fn first_line_without_header_words_is_data() {
        let rows = collect("Utah||Arches\nUtah||Bryce Canyon\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1, "Arches");
    }

    #[test]
    fn header_words_only_matter_on_the_first_line() {
        let rows = collect("Utah||Arches\nState||Interest\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], ("State".to_string(), "Interest".to_string()));
    }

    #[test]
    fn header_after_malformed_first_line_is_data() {
        let rows = collect("garbage\nstate||interest\n");
        assert_eq!(rows, vec![("state".to_string(), "interest".to_string())]);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let rows = collect("Montana||Glacier National Park||extra||more\n");
        assert_eq!(
            rows,
            vec![("Montana".to_string(), "Glacier National Park".to_string())]
        );
    }

    #[test]
    fn keeps_raw_line_for_diagnostics() {
        let rec = PoiRecords::new(Cursor::new("  Nebraska||Chimney Rock  \n"))
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(rec.line, "Nebraska||Chimney Rock");
    }

    #[test]
    fn open_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PoiRecords::open(dir.path().join("missing.csv")).is_err());
    }
}
