use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Occurrence counts for byte strings, with a running total of all weight
/// recorded.
///
/// Entries keep their first-insertion order, which is also the tie-break
/// order when ranking.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    index: HashMap<Vec<u8>, usize>,
    entries: Vec<(Vec<u8>, u64)>,
    total: u64,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `weight` occurrences of `key`.
    pub fn record(&mut self, key: Vec<u8>, weight: u64) {
        self.total += weight;
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += weight,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, weight));
            }
        }
    }

    pub fn count(&self, key: &[u8]) -> u64 {
        self.index
            .get(key)
            .map_or(0, |&slot| self.entries[slot].1)
    }

    /// Sum of every recorded weight.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u64)> {
        self.entries.iter().map(|(key, count)| (key.as_slice(), *count))
    }

    /// Entries sorted by count, highest first. Equal counts keep insertion order.
    pub fn ranked(&self) -> Vec<(&[u8], u64)> {
        let mut ranked: Vec<(&[u8], u64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Builds a ranked [`Report`] of the top `limit` entries, rendering each key
    /// with `render`. Returns `None` when nothing has been recorded.
    pub fn summarize<F>(&self, kind: &str, limit: usize, render: F) -> Option<Report>
    where
        F: Fn(&[u8]) -> String,
    {
        if self.total == 0 {
            return None;
        }
        let total = self.total as f64;
        let entries: Vec<ReportEntry> = self
            .ranked()
            .into_iter()
            .take(limit)
            .map(|(key, count)| ReportEntry {
                text: render(key),
                count,
                percent: count as f64 / total * 100.0,
            })
            .collect();
        let shown: u64 = entries.iter().map(|e| e.count).sum();
        Some(Report {
            kind: kind.to_string(),
            distinct: self.len(),
            total: self.total,
            coverage: shown as f64 / total * 100.0,
            entries,
        })
    }
}

/// A ranked frequency summary.
///
/// `Display` renders the plain-text layout; the `Serialize` form carries the
/// same numbers for machine consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Capitalised plural label, e.g. `Rules` or `Words`.
    pub kind: String,
    pub distinct: usize,
    pub total: u64,
    /// Percentage of `total` covered by the shown entries.
    pub coverage: f64,
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub text: String,
    pub count: u64,
    /// Percentage of the table total.
    pub percent: f64,
}

impl Report {
    pub fn shown(&self) -> usize {
        self.entries.len()
    }

    pub fn shown_count(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = format!(
            "\n\nTop {} {} out of {} ({:.1}% coverage)",
            thousands(self.shown() as u64),
            self.kind,
            thousands(self.distinct as u64),
            self.coverage
        );
        writeln!(f, "{header}")?;
        writeln!(f, "{}", "=".repeat(header.len()))?;
        for entry in &self.entries {
            writeln!(
                f,
                "{:>15} ({:.1}%):    {:<30}",
                thousands(entry.count),
                entry.percent,
                entry.text
            )?;
        }
        Ok(())
    }
}

/// Formats `n` with `,` between groups of three digits.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lossy(key: &[u8]) -> String {
        String::from_utf8_lossy(key).into_owned()
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }

    #[test]
    fn record_accumulates_counts_and_total() {
        let mut table = FrequencyTable::new();
        table.record(b"a".to_vec(), 1);
        table.record(b"b".to_vec(), 3);
        table.record(b"a".to_vec(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.total(), 6);
        assert_eq!(table.count(b"a"), 3);
        assert_eq!(table.count(b"missing"), 0);
    }

    #[test]
    fn ranking_is_stable_for_ties() {
        let mut table = FrequencyTable::new();
        for key in ["x", "y", "z", "y"] {
            table.record(key.as_bytes().to_vec(), 1);
        }
        let ranked: Vec<&[u8]> = table.ranked().into_iter().map(|(k, _)| k).collect();
        assert_eq!(ranked, vec![&b"y"[..], &b"x"[..], &b"z"[..]]);
    }

    #[test]
    fn summarize_empty_table_is_none() {
        assert!(FrequencyTable::new().summarize("Rules", 10, lossy).is_none());
    }

    #[test]
    fn coverage_is_shown_over_total() {
        let mut table = FrequencyTable::new();
        table.record(b"a".to_vec(), 3);
        table.record(b"b".to_vec(), 1);
        let report = table.summarize("Words", 1, lossy).unwrap();
        assert_eq!(report.shown(), 1);
        assert_eq!(report.shown_count(), 3);
        assert!((report.coverage - 75.0).abs() < 1e-9);
        assert!(report.shown_count() <= report.total);

        let full = table.summarize("Words", 10, lossy).unwrap();
        assert_eq!(full.shown_count(), full.total);
        assert!((full.coverage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn display_layout() {
        let mut table = FrequencyTable::new();
        for _ in 0..1500 {
            table.record(b"summer".to_vec(), 1);
        }
        table.record(b"winter".to_vec(), 500);
        let text = table.summarize("Words", 5, lossy).unwrap().to_string();
        let header = "\n\nTop 2 Words out of 2 (100.0% coverage)";
        let expected = format!(
            "{header}\n{}\n{:>15} (75.0%):    {:<30}\n{:>15} (25.0%):    {:<30}\n",
            "=".repeat(header.len()),
            "1,500",
            "summer",
            "500",
            "winter"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn report_serializes_for_machine_consumers() {
        let mut table = FrequencyTable::new();
        table.record(b"abc".to_vec(), 2);
        let report = table.summarize("Words", 5, lossy).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "Words");
        assert_eq!(json["entries"][0]["text"], "abc");
        assert_eq!(json["entries"][0]["count"], 2);
        assert_eq!(json["distinct"], 1);
    }
}
