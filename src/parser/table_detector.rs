//! Stream-mode table detection.
//!
//! Tables are found from text alignment alone, without ruling lines: spans
//! are grouped into rows by baseline, column edges are the left edges that
//! recur across rows, and runs of rows that line up with those edges become
//! tables. Numbered and bulleted lists produce the same geometry and are
//! filtered out.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::spans::TextSpan;

/// Tuning knobs for [`TableDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableDetectorConfig {
    /// Minimum number of rows in a table
    pub min_rows: usize,
    /// Minimum number of columns in a table
    pub min_columns: usize,
    /// Maximum number of columns (wider regions are usually word-split prose)
    pub max_columns: usize,
    /// Baseline tolerance for row grouping, as a fraction of font size
    pub row_tolerance: f32,
    /// Fraction of a row's spans that must sit on a column edge
    pub min_alignment_ratio: f32,
    /// Minimum horizontal distance between two column edges (points)
    pub min_column_gap: f32,
    /// Width of the buckets left edges are snapped to (points)
    pub edge_bucket: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            row_tolerance: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            edge_bucket: 5.0,
        }
    }
}

/// One row of spans sharing a baseline.
#[derive(Debug, Clone)]
pub struct SpanRow {
    /// Mean baseline of the row
    pub y: f32,
    /// Spans, left to right
    pub spans: Vec<TextSpan>,
}

/// A table region found on a page.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Column left edges, ascending
    pub columns: Vec<f32>,
    /// Rows, top to bottom
    pub rows: Vec<SpanRow>,
    /// Rightmost extent of any span in the table
    pub right_x: f32,
}

impl DetectedTable {
    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Cell grid: every row has exactly `column_count()` cells. Spans that
    /// fall into the same cell are joined with a space.
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Vec<&str>> = vec![Vec::new(); self.columns.len()];
                for span in &row.spans {
                    let col = column_for(span.x, &self.columns, self.right_x);
                    if let Some(cell) = cells.get_mut(col) {
                        cell.push(span.text.trim());
                    }
                }
                cells.into_iter().map(|parts| parts.join(" ")).collect()
            })
            .collect()
    }
}

/// Finds tables in the spans of one page.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables, top of page first.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<DetectedTable> {
        let cfg = &self.config;

        if spans.len() < cfg.min_rows * cfg.min_columns {
            log::trace!("TableDetector: only {} spans", spans.len());
            return Vec::new();
        }

        let rows = self.group_rows(spans);
        if rows.len() < cfg.min_rows {
            return Vec::new();
        }

        let page_columns = self.column_edges(&rows);
        if page_columns.len() < cfg.min_columns {
            log::trace!("TableDetector: {} column edges on page", page_columns.len());
            return Vec::new();
        }

        let mut tables = Vec::new();
        for (start, end) in self.aligned_runs(&rows, &page_columns) {
            let region = &rows[start..=end];

            // Edges are recomputed per region; a page-wide edge may not apply here.
            let columns = self.column_edges(region);
            if columns.len() < cfg.min_columns {
                continue;
            }
            if columns.len() > cfg.max_columns {
                log::debug!(
                    "TableDetector: rejecting region with {} columns (max {})",
                    columns.len(),
                    cfg.max_columns
                );
                continue;
            }
            if looks_like_list(region, &columns) {
                log::debug!("TableDetector: rejecting list-shaped region");
                continue;
            }

            let right_x = region
                .iter()
                .flat_map(|r| r.spans.iter())
                .map(TextSpan::right)
                .fold(f32::MIN, f32::max);

            tables.push(DetectedTable {
                columns,
                rows: region.to_vec(),
                right_x,
            });
        }

        log::debug!("TableDetector: {} tables from {} rows", tables.len(), rows.len());
        tables
    }

    /// Group spans into rows by baseline, top of page first.
    fn group_rows(&self, spans: &[TextSpan]) -> Vec<SpanRow> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
        });

        let mut rows: Vec<SpanRow> = Vec::new();
        let mut current: Vec<TextSpan> = Vec::new();
        let mut anchor_y = f32::NAN;

        for span in sorted {
            let tolerance = span.font_size * self.config.row_tolerance;
            if !current.is_empty() && (span.y - anchor_y).abs() > tolerance {
                rows.push(close_row(std::mem::take(&mut current)));
            }
            if current.is_empty() {
                anchor_y = span.y;
            }
            current.push(span);
        }
        if !current.is_empty() {
            rows.push(close_row(current));
        }

        rows
    }

    /// Left edges shared by enough rows, at least `min_column_gap` apart.
    ///
    /// Rows with two or more spans are the evidence; when too few rows have
    /// that shape every span of every row is counted instead.
    fn column_edges(&self, rows: &[SpanRow]) -> Vec<f32> {
        let cfg = &self.config;
        let multi: Vec<&SpanRow> = rows.iter().filter(|r| r.spans.len() >= 2).collect();

        let mut counts: HashMap<i32, usize> = HashMap::new();
        let evidence_rows = if multi.len() >= cfg.min_rows {
            for row in &multi {
                let buckets: HashSet<i32> = row.spans.iter().map(|s| self.bucket(s.x)).collect();
                for b in buckets {
                    *counts.entry(b).or_default() += 1;
                }
            }
            multi.len()
        } else {
            for span in rows.iter().flat_map(|r| r.spans.iter()) {
                *counts.entry(self.bucket(span.x)).or_default() += 1;
            }
            rows.len()
        };

        let threshold = ((evidence_rows as f32 * cfg.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = counts
            .into_iter()
            .filter(|&(_, n)| n >= threshold)
            .map(|(b, _)| b as f32 * cfg.edge_bucket)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut merged: Vec<f32> = Vec::with_capacity(edges.len());
        for edge in edges {
            match merged.last() {
                Some(&last) if edge - last < cfg.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    fn bucket(&self, x: f32) -> i32 {
        (x / self.config.edge_bucket).round() as i32
    }

    /// Maximal runs of consecutive aligned rows, at least `min_rows` long.
    fn aligned_runs(&self, rows: &[SpanRow], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let aligned = self.alignment(row, columns) >= self.config.min_alignment_ratio;
            match (aligned, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if i - s >= self.config.min_rows {
                        runs.push((s, i - 1));
                    }
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                runs.push((s, rows.len() - 1));
            }
        }

        runs
    }

    /// Fraction of a row's spans starting on a column edge.
    fn alignment(&self, row: &SpanRow, columns: &[f32]) -> f32 {
        if row.spans.is_empty() {
            return 0.0;
        }
        let tolerance = self.config.edge_bucket;
        let on_edge = row
            .spans
            .iter()
            .filter(|s| columns.iter().any(|c| (s.x - c).abs() <= tolerance))
            .count();
        on_edge as f32 / row.spans.len() as f32
    }
}

fn close_row(mut spans: Vec<TextSpan>) -> SpanRow {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
    SpanRow { y, spans }
}

/// Column a span starting at `x` belongs to.
///
/// A span belongs to the first column whose band `[edge - 10, next - 10)`
/// contains it; otherwise to the nearest edge.
fn column_for(x: f32, columns: &[f32], right_x: f32) -> usize {
    const SLACK: f32 = 10.0;

    for (i, &edge) in columns.iter().enumerate() {
        let next = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if x >= edge - SLACK && x < next - SLACK {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - **a)
                .abs()
                .partial_cmp(&(x - **b).abs())
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Whether a region is a bulleted or numbered list rather than a table.
///
/// Half the rows starting with a bullet is enough. Numbered markers only
/// disqualify two-column regions, so real tables with an index column
/// survive.
fn looks_like_list(rows: &[SpanRow], columns: &[f32]) -> bool {
    if columns.len() < 2 || rows.is_empty() {
        return false;
    }

    let mut bullets = 0usize;
    let mut numbers = 0usize;
    for row in rows {
        let Some(first) = row
            .spans
            .iter()
            .min_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
        else {
            continue;
        };
        let marker = first.text.trim();
        if is_bullet_marker(marker) {
            bullets += 1;
        } else if is_number_marker(marker) {
            numbers += 1;
        }
    }

    let n = rows.len() as f32;
    bullets as f32 / n >= 0.5 || (columns.len() == 2 && (bullets + numbers) as f32 / n >= 0.5)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text,
        "-" | "\u{2013}"
            | "\u{2014}"
            | "\u{2022}"
            | "\u{00B7}"
            | "*"
            | "\u{25CB}"
            | "\u{25AA}"
            | "\u{25E6}"
            | "\u{25B8}"
            | "\u{25BA}"
            | "\u{25A0}"
            | "\u{25CF}"
            | "\u{25A1}"
            | "\u{25C6}"
            | "\u{25B6}"
            | "\u{27A4}"
    )
}

/// "1.", "12)", "3", "a.", "B)".
fn is_number_marker(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return false;
    }

    let body = compact
        .strip_suffix('.')
        .or_else(|| compact.strip_suffix(')'))
        .unwrap_or(&compact);

    if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    body.len() < compact.len() && body.chars().count() == 1 && body.chars().all(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text, x, y, 10.0)
    }

    fn grid_spans(cells: &[&[&str]], xs: &[f32], top: f32) -> Vec<TextSpan> {
        cells
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .zip(xs)
                    .map(move |(text, &x)| span(text, x, top - 14.0 * r as f32))
            })
            .collect()
    }

    #[test]
    fn test_rows_grouped_by_baseline() {
        let detector = TableDetector::new();
        let spans = vec![
            span("Region", 72.0, 500.0),
            span("Units", 200.0, 501.5),
            span("North", 72.0, 486.0),
            span("1200", 200.0, 486.0),
        ];

        let rows = detector.group_rows(&spans);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].spans[0].text, "Region");
        assert_eq!(rows[0].spans[1].text, "Units");
        assert_eq!(rows[1].spans.len(), 2);
    }

    #[test]
    fn test_three_column_table_grid() {
        let detector = TableDetector::new();
        let spans = grid_spans(
            &[
                &["Quarter", "Revenue", "Margin"],
                &["Q1", "4.2", "18%"],
                &["Q2", "4.9", "21%"],
                &["Q3", "5.3", "22%"],
            ],
            &[72.0, 180.0, 290.0],
            600.0,
        );

        let tables = detector.detect(&spans);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].column_count(), 3);

        let grid = tables[0].to_grid();
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[0], vec!["Quarter", "Revenue", "Margin"]);
        assert_eq!(grid[3], vec!["Q3", "5.3", "22%"]);
        assert!(grid.iter().all(|row| row.len() == 3));
    }

    #[test]
    fn test_missing_cell_stays_empty() {
        let table = DetectedTable {
            columns: vec![72.0, 180.0],
            rows: vec![
                SpanRow {
                    y: 600.0,
                    spans: vec![span("Item", 72.0, 600.0), span("Qty", 180.0, 600.0)],
                },
                SpanRow {
                    y: 586.0,
                    spans: vec![span("Bolts", 72.0, 586.0)],
                },
            ],
            right_x: 200.0,
        };

        assert_eq!(table.to_grid()[1], vec!["Bolts".to_string(), String::new()]);
    }

    #[test]
    fn test_prose_is_not_a_table() {
        let detector = TableDetector::new();
        let spans = vec![
            span("It was a quiet morning in the valley.", 72.0, 700.0),
            span("Nobody expected the river to rise.", 72.0, 686.0),
            span("By noon the bridge was gone.", 72.0, 672.0),
        ];
        assert!(detector.detect(&spans).is_empty());
    }

    #[test]
    fn test_lists_are_not_tables() {
        let detector = TableDetector::new();

        let numbered = grid_spans(
            &[&["1.", "Install"], &["2.", "Configure"], &["3.", "Deploy"], &["4.", "Verify"]],
            &[72.0, 100.0],
            500.0,
        );
        assert!(detector.detect(&numbered).is_empty());

        let bulleted = grid_spans(
            &[&["\u{2022}", "Apples"], &["\u{2022}", "Pears"], &["\u{2022}", "Plums"]],
            &[72.0, 100.0],
            500.0,
        );
        assert!(detector.detect(&bulleted).is_empty());
    }

    #[test]
    fn test_numbered_first_column_survives_when_wide() {
        let detector = TableDetector::new();
        let spans = grid_spans(
            &[&["1", "Oslo", "Norway"], &["2", "Lima", "Peru"], &["3", "Pune", "India"]],
            &[72.0, 120.0, 240.0],
            500.0,
        );
        assert_eq!(detector.detect(&spans).len(), 1);
    }

    #[test]
    fn test_too_many_columns_rejected() {
        let detector = TableDetector::with_config(TableDetectorConfig {
            max_columns: 2,
            ..Default::default()
        });
        let spans = grid_spans(
            &[&["a", "b", "c"], &["d", "e", "f"]],
            &[72.0, 150.0, 230.0],
            500.0,
        );
        assert!(detector.detect(&spans).is_empty());
    }

    #[test]
    fn test_markers() {
        for m in ["1.", "12)", "3", "1 .", "a.", "B)"] {
            assert!(is_number_marker(m), "{m}");
        }
        for m in ["Name", "1a", "", "ab.", "2024-01"] {
            assert!(!is_number_marker(m), "{m}");
        }
        assert!(is_bullet_marker("\u{2022}"));
        assert!(is_bullet_marker("-"));
        assert!(!is_bullet_marker("--"));
    }

    #[test]
    fn test_column_for_nearest_fallback() {
        let columns = [100.0, 200.0];
        assert_eq!(column_for(95.0, &columns, 260.0), 0);
        assert_eq!(column_for(195.0, &columns, 260.0), 1);
        assert_eq!(column_for(20.0, &columns, 260.0), 0);
    }
}
