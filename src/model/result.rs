//! The aggregated extraction record handed to callers.

use serde::{Deserialize, Serialize};

/// A table found by the stream-mode detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    /// One-based page number the table was found on
    pub page: u32,

    /// Cell grid, rows top to bottom, every row the same width
    pub data: Vec<Vec<String>>,
}

impl TableRecord {
    /// Create a table record.
    pub fn new(page: u32, data: Vec<Vec<String>>) -> Self {
        Self { page, data }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Number of columns (width of the first row).
    pub fn column_count(&self) -> usize {
        self.data.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether any cell contains the given text.
    pub fn contains(&self, needle: &str) -> bool {
        self.data.iter().flatten().any(|cell| cell.contains(needle))
    }
}

/// Everything extracted from one PDF.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Text of all pages joined in order, with no separator
    pub text: String,

    /// Sum of per-page token counts
    pub token_count: u64,

    /// Page count reported by the probe (0 if the probe failed)
    pub page_count: u32,

    /// Detected tables, in detector emission order
    pub tables: Vec<TableRecord>,

    /// `data:image/<ext>;base64,...` strings, page order then discovery order
    pub images: Vec<String>,
}

impl ExtractionResult {
    /// Assemble a result from its parts.
    pub fn new(
        text: String,
        token_count: u64,
        page_count: u32,
        tables: Vec<TableRecord>,
        images: Vec<String>,
    ) -> Self {
        Self {
            text,
            token_count,
            page_count,
            tables,
            images,
        }
    }

    /// Number of embedded images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Tables found on a given one-based page.
    pub fn tables_on_page(&self, page: u32) -> impl Iterator<Item = &TableRecord> {
        self.tables.iter().filter(move |t| t.page == page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let result = ExtractionResult::new(
            "Hello".to_string(),
            1,
            2,
            vec![TableRecord::new(2, vec![vec!["a".into(), "b".into()]])],
            vec!["data:image/jpeg;base64,AA==".to_string()],
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["text"], "Hello");
        assert_eq!(value["tokenCount"], 1);
        assert_eq!(value["pageCount"], 2);
        assert_eq!(value["tables"][0]["page"], 2);
        assert_eq!(value["tables"][0]["data"][0][1], "b");
        assert_eq!(value["images"][0], "data:image/jpeg;base64,AA==");
        assert!(value.get("token_count").is_none());
    }

    #[test]
    fn test_table_record_shape() {
        let table = TableRecord::new(
            1,
            vec![
                vec!["Name".into(), "Age".into()],
                vec!["Alice".into(), "30".into()],
            ],
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert!(table.contains("Alice"));
        assert!(!table.contains("Bob"));

        assert_eq!(TableRecord::new(1, vec![]).column_count(), 0);
    }

    #[test]
    fn test_tables_on_page() {
        let result = ExtractionResult {
            tables: vec![
                TableRecord::new(2, vec![]),
                TableRecord::new(1, vec![]),
                TableRecord::new(2, vec![]),
            ],
            ..Default::default()
        };
        assert_eq!(result.tables_on_page(2).count(), 2);
        assert_eq!(result.tables_on_page(3).count(), 0);
    }
}
