use std::ops::Range;

use serde::{Serialize, Deserialize};

/// Row selection in the active dataset
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum RowSelection {
    /// No row chosen yet (fresh dataset)
    #[default]
    Unselected,
    /// Row index into the dataset
    Selected(usize),
}

impl RowSelection {
    pub fn row(&self) -> Option<usize> {
        match self {
            RowSelection::Unselected => None,
            RowSelection::Selected(row) => Some(*row),
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, RowSelection::Selected(_))
    }
}

/// 1-based page containing a row
pub fn page_for_row(row: usize, rows_per_page: usize) -> usize {
    row / rows_per_page.max(1) + 1
}

/// Number of pages; an empty dataset still has one page
pub fn page_count(max_row: usize, rows_per_page: usize) -> usize {
    max_row.div_ceil(rows_per_page.max(1)).max(1)
}

/// Row indices shown on a 1-based page
pub fn page_rows(page: usize, rows_per_page: usize, max_row: usize) -> Range<usize> {
    let start = page.saturating_sub(1) * rows_per_page;
    let end = (start + rows_per_page).min(max_row);
    start.min(end)..end
}
