//! # Binder Layout Engine
//!
//! Pure pagination arithmetic. A binder page is a `rows × cols` grid; the
//! binder declares how many physical pages it has, which fixes its capacity.
//! Indexes at or past the capacity still exist and are displayed, but are
//! classified as overflow.
//!
//! Page numbers are 1-based throughout; slot indexes are 0-based.

use crate::error::{BinderError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const DEFAULT_ROWS: usize = 3;
pub const DEFAULT_COLS: usize = 3;
pub const DEFAULT_PAGES: usize = 10;
pub const DEFAULT_SEARCH_ROWS: usize = 4;
pub const DEFAULT_SEARCH_COLS: usize = 4;

/// Largest accepted row or column count.
pub const MAX_GRID_SIDE: usize = 100;
/// Largest accepted declared page count.
pub const MAX_PAGES: usize = 10_000;

/// `ceil(max(displayed_len, rows*cols*declared_pages) / (rows*cols))`, never below 1.
pub fn page_count(displayed_len: usize, rows: usize, cols: usize, declared_pages: usize) -> usize {
    let per_page = rows.saturating_mul(cols).max(1);
    let span = displayed_len.max(per_page.saturating_mul(declared_pages));
    span.div_ceil(per_page).max(1)
}

/// Index range `[(page-1)*rows*cols, page*rows*cols)`. Page 0 is treated as page 1.
pub fn slots_for_page(page: usize, rows: usize, cols: usize) -> Range<usize> {
    let per_page = rows.saturating_mul(cols);
    let start = page.saturating_sub(1).saturating_mul(per_page);
    start..start.saturating_add(per_page)
}

/// A capacity too large for `usize` has no overflow.
pub fn is_overflow(index: usize, rows: usize, cols: usize, declared_pages: usize) -> bool {
    rows.checked_mul(cols)
        .and_then(|per_page| per_page.checked_mul(declared_pages))
        .is_some_and(|capacity| index >= capacity)
}

/// Grid and declared page count of a binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout {
    pub rows: usize,
    pub cols: usize,
    pub pages: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            pages: DEFAULT_PAGES,
        }
    }
}

impl Layout {
    pub fn new(rows: usize, cols: usize, pages: usize) -> Result<Self> {
        let layout = Self { rows, cols, pages };
        if !layout.is_valid() {
            return Err(BinderError::Validation(format!(
                "Rows and columns must be 1 to {} and pages 1 to {} (got {}x{}x{})",
                MAX_GRID_SIDE, MAX_PAGES, rows, cols, pages
            )));
        }
        Ok(layout)
    }

    /// Builds a layout from raw user input, rejecting anything that is not a
    /// positive whole number.
    pub fn parse(rows: &str, cols: &str, pages: &str) -> Result<Self> {
        Self::new(
            parse_positive("rows", rows)?,
            parse_positive("columns", cols)?,
            parse_positive("pages", pages)?,
        )
    }

    /// Also applied to layouts loaded from disk.
    pub fn is_valid(&self) -> bool {
        (1..=MAX_GRID_SIDE).contains(&self.rows)
            && (1..=MAX_GRID_SIDE).contains(&self.cols)
            && (1..=MAX_PAGES).contains(&self.pages)
    }

    pub fn per_page(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Declared capacity: `rows × cols × pages`.
    pub fn capacity(&self) -> usize {
        self.per_page().saturating_mul(self.pages)
    }

    pub fn page_count(&self, displayed_len: usize) -> usize {
        page_count(displayed_len, self.rows, self.cols, self.pages)
    }

    pub fn slots_for_page(&self, page: usize) -> Range<usize> {
        slots_for_page(page, self.rows, self.cols)
    }

    pub fn is_overflow(&self, index: usize) -> bool {
        is_overflow(index, self.rows, self.cols, self.pages)
    }

    /// 1-based page that holds `index`.
    pub fn page_of(&self, index: usize) -> usize {
        index / self.per_page().max(1) + 1
    }

    pub fn grid(&self) -> GridSize {
        GridSize {
            rows: self.rows,
            cols: self.cols,
        }
    }
}

/// Grid of the search pane: no declared pages, so no capacity and no overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            rows: DEFAULT_SEARCH_ROWS,
            cols: DEFAULT_SEARCH_COLS,
        }
    }
}

impl GridSize {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let side = 1..=MAX_GRID_SIDE;
        if !side.contains(&rows) || !side.contains(&cols) {
            return Err(BinderError::Validation(format!(
                "Rows and columns must be 1 to {} (got {}x{})",
                MAX_GRID_SIDE, rows, cols
            )));
        }
        Ok(Self { rows, cols })
    }

    pub fn parse(rows: &str, cols: &str) -> Result<Self> {
        Self::new(parse_positive("rows", rows)?, parse_positive("columns", cols)?)
    }

    pub fn per_page(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Pages needed for `len` entries; one declared page is the floor.
    pub fn page_count(&self, len: usize) -> usize {
        page_count(len, self.rows, self.cols, 1)
    }

    pub fn slots_for_page(&self, page: usize) -> Range<usize> {
        slots_for_page(page, self.rows, self.cols)
    }
}

fn parse_positive(field: &str, raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(BinderError::Validation(format!(
            "{} must be a positive whole number, got '{}'",
            field,
            raw.trim()
        ))),
    }
}
