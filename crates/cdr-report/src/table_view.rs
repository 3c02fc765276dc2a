//! Plain-text tables for the totals report.
//!
//! Renders a bordered grid with a header row, data rows and an optional
//! footer. Column widths are measured in terminal cells so labels with wide
//! characters stay aligned.

use unicode_width::UnicodeWidthStr;

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A table of string cells with a fixed number of columns.
#[derive(Debug, Clone)]
pub struct TextTable {
    header: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
    footer: Option<Vec<String>>,
}

impl TextTable {
    /// Create a table; the first column is left-aligned, the rest right-aligned.
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        let header: Vec<String> = header.into_iter().map(Into::into).collect();
        let align = (0..header.len())
            .map(|i| if i == 0 { Align::Left } else { Align::Right })
            .collect();
        Self {
            header,
            align,
            rows: Vec::new(),
            footer: None,
        }
    }

    /// Append a data row. Missing cells render empty; extra cells are dropped.
    pub fn row<S: Into<String>>(mut self, cells: impl IntoIterator<Item = S>) -> Self {
        let row = self.normalise(cells);
        self.rows.push(row);
        self
    }

    /// Set the footer row, rendered below a separator.
    pub fn footer<S: Into<String>>(mut self, cells: impl IntoIterator<Item = S>) -> Self {
        self.footer = Some(self.normalise(cells));
        self
    }

    /// Render the table, one line per row, each terminated by `\n`.
    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let border = border_line(&widths);

        let mut out = String::new();
        out.push_str(&border);
        out.push_str(&self.line(&self.header, &widths));
        out.push_str(&border);
        for row in &self.rows {
            out.push_str(&self.line(row, &widths));
        }
        if let Some(footer) = &self.footer {
            out.push_str(&border);
            out.push_str(&self.line(footer, &widths));
        }
        out.push_str(&border);
        out
    }

    fn normalise<S: Into<String>>(&self, cells: impl IntoIterator<Item = S>) -> Vec<String> {
        let mut row: Vec<String> = cells
            .into_iter()
            .take(self.header.len())
            .map(Into::into)
            .collect();
        row.resize(self.header.len(), String::new());
        row
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.width()).collect();
        for row in self.rows.iter().chain(self.footer.iter()) {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.width());
            }
        }
        widths
    }

    fn line(&self, cells: &[String], widths: &[usize]) -> String {
        let mut out = String::from("|");
        for ((cell, width), align) in cells.iter().zip(widths).zip(&self.align) {
            let pad = width.saturating_sub(cell.width());
            out.push(' ');
            match align {
                Align::Left => {
                    out.push_str(cell);
                    out.push_str(&" ".repeat(pad));
                }
                Align::Right => {
                    out.push_str(&" ".repeat(pad));
                    out.push_str(cell);
                }
            }
            out.push_str(" |");
        }
        out.push('\n');
        out
    }
}

fn border_line(widths: &[usize]) -> String {
    let mut out = String::from("+");
    for w in widths {
        out.push_str(&"-".repeat(w + 2));
        out.push('+');
    }
    out.push('\n');
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
