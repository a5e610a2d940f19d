//! Plain text tables with a fixed column gutter.

/// A titled table; columns are left-aligned to their widest cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub title: String,
    pub headings: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Sort rows by their first cell when rendering.
    pub sort_rows: bool,
    pub padding: usize,
}

impl Table {
    pub fn new(title: impl Into<String>, sort_rows: bool) -> Self {
        Self {
            title: title.into(),
            sort_rows,
            padding: 2,
            ..Default::default()
        }
    }

    pub fn set_padding(&mut self, padding: usize) {
        self.padding = padding;
    }

    pub fn add_headings<I, S>(&mut self, headings: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headings.extend(headings.into_iter().map(Into::into));
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Rows in render order.
    pub fn ordered_rows(&self) -> Vec<&Vec<String>> {
        let mut rows: Vec<&Vec<String>> = self.rows.iter().collect();
        if self.sort_rows {
            rows.sort_by(|a, b| a.first().cmp(&b.first()));
        }
        rows
    }

    pub fn render(&self) -> String {
        let rows = self.ordered_rows();
        let columns = rows
            .iter()
            .map(|r| r.len())
            .chain(std::iter::once(self.headings.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; columns];
        for line in std::iter::once(&self.headings).chain(rows.iter().copied()) {
            for (i, cell) in line.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = vec![self.title.clone()];
        if !self.headings.is_empty() {
            out.push(self.render_line(&self.headings, &widths));
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            out.push(self.render_line(&rule, &widths));
        }
        for row in rows {
            out.push(self.render_line(row, &widths));
        }
        out.join("\n")
    }

    fn render_line(&self, cells: &[String], widths: &[usize]) -> String {
        let gutter = " ".repeat(self.padding);
        let line = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                format!("{:<width$}", cell, width = *width)
            })
            .collect::<Vec<_>>()
            .join(&gutter);
        line.trim_end().to_string()
    }
}
