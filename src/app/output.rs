//! Output pane model.
//!
//! Keeps the raw lines the content pipeline produced and their formatted
//! screen rows. Display changes rebuild the rows from the raw lines; new
//! lines only append. `pinned` is true exactly while the scroll offset is at
//! its maximum.

use crate::format::{self, FormatOptions};

#[derive(Debug, Clone)]
pub struct OutputView {
    raw: Vec<String>,
    rows: Vec<String>,
    opts: FormatOptions,
    height: usize,
    offset: usize,
    pinned: bool,
}

impl OutputView {
    pub fn new(opts: FormatOptions, height: usize) -> Self {
        Self {
            raw: Vec::new(),
            rows: Vec::new(),
            opts,
            height,
            offset: 0,
            pinned: true,
        }
    }

    pub fn raw_lines(&self) -> &[String] {
        &self.raw
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    #[cfg(test)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn max_offset(&self) -> usize {
        self.rows.len().saturating_sub(self.height)
    }

    /// Rows currently on screen.
    pub fn visible_rows(&self) -> &[String] {
        let end = (self.offset + self.height).min(self.rows.len());
        &self.rows[self.offset.min(end)..end]
    }

    /// Scroll position as a percentage of the scrollable range.
    pub fn scroll_percent(&self) -> usize {
        let max = self.max_offset();
        if max == 0 {
            100
        } else {
            self.offset * 100 / max
        }
    }

    /// Discard everything and show `lines` instead.
    pub fn replace(&mut self, lines: Vec<String>) {
        self.raw = lines;
        self.reformat();
    }

    pub fn append(&mut self, line: String) {
        let number = self.raw.len() + 1;
        self.rows.extend(format::format_line(&line, number, self.opts));
        self.raw.push(line);
        if self.pinned {
            self.offset = self.max_offset();
        }
    }

    /// Apply new display options. Returns true if the rows were rebuilt.
    pub fn set_options(&mut self, opts: FormatOptions) -> bool {
        if opts == self.opts {
            return false;
        }
        self.opts = opts;
        self.reformat();
        true
    }

    pub fn set_height(&mut self, height: usize) {
        if height != self.height {
            self.height = height;
            self.settle();
        }
    }

    /// Rebuild every row from the raw lines at the current options.
    pub fn reformat(&mut self) {
        self.rows = self
            .raw
            .iter()
            .enumerate()
            .flat_map(|(i, line)| format::format_line(line, i + 1, self.opts))
            .collect();
        self.settle();
    }

    /// Keep the pin (or clamp the offset) after the row count changed.
    fn settle(&mut self) {
        if self.pinned {
            self.offset = self.max_offset();
        } else {
            self.scroll_to(self.offset);
        }
    }

    fn scroll_to(&mut self, offset: usize) {
        let max = self.max_offset();
        self.offset = offset.min(max);
        self.pinned = self.offset >= max;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_to(self.offset.saturating_add(lines));
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_to(self.offset.saturating_sub(lines));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height.max(1));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.height.max(1));
    }

    /// Top of the content. Stays pinned only if everything fits on screen.
    pub fn jump_to_top(&mut self) {
        self.scroll_to(0);
    }

    pub fn jump_to_bottom(&mut self) {
        self.offset = self.max_offset();
        self.pinned = true;
    }
}
