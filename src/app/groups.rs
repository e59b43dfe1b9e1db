//! Group list model: the distinct values of the grouping field plus `all`.

use crate::query::{self, ALL_GROUP};
use std::collections::BTreeSet;
use unicode_width::UnicodeWidthStr;

/// Columns added around the longest name (borders and highlight marker).
const LIST_PADDING: u16 = 4;

pub const DEFAULT_MIN_WIDTH: u16 = 12;
pub const DEFAULT_MAX_WIDTH: u16 = 40;

#[derive(Debug, Clone)]
pub struct GroupList {
    groups: BTreeSet<String>,
    /// Selected group by value, so inserts never move the selection.
    selected: String,
    filter: String,
    filtering: bool,
    min_width: u16,
    max_width: u16,
}

impl GroupList {
    pub fn new(min_width: u16, max_width: u16) -> Self {
        Self {
            groups: BTreeSet::new(),
            selected: ALL_GROUP.to_string(),
            filter: String::new(),
            filtering: false,
            min_width,
            max_width: max_width.max(min_width),
        }
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// Entries shown in the pane: `all` first, then groups matching the filter.
    pub fn visible(&self) -> Vec<&str> {
        let needle = self.filter.to_lowercase();
        std::iter::once(ALL_GROUP)
            .chain(
                self.groups
                    .iter()
                    .map(String::as_str)
                    .filter(|g| needle.is_empty() || g.to_lowercase().contains(&needle)),
            )
            .collect()
    }

    /// Position of the selection among the visible entries.
    pub fn selected_index(&self) -> Option<usize> {
        self.visible().iter().position(|g| *g == self.selected)
    }

    /// Add a discovered group. Returns true if it was new.
    pub fn insert(&mut self, group: String) -> bool {
        if query::is_all_group(&group) {
            return false;
        }
        self.groups.insert(group)
    }

    /// Replace every group with `groups`, keeping the selection if it still
    /// exists. Returns true if the selection fell back to `all`.
    pub fn replace(&mut self, groups: impl IntoIterator<Item = String>) -> bool {
        self.groups = groups
            .into_iter()
            .filter(|g| !query::is_all_group(g))
            .collect();
        if query::is_all_group(&self.selected) || self.groups.contains(&self.selected) {
            return false;
        }
        self.selected = ALL_GROUP.to_string();
        true
    }

    /// Back to `{all}`. Returns true if the selection changed.
    pub fn reset(&mut self) -> bool {
        self.replace(std::iter::empty())
    }

    pub fn select_next(&mut self) -> bool {
        self.step(1)
    }

    pub fn select_prev(&mut self) -> bool {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> bool {
        let visible = self.visible();
        let next = match visible.iter().position(|g| *g == self.selected) {
            Some(i) => (i as isize + delta).clamp(0, visible.len() as isize - 1) as usize,
            None => 0,
        };
        let target = visible[next].to_string();
        if target == self.selected {
            return false;
        }
        self.selected = target;
        true
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Filter sub-mode is active while typing or while a narrowing applies.
    pub fn has_filter(&self) -> bool {
        self.filtering || !self.filter.is_empty()
    }

    pub fn start_filter(&mut self) {
        self.filtering = true;
        self.filter.clear();
    }

    pub fn filter_push(&mut self, c: char) {
        if self.filtering {
            self.filter.push(c);
        }
    }

    pub fn filter_pop(&mut self) {
        if self.filtering {
            self.filter.pop();
        }
    }

    /// Stop typing, keep the narrowing.
    pub fn accept_filter(&mut self) {
        self.filtering = false;
    }

    pub fn clear_filter(&mut self) {
        self.filtering = false;
        self.filter.clear();
    }

    /// Pane width fitted to the longest name.
    pub fn width(&self) -> u16 {
        let longest = self
            .groups
            .iter()
            .map(|g| g.width())
            .chain(std::iter::once(ALL_GROUP.width()))
            .max()
            .unwrap_or(0);
        let wanted = (longest.min(u16::MAX as usize) as u16).saturating_add(LIST_PADDING);
        wanted.clamp(self.min_width, self.max_width)
    }
}

impl Default for GroupList {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_WIDTH, DEFAULT_MAX_WIDTH)
    }
}
