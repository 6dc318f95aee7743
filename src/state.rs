use crate::config::SearchConfig;
use crate::matcher::ItemMatcher;
use crate::model::MenuItem;

/// Per-session launcher state: query, results, selection and scroll window.
pub struct LauncherState {
    pub visible: bool,
    pub query: String,
    all_items: Vec<MenuItem>,
    /// Indices into `all_items`, in aggregation order.
    filtered_indices: Vec<usize>,
    selected_index: Option<usize>,
    scroll_offset: usize,
    max_visible_items: usize,
    min_chars_for_search: usize,
    matcher: ItemMatcher,
}

impl LauncherState {
    pub fn new(search: &SearchConfig, max_visible_items: usize) -> Self {
        Self {
            visible: false,
            query: String::new(),
            all_items: Vec::new(),
            filtered_indices: Vec::new(),
            selected_index: None,
            scroll_offset: 0,
            max_visible_items: max_visible_items.max(1),
            min_chars_for_search: search.min_chars_for_search,
            matcher: ItemMatcher::new(search),
        }
    }

    pub fn set_items(&mut self, items: Vec<MenuItem>) {
        self.all_items = items;
        self.update_filtered_items();
    }

    pub fn all_items(&self) -> &[MenuItem] {
        &self.all_items
    }

    /// Recomputes the filtered list and returns focus to the top result.
    pub fn update_filtered_items(&mut self) {
        self.filtered_indices = if self.query.chars().count() < self.min_chars_for_search {
            (0..self.all_items.len()).collect()
        } else {
            self.matcher.filter(&self.query, &self.all_items)
        };

        self.selected_index = if self.filtered_indices.is_empty() { None } else { Some(0) };
        self.scroll_offset = 0;
        log::debug!("LauncherState: query='{}', filtered_count={}", self.query, self.filtered_indices.len());
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered_indices.len()
    }

    pub fn filtered_items(&self) -> impl Iterator<Item = &MenuItem> + '_ {
        self.filtered_indices.iter().map(|&idx| &self.all_items[idx])
    }

    /// The scroll window: `(filtered index, item)` pairs currently on screen.
    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &MenuItem)> + '_ {
        self.filtered_indices
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.max_visible_items)
            .map(|(i, &idx)| (i, &self.all_items[idx]))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn max_visible_items(&self) -> usize {
        self.max_visible_items
    }

    pub fn selected_item(&self) -> Option<&MenuItem> {
        self.selected_index
            .and_then(|i| self.filtered_indices.get(i))
            .map(|&idx| &self.all_items[idx])
    }

    /// Moves the selection by `delta`, clamped to the result list, and
    /// scrolls just enough to keep it on screen. Returns whether anything
    /// changed.
    pub fn move_selection(&mut self, delta: i32) -> bool {
        let Some(current) = self.selected_index else { return false };
        let last = self.filtered_indices.len() as i64 - 1;
        let new_index = (current as i64 + delta as i64).clamp(0, last) as usize;
        if new_index == current {
            return false;
        }
        self.selected_index = Some(new_index);

        if new_index < self.scroll_offset {
            self.scroll_offset = new_index;
        } else if new_index >= self.scroll_offset + self.max_visible_items {
            self.scroll_offset = new_index + 1 - self.max_visible_items;
        }
        true
    }

    /// Selects the given filtered index if it is currently on screen,
    /// without scrolling. Returns whether the selection changed.
    pub fn select_visible(&mut self, index: usize) -> bool {
        let on_screen = index >= self.scroll_offset
            && index < self.scroll_offset + self.max_visible_items
            && index < self.filtered_indices.len();
        if !on_screen || self.selected_index == Some(index) {
            return false;
        }
        self.selected_index = Some(index);
        true
    }

    /// Clears the query and indices for a fresh session.
    pub fn reset(&mut self) {
        self.query.clear();
        self.selected_index = None;
        self.scroll_offset = 0;
    }
}
