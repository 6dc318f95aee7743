use tiny_skia::Rect;
use crate::config::ThemeConfig;

/// What lies under a surface-local point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Nothing,
    SearchField,
    Tab(usize),
    /// Row position within the scroll window, not a filtered index.
    Row(usize),
}

/// Surface geometry, top to bottom: search header, optional tab strip,
/// `max_visible_items` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub header_height: f32,
    pub tab_height: f32,
    pub item_height: f32,
    pub max_visible_items: usize,
    pub padding: f32,
    pub tab_count: usize,
}

impl Layout {
    pub fn new(theme: &ThemeConfig, width: u32, tab_count: usize) -> Self {
        let show_tabs = theme.show_tabs && tab_count > 1;
        Self {
            width: width as f32,
            header_height: theme.height as f32,
            tab_height: if show_tabs { theme.tab_height as f32 } else { 0.0 },
            item_height: theme.item_height as f32,
            max_visible_items: theme.max_visible_items.max(1),
            padding: theme.padding,
            tab_count: if show_tabs { tab_count } else { 0 },
        }
    }

    pub fn height(&self) -> u32 {
        (self.header_height + self.tab_height + self.item_height * self.max_visible_items as f32).ceil() as u32
    }

    pub fn has_tab_strip(&self) -> bool {
        self.tab_count > 0
    }

    pub fn search_rect(&self) -> Option<Rect> {
        Rect::from_xywh(0.0, 0.0, self.width, self.header_height)
    }

    pub fn tab_rect(&self, index: usize) -> Option<Rect> {
        if index >= self.tab_count {
            return None;
        }
        let tab_width = self.width / self.tab_count as f32;
        Rect::from_xywh(tab_width * index as f32, self.header_height, tab_width, self.tab_height)
    }

    fn rows_top(&self) -> f32 {
        self.header_height + self.tab_height
    }

    pub fn row_rect(&self, row: usize) -> Option<Rect> {
        if row >= self.max_visible_items {
            return None;
        }
        let y = self.rows_top() + row as f32 * self.item_height;
        Rect::from_xywh(0.0, y, self.width, self.item_height)
    }

    pub fn hit(&self, x: f64, y: f64) -> Hit {
        let (x, y) = (x as f32, y as f32);
        if x < 0.0 || y < 0.0 || x >= self.width {
            return Hit::Nothing;
        }
        if y < self.header_height {
            return Hit::SearchField;
        }
        if y < self.rows_top() {
            let tab_width = self.width / self.tab_count.max(1) as f32;
            let index = ((x / tab_width) as usize).min(self.tab_count.saturating_sub(1));
            return Hit::Tab(index);
        }
        let row = ((y - self.rows_top()) / self.item_height) as usize;
        if row < self.max_visible_items { Hit::Row(row) } else { Hit::Nothing }
    }
}
