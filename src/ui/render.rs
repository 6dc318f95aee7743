use tiny_skia::{Paint, Color, Rect, Transform, PixmapMut, PixmapPaint, PathBuilder};
use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, SwashCache};
use crate::config::ThemeConfig;
use crate::launcher::Launcher;
use crate::ui::icons::{IconCache, IconKey};
use crate::ui::layout::Layout;

struct Palette {
    background: Color,
    selected_background: Color,
    text: Color,
    description: Color,
    placeholder: Color,
    tab_background: Color,
    tab_active_background: Color,
    tab_text: Color,
}

impl Palette {
    fn new(theme: &ThemeConfig) -> anyhow::Result<Self> {
        Ok(Self {
            background: ThemeConfig::parse_color(&theme.background)?,
            selected_background: ThemeConfig::parse_color(&theme.selected_background)?,
            text: ThemeConfig::parse_color(&theme.text)?,
            description: ThemeConfig::parse_color(&theme.description)?,
            placeholder: ThemeConfig::parse_color(&theme.placeholder)?,
            tab_background: ThemeConfig::parse_color(&theme.tab_background)?,
            tab_active_background: ThemeConfig::parse_color(&theme.tab_active_background)?,
            tab_text: ThemeConfig::parse_color(&theme.tab_text)?,
        })
    }
}

/// Rasterizes the launcher into a pixmap: search header, tab strip, rows.
pub struct Renderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    font_family: Option<String>,
    palette: Palette,
    pub icon_cache: IconCache,
}

impl Renderer {
    pub fn new(icon_cache: IconCache, theme: &ThemeConfig) -> anyhow::Result<Self> {
        Self::with_font_system(FontSystem::new(), icon_cache, theme)
    }

    pub fn with_font_system(font_system: FontSystem, icon_cache: IconCache, theme: &ThemeConfig) -> anyhow::Result<Self> {
        Ok(Self {
            font_system,
            swash_cache: SwashCache::new(),
            font_family: theme.font_family.clone(),
            palette: Palette::new(theme)?,
            icon_cache,
        })
    }

    pub fn insert_icon(&mut self, key: IconKey, pixmap: Option<tiny_skia::Pixmap>) {
        self.icon_cache.insert(key, pixmap);
    }

    /// Draws the current launcher state. Does nothing and returns `false`
    /// while the launcher is hidden.
    pub fn draw(&mut self, pixmap: &mut PixmapMut, launcher: &Launcher, theme: &ThemeConfig, layout: &Layout) -> bool {
        if !launcher.is_visible() {
            return false;
        }
        pixmap.fill(self.palette.background);

        self.draw_search_field(pixmap, launcher, theme, layout);
        if layout.has_tab_strip() {
            self.draw_tabs(pixmap, launcher, theme, layout);
        }
        self.draw_rows(pixmap, launcher, theme, layout);
        true
    }

    fn draw_search_field(&mut self, pixmap: &mut PixmapMut, launcher: &Launcher, theme: &ThemeConfig, layout: &Layout) {
        let query = &launcher.state().query;
        let (text, color) = if query.is_empty() {
            (theme.placeholder_text.clone(), self.palette.placeholder)
        } else {
            (format!("> {}", query), self.palette.text)
        };
        let Some(field) = layout.search_rect() else { return };
        let y = field.top() + (field.height() - theme.font_size) / 2.0;
        let max_width = field.width() - 2.0 * theme.padding;
        self.draw_text(pixmap, &text, field.left() + theme.padding, y, max_width, theme.font_size, color);
    }

    fn draw_tabs(&mut self, pixmap: &mut PixmapMut, launcher: &Launcher, theme: &ThemeConfig, layout: &Layout) {
        let tab_font_size = theme.description_font_size.max(theme.font_size * 0.8);
        for (i, tab) in launcher.tabs().iter().enumerate() {
            let Some(rect) = layout.tab_rect(i) else { continue };
            let fill = if i == launcher.active_tab() {
                self.palette.tab_active_background
            } else {
                self.palette.tab_background
            };
            fill_rect(pixmap, rect, fill);

            let mut x = rect.left() + theme.tab_padding;
            if let Some(icon_ref) = &tab.icon {
                let size = (layout.tab_height - 8.0).max(1.0) as u32;
                if self.draw_icon(pixmap, icon_ref, size, x, rect.top() + (rect.height() - size as f32) / 2.0) {
                    x += size as f32 + theme.tab_padding / 2.0;
                }
            }
            let y = rect.top() + (rect.height() - tab_font_size) / 2.0;
            let max_width = rect.right() - x - theme.tab_padding;
            self.draw_text(pixmap, &tab.label, x, y, max_width, tab_font_size, self.palette.tab_text);
        }
    }

    fn draw_rows(&mut self, pixmap: &mut PixmapMut, launcher: &Launcher, theme: &ThemeConfig, layout: &Layout) {
        let state = launcher.state();
        let scroll_offset = state.scroll_offset();

        for (i, item) in state.visible_rows() {
            let Some(rect) = layout.row_rect(i - scroll_offset) else { break };

            if state.selected_index() == Some(i) {
                if let Some(sel_rect) = Rect::from_xywh(
                    theme.padding / 2.0,
                    rect.top() + 2.0,
                    rect.width() - theme.padding,
                    rect.height() - 4.0,
                ) {
                    draw_rounded_rect(pixmap, sel_rect, theme.border_radius, self.palette.selected_background);
                }
            }

            let mut text_x = theme.padding;
            if let Some(icon_ref) = item.icon_ref() {
                let size = theme.icon_size;
                let icon_y = rect.top() + (rect.height() - size as f32) / 2.0;
                if self.draw_icon(pixmap, icon_ref, size, text_x, icon_y) {
                    text_x += size as f32 + theme.padding;
                }
            }
            let max_width = rect.right() - text_x - theme.padding;

            match item.description() {
                Some(description) => {
                    let block = theme.font_size + 2.0 + theme.description_font_size;
                    let top = rect.top() + (rect.height() - block) / 2.0;
                    self.draw_text(pixmap, item.display_name(), text_x, top, max_width, theme.font_size, self.palette.text);
                    self.draw_text(
                        pixmap,
                        description,
                        text_x,
                        top + theme.font_size + 2.0,
                        max_width,
                        theme.description_font_size,
                        self.palette.description,
                    );
                }
                None => {
                    let top = rect.top() + (rect.height() - theme.font_size) / 2.0;
                    self.draw_text(pixmap, item.display_name(), text_x, top, max_width, theme.font_size, self.palette.text);
                }
            }
        }

        if state.filtered_len() == 0 {
            if let Some(rect) = layout.row_rect(0) {
                let top = rect.top() + (rect.height() - theme.font_size) / 2.0;
                self.draw_text(pixmap, "No results found", theme.padding, top, layout.width, theme.font_size, self.palette.placeholder);
            }
        }
    }

    /// Returns `false` when the icon is not (yet) available.
    fn draw_icon(&mut self, pixmap: &mut PixmapMut, icon_ref: &str, size: u32, x: f32, y: f32) -> bool {
        let Some(icon) = self.icon_cache.resolve(icon_ref, size) else { return false };
        pixmap.draw_pixmap(x as i32, y as i32, icon.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(&mut self, pixmap: &mut PixmapMut, text: &str, x: f32, y: f32, max_width: f32, size: f32, color: Color) {
        // cosmic-text cannot shape without any font face loaded
        if text.is_empty() || max_width <= 0.0 || self.font_system.db().is_empty() {
            return;
        }
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size * 1.2));
        buffer.set_size(&mut self.font_system, Some(max_width), Some(size * 1.2));
        let attrs = match &self.font_family {
            Some(family) => Attrs::new().family(Family::Name(family.as_str())),
            None => Attrs::new(),
        };
        buffer.set_text(&mut self.font_system, text, attrs, cosmic_text::Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let text_color = cosmic_text::Color::rgba(
            (color.red() * 255.0) as u8,
            (color.green() * 255.0) as u8,
            (color.blue() * 255.0) as u8,
            (color.alpha() * 255.0) as u8,
        );

        buffer.draw(&mut self.font_system, &mut self.swash_cache, text_color, |draw_x, draw_y, w, h, color| {
            let draw_x = draw_x + x as i32;
            let draw_y = draw_y + y as i32;
            if w == 0 || h == 0 { return; }
            if draw_x >= 0 && draw_y >= 0 && draw_x < pixmap.width() as i32 && draw_y < pixmap.height() as i32 {
                let paint = Paint {
                    shader: tiny_skia::Shader::SolidColor(Color::from_rgba8(color.r(), color.g(), color.b(), color.a())),
                    ..Paint::default()
                };
                if let Some(r) = Rect::from_xywh(draw_x as f32, draw_y as f32, w as f32, h as f32) {
                    pixmap.fill_rect(r, &paint, Transform::identity(), None);
                }
            }
        });
    }
}

fn fill_rect(pixmap: &mut PixmapMut, rect: Rect, color: Color) {
    let mut paint = Paint::default();
    paint.set_color(color);
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

fn draw_rounded_rect(pixmap: &mut PixmapMut, rect: Rect, radius: f32, fill: Color) {
    let radius = radius.min(rect.width() / 2.0).min(rect.height() / 2.0);
    let mut pb = PathBuilder::new();
    let x = rect.left();
    let y = rect.top();
    let w = rect.width();
    let h = rect.height();

    pb.move_to(x + radius, y);
    pb.line_to(x + w - radius, y);
    pb.quad_to(x + w, y, x + w, y + radius);
    pb.line_to(x + w, y + h - radius);
    pb.quad_to(x + w, y + h, x + w - radius, y + h);
    pb.line_to(x + radius, y + h);
    pb.quad_to(x, y + h, x, y + h - radius);
    pb.line_to(x, y + radius);
    pb.quad_to(x, y, x + radius, y);
    pb.close();

    if let Some(path) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color(fill);
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, Transform::identity(), None);
    }
}
