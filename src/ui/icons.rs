use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tiny_skia::{Pixmap, Transform};
use image::ImageReader;
use std::fs;
use std::sync::mpsc::{Sender, channel};
use std::thread;

pub type IconKey = (String, u32);

/// Resolves icon references (theme names or absolute paths) to pixmaps.
///
/// Lookups never block: a miss queues the icon for the loader thread and
/// returns `None`. The result comes back over `response_tx` and must be
/// handed to [`IconCache::insert`] on the control thread.
pub struct IconCache {
    cache: HashMap<IconKey, Option<Pixmap>>,
    pending: HashSet<IconKey>,
    request_tx: Sender<IconKey>,
}

impl IconCache {
    pub fn new(response_tx: calloop::channel::Sender<(IconKey, Option<Pixmap>)>) -> Self {
        let (request_tx, request_rx) = channel::<IconKey>();

        let paths = icon_theme_paths();
        thread::spawn(move || {
            let loader = IconLoader { icon_theme_paths: paths };
            while let Ok((icon_ref, size)) = request_rx.recv() {
                let pixmap = loader.find_and_load(&icon_ref, size);
                if pixmap.is_none() {
                    log::debug!("Icon '{}' not found", icon_ref);
                }
                if response_tx.send(((icon_ref, size), pixmap)).is_err() {
                    break;
                }
            }
        });

        Self {
            cache: HashMap::new(),
            pending: HashSet::new(),
            request_tx,
        }
    }

    pub fn resolve(&mut self, icon_ref: &str, size: u32) -> Option<&Pixmap> {
        let key = (icon_ref.to_string(), size);
        if self.cache.contains_key(&key) {
            return self.cache.get(&key).and_then(Option::as_ref);
        }

        if self.pending.insert(key.clone()) {
            let _ = self.request_tx.send(key);
        }

        None
    }

    pub fn insert(&mut self, key: IconKey, pixmap: Option<Pixmap>) {
        self.pending.remove(&key);
        self.cache.insert(key, pixmap);
    }
}

fn icon_theme_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = directories::BaseDirs::new() {
        paths.push(home.data_dir().join("icons"));
    }
    paths.push(PathBuf::from("/usr/share/icons"));
    paths.push(PathBuf::from("/usr/share/pixmaps"));
    paths
}

struct IconLoader {
    icon_theme_paths: Vec<PathBuf>,
}

impl IconLoader {
    fn find_and_load(&self, icon_ref: &str, size: u32) -> Option<Pixmap> {
        let path = Path::new(icon_ref);
        if path.is_absolute() {
            return path.exists().then(|| load_from_path(path, size)).flatten();
        }

        let sized = format!("hicolor/{size}x{size}/apps");
        let subdirs = [
            sized.as_str(),
            "hicolor/48x48/apps",
            "hicolor/scalable/apps",
            "hicolor/32x32/apps",
            "hicolor/64x64/apps",
            "Adwaita/48x48/apps",
            "Adwaita/scalable/apps",
            "",
        ];

        for root in &self.icon_theme_paths {
            if !root.exists() { continue; }

            for sub in subdirs {
                let dir = root.join(sub);
                if !dir.exists() { continue; }

                for ext in ["png", "svg"] {
                    let file_path = dir.join(format!("{}.{}", icon_ref, ext));
                    if !file_path.exists() { continue; }
                    match load_from_path(&file_path, size) {
                        Some(pixmap) => return Some(pixmap),
                        None => log::debug!("Could not decode {:?}", file_path),
                    }
                }
            }
        }
        None
    }
}

fn load_from_path(path: &Path, size: u32) -> Option<Pixmap> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("svg") => load_svg(path, size),
        _ => load_raster(path, size),
    }
}

fn load_raster(path: &Path, size: u32) -> Option<Pixmap> {
    let img = ImageReader::open(path).ok()?.decode().ok()?;
    let img = img.resize(size, size, image::imageops::FilterType::Lanczos3);
    let mut rgba = img.into_rgba8();

    // tiny-skia stores premultiplied alpha
    for pixel in rgba.chunks_exact_mut(4) {
        let a = pixel[3] as f32 / 255.0;
        pixel[0] = (pixel[0] as f32 * a) as u8;
        pixel[1] = (pixel[1] as f32 * a) as u8;
        pixel[2] = (pixel[2] as f32 * a) as u8;
    }

    let width = rgba.width();
    let height = rgba.height();

    Pixmap::from_vec(rgba.into_vec(), tiny_skia::IntSize::from_wh(width, height)?)
}

fn load_svg(path: &Path, size: u32) -> Option<Pixmap> {
    let opt = resvg::usvg::Options::default();
    let svg_data = fs::read(path).ok()?;
    let tree = resvg::usvg::Tree::from_data(&svg_data, &opt).ok()?;

    let mut pixmap = Pixmap::new(size, size)?;
    let transform = Transform::from_scale(
        size as f32 / tree.size().width(),
        size as f32 / tree.size().height(),
    );

    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_scales_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255])).save(&path).unwrap();

        let pixmap = load_from_path(&path, 4).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (4, 4));
        let px = pixmap.pixel(1, 1).unwrap();
        assert!(px.red() > 240 && px.alpha() > 240);
        assert_eq!(px.blue(), 0);
    }

    #[test]
    fn renders_svg_at_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.svg");
        fs::write(
            &path,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="blue"/></svg>"#,
        )
        .unwrap();
        let pixmap = load_from_path(&path, 16).unwrap();
        assert_eq!(pixmap.width(), 16);
    }

    #[test]
    fn theme_lookup_and_missing_icons() {
        let root = tempfile::tempdir().unwrap();
        let apps = root.path().join("hicolor/24x24/apps");
        fs::create_dir_all(&apps).unwrap();
        image::RgbaImage::new(24, 24).save(apps.join("term.png")).unwrap();

        let loader = IconLoader { icon_theme_paths: vec![root.path().to_path_buf()] };
        assert!(loader.find_and_load("term", 24).is_some());
        assert!(loader.find_and_load("does-not-exist", 24).is_none());
        assert!(loader.find_and_load("/nonexistent/icon.png", 24).is_none());
    }

    #[test]
    fn undecodable_candidates_do_not_hide_later_ones() {
        let root = tempfile::tempdir().unwrap();
        let sized = root.path().join("hicolor/24x24/apps");
        let fallback = root.path().join("hicolor/48x48/apps");
        fs::create_dir_all(&sized).unwrap();
        fs::create_dir_all(&fallback).unwrap();
        fs::write(sized.join("term.xpm"), "/* XPM */").unwrap();
        fs::write(sized.join("term.png"), "not a png").unwrap();
        image::RgbaImage::new(48, 48).save(fallback.join("term.png")).unwrap();

        let loader = IconLoader { icon_theme_paths: vec![root.path().to_path_buf()] };
        let pixmap = loader.find_and_load("term", 24).unwrap();
        assert_eq!(pixmap.width(), 24);
    }

    #[test]
    fn misses_are_queued_once_and_cached_after_insert() {
        let (tx, _rx) = calloop::channel::channel();
        let mut cache = IconCache::new(tx);
        assert!(cache.resolve("firefox", 24).is_none());
        assert!(cache.pending.contains(&("firefox".to_string(), 24)));

        cache.insert(("firefox".to_string(), 24), Pixmap::new(24, 24));
        assert!(cache.resolve("firefox", 24).is_some());
        assert!(cache.pending.is_empty());

        cache.insert(("broken".to_string(), 24), None);
        assert!(cache.resolve("broken", 24).is_none());
    }
}
