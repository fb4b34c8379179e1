//! File-backed render sink.
//!
//! The menu-bar icon is written as a PNG that a status-bar host (SwiftBar,
//! xbar, a waybar custom module, ...) can display. When a popover directory
//! is configured, the detail view is mirrored there as `5h.png`, `7d.png`
//! and `detail.txt`. Every file is replaced atomically via rename.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::schema::OutputConfig;
use crate::detail::DetailView;
use crate::gauge::raster::{encode_png, rasterize, Palette, RenderError};
use crate::gauge::GaugeScene;
use crate::pacing::Window;
use crate::scheduler::RenderSink;

/// Errors from writing rendered output.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing or renaming an output file failed.
    #[error("Failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rasterizing or encoding failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Writes rendered scenes to disk.
#[derive(Debug, Clone)]
pub struct FileSink {
    icon_path: PathBuf,
    popover_dir: Option<PathBuf>,
    palette: Palette,
    scale: f64,
}

impl FileSink {
    /// Create a sink writing the icon to `icon_path`.
    pub fn new(icon_path: PathBuf, palette: Palette, scale: f64) -> Self {
        Self {
            icon_path,
            popover_dir: None,
            palette,
            scale,
        }
    }

    /// Also mirror the detail view into `dir`.
    pub fn with_popover_dir(mut self, dir: PathBuf) -> Self {
        self.popover_dir = Some(dir);
        self
    }

    /// Sink configured from the `[output]` section.
    pub fn from_config(output: &OutputConfig) -> Self {
        let sink = Self::new(
            output.icon_path(),
            Palette::for_theme(output.theme),
            output.scale,
        );
        match output.popover_dir() {
            Some(dir) => sink.with_popover_dir(dir),
            None => sink,
        }
    }

    /// Where the icon is written.
    pub fn icon_path(&self) -> &Path {
        &self.icon_path
    }

    /// Rasterize and encode `scene` with this sink's palette and scale.
    pub fn png(&self, scene: &GaugeScene) -> Result<Vec<u8>, SinkError> {
        let image = rasterize(scene, &self.palette, self.scale)?;
        Ok(encode_png(&image)?)
    }
}

/// File name of the popover gauge for `window`.
pub fn popover_file_name(window: Window) -> &'static str {
    match window {
        Window::FiveHour => "5h.png",
        Window::SevenDay => "7d.png",
    }
}

impl RenderSink for FileSink {
    fn set_tray_image(&mut self, scene: &GaugeScene) -> Result<(), SinkError> {
        let png = self.png(scene)?;
        write_atomic(&self.icon_path, &png)?;
        debug!(path = %self.icon_path.display(), bytes = png.len(), "tray icon written");
        Ok(())
    }

    fn set_detail_view(&mut self, view: &DetailView) -> Result<(), SinkError> {
        let Some(dir) = &self.popover_dir else {
            return Ok(());
        };
        for detail in view.windows() {
            let png = self.png(&detail.gauge)?;
            write_atomic(&dir.join(popover_file_name(detail.window)), &png)?;
        }
        write_atomic(&dir.join("detail.txt"), format!("{view}\n").as_bytes())?;
        debug!(dir = %dir.display(), "detail view written");
        Ok(())
    }

    fn is_detail_open(&self) -> bool {
        self.popover_dir.is_some()
    }
}

/// Write `bytes` to a sibling temp file, then rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
    let io_error = |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, bytes).map_err(io_error)?;
    fs::rename(&tmp, path).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::UsageSnapshot;
    use chrono::{Duration, TimeZone, Utc};

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn tray_image_is_written_as_png() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("nested/icon.png");
        let mut sink = FileSink::new(path.clone(), Palette::default(), 1.0);

        sink.set_tray_image(&crate::gauge::menu_bar_icon(None, 0.0))
            .expect("write icon");

        let bytes = fs::read(&path).expect("icon exists");
        assert!(bytes.starts_with(PNG_SIGNATURE));
        assert!(!dir.path().join("nested/icon.png.tmp").exists());
    }

    #[test]
    fn detail_view_needs_popover_dir() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let sink = FileSink::new(dir.path().join("icon.png"), Palette::default(), 1.0);
        assert!(!sink.is_detail_open());

        let sink = sink.with_popover_dir(dir.path().join("popover"));
        assert!(sink.is_detail_open());
    }

    #[test]
    fn detail_view_writes_gauges_and_text() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let popover = dir.path().join("popover");
        let mut sink = FileSink::new(dir.path().join("icon.png"), Palette::default(), 1.0)
            .with_popover_dir(popover.clone());

        let now = Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap();
        let snapshot = UsageSnapshot {
            five_hour_pct: 40.0,
            seven_day_pct: 60.0,
            resets_at: Some(now + Duration::hours(2)),
            seven_day_resets_at: Some(now + Duration::hours(50)),
            extra_usage_cents: 0.0,
        };
        let view = DetailView::build(Some(&snapshot), None, now);
        sink.set_detail_view(&view).expect("write detail");

        for name in ["5h.png", "7d.png"] {
            let bytes = fs::read(popover.join(name)).expect("gauge exists");
            assert!(bytes.starts_with(PNG_SIGNATURE), "{name} is a PNG");
        }
        let text = fs::read_to_string(popover.join("detail.txt")).expect("text exists");
        assert!(text.contains("-20 · 2h"));
        assert!(text.ends_with("extra  $0.00\n"));
    }

    #[test]
    fn oversized_scale_fails_without_writing() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("icon.png");
        let mut sink = FileSink::new(path.clone(), Palette::default(), 1.0e6);

        let result = sink.set_tray_image(&crate::gauge::menu_bar_icon(None, 0.0));
        assert!(matches!(
            result,
            Err(SinkError::Render(RenderError::Scale(_)))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("out.txt");
        write_atomic(&path, b"first").expect("first write");
        write_atomic(&path, b"second").expect("second write");
        assert_eq!(fs::read(&path).expect("read"), b"second");
    }

    #[test]
    fn write_atomic_reports_path_on_failure() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").expect("write blocker");
        // A regular file cannot be used as a parent directory
        let path = blocker.join("icon.png");
        match write_atomic(&path, b"data") {
            Err(SinkError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Io error, got: {other:?}"),
        }
    }

    #[test]
    fn from_config_resolves_paths() {
        let output = OutputConfig {
            icon_path: "/tmp/pacebar-test/icon.png".to_string(),
            popover_dir: "/tmp/pacebar-test/popover".to_string(),
            ..OutputConfig::default()
        };
        let sink = FileSink::from_config(&output);
        assert_eq!(sink.icon_path(), Path::new("/tmp/pacebar-test/icon.png"));
        assert!(sink.is_detail_open());
    }
}
