//! Binary entry point: wires a real X connection to the core engine and
//! drives it via [`portalwm::event_loop::run`].
//!
//! The compositor needs a Cairo surface backed by the live XCB connection to
//! paint anything a user would actually see, and the marker/background
//! layers need real cursor and wallpaper implementations (spec §6) — all of
//! that is out of scope for this crate (see [`portalwm::hooks`]) and would
//! normally be supplied by an embedder. This binary supplies the minimum
//! stand-ins needed to run the engine standalone: an in-memory buffer
//! surface, a solid-colour background, a no-op pixmap painter, and a no-op
//! cursor sink.

use portalwm::config::{Config, ConfigSource};
use portalwm::hooks::{BackgroundPainter, CursorHint, MarkerSink, PixmapPainter};
use portalwm::x::{CompositePixmap, X11rbConn, XConn};
use portalwm::{event_loop, wm::WindowManager, Result};

/// Reads core tunables from the process environment (`PORTALWM_FRAMERATE`,
/// `PORTALWM_THEME`, `PORTALWM_TILE_GAP`); everything else config.rs's key
/// list recognizes belongs to the out-of-scope loader.
struct EnvConfigSource;

impl ConfigSource for EnvConfigSource {
    fn get_str(&self, key: &str, default: &str) -> String {
        std::env::var(format!("PORTALWM_{}", key.to_uppercase())).unwrap_or_else(|_| default.to_string())
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        std::env::var(format!("PORTALWM_{}", key.to_uppercase()))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

struct NoopSink;
impl MarkerSink for NoopSink {
    fn push(&mut self, _id: u64, _hint: CursorHint, _grab: bool) {}
    fn pop(&mut self, _id: u64) {}
}

struct SolidBackground {
    rgb: (f64, f64, f64),
}
impl BackgroundPainter for SolidBackground {
    fn draw_background(&mut self, buffer_cr: &cairo::Context) -> Result<()> {
        let (r, g, b) = self.rgb;
        buffer_cr.set_source_rgb(r, g, b);
        buffer_cr.paint()?;
        Ok(())
    }
}

struct NoopPixmapPainter;
impl PixmapPainter for NoopPixmapPainter {
    fn paint_pixmap(
        &mut self,
        _buffer_cr: &cairo::Context,
        _pixmap: CompositePixmap,
        _x: i32,
        _y: i32,
        _width: u32,
        _height: u32,
    ) -> Result<()> {
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").finish().init();

    let conn = X11rbConn::connect(None)?;
    let config = Config::from_source(&EnvConfigSource);
    let mut wm = WindowManager::new(&conn, config)?;

    let (width, height) = conn.screen_size()?;
    let buffer = cairo::ImageSurface::create(cairo::Format::ARgb32, width as i32, height as i32)?;
    let buffer_cr = cairo::Context::new(&buffer)?;

    let mut sink = NoopSink;
    let mut background = SolidBackground { rgb: (0.08, 0.08, 0.08) };
    let mut painter = NoopPixmapPainter;

    event_loop::run(&conn, &mut wm, &mut sink, &mut background, &mut painter, &buffer_cr)
}
