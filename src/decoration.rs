//! Decoration engine (C6, spec §4.5): frame rendering, trigger hit-testing
//! and close-button handling, and title updates.
//!
//! Grounded in `portals/frames.c` (`draw_portal_frame`), `portals/title.c`
//! and `portals/buttons.c` (titlebar buttons, called "triggers" by the
//! distilled spec). Rendering itself targets a Cairo context the caller
//! owns for the frame window, the same seam [`crate::hooks::BackgroundPainter`]
//! uses for the desktop background — this crate never opens an Xlib/XCB
//! surface itself.

use tracing::debug;

use crate::atom::{Atom, AtomCache};
use crate::config::ThemeMode;
use crate::portal::{Portal, PortalId, PortalRegistry, PortalTheme, Xid, PORTAL_TITLE_BAR_HEIGHT};
use crate::x::XConn;
use crate::Result;

/// Width/height of a titlebar button's clickable square.
const BUTTON_SIZE: i32 = 16;
/// Gap between a button's edge and the titlebar edge, and between buttons.
const BUTTON_PADDING: i32 = 4;
/// Left inset of the title text.
const TITLE_PADDING_LEFT: f64 = 8.0;
/// Right inset reserved for the trigger buttons.
const TITLE_PADDING_RIGHT: f64 = 50.0;
/// Radius of the focus indicator dot.
const FOCUS_DOT_RADIUS: f64 = 3.0;

/// A resolved RGB color, 0.0..=1.0 per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f64, pub f64, pub f64);

/// A resolved RGBA color, 0.0..=1.0 per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba(pub f64, pub f64, pub f64, pub f64);

/// A resolved titlebar palette, shared by the decoration engine (frame
/// fill/text) and the compositor (inner border/separator, spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub titlebar_bg: Rgb,
    pub titlebar_fg: Rgb,
    pub titlebar_border: Rgba,
    pub titlebar_separator: Rgba,
}

const LIGHT: Theme = Theme {
    titlebar_bg: Rgb(0.95, 0.95, 0.95),
    titlebar_fg: Rgb(0.1, 0.1, 0.1),
    titlebar_border: Rgba(0.0, 0.0, 0.0, 0.15),
    titlebar_separator: Rgba(0.0, 0.0, 0.0, 0.2),
};
const DARK: Theme = Theme {
    titlebar_bg: Rgb(0.1, 0.1, 0.1),
    titlebar_fg: Rgb(0.9, 0.9, 0.9),
    titlebar_border: Rgba(1.0, 1.0, 1.0, 0.15),
    titlebar_separator: Rgba(1.0, 1.0, 1.0, 0.15),
};

/// Resolve a portal's titlebar palette from the configured [`ThemeMode`] and
/// its own resolved [`PortalTheme`] (spec §6, `config.rs`'s `ThemeMode::Adaptive`
/// doc: "titlebar palette still needs an external theme layer to pick one").
/// `Adaptive` with no theme resolved yet falls back to light.
pub fn resolve_theme(mode: ThemeMode, portal_theme: PortalTheme) -> Theme {
    match mode {
        ThemeMode::Light => LIGHT,
        ThemeMode::Dark => DARK,
        ThemeMode::Adaptive => match portal_theme {
            PortalTheme::Dark => DARK,
            PortalTheme::Light | PortalTheme::Unresolved => LIGHT,
        },
    }
}

fn close_button_pos(width: u32) -> (i32, i32) {
    let x = width as i32 - BUTTON_PADDING - BUTTON_SIZE;
    let y = (PORTAL_TITLE_BAR_HEIGHT as i32 - BUTTON_SIZE) / 2;
    (x, y)
}

fn arrange_button_pos(width: u32) -> (i32, i32) {
    let (close_x, close_y) = close_button_pos(width);
    (close_x - BUTTON_SIZE - BUTTON_PADDING, close_y)
}

fn in_square(origin: (i32, i32), rel_x: i32, rel_y: i32) -> bool {
    let (x, y) = origin;
    rel_x >= x && rel_x <= x + BUTTON_SIZE && rel_y >= y && rel_y <= y + BUTTON_SIZE
}

/// Whether `(rel_x, rel_y)`, frame-relative, hits the close trigger.
pub fn is_close_trigger(width: u32, rel_x: i32, rel_y: i32) -> bool {
    in_square(close_button_pos(width), rel_x, rel_y)
}

/// Whether `(rel_x, rel_y)`, frame-relative, hits the arrange trigger.
pub fn is_arrange_trigger(width: u32, rel_x: i32, rel_y: i32) -> bool {
    in_square(arrange_button_pos(width), rel_x, rel_y)
}

/// Whether `(rel_x, rel_y)` falls anywhere within the titlebar band.
pub fn is_frame_area(width: u32, rel_x: i32, rel_y: i32) -> bool {
    rel_x >= 0 && rel_x < width as i32 && rel_y >= 0 && rel_y < PORTAL_TITLE_BAR_HEIGHT as i32
}

/// A left click at `(rel_x, rel_y)`, frame-relative, landed on the close
/// trigger and should be routed to [`crate::lifecycle::close_portal`]
/// (spec §4.5: "On left click inside the close trigger, call
/// `destroy_portal`" — our lifecycle names the graceful-close entry point
/// `close_portal`; the registry-freeing `destroy_portal` only runs once the
/// client is actually gone).
pub fn handle_trigger_click<X: XConn>(
    conn: &X,
    registry: &PortalRegistry,
    id: PortalId,
    rel_x: i32,
    rel_y: i32,
) -> Result<bool> {
    let Some(portal) = registry.get(id) else { return Ok(false) };
    if !is_frame_area(portal.geometry.w, rel_x, rel_y) {
        return Ok(false);
    }
    if is_close_trigger(portal.geometry.w, rel_x, rel_y) {
        crate::lifecycle::close_portal(conn, registry, id)?;
        return Ok(true);
    }
    // The arrange trigger has no assigned action yet (spec is silent; the
    // original leaves it as a no-op too).
    Ok(false)
}

/// Draw a portal's frame: clear, titlebar fill, focus dot, title text,
/// triggers (spec §4.5).
pub fn draw_frame(cr: &cairo::Context, portal: &Portal, theme: Theme, focused: bool) -> Result<()> {
    let width = portal.geometry.w as f64;

    cr.save()?;
    cr.set_operator(cairo::Operator::Clear);
    cr.paint()?;
    cr.set_operator(cairo::Operator::Over);

    let Theme { titlebar_bg, titlebar_fg, .. } = theme;
    cr.set_source_rgb(titlebar_bg.0, titlebar_bg.1, titlebar_bg.2);
    cr.rectangle(0.0, 0.0, width, PORTAL_TITLE_BAR_HEIGHT as f64);
    cr.fill()?;

    cr.set_source_rgba(titlebar_fg.0, titlebar_fg.1, titlebar_fg.2, 0.5);
    let dot_x = 10.0 + FOCUS_DOT_RADIUS;
    let dot_y = PORTAL_TITLE_BAR_HEIGHT as f64 / 2.0;
    cr.arc(dot_x, dot_y, FOCUS_DOT_RADIUS, 0.0, std::f64::consts::TAU);
    if focused {
        cr.fill()?;
    } else {
        cr.set_line_width(1.0);
        cr.stroke()?;
    }

    draw_title(cr, portal, titlebar_fg)?;
    draw_triggers(cr, portal, titlebar_fg)?;

    cr.restore()?;
    Ok(())
}

fn draw_title(cr: &cairo::Context, portal: &Portal, fg: Rgb) -> Result<()> {
    let width = portal.geometry.w as f64;
    let available = width - TITLE_PADDING_LEFT - TITLE_PADDING_RIGHT;
    if available <= 0.0 {
        return Ok(());
    }

    cr.save()?;
    cr.rectangle(TITLE_PADDING_LEFT, 0.0, available, PORTAL_TITLE_BAR_HEIGHT as f64);
    cr.clip();

    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
    cr.set_font_size(11.0);
    cr.set_source_rgb(fg.0, fg.1, fg.2);

    let extents = cr.font_extents()?;
    let text_y = (PORTAL_TITLE_BAR_HEIGHT as f64 + extents.ascent - extents.descent) / 2.0;
    cr.move_to(TITLE_PADDING_LEFT, text_y);
    cr.show_text(&portal.title)?;

    cr.restore()?;
    Ok(())
}

fn draw_triggers(cr: &cairo::Context, portal: &Portal, fg: Rgb) -> Result<()> {
    let width = portal.geometry.w;
    let (x, y) = close_button_pos(width);
    cr.set_source_rgb(fg.0, fg.1, fg.2);
    cr.set_line_width(2.0);
    cr.move_to((x + BUTTON_PADDING) as f64, (y + BUTTON_PADDING) as f64);
    cr.line_to((x + BUTTON_SIZE - BUTTON_PADDING) as f64, (y + BUTTON_SIZE - BUTTON_PADDING) as f64);
    cr.move_to((x + BUTTON_SIZE - BUTTON_PADDING) as f64, (y + BUTTON_PADDING) as f64);
    cr.line_to((x + BUTTON_PADDING) as f64, (y + BUTTON_SIZE - BUTTON_PADDING) as f64);
    cr.stroke()?;
    Ok(())
}

/// React to a `PropertyNotify` on `WM_NAME`/`_NET_WM_NAME`: re-read and
/// update the title, returning `true` if it changed and the frame needs a
/// redraw (spec §4.5 "Title updates").
pub fn handle_title_property_notify<X: XConn>(
    conn: &X,
    atoms: &AtomCache,
    registry: &mut PortalRegistry,
    id: PortalId,
    changed_atom: Xid,
) -> Result<bool> {
    if changed_atom != atoms.get(Atom::WmName) && changed_atom != atoms.get(Atom::NetWmName) {
        return Ok(false);
    }
    let Some(portal) = registry.get(id) else { return Ok(false) };
    let window = portal.client_window;
    let new_title = crate::lifecycle::read_title(conn, window);
    if new_title == portal.title {
        return Ok(false);
    }
    if let Some(portal) = registry.get_mut(id) {
        portal.title = new_title;
    }
    debug!(%window, id, "portal title updated");
    Ok(true)
}
