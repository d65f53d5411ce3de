//! Traits the out-of-scope collaborators implement against (spec §6):
//! the shortcut layer, the marker (cursor) layer, and the background layer.
//!
//! None of these are invoked by anything inside this crate; they exist so
//! an embedder can wire up the thin glue spec §1 places outside the core.

use crate::portal::PortalId;
use crate::Result;

/// Calls the shortcut layer makes into the core.
pub trait ShortcutActions {
    /// Move the given portal (or transient root) to `workspace`.
    fn move_portal_to_workspace(&mut self, portal: PortalId, workspace: u8) -> Result<()>;
    /// Switch the active workspace.
    fn switch_workspace(&mut self, workspace: u8) -> Result<()>;
    /// Toggle the active workspace's layout mode.
    fn toggle_workspace_layout_mode(&mut self) -> Result<()>;
    /// Close the currently focused portal.
    fn destroy_focused_portal(&mut self) -> Result<()>;
}

/// A cursor-shape hint the interaction engine (C7) emits for the marker
/// layer to render. Core never reads marker state back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    /// Default root cursor.
    Normal,
    /// Hovering a frame's draggable title bar.
    HoverFrame,
    /// Hovering a resize corner.
    HoverResize,
    /// A drag is in progress.
    Dragging,
    /// A resize is in progress.
    Resizing,
}

/// Sink the marker layer implements to receive cursor hints pushed by id
/// (spec's "marker deck": a LIFO keyed by id, top-of-deck wins).
pub trait MarkerSink {
    /// Push a cursor hint for `id` onto the deck.
    fn push(&mut self, id: u64, hint: CursorHint, grab: bool);
    /// Pop the hint previously pushed for `id`.
    fn pop(&mut self, id: u64);
}

/// Implemented by the background layer; invoked once per `Update` tick
/// before portals are painted (spec §4.9 step 2).
pub trait BackgroundPainter {
    /// Paint the desktop background into the compositor's buffer surface.
    fn draw_background(&mut self, buffer_cr: &cairo::Context) -> Result<()>;
}

/// Implemented by the XCB/Cairo glue layer the compositor (C10) calls into
/// to paint a window's live composited content. Wrapping an
/// [`crate::x::CompositePixmap`] in a Cairo surface needs the raw XCB
/// connection and visual, which `XConn` deliberately doesn't expose (same
/// seam as [`BackgroundPainter`]) — this crate never creates that surface
/// itself.
pub trait PixmapPainter {
    /// Paint `pixmap`'s current content into `buffer_cr`, placed with its
    /// top-left corner at `(x, y)` and sized `width x height`.
    fn paint_pixmap(
        &mut self,
        buffer_cr: &cairo::Context,
        pixmap: crate::x::CompositePixmap,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<()>;
}
