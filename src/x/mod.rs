//! The X abstraction layer (C1): display handle, tree walks, property
//! get/set, key/raw-input grabbing, coordinate translation and the error
//! trap that swallows transient races.

pub mod event;
pub mod property;
pub mod mock;
pub mod x11rb_conn;

pub use event::{ClientMessage, EventTag, RawEvent, XEvent};
pub use mock::{MockXConn, StubXConn};
pub use property::{MotifHints, Prop, WindowAttributes, WindowGeometry, WmNormalHints, WmState};
pub use x11rb_conn::X11rbConn;

use crate::geometry::{Point, Rect};
use crate::portal::Xid;
use crate::Result;

/// A window type to be specified when creating a new window in the X server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WinType {
    /// The WM's own hidden check window (`_NET_SUPPORTING_WM_CHECK`).
    CheckWin,
    /// A decorative frame window.
    Frame,
}

/// How a window should be redirected for off-screen composited drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeRedirect {
    /// `CompositeRedirectManual`: the compositor alone names the pixmap.
    Manual,
    /// `CompositeRedirectAutomatic`: the server keeps it up to date.
    Automatic,
}

/// An opaque handle to a composited window's backing pixmap for one frame.
///
/// Owned per-tick by the compositor: acquired, wrapped in a Cairo surface,
/// used, and freed within the same call (spec §5 "Lifetime").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositePixmap(pub Xid);

/// A handle on a running X11 connection used for issuing X requests.
///
/// This is an abstraction boundary so the engine can run against either the
/// `x11rb`-backed implementation or an in-memory mock for tests (spec §5, §8
/// use a "virtual X server" as the scenario-test seed).
pub trait XConn {
    /// The root window.
    fn root(&self) -> Xid;
    /// `(width, height)` of the (single, per Non-goals) screen.
    fn screen_size(&self) -> Result<(u32, u32)>;
    /// Current pointer position, root-relative.
    fn cursor_position(&self) -> Result<Point>;

    /// Intern (or look up) an atom by name.
    fn intern_atom(&self, name: &str) -> Result<Xid>;

    /// Direct children of `window`, in bottom-to-top stacking order.
    fn query_tree(&self, window: Xid) -> Result<Vec<Xid>>;
    /// Attributes needed to decide adoption eligibility and viewability.
    fn get_window_attributes(&self, window: Xid) -> Result<WindowAttributes>;
    /// Geometry relative to `window`'s current parent, plus that parent.
    fn get_geometry(&self, window: Xid) -> Result<WindowGeometry>;
    /// Translate `(x, y)` in `from`'s coordinate space into root coordinates.
    fn translate_to_root(&self, from: Xid, x: i32, y: i32) -> Result<Point>;

    /// Create a new, initially unmapped window (used for frames and the
    /// hidden EWMH check window).
    fn create_window(&self, ty: WinType, r: Rect) -> Result<Xid>;
    /// Destroy a window the WM itself created (a frame or the check window).
    fn destroy_window(&self, window: Xid) -> Result<()>;
    /// Reparent `window` into `parent` at `(x, y)` parent-relative.
    fn reparent_window(&self, window: Xid, parent: Xid, x: i32, y: i32) -> Result<()>;
    /// Add `window` to the X save-set so it survives an abnormal WM exit.
    fn add_to_save_set(&self, window: Xid) -> Result<()>;

    /// Map a window, making it visible.
    fn map_window(&self, window: Xid) -> Result<()>;
    /// Unmap a window, hiding it.
    fn unmap_window(&self, window: Xid) -> Result<()>;
    /// Forcibly destroy a client (used when it does not support
    /// `WM_DELETE_WINDOW`).
    fn kill_window(&self, window: Xid) -> Result<()>;
    /// Move `window` relative to its current parent. Errors are trapped by
    /// the caller per spec §4.2 "Move": the request may race a vanished peer.
    fn move_window(&self, window: Xid, x: i32, y: i32) -> Result<()>;
    /// Resize `window`.
    fn resize_window(&self, window: Xid, width: u32, height: u32) -> Result<()>;
    /// Raise `window` to the top of the stacking order.
    fn raise_window(&self, window: Xid) -> Result<()>;
    /// Stack `window` immediately above `sibling`.
    fn stack_above(&self, window: Xid, sibling: Xid) -> Result<()>;
    /// Pass a `ConfigureRequest` straight through to `XConfigureWindow`
    /// (spec §4.2 "non-framed" policy branch).
    fn configure_window_passthrough(
        &self,
        window: Xid,
        x: Option<i32>,
        y: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<()>;

    /// Set keyboard input focus to `window`.
    fn set_input_focus(&self, window: Xid) -> Result<()>;

    /// Send a synthetic `ConfigureNotify`, per ICCCM §4.1.5.
    fn send_synthetic_configure_notify(
        &self,
        window: Xid,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<()>;
    /// Send a `WM_PROTOCOLS`/`WM_DELETE_WINDOW` client message.
    fn send_delete_window(&self, window: Xid) -> Result<()>;

    /// Read a property, decoded to the extent the core needs.
    fn get_prop(&self, window: Xid, name: &str) -> Result<Option<Prop>>;
    /// Write a property.
    fn set_prop(&self, window: Xid, name: &str, value: Prop) -> Result<()>;
    /// Delete a property.
    fn delete_prop(&self, window: Xid, name: &str) -> Result<()>;
    /// `true` if `window` lists `proto` in `WM_PROTOCOLS`.
    fn supports_protocol(&self, window: Xid, proto: &str) -> Result<bool>;

    /// Grab the server for an atomic section (fullscreen enter/exit,
    /// composite pixmap acquisition). Never held across a `select` (spec §5).
    fn grab_server(&self) -> Result<()>;
    /// Release a server grab.
    fn ungrab_server(&self) -> Result<()>;

    /// Select the root-window substructure-redirect/notify event mask plus
    /// the XInput2 raw button/key/motion mask (spec §6).
    fn select_root_input(&self) -> Result<()>;
    /// Select `SubstructureNotifyMask` on a freshly created portal's client.
    fn select_client_input(&self, window: Xid) -> Result<()>;

    /// Block (bounded by the event loop's `select` timeout) for the next X
    /// or XInput2 event. Returns `None` on timeout.
    fn poll_event(&self) -> Result<Option<XEvent>>;
    /// Flush pending requests to the X server.
    fn flush(&self);
    /// A pollable file descriptor for the event loop's `select` (C3).
    fn connection_fd(&self) -> std::os::unix::io::RawFd;

    /// Whether the XComposite extension (>= 0.2) is available.
    fn composite_available(&self) -> bool;
    /// `XCompositeRedirectSubwindows` on root (manual mode), done once at
    /// startup if composite is available.
    fn composite_redirect_subwindows(&self, window: Xid) -> Result<()>;
    /// Redirect a single window (spec §4.7 fullscreen, §4.9 split rendering).
    fn composite_redirect_window(&self, window: Xid, mode: CompositeRedirect) -> Result<()>;
    /// Reverse a manual redirect.
    fn composite_unredirect_window(&self, window: Xid) -> Result<()>;
    /// Acquire this tick's backing pixmap for a composited window.
    fn composite_name_window_pixmap(&self, window: Xid) -> Result<CompositePixmap>;
    /// Release a pixmap obtained from [`XConn::composite_name_window_pixmap`].
    fn free_pixmap(&self, pixmap: CompositePixmap) -> Result<()>;

    /// Read a 1-pixel-tall strip of `len` RGB samples from `window` starting
    /// at `(x, y)`, used by the luminance-adaptive border (spec §4.9).
    fn get_image_strip(&self, window: Xid, x: i32, y: i32, len: u32) -> Result<Vec<(u8, u8, u8)>>;
}
