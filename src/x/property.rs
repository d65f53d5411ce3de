//! Parsed X window properties the core reads and writes.

use crate::geometry::Rect;
use crate::portal::Xid;

/// A decoded property value, wide enough for everything the core reads
/// (spec §6 "Properties read").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prop {
    /// `WM_STATE`-shaped and other 32-bit cardinal lists.
    Cardinal(Vec<u32>),
    /// Lists of atoms, e.g. `_NET_WM_STATE`, `_NET_WM_WINDOW_TYPE`.
    Atom(Vec<Xid>),
    /// Window references, e.g. `WM_TRANSIENT_FOR`.
    Window(Vec<Xid>),
    /// `UTF8_STRING`/`STRING` lists, e.g. `WM_CLASS` (instance, class) or a title.
    Strings(Vec<String>),
    /// Parsed `WM_NORMAL_HINTS`.
    NormalHints(WmNormalHints),
    /// Parsed `_MOTIF_WM_HINTS`.
    MotifHints(MotifHints),
}

/// `WM_STATE` values understood by ICCCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmState {
    /// `WithdrawnState`.
    Withdrawn,
    /// `NormalState`.
    Normal,
    /// `IconicState`.
    Iconic,
}

impl WmState {
    /// The ICCCM integer encoding.
    pub fn as_u32(self) -> u32 {
        match self {
            WmState::Withdrawn => 0,
            WmState::Normal => 1,
            WmState::Iconic => 3,
        }
    }
}

/// Relevant fields of `WM_NORMAL_HINTS` (ICCCM §4.1.2.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WmNormalHints {
    /// `USPosition`/`PPosition` present and not a toolkit-default placement.
    pub has_user_specified_position: bool,
    /// Requested position, valid only when `has_user_specified_position`.
    pub x: i32,
    /// Requested position, valid only when `has_user_specified_position`.
    pub y: i32,
    /// `PMinSize` width, if present.
    pub min_width: Option<u32>,
    /// `PMinSize` height, if present.
    pub min_height: Option<u32>,
}

impl WmNormalHints {
    /// `true` when the hints carry a genuine user/program requested position
    /// rather than a toolkit default of `(0, 0)` or `(1, 1)` (spec §4.3).
    pub fn has_honorable_position(&self) -> bool {
        self.has_user_specified_position && !matches!((self.x, self.y), (0, 0) | (1, 1))
    }
}

/// Relevant fields of `_MOTIF_WM_HINTS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotifHints {
    /// Whether the `decorations` field should be honored at all.
    pub decorations_set: bool,
    /// The requested decoration state.
    pub decorations: bool,
}

impl MotifHints {
    /// Whether these hints permit a server-drawn frame. Absent hints permit
    /// framing (the common case).
    pub fn allows_decorations(&self) -> bool {
        !self.decorations_set || self.decorations
    }
}

/// Attributes queried directly from the X server for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    /// `override_redirect` flag.
    pub override_redirect: bool,
    /// Whether the window is currently viewable.
    pub viewable: bool,
}

/// A window's geometry and its direct parent, as reported by the X server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    /// Geometry relative to the window's immediate parent.
    pub rect: Rect,
    /// The immediate parent window.
    pub parent: Xid,
}
