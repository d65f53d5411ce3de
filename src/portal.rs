//! The [`Portal`] data model (spec §3) and the fixed-capacity registry (C4).

use std::fmt;

use tracing::{trace, warn};

use crate::geometry::Rect;
use crate::visibility::Visibility;

/// Resource caps from spec §5.
pub const MAX_PORTALS: usize = 256;
/// Upper bound on how many workspaces exist.
pub const MAX_WORKSPACES: u8 = 6;
/// Upper bound on non-transient, non-hidden portals per workspace.
pub const MAX_WORKSPACE_PORTALS: usize = 8;
/// Title bar height, in pixels, for every framed portal.
pub const PORTAL_TITLE_BAR_HEIGHT: u32 = 26;
/// Minimum portal width honored by resize/tiling.
pub const MINIMUM_PORTAL_WIDTH: u32 = 128;
/// Minimum portal height honored by resize/tiling.
pub const MINIMUM_PORTAL_HEIGHT: u32 = 64;
/// Cascade offset applied on first-map-from-same-class and on floating toggle.
pub const CASCADE_OFFSET_PX: i32 = 46;
/// Fraction of the viewport dimension that triggers auto-tiling on map.
pub const VIEWPORT_THRESHOLD: f64 = 0.75;
/// Rounded-corner radius used when compositing a framed portal.
pub const PORTAL_CORNER_RADIUS: f64 = 6.0;
/// Rounded-corner radius used when compositing a frameless (CSD/override-redirect) portal.
pub const PORTAL_FRAMELESS_CORNER_RADIUS: f64 = 4.0;

/// An X11 window ID.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Xid(pub u32);

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Xid {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<Xid> for u32 {
    fn from(id: Xid) -> Self {
        id.0
    }
}

/// Resolved decoration palette for a portal; `Unresolved` until the theme
/// layer (out of scope, §1) assigns one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortalTheme {
    /// Not yet resolved.
    #[default]
    Unresolved,
    /// Light titlebar palette.
    Light,
    /// Dark titlebar palette.
    Dark,
}

/// The EWMH `_NET_WM_WINDOW_TYPE` a client advertised, so far as the core
/// needs to distinguish it (full set lives in [`crate::atom::Atom`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    /// No type was advertised, or it was an unrecognized one.
    #[default]
    Normal,
    /// `_NET_WM_WINDOW_TYPE_DIALOG`.
    Dialog,
    /// `_NET_WM_WINDOW_TYPE_DOCK`.
    Dock,
    /// `_NET_WM_WINDOW_TYPE_MENU`.
    Menu,
    /// `_NET_WM_WINDOW_TYPE_NOTIFICATION`.
    Notification,
    /// `_NET_WM_WINDOW_TYPE_TOOLTIP`.
    Tooltip,
    /// `_NET_WM_WINDOW_TYPE_SPLASH`.
    Splash,
    /// `_NET_WM_WINDOW_TYPE_UTILITY`.
    Utility,
}

impl WindowType {
    /// `true` for window types that are never eligible for a server-drawn
    /// frame (spec §4.2).
    pub fn disqualifies_framing(&self) -> bool {
        matches!(
            self,
            WindowType::Dock
                | WindowType::Menu
                | WindowType::Notification
                | WindowType::Tooltip
                | WindowType::Splash
                | WindowType::Utility
        )
    }

    /// `true` for window types the compositor should never draw a frameless
    /// shadow/border treatment for either (tooltips/notifications paint flat).
    pub fn is_decoration_exempt(&self) -> bool {
        matches!(self, WindowType::Tooltip | WindowType::Notification)
    }
}

/// One managed pairing of a client window and its optional decorative frame
/// (spec §3). This is the window manager's unit of state.
#[derive(Debug, Clone)]
pub struct Portal {
    /// Whether this slot holds a live portal (tombstone flag).
    pub active: bool,
    /// Window title, read from `_NET_WM_NAME`/`WM_NAME`.
    pub title: String,
    /// First-map setup has completed.
    pub initialized: bool,
    /// Direct child of root and not override-redirect at map time.
    pub top_level: bool,
    /// Back-reference to the transient-for parent portal's index, if any.
    pub transient_for: Option<usize>,
    /// Current place in the visibility state machine.
    pub visibility: Visibility,
    /// The client manages its own geometry/decoration.
    pub override_redirect: bool,
    /// Currently in the fullscreen state.
    pub fullscreen: bool,
    /// Assigned workspace index in `[0, MAX_WORKSPACES)`, or `None` if unassigned.
    pub workspace: Option<u8>,
    /// Root-relative outer rectangle (frame's outer rect if framed).
    pub geometry: Rect,
    /// Pre-fullscreen geometry snapshot.
    pub geometry_backup: Rect,
    /// Last floating-mode geometry, used for cascade sizing.
    pub geometry_floating_backup: Rect,
    /// The decorative frame window, if this portal is framed.
    pub frame_window: Option<Xid>,
    /// The client window. Always set for an active portal.
    pub client_window: Xid,
    /// `_NET_WM_WINDOW_TYPE`, so far as the core cares.
    pub client_window_type: WindowType,
    /// The client repositioned itself inside the frame; triggers split rendering.
    pub misaligned: bool,
    /// Resolved decoration palette.
    pub theme: PortalTheme,
    /// `true` once this portal's client has had `CompositeRedirectAutomatic`
    /// applied for split rendering (compositor bookkeeping, spec §4.9).
    pub client_independently_redirected: bool,
}

impl Portal {
    fn new(client_window: Xid) -> Self {
        Self {
            active: true,
            title: String::new(),
            initialized: false,
            top_level: false,
            transient_for: None,
            visibility: Visibility::Hidden,
            override_redirect: false,
            fullscreen: false,
            workspace: None,
            geometry: Rect::default(),
            geometry_backup: Rect::default(),
            geometry_floating_backup: Rect::default(),
            frame_window: None,
            client_window,
            client_window_type: WindowType::default(),
            misaligned: false,
            theme: PortalTheme::default(),
            client_independently_redirected: false,
        }
    }

    /// Whether the client is reparented into a server-drawn frame.
    pub fn is_framed(&self) -> bool {
        self.frame_window.is_some()
    }

    /// The outer X window to issue move/stack requests against: the frame if
    /// present, otherwise the client itself.
    pub fn outer_window(&self) -> Xid {
        self.frame_window.unwrap_or(self.client_window)
    }

    /// This portal is counted against a workspace's `MAX_WORKSPACE_PORTALS`
    /// cap (spec §3 invariant / §4.8).
    pub fn counts_against_workspace_cap(&self) -> bool {
        self.transient_for.is_none()
            && !self.override_redirect
            && self.visibility != Visibility::Hidden
    }

    /// Eligible to participate in tiling (spec, `workspaces/tiling.c`
    /// `is_tiling_eligible`).
    pub fn is_tiling_eligible(&self) -> bool {
        self.active
            && self.initialized
            && self.transient_for.is_none()
            && !self.override_redirect
            && self.visibility != Visibility::Hidden
    }
}

/// A stable index into the [`PortalRegistry`]'s backing array.
pub type PortalId = usize;

/// Fixed-capacity slab-with-tombstones registry of [`Portal`]s (C4).
///
/// Slot addresses (indices) are stable across the registry's lifetime: a
/// `PortalId` obtained from [`PortalRegistry::create`] remains valid until
/// that slot is destroyed, even as other portals come and go.
#[derive(Debug)]
pub struct PortalRegistry {
    slots: Vec<Portal>,
    active_count: usize,
    /// Bottom-to-top stacking order, rebuilt from the X tree on every
    /// stacking change. Contains only active portal ids.
    sorted: Vec<PortalId>,
}

impl Default for PortalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PortalRegistry {
    /// Construct an empty registry with `MAX_PORTALS` inactive slots.
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(MAX_PORTALS),
            active_count: 0,
            sorted: Vec::with_capacity(MAX_PORTALS),
        }
    }

    /// Find the first inactive slot and activate it for `client_window`.
    ///
    /// Returns `None` if every slot is in use (spec §7.2: registry full).
    pub fn create(&mut self, client_window: Xid) -> Option<PortalId> {
        if let Some((id, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, p)| !p.active)
        {
            *slot = Portal::new(client_window);
            self.active_count += 1;
            trace!(%client_window, id, "reused tombstoned portal slot");
            return Some(id);
        }

        if self.slots.len() >= MAX_PORTALS {
            warn!(%client_window, "portal registry full");
            return None;
        }

        self.slots.push(Portal::new(client_window));
        self.active_count += 1;
        let id = self.slots.len() - 1;
        trace!(%client_window, id, "created new portal slot");
        Some(id)
    }

    /// Tombstone the given slot. The caller is responsible for having already
    /// confirmed the client window is gone (spec §4.1 `destroy`).
    pub fn destroy(&mut self, id: PortalId) {
        if let Some(slot) = self.slots.get_mut(id) {
            if slot.active {
                slot.active = false;
                self.active_count -= 1;
            }
        }
        self.sorted.retain(|&i| i != id);
    }

    /// Look up a portal by id.
    pub fn get(&self, id: PortalId) -> Option<&Portal> {
        self.slots.get(id).filter(|p| p.active)
    }

    /// Look up a portal mutably by id.
    pub fn get_mut(&mut self, id: PortalId) -> Option<&mut Portal> {
        self.slots.get_mut(id).filter(|p| p.active)
    }

    /// Linear scan matching either `client_window` or `frame_window`.
    pub fn find_by_window(&self, w: Xid) -> Option<PortalId> {
        self.slots.iter().enumerate().find_map(|(id, p)| {
            if !p.active {
                return None;
            }
            if p.client_window == w || p.frame_window == Some(w) {
                Some(id)
            } else {
                None
            }
        })
    }

    /// Iterate over every active portal, unordered.
    pub fn iter(&self) -> impl Iterator<Item = (PortalId, &Portal)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, p)| p.active)
    }

    /// Number of currently active portals.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Replace the stacking cache. Callers rebuild this by walking the X
    /// tree and retaining only entries that match a portal's client window
    /// (spec §4.1).
    pub fn set_sorted(&mut self, sorted: Vec<PortalId>) {
        self.sorted = sorted;
    }

    /// The current bottom-to-top stacking order (active portals only).
    pub fn sorted(&self) -> &[PortalId] {
        &self.sorted
    }

    /// Topmost hit at `(x, y)` among `Visible` portals, top-down.
    pub fn find_at(&self, x: i32, y: i32) -> Option<PortalId> {
        self.sorted.iter().rev().copied().find(|&id| {
            self.get(id)
                .map(|p| p.visibility == Visibility::Visible && p.geometry.contains(x, y))
                .unwrap_or(false)
        })
    }

    /// The topmost `Visible` portal in stacking order, or `None`.
    pub fn top_portal(&self) -> Option<PortalId> {
        self.sorted
            .iter()
            .rev()
            .copied()
            .find(|&id| self.get(id).map(|p| p.visibility == Visibility::Visible).unwrap_or(false))
    }

    /// Follow `transient_for` links to the root ancestor, with a depth guard
    /// of `MAX_PORTALS` to defend against a corrupted cycle.
    pub fn find_transient_root(&self, mut id: PortalId) -> PortalId {
        let mut depth = 0;
        while let Some(p) = self.get(id) {
            match p.transient_for {
                Some(parent) if depth < MAX_PORTALS => {
                    id = parent;
                    depth += 1;
                }
                _ => break,
            }
        }
        id
    }

    /// Count non-transient, non-override-redirect, non-hidden portals
    /// assigned to `workspace` (spec §3 invariant, §8).
    pub fn count_workspace_portals(&self, workspace: u8) -> usize {
        self.iter()
            .filter(|(_, p)| p.workspace == Some(workspace) && p.counts_against_workspace_cap())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_reuses_tombstoned_slots() {
        let mut reg = PortalRegistry::new();
        let a = reg.create(Xid(1)).unwrap();
        reg.destroy(a);
        let b = reg.create(Xid(2)).unwrap();
        assert_eq!(a, b, "tombstoned slot should be reused");
        assert_eq!(reg.active_count(), 1);
    }

    #[test]
    fn registry_full_returns_none() {
        let mut reg = PortalRegistry::new();
        for i in 0..MAX_PORTALS {
            assert!(reg.create(Xid(i as u32)).is_some());
        }
        assert!(reg.create(Xid(9999)).is_none());
    }

    #[test]
    fn find_by_window_matches_client_or_frame() {
        let mut reg = PortalRegistry::new();
        let id = reg.create(Xid(10)).unwrap();
        reg.get_mut(id).unwrap().frame_window = Some(Xid(11));
        assert_eq!(reg.find_by_window(Xid(10)), Some(id));
        assert_eq!(reg.find_by_window(Xid(11)), Some(id));
        assert_eq!(reg.find_by_window(Xid(12)), None);
    }

    #[test]
    fn transient_root_follows_chain_with_depth_guard() {
        let mut reg = PortalRegistry::new();
        let root = reg.create(Xid(1)).unwrap();
        let mid = reg.create(Xid(2)).unwrap();
        let leaf = reg.create(Xid(3)).unwrap();
        reg.get_mut(mid).unwrap().transient_for = Some(root);
        reg.get_mut(leaf).unwrap().transient_for = Some(mid);
        assert_eq!(reg.find_transient_root(leaf), root);
        assert_eq!(reg.find_transient_root(root), root);
    }
}
