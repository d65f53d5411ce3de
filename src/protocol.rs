//! EWMH protocol surface (C11, spec §4.10): identification chain, the
//! `_NET_SUPPORTED` announcement, desktop/client-list bookkeeping, and the
//! client-message handlers that don't belong to a more specific engine
//! (`_NET_WM_STATE` lives in [`crate::fullscreen`], `_NET_WM_MOVERESIZE` in
//! [`crate::interaction`]).
//!
//! Grounded in `ewmh/ewmh.c`'s `setup_ewmh_identification_chain`/
//! `setup_ewmh_supported_list` and `ewmh/moveresize.c`'s close-window path.

use tracing::debug;

use crate::atom::{Atom, AtomCache, EWMH_SUPPORTED};
use crate::portal::{PortalId, PortalRegistry, Xid};
use crate::visibility::Visibility;
use crate::x::property::Prop;
use crate::x::{WinType, XConn};
use crate::Result;

const WM_NAME: &str = "Penumbra";
const CHECK_WINDOW_GEOMETRY: crate::geometry::Rect = crate::geometry::Rect::new(-1, -1, 1, 1);

/// Set up the `_NET_SUPPORTING_WM_CHECK` identification chain and announce
/// `_NET_SUPPORTED` (spec §4.10 "Startup announcement"). Run once during
/// `Initialize`; returns the check window so the caller can destroy it on
/// shutdown.
pub fn announce<X: XConn>(conn: &X, atoms: &AtomCache) -> Result<Xid> {
    let root = conn.root();
    let check = conn.create_window(WinType::CheckWin, CHECK_WINDOW_GEOMETRY)?;

    conn.set_prop(root, Atom::NetSupportingWmCheck.as_ref(), Prop::Window(vec![check]))?;
    conn.set_prop(check, Atom::NetSupportingWmCheck.as_ref(), Prop::Window(vec![check]))?;
    conn.set_prop(check, Atom::NetWmName.as_ref(), Prop::Strings(vec![WM_NAME.to_string()]))?;

    let supported: Vec<Xid> = EWMH_SUPPORTED.iter().map(|&a| atoms.get(a)).collect();
    conn.set_prop(root, Atom::NetSupported.as_ref(), Prop::Atom(supported))?;

    debug!(%check, "EWMH identification chain established");
    Ok(check)
}

/// Announce the desktop set (spec §4.10 "Desktops"): `_NET_NUMBER_OF_DESKTOPS`,
/// `_NET_DESKTOP_NAMES` and the initial `_NET_CURRENT_DESKTOP`. Workspaces
/// are named positionally (`"1"`..`"N"`); the spec defines no naming scheme.
pub fn announce_desktops<X: XConn>(conn: &X, workspace_count: u8, current: u8) -> Result<()> {
    let root = conn.root();
    conn.set_prop(
        root,
        Atom::NetNumberOfDesktops.as_ref(),
        Prop::Cardinal(vec![workspace_count as u32]),
    )?;
    let names: Vec<String> = (1..=workspace_count).map(|n| n.to_string()).collect();
    conn.set_prop(root, Atom::NetDesktopNames.as_ref(), Prop::Strings(names))?;
    update_current_desktop(conn, current)
}

/// `_NET_CURRENT_DESKTOP` (spec §4.10): update after a workspace switch.
pub fn update_current_desktop<X: XConn>(conn: &X, current: u8) -> Result<()> {
    conn.set_prop(
        conn.root(),
        Atom::NetCurrentDesktop.as_ref(),
        Prop::Cardinal(vec![current as u32]),
    )
}

/// `_NET_CLIENT_LIST` (spec §4.10): every active portal's client window,
/// bottom-to-top stacking order. Called after any map/destroy.
pub fn update_client_list<X: XConn>(conn: &X, registry: &PortalRegistry) -> Result<()> {
    let windows: Vec<Xid> = registry
        .sorted()
        .iter()
        .filter_map(|&id| registry.get(id).map(|p| p.client_window))
        .collect();
    conn.set_prop(conn.root(), Atom::NetClientList.as_ref(), Prop::Window(windows))
}

/// `_NET_ACTIVE_WINDOW` (spec §4.10): update after a focus change.
pub fn update_active_window<X: XConn>(conn: &X, registry: &PortalRegistry, focused: Option<PortalId>) -> Result<()> {
    let window = focused.and_then(|id| registry.get(id)).map(|p| p.client_window);
    let value = window.map(|w| vec![w]).unwrap_or_default();
    conn.set_prop(conn.root(), Atom::NetActiveWindow.as_ref(), Prop::Window(value))
}

/// `_NET_CLOSE_WINDOW` (spec §4.10): route straight to the graceful close
/// path.
pub fn handle_net_close_window<X: XConn>(conn: &X, registry: &PortalRegistry, id: PortalId) -> Result<()> {
    crate::lifecycle::close_portal(conn, registry, id)
}

/// `_NET_ACTIVE_WINDOW` client message requesting a pager/taskbar activate a
/// window (spec §4.10 "Activation"): raise it and set input focus. A caller
/// is expected to have already made the owning workspace current if the
/// portal lives elsewhere (spec is silent on cross-workspace activation; we
/// only act if the portal is currently visible).
pub fn handle_net_active_window<X: XConn>(conn: &X, registry: &mut PortalRegistry, id: PortalId) -> Result<()> {
    let Some(portal) = registry.get(id) else { return Ok(()) };
    if portal.visibility != Visibility::Visible {
        return Ok(());
    }
    let window = portal.client_window;
    crate::lifecycle::raise_portal(conn, registry, id)?;
    conn.set_input_focus(window)?;
    update_active_window(conn, registry, Some(id))?;
    debug!(%window, id, "activated via _NET_ACTIVE_WINDOW");
    Ok(())
}
