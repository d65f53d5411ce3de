//! Portal creation, initialization, mapping, move/resize and synchronize
//! (C5, spec §4.2–§4.4).

use tracing::{debug, trace, warn};

use crate::atom::{Atom, AtomCache};
use crate::geometry::Rect;
use crate::portal::{
    PortalId, PortalRegistry, WindowType, Xid, MAX_WORKSPACE_PORTALS, PORTAL_TITLE_BAR_HEIGHT,
};
use crate::visibility::{Transition, Visibility};
use crate::x::property::{Prop, WmState};
use crate::x::{WinType, XConn};
use crate::{Error, Result};

/// Fired by lifecycle operations so the workspace/protocol/compositor layers
/// can react without lifecycle depending on them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    PortalInitialized(PortalId),
    PortalMapped { portal: PortalId, first_map: bool },
    PortalUnmapped(PortalId),
    PortalRaised(PortalId),
    PortalDestroyed(PortalId),
    PortalFocused(PortalId),
}

/// Read a window's name, preferring `_NET_WM_NAME` over `WM_NAME`, falling
/// back to `"Untitled"` on a property-read miss (spec §7 item 5).
pub(crate) fn read_title<X: XConn>(conn: &X, window: Xid) -> String {
    if let Ok(Some(Prop::Strings(names))) = conn.get_prop(window, Atom::NetWmName.as_ref()) {
        if let Some(name) = names.into_iter().next() {
            return name;
        }
    }
    if let Ok(Some(Prop::Strings(names))) = conn.get_prop(window, Atom::WmName.as_ref()) {
        if let Some(name) = names.into_iter().next() {
            return name;
        }
    }
    "Untitled".to_string()
}

fn read_window_type<X: XConn>(conn: &X, atoms: &AtomCache, window: Xid) -> WindowType {
    let Ok(Some(Prop::Atom(advertised))) = conn.get_prop(window, Atom::NetWmWindowType.as_ref()) else {
        return WindowType::Normal;
    };
    const TABLE: &[(Atom, WindowType)] = &[
        (Atom::NetWmWindowTypeDialog, WindowType::Dialog),
        (Atom::NetWmWindowTypeDock, WindowType::Dock),
        (Atom::NetWmWindowTypeMenu, WindowType::Menu),
        (Atom::NetWmWindowTypeNotification, WindowType::Notification),
        (Atom::NetWmWindowTypeTooltip, WindowType::Tooltip),
        (Atom::NetWmWindowTypeSplash, WindowType::Splash),
        (Atom::NetWmWindowTypeUtility, WindowType::Utility),
    ];
    for xid in advertised {
        if let Some(&(_, ty)) = TABLE.iter().find(|(atom, _)| atoms.get(*atom) == xid) {
            return ty;
        }
    }
    WindowType::Normal
}

fn allows_decorations<X: XConn>(conn: &X, window: Xid) -> bool {
    match conn.get_prop(window, Atom::MotifWmHints.as_ref()) {
        Ok(Some(Prop::MotifHints(hints))) => hints.allows_decorations(),
        _ => true,
    }
}

/// Decide whether a portal should be framed (spec §4.2 "Framing decision").
fn should_frame(top_level: bool, motif_allows: bool, window_type: WindowType) -> bool {
    top_level && motif_allows && !window_type.disqualifies_framing()
}

/// Create a portal for a newly observed top-level window (spec §4.1
/// `create`). Does not initialize it; callers initialize on first map.
pub fn create_portal<X: XConn>(conn: &X, registry: &mut PortalRegistry, window: Xid) -> Result<PortalId> {
    let id = registry.create(window).ok_or(Error::RegistryFull)?;
    conn.select_client_input(window)?;
    trace!(%window, id, "portal created");
    Ok(id)
}

/// First-map initialization (spec §4.2 "Initialization").
pub fn initialize_portal<X: XConn>(
    conn: &X,
    atoms: &AtomCache,
    registry: &mut PortalRegistry,
    id: PortalId,
) -> Result<LifecycleEvent> {
    let window = registry.get(id).ok_or(Error::UnknownPortal(Xid::default()))?.client_window;

    let title = read_title(conn, window);
    let attrs = conn.get_window_attributes(window)?;
    let geom = conn.get_geometry(window)?;
    let top_level = geom.parent == conn.root() && !attrs.override_redirect;

    // Root-relative position must be captured before reparenting moves the
    // client under a frame (spec §4.2 step 4).
    let root_pos = conn.translate_to_root(window, 0, 0)?;

    let window_type = read_window_type(conn, atoms, window);
    let motif_allows = allows_decorations(conn, window);
    let framed = should_frame(top_level, motif_allows, window_type);

    let portal = registry.get_mut(id).ok_or(Error::UnknownPortal(window))?;
    portal.title = title;
    portal.top_level = top_level;
    portal.override_redirect = attrs.override_redirect;
    portal.client_window_type = window_type;

    if framed {
        let outer = Rect::new(root_pos.x, root_pos.y, geom.rect.w, geom.rect.h + PORTAL_TITLE_BAR_HEIGHT);
        let frame = conn.create_window(WinType::Frame, outer)?;
        conn.reparent_window(window, frame, 0, PORTAL_TITLE_BAR_HEIGHT as i32)?;
        conn.add_to_save_set(window)?;
        conn.set_prop(
            window,
            Atom::NetFrameExtents.as_ref(),
            Prop::Cardinal(vec![0, 0, PORTAL_TITLE_BAR_HEIGHT, 0]),
        )?;

        let portal = registry.get_mut(id).ok_or(Error::UnknownPortal(window))?;
        portal.frame_window = Some(frame);
        portal.geometry = outer;
        portal.geometry_floating_backup = outer;
    } else {
        let outer = Rect::new(root_pos.x, root_pos.y, geom.rect.w, geom.rect.h);
        let portal = registry.get_mut(id).ok_or(Error::UnknownPortal(window))?;
        portal.geometry = outer;
        portal.geometry_floating_backup = outer;
    }

    let portal = registry.get_mut(id).ok_or(Error::UnknownPortal(window))?;
    portal.initialized = true;
    debug!(%window, id, framed, "portal initialized");
    Ok(LifecycleEvent::PortalInitialized(id))
}

/// Apply the `map` visibility transition, positioning the portal on first
/// map per spec §4.3 "Positioning on first map".
pub fn map_portal<X: XConn>(
    conn: &X,
    registry: &mut PortalRegistry,
    id: PortalId,
) -> Result<Option<LifecycleEvent>> {
    let portal = registry.get_mut(id).ok_or(Error::UnknownPortal(Xid::default()))?;
    let (next, transition) = portal.visibility.map();
    portal.visibility = next;

    let Transition::Mapped { first_map } = transition else {
        return Ok(None);
    };

    let window = registry.get(id).unwrap().client_window;
    let outer = registry.get(id).unwrap().outer_window();
    conn.map_window(outer)?;
    if registry.get(id).unwrap().is_framed() {
        conn.map_window(window)?;
    }
    conn.set_prop(window, Atom::WmState.as_ref(), Prop::Cardinal(vec![WmState::Normal.as_u32()]))?;

    if first_map {
        position_on_first_map(conn, registry, id)?;
    }

    Ok(Some(LifecycleEvent::PortalMapped { portal: id, first_map }))
}

fn position_on_first_map<X: XConn>(conn: &X, registry: &mut PortalRegistry, id: PortalId) -> Result<()> {
    let window = registry.get(id).unwrap().client_window;
    let hints = match conn.get_prop(window, Atom::WmNormalHints.as_ref()) {
        Ok(Some(Prop::NormalHints(h))) => Some(h),
        _ => None,
    };

    if let Some(hints) = hints {
        if hints.has_honorable_position() {
            let framed = registry.get(id).unwrap().is_framed();
            let y = if framed {
                hints.y - PORTAL_TITLE_BAR_HEIGHT as i32
            } else {
                hints.y
            };
            move_portal(conn, registry, id, hints.x, y)?;
            return Ok(());
        }
    }

    // Center on the transient parent if any, else on screen.
    let portal = registry.get(id).unwrap();
    let size = portal.geometry;
    let center_on = if let Some(parent_id) = portal.transient_for {
        registry.get(parent_id).map(|p| p.geometry)
    } else {
        None
    };
    let outer = if let Some(parent_rect) = center_on {
        Rect::new(0, 0, size.w, size.h).centered_in(&parent_rect)
    } else {
        let (sw, sh) = conn.screen_size()?;
        Rect::new(0, 0, size.w, size.h).centered_in(&Rect::new(0, 0, sw, sh))
    };
    move_portal(conn, registry, id, outer.x, outer.y)
}

/// Apply the `unmap`/`suspend`/`reveal` visibility transitions.
pub fn unmap_portal<X: XConn>(conn: &X, registry: &mut PortalRegistry, id: PortalId) -> Result<Option<LifecycleEvent>> {
    apply_visibility(conn, registry, id, Visibility::unmap)
}

pub fn suspend_portal<X: XConn>(conn: &X, registry: &mut PortalRegistry, id: PortalId) -> Result<Option<LifecycleEvent>> {
    apply_visibility(conn, registry, id, Visibility::suspend)
}

pub fn reveal_portal<X: XConn>(conn: &X, registry: &mut PortalRegistry, id: PortalId) -> Result<Option<LifecycleEvent>> {
    match apply_visibility(conn, registry, id, Visibility::reveal)? {
        Some(LifecycleEvent::PortalMapped { portal, first_map }) if !first_map => {
            Ok(Some(LifecycleEvent::PortalMapped { portal, first_map: false }))
        }
        other => Ok(other),
    }
}

fn apply_visibility<X: XConn>(
    conn: &X,
    registry: &mut PortalRegistry,
    id: PortalId,
    f: impl FnOnce(Visibility) -> (Visibility, Transition),
) -> Result<Option<LifecycleEvent>> {
    let portal = registry.get_mut(id).ok_or(Error::UnknownPortal(Xid::default()))?;
    let (next, transition) = f(portal.visibility);
    portal.visibility = next;
    let window = portal.client_window;
    let outer = portal.outer_window();
    let framed = portal.is_framed();

    match transition {
        Transition::Unmapped => {
            conn.unmap_window(outer)?;
            if framed {
                conn.unmap_window(window)?;
            }
            conn.set_prop(window, Atom::WmState.as_ref(), Prop::Cardinal(vec![WmState::Withdrawn.as_u32()]))?;
            Ok(Some(LifecycleEvent::PortalUnmapped(id)))
        }
        Transition::Mapped { first_map } => {
            conn.map_window(outer)?;
            if framed {
                conn.map_window(window)?;
            }
            conn.set_prop(window, Atom::WmState.as_ref(), Prop::Cardinal(vec![WmState::Normal.as_u32()]))?;
            Ok(Some(LifecycleEvent::PortalMapped { portal: id, first_map }))
        }
        Transition::NoXChange | Transition::Rejected => Ok(None),
    }
}

/// `move(p, x, y)` (spec §4.2 "Move").
pub fn move_portal<X: XConn>(conn: &X, registry: &mut PortalRegistry, id: PortalId, x: i32, y: i32) -> Result<()> {
    let portal = registry.get_mut(id).ok_or(Error::UnknownPortal(Xid::default()))?;
    portal.geometry.x = x;
    portal.geometry.y = y;
    let outer = portal.outer_window();
    let framed = portal.is_framed();
    let window = portal.client_window;
    let (w, h) = (portal.geometry.w, portal.geometry.h);

    // `outer` is always a direct child of root, so root coordinates are
    // already parent-relative coordinates.
    conn.move_window(outer, x, y)?;

    if framed {
        conn.send_synthetic_configure_notify(
            window,
            x,
            y + PORTAL_TITLE_BAR_HEIGHT as i32,
            w,
            h.saturating_sub(PORTAL_TITLE_BAR_HEIGHT),
        )?;
    }
    Ok(())
}

/// `resize(p, w, h)` (spec §4.2 "Resize").
pub fn resize_portal<X: XConn>(conn: &X, registry: &mut PortalRegistry, id: PortalId, w: u32, h: u32) -> Result<()> {
    let portal = registry.get_mut(id).ok_or(Error::UnknownPortal(Xid::default()))?;
    portal.geometry.w = w;
    portal.geometry.h = h;
    let outer = portal.outer_window();
    let framed = portal.is_framed();
    let window = portal.client_window;
    let (x, y) = (portal.geometry.x, portal.geometry.y);

    conn.resize_window(outer, w, h)?;
    if framed {
        let client_h = h.saturating_sub(PORTAL_TITLE_BAR_HEIGHT).max(1);
        conn.resize_window(window, w, client_h)?;
        conn.send_synthetic_configure_notify(window, x, y + PORTAL_TITLE_BAR_HEIGHT as i32, w, client_h)?;
    }
    Ok(())
}

/// Re-read the client's actual geometry and correct drift (spec §4.2
/// "Synchronize"). Skips fullscreen portals (managed by the fullscreen
/// engine instead).
pub fn synchronize_portal<X: XConn>(conn: &X, registry: &mut PortalRegistry, id: PortalId) -> Result<()> {
    let portal = registry.get(id).ok_or(Error::UnknownPortal(Xid::default()))?;
    if portal.fullscreen {
        return Ok(());
    }
    let window = portal.client_window;
    let framed = portal.is_framed();
    let title_bar = if framed { PORTAL_TITLE_BAR_HEIGHT } else { 0 };

    let client_geom = conn.get_geometry(window)?;
    let root_pos = conn.translate_to_root(window, 0, 0)?;
    let expected = Rect::new(
        root_pos.x,
        root_pos.y - title_bar as i32,
        client_geom.rect.w,
        client_geom.rect.h + title_bar,
    );

    let current = registry.get(id).unwrap().geometry;
    if (expected.x, expected.y) != (current.x, current.y) {
        move_portal(conn, registry, id, expected.x, expected.y)?;
    }
    if (expected.w, expected.h) != (current.w, current.h) {
        resize_portal(conn, registry, id, expected.w, expected.h)?;
    }
    Ok(())
}

/// `ConfigureNotify` enforcement for framed portals (spec §4.2). Returns
/// `true` if the client had drifted and was re-pinned.
pub fn enforce_configure_notify<X: XConn>(
    conn: &X,
    registry: &mut PortalRegistry,
    id: PortalId,
    client_x: i32,
    client_y: i32,
) -> Result<bool> {
    let Some(portal) = registry.get_mut(id) else {
        return Ok(false);
    };
    if !portal.is_framed() {
        return Ok(false);
    }
    if client_x == 0 && client_y == PORTAL_TITLE_BAR_HEIGHT as i32 {
        return Ok(false);
    }
    portal.misaligned = true;
    let window = portal.client_window;
    conn.move_window(window, 0, PORTAL_TITLE_BAR_HEIGHT as i32)?;
    warn!(%window, id, "client misaligned itself inside frame; re-pinned");
    Ok(true)
}

/// Raise the transient root first, then every active initialized portal in
/// its transient group (spec §4.2 "Raise").
pub fn raise_portal<X: XConn>(conn: &X, registry: &mut PortalRegistry, id: PortalId) -> Result<LifecycleEvent> {
    let root_id = registry.find_transient_root(id);
    let root_window = registry.get(root_id).ok_or(Error::UnknownPortal(Xid::default()))?.outer_window();
    conn.raise_window(root_window)?;

    let children: Vec<PortalId> = registry
        .iter()
        .filter(|(pid, p)| *pid != root_id && p.active && p.initialized && registry.find_transient_root(*pid) == root_id)
        .map(|(pid, _)| pid)
        .collect();
    for child_id in children {
        if let Some(p) = registry.get(child_id) {
            conn.raise_window(p.outer_window())?;
        }
    }

    Ok(LifecycleEvent::PortalRaised(root_id))
}

/// `destroy_portal` close path: graceful `WM_DELETE_WINDOW` if supported,
/// else forced `kill_window`. The registry slot is freed only once the
/// client window is actually gone (subsequent `DestroyNotify`), per spec
/// §4.1/§4.3 "Close".
pub fn close_portal<X: XConn>(conn: &X, registry: &PortalRegistry, id: PortalId) -> Result<()> {
    let window = registry.get(id).ok_or(Error::UnknownPortal(Xid::default()))?.client_window;
    if conn.supports_protocol(window, Atom::WmDeleteWindow.as_ref())? {
        conn.send_delete_window(window)?;
    } else {
        conn.kill_window(window)?;
    }
    Ok(())
}

/// Tombstone the registry slot for a client window that has actually gone
/// away (`DestroyNotify`). Returns the freed id, if any.
pub fn destroy_portal(registry: &mut PortalRegistry, id: PortalId) -> Option<LifecycleEvent> {
    if registry.get(id).is_none() {
        return None;
    }
    registry.destroy(id);
    Some(LifecycleEvent::PortalDestroyed(id))
}

/// Adopt every pre-existing top-level child of root on startup (spec §4.4).
/// Bypasses [`MAX_WORKSPACE_PORTALS`]; adoption is explicitly exempt.
pub fn adopt_existing_windows<X: XConn>(
    conn: &X,
    atoms: &AtomCache,
    registry: &mut PortalRegistry,
    current_workspace: u8,
) -> Result<Vec<PortalId>> {
    let mut adopted = Vec::new();
    for window in conn.query_tree(conn.root())? {
        let attrs = match conn.get_window_attributes(window) {
            Ok(a) => a,
            Err(_) => continue,
        };
        if attrs.override_redirect || !attrs.viewable {
            continue;
        }

        let id = create_portal(conn, registry, window)?;
        let workspace = match conn.get_prop(window, Atom::NetWmDesktop.as_ref()) {
            Ok(Some(Prop::Cardinal(v))) if !v.is_empty() => {
                (v[0] as u8).min(crate::portal::MAX_WORKSPACES - 1)
            }
            _ => current_workspace,
        };
        if let Some(p) = registry.get_mut(id) {
            p.workspace = Some(workspace);
        }
        initialize_portal(conn, atoms, registry, id)?;
        if workspace == current_workspace {
            map_portal(conn, registry, id)?;
        } else {
            suspend_portal(conn, registry, id)?;
        }
        adopted.push(id);
        debug!(%window, id, workspace, "adopted pre-existing window");
    }
    Ok(adopted)
}

/// Whether `workspace` has room for one more non-transient, non-hidden,
/// non-override-redirect portal (spec §4.8 "Portal limit"). Adoption calls
/// bypass this check entirely (they never call it).
pub fn workspace_has_room(registry: &PortalRegistry, workspace: u8) -> bool {
    registry.count_workspace_portals(workspace) < MAX_WORKSPACE_PORTALS
}
