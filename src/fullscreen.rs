//! Fullscreen engine (C9, spec §4.7): geometry backup/restore, direct
//! compositor redirect of the client, `_NET_WM_STATE_FULLSCREEN` round-trip.

use tracing::debug;

use crate::atom::{Atom, AtomCache};
use crate::geometry::Rect;
use crate::portal::{PortalId, PortalRegistry, Xid, PORTAL_TITLE_BAR_HEIGHT};
use crate::x::property::Prop;
use crate::x::{CompositeRedirect, XConn};
use crate::{Error, Result};

/// Read the current `_NET_WM_STATE` atom list, or an empty one if unset.
fn read_net_wm_state<X: XConn>(conn: &X, window: Xid) -> Vec<Xid> {
    match conn.get_prop(window, Atom::NetWmState.as_ref()) {
        Ok(Some(Prop::Atom(atoms))) => atoms,
        _ => Vec::new(),
    }
}

fn write_net_wm_state<X: XConn>(conn: &X, window: Xid, atoms: Vec<Xid>) -> Result<()> {
    conn.set_prop(window, Atom::NetWmState.as_ref(), Prop::Atom(atoms))
}

/// `true` if `_NET_WM_STATE` currently lists `_NET_WM_STATE_FULLSCREEN`.
pub fn advertises_fullscreen<X: XConn>(conn: &X, atoms: &AtomCache, window: Xid) -> bool {
    let fullscreen = atoms.get(Atom::NetWmStateFullscreen);
    read_net_wm_state(conn, window).contains(&fullscreen)
}

/// `enter(p)` (spec §4.7): back up geometry, redirect the client directly,
/// resize frame+client to cover the screen, zero the frame extents, add
/// the state atom, raise.
pub fn enter_fullscreen<X: XConn>(
    conn: &X,
    atoms: &AtomCache,
    registry: &mut PortalRegistry,
    id: PortalId,
) -> Result<()> {
    let portal = registry.get(id).ok_or(Error::UnknownPortal(Xid::default()))?;
    if portal.fullscreen {
        return Ok(());
    }
    let window = portal.client_window;
    let outer = portal.outer_window();
    let framed = portal.is_framed();
    let geometry = portal.geometry;

    conn.grab_server()?;
    let result = (|| -> Result<()> {
        conn.composite_redirect_window(window, CompositeRedirect::Manual)?;

        let (screen_w, screen_h) = conn.screen_size()?;
        let full = Rect::new(0, 0, screen_w, screen_h);
        conn.move_window(outer, full.x, full.y)?;
        conn.resize_window(outer, full.w, full.h)?;
        if framed {
            conn.move_window(window, 0, 0)?;
            conn.resize_window(window, full.w, full.h)?;
            conn.send_synthetic_configure_notify(window, 0, 0, full.w, full.h)?;
            conn.set_prop(window, Atom::NetFrameExtents.as_ref(), Prop::Cardinal(vec![0, 0, 0, 0]))?;
        } else {
            conn.send_synthetic_configure_notify(window, full.x, full.y, full.w, full.h)?;
        }

        let mut state = read_net_wm_state(conn, window);
        let fullscreen_atom = atoms.get(Atom::NetWmStateFullscreen);
        if !state.contains(&fullscreen_atom) {
            state.push(fullscreen_atom);
        }
        write_net_wm_state(conn, window, state)?;

        conn.raise_window(outer)?;
        Ok(())
    })();
    conn.ungrab_server()?;
    result?;

    let portal = registry.get_mut(id).ok_or(Error::UnknownPortal(window))?;
    portal.geometry_backup = geometry;
    let (screen_w, screen_h) = conn.screen_size()?;
    portal.geometry = Rect::new(0, 0, screen_w, screen_h);
    portal.fullscreen = true;
    debug!(%window, id, "entered fullscreen");
    Ok(())
}

/// `exit(p)` (spec §4.7): reverse `enter` from `geometry_backup`.
pub fn exit_fullscreen<X: XConn>(
    conn: &X,
    atoms: &AtomCache,
    registry: &mut PortalRegistry,
    id: PortalId,
) -> Result<()> {
    let portal = registry.get(id).ok_or(Error::UnknownPortal(Xid::default()))?;
    if !portal.fullscreen {
        return Ok(());
    }
    let window = portal.client_window;
    let outer = portal.outer_window();
    let framed = portal.is_framed();
    let backup = portal.geometry_backup;

    conn.grab_server()?;
    let result = (|| -> Result<()> {
        conn.move_window(outer, backup.x, backup.y)?;
        conn.resize_window(outer, backup.w, backup.h)?;
        if framed {
            let client_h = backup.h.saturating_sub(PORTAL_TITLE_BAR_HEIGHT).max(1);
            conn.move_window(window, 0, PORTAL_TITLE_BAR_HEIGHT as i32)?;
            conn.resize_window(window, backup.w, client_h)?;
            conn.send_synthetic_configure_notify(window, backup.x, backup.y + PORTAL_TITLE_BAR_HEIGHT as i32, backup.w, client_h)?;
            conn.set_prop(
                window,
                Atom::NetFrameExtents.as_ref(),
                Prop::Cardinal(vec![0, 0, PORTAL_TITLE_BAR_HEIGHT, 0]),
            )?;
        } else {
            conn.send_synthetic_configure_notify(window, backup.x, backup.y, backup.w, backup.h)?;
        }
        conn.composite_unredirect_window(window)?;

        let fullscreen_atom = atoms.get(Atom::NetWmStateFullscreen);
        let state: Vec<Xid> = read_net_wm_state(conn, window).into_iter().filter(|&a| a != fullscreen_atom).collect();
        write_net_wm_state(conn, window, state)?;
        Ok(())
    })();
    conn.ungrab_server()?;
    result?;

    let portal = registry.get_mut(id).ok_or(Error::UnknownPortal(window))?;
    portal.geometry = backup;
    portal.fullscreen = false;
    debug!(%window, id, "exited fullscreen");
    Ok(())
}

/// Toggle action encoding from `_NET_WM_STATE` client messages (EWMH §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Remove,
    Add,
    Toggle,
}

impl StateAction {
    pub fn from_u32(action: u32) -> Self {
        match action {
            0 => StateAction::Remove,
            1 => StateAction::Add,
            _ => StateAction::Toggle,
        }
    }
}

/// Apply a `_NET_WM_STATE` client message naming fullscreen in either slot
/// (spec §4.7 "Toggled via `_NET_WM_STATE`"). A no-op if neither atom slot
/// names fullscreen.
pub fn handle_net_wm_state<X: XConn>(
    conn: &X,
    atoms: &AtomCache,
    registry: &mut PortalRegistry,
    id: PortalId,
    action: u32,
    first: Xid,
    second: Xid,
) -> Result<()> {
    let fullscreen_atom = atoms.get(Atom::NetWmStateFullscreen);
    if first != fullscreen_atom && second != fullscreen_atom {
        return Ok(());
    }
    let currently = registry.get(id).map(|p| p.fullscreen).unwrap_or(false);
    match StateAction::from_u32(action) {
        StateAction::Add => enter_fullscreen(conn, atoms, registry, id),
        StateAction::Remove => exit_fullscreen(conn, atoms, registry, id),
        StateAction::Toggle if currently => exit_fullscreen(conn, atoms, registry, id),
        StateAction::Toggle => enter_fullscreen(conn, atoms, registry, id),
    }
}

/// On `PortalInitialized`, enter fullscreen immediately if the client
/// already advertised `_NET_WM_STATE_FULLSCREEN` at map time (spec §4.7).
pub fn enter_if_already_advertised<X: XConn>(
    conn: &X,
    atoms: &AtomCache,
    registry: &mut PortalRegistry,
    id: PortalId,
) -> Result<()> {
    let Some(portal) = registry.get(id) else { return Ok(()) };
    let window = portal.client_window;
    if advertises_fullscreen(conn, atoms, window) {
        enter_fullscreen(conn, atoms, registry, id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect as GRect};
    use crate::x::mock::MockXConn;
    use crate::x::{CompositePixmap, WindowAttributes, WindowGeometry};
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeConn {
        props: RefCell<std::collections::HashMap<(Xid, String), Prop>>,
        moves: RefCell<Vec<(Xid, i32, i32)>>,
        resizes: RefCell<Vec<(Xid, u32, u32)>>,
        grabbed: RefCell<bool>,
    }

    impl MockXConn for FakeConn {
        fn mock_root(&self) -> Xid {
            Xid(1)
        }
        fn mock_screen_size(&self) -> Result<(u32, u32)> {
            Ok((1920, 1080))
        }
        fn mock_intern_atom(&self, name: &str) -> Result<Xid> {
            Ok(Xid(10_000 + name.len() as u32))
        }
        fn mock_get_window_attributes(&self, _window: Xid) -> Result<WindowAttributes> {
            Ok(WindowAttributes { override_redirect: false, viewable: true })
        }
        fn mock_get_geometry(&self, _window: Xid) -> Result<WindowGeometry> {
            Ok(WindowGeometry { rect: GRect::new(100, 100, 640, 480), parent: Xid(1) })
        }
        fn mock_translate_to_root(&self, _from: Xid, x: i32, y: i32) -> Result<Point> {
            Ok(Point::new(100 + x, 100 + y))
        }
        fn mock_create_window(&self, _ty: crate::x::WinType, _r: GRect) -> Result<Xid> {
            Ok(Xid(1001))
        }
        fn mock_reparent_window(&self, _window: Xid, _parent: Xid, _x: i32, _y: i32) -> Result<()> {
            Ok(())
        }
        fn mock_add_to_save_set(&self, _window: Xid) -> Result<()> {
            Ok(())
        }
        fn mock_get_prop(&self, window: Xid, name: &str) -> Result<Option<Prop>> {
            Ok(self.props.borrow().get(&(window, name.to_string())).cloned())
        }
        fn mock_set_prop(&self, window: Xid, name: &str, value: Prop) -> Result<()> {
            self.props.borrow_mut().insert((window, name.to_string()), value);
            Ok(())
        }
        fn mock_move_window(&self, window: Xid, x: i32, y: i32) -> Result<()> {
            self.moves.borrow_mut().push((window, x, y));
            Ok(())
        }
        fn mock_resize_window(&self, window: Xid, w: u32, h: u32) -> Result<()> {
            self.resizes.borrow_mut().push((window, w, h));
            Ok(())
        }
        fn mock_send_synthetic_configure_notify(&self, _w: Xid, _x: i32, _y: i32, _width: u32, _height: u32) -> Result<()> {
            Ok(())
        }
        fn mock_raise_window(&self, _window: Xid) -> Result<()> {
            Ok(())
        }
        fn mock_grab_server(&self) -> Result<()> {
            *self.grabbed.borrow_mut() = true;
            Ok(())
        }
        fn mock_ungrab_server(&self) -> Result<()> {
            *self.grabbed.borrow_mut() = false;
            Ok(())
        }
        fn mock_composite_redirect_window(&self, _window: Xid, _mode: CompositeRedirect) -> Result<()> {
            Ok(())
        }
        fn mock_composite_unredirect_window(&self, _window: Xid) -> Result<()> {
            Ok(())
        }
        fn mock_composite_name_window_pixmap(&self, _window: Xid) -> Result<CompositePixmap> {
            Ok(CompositePixmap(Xid(0)))
        }
        fn mock_select_client_input(&self, _window: Xid) -> Result<()> {
            Ok(())
        }
    }

    fn framed_portal(conn: &FakeConn, registry: &mut PortalRegistry, atoms: &AtomCache) -> PortalId {
        let id = crate::lifecycle::create_portal(conn, registry, Xid(42)).unwrap();
        crate::lifecycle::initialize_portal(conn, atoms, registry, id).unwrap();
        id
    }

    #[test]
    fn enter_backs_up_geometry_and_covers_the_screen() {
        let conn = FakeConn::default();
        let atoms = AtomCache::prepare(&conn).unwrap();
        let mut registry = PortalRegistry::new();
        let id = framed_portal(&conn, &mut registry, &atoms);
        let original = registry.get(id).unwrap().geometry;

        enter_fullscreen(&conn, &atoms, &mut registry, id).unwrap();

        let portal = registry.get(id).unwrap();
        assert!(portal.fullscreen);
        assert_eq!(portal.geometry_backup, original);
        assert_eq!(portal.geometry, Rect::new(0, 0, 1920, 1080));
        assert!(!*conn.grabbed.borrow(), "server must be ungrabbed before returning");
        assert!(advertises_fullscreen(&conn, &atoms, Xid(42)));
    }

    #[test]
    fn exit_restores_exact_backup_geometry() {
        let conn = FakeConn::default();
        let atoms = AtomCache::prepare(&conn).unwrap();
        let mut registry = PortalRegistry::new();
        let id = framed_portal(&conn, &mut registry, &atoms);
        let original = registry.get(id).unwrap().geometry;

        enter_fullscreen(&conn, &atoms, &mut registry, id).unwrap();
        exit_fullscreen(&conn, &atoms, &mut registry, id).unwrap();

        let portal = registry.get(id).unwrap();
        assert!(!portal.fullscreen);
        assert_eq!(portal.geometry, original);
        assert!(!advertises_fullscreen(&conn, &atoms, Xid(42)));
    }

    #[test]
    fn toggle_action_flips_current_state() {
        let conn = FakeConn::default();
        let atoms = AtomCache::prepare(&conn).unwrap();
        let mut registry = PortalRegistry::new();
        let id = framed_portal(&conn, &mut registry, &atoms);
        let fullscreen_atom = atoms.get(Atom::NetWmStateFullscreen);

        handle_net_wm_state(&conn, &atoms, &mut registry, id, 2, fullscreen_atom, Xid::default()).unwrap();
        assert!(registry.get(id).unwrap().fullscreen);

        handle_net_wm_state(&conn, &atoms, &mut registry, id, 2, Xid::default(), fullscreen_atom).unwrap();
        assert!(!registry.get(id).unwrap().fullscreen);
    }

    #[test]
    fn unrelated_state_atom_is_ignored() {
        let conn = FakeConn::default();
        let atoms = AtomCache::prepare(&conn).unwrap();
        let mut registry = PortalRegistry::new();
        let id = framed_portal(&conn, &mut registry, &atoms);

        handle_net_wm_state(&conn, &atoms, &mut registry, id, 1, Xid(77), Xid(78)).unwrap();
        assert!(!registry.get(id).unwrap().fullscreen);
    }
}
