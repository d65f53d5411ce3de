//! End-to-end scenarios against a mock connection (spec §8 "End-to-end
//! scenarios" 1, 2, 4, 6, 7). These exercise [`WindowManager`] the way a
//! real event loop would: feed it `XEvent`s and inspect the resulting
//! registry/connection state, never reaching into engine internals.

use std::cell::RefCell;
use std::collections::HashMap;

use portalwm::atom::Atom;
use portalwm::config::{Config, ThemeMode};
use portalwm::geometry::{Point, Rect};
use portalwm::hooks::{CursorHint, MarkerSink};
use portalwm::portal::{Xid, MAX_WORKSPACE_PORTALS, PORTAL_TITLE_BAR_HEIGHT};
use portalwm::visibility::Visibility;
use portalwm::x::mock::MockXConn;
use portalwm::x::property::Prop;
use portalwm::x::{ClientMessage, WinType, WindowAttributes, WindowGeometry, XEvent};
use portalwm::wm::WindowManager;

struct NoopSink;
impl MarkerSink for NoopSink {
    fn push(&mut self, _id: u64, _hint: CursorHint, _grab: bool) {}
    fn pop(&mut self, _id: u64) {}
}

#[derive(Default)]
struct FakeConn {
    root_children: RefCell<Vec<Xid>>,
    props: RefCell<HashMap<(Xid, String), Prop>>,
    mapped: RefCell<Vec<Xid>>,
    moved: RefCell<HashMap<Xid, (i32, i32)>>,
    resized: RefCell<HashMap<Xid, (u32, u32)>>,
    override_redirect: RefCell<std::collections::HashSet<Xid>>,
    next_window: RefCell<u32>,
}

impl FakeConn {
    fn set_prop(&self, window: Xid, name: &str, value: Prop) {
        self.props.borrow_mut().insert((window, name.to_string()), value);
    }

    fn geometry_of(&self, window: Xid) -> Rect {
        let (x, y) = self.moved.borrow().get(&window).copied().unwrap_or((0, 0));
        let (w, h) = self.resized.borrow().get(&window).copied().unwrap_or((640, 480));
        Rect::new(x, y, w, h)
    }
}

impl MockXConn for FakeConn {
    fn mock_root(&self) -> Xid {
        Xid(1)
    }
    fn mock_screen_size(&self) -> portalwm::Result<(u32, u32)> {
        Ok((1920, 1080))
    }
    fn mock_cursor_position(&self) -> portalwm::Result<Point> {
        Ok(Point::new(0, 0))
    }
    fn mock_intern_atom(&self, name: &str) -> portalwm::Result<Xid> {
        Ok(Xid(10_000 + name.len() as u32))
    }
    fn mock_query_tree(&self, window: Xid) -> portalwm::Result<Vec<Xid>> {
        if window == self.mock_root() {
            Ok(self.root_children.borrow().clone())
        } else {
            Ok(Vec::new())
        }
    }
    fn mock_get_window_attributes(&self, window: Xid) -> portalwm::Result<WindowAttributes> {
        Ok(WindowAttributes {
            override_redirect: self.override_redirect.borrow().contains(&window),
            viewable: true,
        })
    }
    fn mock_get_geometry(&self, window: Xid) -> portalwm::Result<WindowGeometry> {
        Ok(WindowGeometry { rect: self.geometry_of(window), parent: self.mock_root() })
    }
    fn mock_translate_to_root(&self, _from: Xid, x: i32, y: i32) -> portalwm::Result<Point> {
        Ok(Point::new(x, y))
    }
    fn mock_create_window(&self, _ty: WinType, _r: Rect) -> portalwm::Result<Xid> {
        let mut n = self.next_window.borrow_mut();
        *n += 1;
        let xid = Xid(1000 + *n);
        self.root_children.borrow_mut().push(xid);
        Ok(xid)
    }
    fn mock_reparent_window(&self, _window: Xid, _parent: Xid, _x: i32, _y: i32) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_add_to_save_set(&self, _window: Xid) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_get_prop(&self, window: Xid, name: &str) -> portalwm::Result<Option<Prop>> {
        Ok(self.props.borrow().get(&(window, name.to_string())).cloned())
    }
    fn mock_set_prop(&self, window: Xid, name: &str, value: Prop) -> portalwm::Result<()> {
        self.set_prop(window, name, value);
        Ok(())
    }
    fn mock_map_window(&self, window: Xid) -> portalwm::Result<()> {
        self.mapped.borrow_mut().push(window);
        Ok(())
    }
    fn mock_unmap_window(&self, _window: Xid) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_move_window(&self, window: Xid, x: i32, y: i32) -> portalwm::Result<()> {
        self.moved.borrow_mut().insert(window, (x, y));
        Ok(())
    }
    fn mock_resize_window(&self, window: Xid, w: u32, h: u32) -> portalwm::Result<()> {
        self.resized.borrow_mut().insert(window, (w, h));
        Ok(())
    }
    fn mock_raise_window(&self, _window: Xid) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_stack_above(&self, _window: Xid, _sibling: Xid) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_set_input_focus(&self, _window: Xid) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_send_synthetic_configure_notify(
        &self,
        _window: Xid,
        _x: i32,
        _y: i32,
        _width: u32,
        _height: u32,
    ) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_supports_protocol(&self, _window: Xid, _proto: &str) -> portalwm::Result<bool> {
        Ok(true)
    }
    fn mock_send_delete_window(&self, _window: Xid) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_kill_window(&self, _window: Xid) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_select_root_input(&self) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_select_client_input(&self, _window: Xid) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_grab_server(&self) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_ungrab_server(&self) -> portalwm::Result<()> {
        Ok(())
    }
    fn mock_composite_available(&self) -> bool {
        false
    }
    fn mock_composite_redirect_window(&self, _window: Xid, _mode: portalwm::x::CompositeRedirect) -> portalwm::Result<()> {
        Ok(())
    }
}

fn config() -> Config {
    Config { framerate: 60, theme: ThemeMode::Adaptive, tile_gap: 6 }
}

/// Scenario 1: basic create/destroy. Mapping a client frames it, reparents
/// it, and lists it on `_NET_CLIENT_LIST`.
#[test]
fn scenario_basic_create() {
    let conn = FakeConn::default();
    let mut wm = WindowManager::new(&conn, config()).unwrap();
    let mut sink = NoopSink;

    let client = Xid(42);
    conn.moved.borrow_mut().insert(client, (100, 100));
    conn.resized.borrow_mut().insert(client, (640, 480));

    wm.handle_event(&conn, XEvent::MapRequest { window: client }, &mut sink).unwrap();

    let id = wm.registry().find_by_window(client).unwrap();
    let portal = wm.registry().get(id).unwrap();
    assert!(portal.is_framed());
    assert_eq!(portal.visibility, Visibility::Visible);
    assert!(conn.mapped.borrow().contains(&client));
    assert!(conn.mapped.borrow().contains(&portal.frame_window.unwrap()));

    let list = conn.props.borrow().get(&(Xid(1), Atom::NetClientList.as_ref().to_string())).cloned();
    match list {
        Some(Prop::Window(w)) => assert!(w.contains(&client)),
        other => panic!("expected a window list, got {other:?}"),
    }
}

/// Scenario 2: fullscreen round-trip restores the exact pre-enter geometry.
#[test]
fn scenario_fullscreen_round_trip() {
    let conn = FakeConn::default();
    let mut wm = WindowManager::new(&conn, config()).unwrap();
    let mut sink = NoopSink;

    let client = Xid(50);
    conn.moved.borrow_mut().insert(client, (100, 100));
    conn.resized.borrow_mut().insert(client, (640, 480));
    wm.handle_event(&conn, XEvent::MapRequest { window: client }, &mut sink).unwrap();
    let id = wm.registry().find_by_window(client).unwrap();
    let before = wm.registry().get(id).unwrap().geometry;

    let fullscreen_atom = Xid(10_000 + Atom::NetWmStateFullscreen.as_ref().len() as u32);
    wm.handle_event(
        &conn,
        XEvent::ClientMessage(ClientMessage::NetWmState {
            window: client,
            action: 1,
            first: fullscreen_atom,
            second: Xid(0),
        }),
        &mut sink,
    )
    .unwrap();
    assert!(wm.registry().get(id).unwrap().fullscreen);
    assert_eq!(wm.registry().get(id).unwrap().geometry, Rect::new(0, 0, 1920, 1080));

    wm.handle_event(
        &conn,
        XEvent::ClientMessage(ClientMessage::NetWmState {
            window: client,
            action: 0,
            first: fullscreen_atom,
            second: Xid(0),
        }),
        &mut sink,
    )
    .unwrap();
    assert!(!wm.registry().get(id).unwrap().fullscreen);
    assert_eq!(wm.registry().get(id).unwrap().geometry, before);
}

/// Scenario 6: a ninth portal on a full workspace is left unmapped and does
/// not appear on the client list.
#[test]
fn scenario_workspace_cap() {
    let conn = FakeConn::default();
    let mut wm = WindowManager::new(&conn, config()).unwrap();
    let mut sink = NoopSink;

    for i in 0..MAX_WORKSPACE_PORTALS {
        let window = Xid(200 + i as u32);
        wm.handle_event(&conn, XEvent::MapRequest { window }, &mut sink).unwrap();
    }
    assert_eq!(wm.registry().count_workspace_portals(0), MAX_WORKSPACE_PORTALS);

    let overflow = Xid(299);
    wm.handle_event(&conn, XEvent::MapRequest { window: overflow }, &mut sink).unwrap();
    let id = wm.registry().find_by_window(overflow).unwrap();
    assert_eq!(wm.registry().get(id).unwrap().visibility, Visibility::Hidden);
    assert!(!conn.mapped.borrow().contains(&overflow));

    let list = conn.props.borrow().get(&(Xid(1), Atom::NetClientList.as_ref().to_string())).cloned();
    if let Some(Prop::Window(w)) = list {
        assert!(!w.contains(&overflow));
    }
}

/// Scenario 7: moving a transient group's root to another workspace carries
/// its transients along.
#[test]
fn scenario_transient_group_moves_together() {
    let conn = FakeConn::default();
    let mut wm = WindowManager::new(&conn, config()).unwrap();
    let mut sink = NoopSink;

    let parent = Xid(60);
    wm.handle_event(&conn, XEvent::MapRequest { window: parent }, &mut sink).unwrap();
    let parent_id = wm.registry().find_by_window(parent).unwrap();

    let child = Xid(61);
    conn.set_prop(child, Atom::WmTransientFor.as_ref(), Prop::Window(vec![parent]));
    wm.handle_event(&conn, XEvent::MapRequest { window: child }, &mut sink).unwrap();
    let child_id = wm.registry().find_by_window(child).unwrap();
    assert_eq!(wm.registry().get(child_id).unwrap().transient_for, Some(parent_id));

    wm.move_portal_to_workspace(&conn, parent_id, 3).unwrap();

    assert_eq!(wm.registry().get(parent_id).unwrap().workspace, Some(3));
    assert_eq!(wm.registry().get(child_id).unwrap().workspace, Some(3));
}

/// Scenario 8 (partial): a client that repositions itself inside its frame
/// is flagged misaligned and corrected back to the frame offset.
#[test]
fn scenario_misaligned_client_is_corrected() {
    let conn = FakeConn::default();
    let mut wm = WindowManager::new(&conn, config()).unwrap();
    let mut sink = NoopSink;

    let client = Xid(70);
    wm.handle_event(&conn, XEvent::MapRequest { window: client }, &mut sink).unwrap();

    wm.handle_event(
        &conn,
        XEvent::ConfigureNotify { window: client, x: 5, y: 30, width: 640, height: 480 },
        &mut sink,
    )
    .unwrap();

    let id = wm.registry().find_by_window(client).unwrap();
    assert!(wm.registry().get(id).unwrap().misaligned);
    assert_eq!(*conn.moved.borrow().get(&client).unwrap(), (0, PORTAL_TITLE_BAR_HEIGHT as i32));
}
