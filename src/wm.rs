//! Top-level orchestrator: owns every engine's state and wires X events to
//! the right sequence of engine calls (spec §9 "Startup", §4.11 "Dispatch").
//!
//! Event routing here is a direct `match` in [`WindowManager::handle_event`]
//! rather than registrations on [`crate::bus::EventBus`]: several handlers
//! need a marker sink or painter alongside `(conn, event)`, which
//! `Handler<X>`'s fixed signature has no room for. `EventBus` stays available
//! as general dispatch infrastructure for an embedder that wants to hang
//! extra, independent handlers off the same event stream.

use tracing::warn;

use crate::atom::{Atom, AtomCache};
use crate::config::Config;
use crate::decoration;
use crate::fullscreen;
use crate::hooks::{BackgroundPainter, MarkerSink, PixmapPainter};
use crate::interaction::{self, InteractionState};
use crate::lifecycle::{self, LifecycleEvent};
use crate::portal::{PortalId, PortalRegistry, Xid, MAX_WORKSPACES};
use crate::protocol;
use crate::workspace::WorkspaceManager;
use crate::x::property::Prop;
use crate::x::{ClientMessage, RawEvent, XConn, XEvent};
use crate::Result;

/// Owns the portal registry and every engine's state; the single entry point
/// an event loop (C3) drives.
pub struct WindowManager {
    atoms: AtomCache,
    registry: PortalRegistry,
    workspaces: WorkspaceManager,
    interaction: InteractionState,
    config: Config,
    check_window: Xid,
    focused: Option<PortalId>,
}

impl WindowManager {
    /// `Prepare` + `Initialize` (spec §9): select root input, redirect for
    /// compositing if available, intern atoms, announce the EWMH
    /// identification chain and desktop set, and adopt any window already
    /// mapped under root.
    pub fn new<X: XConn>(conn: &X, config: Config) -> Result<Self> {
        conn.select_root_input()?;
        if conn.composite_available() {
            conn.composite_redirect_subwindows(conn.root())?;
        }

        let atoms = AtomCache::prepare(conn)?;
        let mut registry = PortalRegistry::new();
        let workspaces = WorkspaceManager::new(MAX_WORKSPACES, config.tile_gap);
        let check_window = protocol::announce(conn, &atoms)?;
        protocol::announce_desktops(conn, MAX_WORKSPACES, 0)?;
        lifecycle::adopt_existing_windows(conn, &atoms, &mut registry, 0)?;

        let mut wm = WindowManager {
            atoms,
            registry,
            workspaces,
            interaction: InteractionState::new(),
            config,
            check_window,
            focused: None,
        };
        wm.rebuild_stacking(conn)?;
        protocol::update_client_list(conn, &wm.registry)?;
        Ok(wm)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn check_window(&self) -> Xid {
        self.check_window
    }

    pub fn focused(&self) -> Option<PortalId> {
        self.focused
    }

    pub fn registry(&self) -> &PortalRegistry {
        &self.registry
    }

    pub fn current_workspace(&self) -> u8 {
        self.workspaces.current()
    }

    /// Rebuild the stacking cache from the X tree (spec §4.1), keeping only
    /// entries that resolve to a known portal.
    fn rebuild_stacking<X: XConn>(&mut self, conn: &X) -> Result<()> {
        let children = conn.query_tree(conn.root())?;
        let sorted: Vec<PortalId> = children
            .into_iter()
            .filter_map(|w| self.registry.find_by_window(w))
            .collect();
        self.registry.set_sorted(sorted);
        Ok(())
    }

    /// Read `WM_TRANSIENT_FOR` and resolve it to a portal id, if the named
    /// parent window is itself managed. Nothing in [`crate::lifecycle`] sets
    /// this: resolving it needs a registry-wide lookup by window, which only
    /// the orchestrator has the context to run at initialization time.
    fn resolve_transient_for<X: XConn>(&mut self, conn: &X, id: PortalId) {
        let Some(window) = self.registry.get(id).map(|p| p.client_window) else {
            return;
        };
        let parent_window = match conn.get_prop(window, Atom::WmTransientFor.as_ref()) {
            Ok(Some(Prop::Window(windows))) => windows.into_iter().next(),
            _ => None,
        };
        let Some(parent_window) = parent_window else {
            return;
        };
        let Some(parent_id) = self.registry.find_by_window(parent_window) else {
            return;
        };
        if parent_id == id {
            return;
        }
        if let Some(portal) = self.registry.get_mut(id) {
            portal.transient_for = Some(parent_id);
        }
    }

    /// Update input focus and `_NET_ACTIVE_WINDOW` together; a no-op if `id`
    /// is already focused.
    fn focus<X: XConn>(&mut self, conn: &X, id: Option<PortalId>) -> Result<()> {
        if self.focused == id {
            return Ok(());
        }
        self.focused = id;
        if let Some(id) = id {
            if let Some(portal) = self.registry.get(id) {
                conn.set_input_focus(portal.client_window)?;
            }
        }
        protocol::update_active_window(conn, &self.registry, id)
    }

    /// `switch_workspace` (spec §4.8): the action behind
    /// [`crate::hooks::ShortcutActions::switch_workspace`]. Conn-generic
    /// like every other method here, so an embedder's own
    /// `ShortcutActions` adapter — which already holds the connection —
    /// can delegate into it directly; `WindowManager` itself can't
    /// implement that trait, since its methods carry no connection
    /// parameter to thread through.
    pub fn switch_workspace<X: XConn>(&mut self, conn: &X, workspace: u8) -> Result<()> {
        let focus = self.workspaces.switch_workspace(conn, &mut self.registry, workspace)?;
        protocol::update_current_desktop(conn, workspace)?;
        self.rebuild_stacking(conn)?;
        self.focus(conn, focus)
    }

    /// `move_portal_to_workspace` (spec §4.8), following the transient
    /// group.
    pub fn move_portal_to_workspace<X: XConn>(&mut self, conn: &X, id: PortalId, workspace: u8) -> Result<()> {
        self.workspaces.move_portal_to_workspace(conn, &mut self.registry, id, workspace)?;
        self.rebuild_stacking(conn)?;
        protocol::update_client_list(conn, &self.registry)
    }

    /// Toggle the current workspace between floating and tiling layout.
    pub fn toggle_workspace_layout_mode<X: XConn>(&mut self, conn: &X) -> Result<()> {
        let workspace = self.workspaces.current();
        self.workspaces.toggle_layout_mode(conn, &mut self.registry, workspace)
    }

    /// Gracefully close whichever portal currently has input focus, if any.
    pub fn destroy_focused_portal<X: XConn>(&self, conn: &X) -> Result<()> {
        let Some(id) = self.focused else { return Ok(()) };
        lifecycle::close_portal(conn, &self.registry, id)
    }

    /// Run one compositor `Update` tick (C10, spec §4.9).
    pub fn tick<X: XConn>(
        &mut self,
        conn: &X,
        buffer_cr: &cairo::Context,
        background: &mut dyn BackgroundPainter,
        painter: &mut dyn PixmapPainter,
    ) -> Result<()> {
        crate::compositor::redraw_tick(conn, &mut self.registry, self.config.theme, buffer_cr, background, painter)
    }

    /// Route one X (or internal `Update`) event to the engine(s) that own
    /// it (spec §4.11 step 4).
    pub fn handle_event<X: XConn>(&mut self, conn: &X, event: XEvent, sink: &mut dyn MarkerSink) -> Result<()> {
        match event {
            XEvent::CreateNotify { window } => self.on_create_notify(conn, window),
            XEvent::MapRequest { window } => self.on_map_request(conn, window),
            XEvent::MapNotify { .. } => self.rebuild_stacking(conn),
            XEvent::UnmapNotify { window } => self.on_unmap_notify(conn, window),
            XEvent::DestroyNotify { window } => self.on_destroy_notify(conn, window, sink),
            XEvent::ConfigureRequest { window, x, y, width, height } => {
                self.on_configure_request(conn, window, x, y, width, height)
            }
            XEvent::ConfigureNotify { window, x, y, .. } => self.on_configure_notify(conn, window, x, y),
            XEvent::PropertyNotify { window, atom } => self.on_property_notify(conn, window, atom),
            XEvent::ClientMessage(msg) => self.on_client_message(conn, msg, sink),
            XEvent::Raw(raw) => self.on_raw(conn, raw, sink),
            XEvent::Update => Ok(()),
        }
    }

    /// `create` (spec §4.1): register a portal slot for a newly observed
    /// top-level window. A registry-full condition is logged and otherwise
    /// swallowed; the window simply never gets managed.
    fn on_create_notify<X: XConn>(&mut self, conn: &X, window: Xid) -> Result<()> {
        if self.registry.find_by_window(window).is_some() {
            return Ok(());
        }
        match lifecycle::create_portal(conn, &mut self.registry, window) {
            Ok(_) => Ok(()),
            Err(crate::Error::RegistryFull) => {
                warn!(%window, "dropping create request: portal registry full");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// `MapRequest` (spec §4.1–§4.3): create the portal if `CreateNotify`
    /// was missed, initialize it on first map, resolve any transient-for
    /// parent, enforce the per-workspace portal cap, and map it.
    fn on_map_request<X: XConn>(&mut self, conn: &X, window: Xid) -> Result<()> {
        let id = match self.registry.find_by_window(window) {
            Some(id) => id,
            None => match lifecycle::create_portal(conn, &mut self.registry, window) {
                Ok(id) => id,
                Err(crate::Error::RegistryFull) => {
                    warn!(%window, "dropping map request: portal registry full");
                    return Ok(());
                }
                Err(e) => return Err(e),
            },
        };

        let already_initialized = self.registry.get(id).map(|p| p.initialized).unwrap_or(false);
        if already_initialized {
            lifecycle::map_portal(conn, &mut self.registry, id)?;
            self.rebuild_stacking(conn)?;
            return Ok(());
        }

        let workspace = self.workspaces.current();
        if let Some(portal) = self.registry.get_mut(id) {
            portal.workspace = Some(workspace);
        }
        lifecycle::initialize_portal(conn, &self.atoms, &mut self.registry, id)?;
        self.resolve_transient_for(conn, id);

        let exempt = self
            .registry
            .get(id)
            .map(|p| p.transient_for.is_some() || p.override_redirect)
            .unwrap_or(true);
        if !exempt && !self.workspaces.workspace_has_room(&self.registry, workspace) {
            warn!(%window, workspace, "workspace full, refusing to map portal");
            return Ok(());
        }

        fullscreen::enter_if_already_advertised(conn, &self.atoms, &mut self.registry, id)?;

        if let Some(LifecycleEvent::PortalMapped { first_map: true, .. }) =
            lifecycle::map_portal(conn, &mut self.registry, id)?
        {
            self.workspaces.on_portal_mapped(conn, &mut self.registry, id)?;
        }

        self.rebuild_stacking(conn)?;
        protocol::update_client_list(conn, &self.registry)?;
        self.focus(conn, Some(id))?;
        Ok(())
    }

    /// Client withdrew (`UnmapNotify`, spec §4.3 "Unmap").
    fn on_unmap_notify<X: XConn>(&mut self, conn: &X, window: Xid) -> Result<()> {
        let Some(id) = self.registry.find_by_window(window) else {
            return Ok(());
        };
        lifecycle::unmap_portal(conn, &mut self.registry, id)?;
        if self.focused == Some(id) {
            self.focus(conn, None)?;
        }
        Ok(())
    }

    /// The client window is actually gone (spec §4.1 "destroy"): tear down
    /// every engine's bookkeeping for it before freeing the registry slot.
    fn on_destroy_notify<X: XConn>(&mut self, conn: &X, window: Xid, sink: &mut dyn MarkerSink) -> Result<()> {
        let Some(id) = self.registry.find_by_window(window) else {
            return Ok(());
        };
        self.interaction.on_portal_destroyed(sink, id);
        let workspace = self.registry.get(id).and_then(|p| p.workspace);

        lifecycle::destroy_portal(&mut self.registry, id);
        if let Some(ws) = workspace {
            self.workspaces.on_portal_removed(conn, &mut self.registry, ws, id)?;
        }
        if self.focused == Some(id) {
            self.focused = None;
            protocol::update_active_window(conn, &self.registry, None)?;
        }

        self.rebuild_stacking(conn)?;
        protocol::update_client_list(conn, &self.registry)
    }

    /// `ConfigureRequest` (spec §4.2): pass through untouched for unmanaged,
    /// uninitialized or override-redirect windows; otherwise apply whichever
    /// of position/size the client asked to change.
    fn on_configure_request<X: XConn>(
        &mut self,
        conn: &X,
        window: Xid,
        x: Option<i32>,
        y: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<()> {
        let managed = self
            .registry
            .find_by_window(window)
            .and_then(|id| self.registry.get(id).map(|p| (id, p.initialized && !p.override_redirect)));

        let Some((id, true)) = managed else {
            return conn.configure_window_passthrough(window, x, y, width, height);
        };

        if let (Some(x), Some(y)) = (x, y) {
            lifecycle::move_portal(conn, &mut self.registry, id, x, y)?;
        }
        if let (Some(w), Some(h)) = (width, height) {
            lifecycle::resize_portal(conn, &mut self.registry, id, w, h)?;
        }
        Ok(())
    }

    /// `ConfigureNotify` (spec §4.2): only the client's own report of its
    /// position inside the frame matters here; the frame's own notifications
    /// are our own doing and carry no new information.
    fn on_configure_notify<X: XConn>(&mut self, conn: &X, window: Xid, x: i32, y: i32) -> Result<()> {
        let Some(id) = self.registry.find_by_window(window) else {
            return Ok(());
        };
        let is_client = self.registry.get(id).map(|p| p.client_window == window).unwrap_or(false);
        if is_client {
            lifecycle::enforce_configure_notify(conn, &mut self.registry, id, x, y)?;
        }
        Ok(())
    }

    /// `PropertyNotify` (spec §4.5 "Title updates").
    fn on_property_notify<X: XConn>(&mut self, conn: &X, window: Xid, atom: Xid) -> Result<()> {
        let Some(id) = self.registry.find_by_window(window) else {
            return Ok(());
        };
        decoration::handle_title_property_notify(conn, &self.atoms, &mut self.registry, id, atom)?;
        Ok(())
    }

    /// Decoded client messages (spec §4.7/§4.10): routed to whichever engine
    /// owns that concern.
    fn on_client_message<X: XConn>(&mut self, conn: &X, msg: ClientMessage, sink: &mut dyn MarkerSink) -> Result<()> {
        match msg {
            ClientMessage::NetWmState { window, action, first, second } => {
                let Some(id) = self.registry.find_by_window(window) else {
                    return Ok(());
                };
                fullscreen::handle_net_wm_state(conn, &self.atoms, &mut self.registry, id, action, first, second)
            }
            ClientMessage::NetWmMoveresize { window, x_root, y_root, direction } => {
                let Some(id) = self.registry.find_by_window(window) else {
                    return Ok(());
                };
                interaction::handle_net_wm_moveresize(&self.registry, &mut self.interaction, sink, id, x_root, y_root, direction);
                Ok(())
            }
            ClientMessage::NetCloseWindow { window } => {
                let Some(id) = self.registry.find_by_window(window) else {
                    return Ok(());
                };
                protocol::handle_net_close_window(conn, &self.registry, id)
            }
            ClientMessage::Other { window, message_type } => {
                if message_type != self.atoms.get(Atom::NetActiveWindow) {
                    return Ok(());
                }
                let Some(id) = self.registry.find_by_window(window) else {
                    return Ok(());
                };
                protocol::handle_net_active_window(conn, &mut self.registry, id)
            }
        }
    }

    /// Raw XInput2 events (spec §4.6, §6). Button presses also drive
    /// click-to-raise/focus here, since that's orchestration rather than
    /// anything [`crate::interaction`] itself owns.
    fn on_raw<X: XConn>(&mut self, conn: &X, raw: RawEvent, sink: &mut dyn MarkerSink) -> Result<()> {
        match raw {
            RawEvent::ButtonPress { detail } => {
                interaction::handle_button_press(conn, &mut self.registry, &mut self.interaction, sink, detail)?;
                if detail == 1 {
                    let cursor = conn.cursor_position()?;
                    if let Some(id) = self.registry.find_at(cursor.x, cursor.y) {
                        let override_redirect = self.registry.get(id).map(|p| p.override_redirect).unwrap_or(true);
                        if !override_redirect {
                            lifecycle::raise_portal(conn, &mut self.registry, id)?;
                            self.focus(conn, Some(id))?;
                        }
                    }
                }
                Ok(())
            }
            RawEvent::ButtonRelease { detail } => {
                interaction::handle_button_release(&mut self.interaction, sink, detail);
                Ok(())
            }
            RawEvent::Motion { time } => interaction::handle_motion(
                conn,
                &mut self.registry,
                &mut self.interaction,
                sink,
                time,
                self.config.throttle_ms() as u32,
            ),
            RawEvent::KeyPress { .. } | RawEvent::KeyRelease { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeMode;
    use crate::geometry::{Point, Rect};
    use crate::hooks::CursorHint;
    use crate::x::mock::MockXConn;
    use crate::x::{CompositePixmap, CompositeRedirect, WindowAttributes, WindowGeometry};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
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
        focused: RefCell<Option<Xid>>,
        raised: RefCell<Vec<Xid>>,
        next_window: RefCell<u32>,
    }

    impl FakeConn {
        fn set_prop(&self, window: Xid, name: &str, value: Prop) {
            self.props.borrow_mut().insert((window, name.to_string()), value);
        }
    }

    impl MockXConn for FakeConn {
        fn mock_root(&self) -> Xid {
            Xid(1)
        }
        fn mock_screen_size(&self) -> Result<(u32, u32)> {
            Ok((1920, 1080))
        }
        fn mock_cursor_position(&self) -> Result<Point> {
            Ok(Point::new(0, 0))
        }
        fn mock_intern_atom(&self, name: &str) -> Result<Xid> {
            Ok(Xid(10_000 + name.len() as u32))
        }
        fn mock_query_tree(&self, window: Xid) -> Result<Vec<Xid>> {
            if window == self.mock_root() {
                Ok(self.root_children.borrow().clone())
            } else {
                Ok(Vec::new())
            }
        }
        fn mock_get_window_attributes(&self, _window: Xid) -> Result<WindowAttributes> {
            Ok(WindowAttributes { override_redirect: false, viewable: true })
        }
        fn mock_get_geometry(&self, _window: Xid) -> Result<WindowGeometry> {
            Ok(WindowGeometry { rect: Rect::new(0, 0, 640, 480), parent: self.mock_root() })
        }
        fn mock_translate_to_root(&self, _from: Xid, x: i32, y: i32) -> Result<Point> {
            Ok(Point::new(x, y))
        }
        fn mock_create_window(&self, _ty: crate::x::WinType, _r: Rect) -> Result<Xid> {
            let mut n = self.next_window.borrow_mut();
            *n += 1;
            let xid = Xid(1000 + *n);
            self.root_children.borrow_mut().push(xid);
            Ok(xid)
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
            self.set_prop(window, name, value);
            Ok(())
        }
        fn mock_map_window(&self, window: Xid) -> Result<()> {
            self.mapped.borrow_mut().push(window);
            Ok(())
        }
        fn mock_unmap_window(&self, _window: Xid) -> Result<()> {
            Ok(())
        }
        fn mock_move_window(&self, _window: Xid, _x: i32, _y: i32) -> Result<()> {
            Ok(())
        }
        fn mock_resize_window(&self, _window: Xid, _w: u32, _h: u32) -> Result<()> {
            Ok(())
        }
        fn mock_raise_window(&self, window: Xid) -> Result<()> {
            self.raised.borrow_mut().push(window);
            Ok(())
        }
        fn mock_set_input_focus(&self, window: Xid) -> Result<()> {
            *self.focused.borrow_mut() = Some(window);
            Ok(())
        }
        fn mock_send_synthetic_configure_notify(
            &self,
            _window: Xid,
            _x: i32,
            _y: i32,
            _width: u32,
            _height: u32,
        ) -> Result<()> {
            Ok(())
        }
        fn mock_supports_protocol(&self, _window: Xid, _proto: &str) -> Result<bool> {
            Ok(true)
        }
        fn mock_send_delete_window(&self, _window: Xid) -> Result<()> {
            Ok(())
        }
        fn mock_kill_window(&self, _window: Xid) -> Result<()> {
            Ok(())
        }
        fn mock_select_root_input(&self) -> Result<()> {
            Ok(())
        }
        fn mock_select_client_input(&self, _window: Xid) -> Result<()> {
            Ok(())
        }
        fn mock_composite_available(&self) -> bool {
            false
        }
    }

    fn config() -> Config {
        Config { framerate: 60, theme: ThemeMode::Adaptive, tile_gap: 6 }
    }

    #[test]
    fn new_announces_and_starts_unfocused() {
        let conn = FakeConn::default();
        let wm = WindowManager::new(&conn, config()).unwrap();
        assert_eq!(wm.focused(), None);
        assert_eq!(wm.current_workspace(), 0);
        assert!(wm.check_window().0 > 0);
    }

    #[test]
    fn map_request_initializes_maps_and_focuses_the_portal() {
        let conn = FakeConn::default();
        let mut wm = WindowManager::new(&conn, config()).unwrap();
        let mut sink = NoopSink;

        wm.handle_event(&conn, XEvent::MapRequest { window: Xid(42) }, &mut sink).unwrap();

        let id = wm.registry().find_by_window(Xid(42)).unwrap();
        let portal = wm.registry().get(id).unwrap();
        assert!(portal.initialized);
        assert_eq!(portal.visibility, crate::visibility::Visibility::Visible);
        assert!(conn.mapped.borrow().contains(&Xid(42)));
        assert_eq!(wm.focused(), Some(id));
    }

    #[test]
    fn workspace_full_rejects_further_maps() {
        let conn = FakeConn::default();
        let mut wm = WindowManager::new(&conn, config()).unwrap();
        let mut sink = NoopSink;

        for i in 0..crate::portal::MAX_WORKSPACE_PORTALS {
            let window = Xid(100 + i as u32);
            wm.handle_event(&conn, XEvent::MapRequest { window }, &mut sink).unwrap();
        }
        assert_eq!(wm.registry().count_workspace_portals(0), crate::portal::MAX_WORKSPACE_PORTALS);

        let overflow = Xid(999);
        wm.handle_event(&conn, XEvent::MapRequest { window: overflow }, &mut sink).unwrap();
        let id = wm.registry().find_by_window(overflow).unwrap();
        assert_eq!(wm.registry().get(id).unwrap().visibility, crate::visibility::Visibility::Hidden);
    }

    #[test]
    fn destroy_clears_focus_and_frees_the_slot() {
        let conn = FakeConn::default();
        let mut wm = WindowManager::new(&conn, config()).unwrap();
        let mut sink = NoopSink;
        wm.handle_event(&conn, XEvent::MapRequest { window: Xid(7) }, &mut sink).unwrap();
        let id = wm.registry().find_by_window(Xid(7)).unwrap();
        assert_eq!(wm.focused(), Some(id));

        wm.handle_event(&conn, XEvent::DestroyNotify { window: Xid(7) }, &mut sink).unwrap();

        assert_eq!(wm.focused(), None);
        assert!(wm.registry().get(id).is_none());
    }

    #[test]
    fn transient_for_is_resolved_from_the_window_property() {
        let conn = FakeConn::default();
        let mut wm = WindowManager::new(&conn, config()).unwrap();
        let mut sink = NoopSink;

        wm.handle_event(&conn, XEvent::MapRequest { window: Xid(10) }, &mut sink).unwrap();
        let parent_id = wm.registry().find_by_window(Xid(10)).unwrap();

        conn.set_prop(Xid(11), Atom::WmTransientFor.as_ref(), Prop::Window(vec![Xid(10)]));
        wm.handle_event(&conn, XEvent::MapRequest { window: Xid(11) }, &mut sink).unwrap();

        let child_id = wm.registry().find_by_window(Xid(11)).unwrap();
        assert_eq!(wm.registry().get(child_id).unwrap().transient_for, Some(parent_id));
    }

    #[test]
    fn net_active_window_via_other_client_message_raises_and_focuses() {
        let conn = FakeConn::default();
        let mut wm = WindowManager::new(&conn, config()).unwrap();
        let mut sink = NoopSink;
        wm.handle_event(&conn, XEvent::MapRequest { window: Xid(5) }, &mut sink).unwrap();
        wm.handle_event(&conn, XEvent::MapRequest { window: Xid(6) }, &mut sink).unwrap();
        assert_eq!(wm.focused(), wm.registry().find_by_window(Xid(6)));

        let active_window_atom = wm.atoms.get(Atom::NetActiveWindow);
        wm.handle_event(
            &conn,
            XEvent::ClientMessage(ClientMessage::Other { window: Xid(5), message_type: active_window_atom }),
            &mut sink,
        )
        .unwrap();

        assert_eq!(*conn.focused.borrow(), Some(Xid(5)));
        assert_eq!(wm.focused(), wm.registry().find_by_window(Xid(5)));
    }

    #[test]
    fn unrelated_client_message_is_ignored() {
        let conn = FakeConn::default();
        let mut wm = WindowManager::new(&conn, config()).unwrap();
        let mut sink = NoopSink;
        wm.handle_event(&conn, XEvent::MapRequest { window: Xid(5) }, &mut sink).unwrap();

        wm.handle_event(
            &conn,
            XEvent::ClientMessage(ClientMessage::Other { window: Xid(5), message_type: Xid(77) }),
            &mut sink,
        )
        .unwrap();

        assert!(conn.raised.borrow().is_empty());
    }
}
