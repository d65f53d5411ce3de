//! Pointer-driven drag/resize engine (C7, spec §4.6).
//!
//! Mirrors the original's `portals/interaction.c` dispatcher: a single
//! `ButtonPress` decides whether the click lands on a trigger, the
//! bottom-right resize corner, or the title bar, and `Motion`/`ButtonRelease`
//! drive whichever state machine (if any) is active. Only one of drag/resize
//! can be in progress at a time.

use tracing::debug;

use crate::decoration;
use crate::hooks::{CursorHint, MarkerSink};
use crate::portal::{Portal, PortalId, PortalRegistry, MINIMUM_PORTAL_HEIGHT, MINIMUM_PORTAL_WIDTH};
use crate::x::XConn;
use crate::{Error, Result};

/// Width, in pixels, of the bottom-right corner hit area that starts a resize.
pub const PORTAL_RESIZE_AREA_SIZE: i32 = 20;

/// Marker ids pushed onto the marker deck (spec's "marker deck", one id per
/// distinct hint source so hover and active-drag pushes don't collide).
const MARKER_DRAGGING: u64 = 1;
const MARKER_RESIZING: u64 = 2;
const MARKER_HOVER_RESIZE: u64 = 3;
const MARKER_HOVER_FRAME: u64 = 4;

struct DragState {
    portal: PortalId,
    mouse_start_x: i32,
    mouse_start_y: i32,
    portal_start_x: i32,
    portal_start_y: i32,
    last_drag_time: u32,
}

struct ResizeState {
    portal: PortalId,
    mouse_start_x: i32,
    mouse_start_y: i32,
    original_x: i32,
    original_y: i32,
    original_w: u32,
    original_h: u32,
    last_resize_time: u32,
}

/// The interaction engine's persistent state: at most one active drag or
/// resize at a time (spec §4.6 invariant).
#[derive(Default)]
pub struct InteractionState {
    drag: Option<DragState>,
    resize: Option<ResizeState>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_some()
    }

    /// Whether a click at `(rel_x, rel_y)` (portal-relative) falls in the
    /// bottom-right resize corner.
    fn is_resize_area(portal: &Portal, rel_x: i32, rel_y: i32) -> bool {
        let w = portal.geometry.w as i32;
        let h = portal.geometry.h as i32;
        rel_x > w - PORTAL_RESIZE_AREA_SIZE && rel_x <= w && rel_y > h - PORTAL_RESIZE_AREA_SIZE && rel_y <= h
    }

    fn start_dragging(&mut self, sink: &mut dyn MarkerSink, id: PortalId, portal: &Portal, x_root: i32, y_root: i32) {
        self.drag = Some(DragState {
            portal: id,
            mouse_start_x: x_root,
            mouse_start_y: y_root,
            portal_start_x: portal.geometry.x,
            portal_start_y: portal.geometry.y,
            last_drag_time: 0,
        });
        sink.push(MARKER_DRAGGING, CursorHint::Dragging, true);
        debug!(id, "started dragging portal");
    }

    fn stop_dragging(&mut self, sink: &mut dyn MarkerSink) {
        if self.drag.take().is_some() {
            sink.pop(MARKER_DRAGGING);
        }
    }

    /// Moves the dragged portal, throttled to `throttle_ms` between updates
    /// (spec §4.6, §4.11 `throttle_ms`).
    fn update_dragging<X: XConn>(
        &mut self,
        conn: &X,
        registry: &mut PortalRegistry,
        x_root: i32,
        y_root: i32,
        event_time: u32,
        throttle_ms: u32,
    ) -> Result<()> {
        let Some(drag) = &mut self.drag else { return Ok(()) };
        if event_time.wrapping_sub(drag.last_drag_time) < throttle_ms {
            return Ok(());
        }
        let new_x = drag.portal_start_x + (x_root - drag.mouse_start_x);
        let new_y = drag.portal_start_y + (y_root - drag.mouse_start_y);
        let id = drag.portal;
        drag.last_drag_time = event_time;
        crate::lifecycle::move_portal(conn, registry, id, new_x, new_y)
    }

    fn start_resizing(&mut self, sink: &mut dyn MarkerSink, id: PortalId, portal: &Portal, x_root: i32, y_root: i32) {
        self.resize = Some(ResizeState {
            portal: id,
            mouse_start_x: x_root,
            mouse_start_y: y_root,
            original_x: portal.geometry.x,
            original_y: portal.geometry.y,
            original_w: portal.geometry.w,
            original_h: portal.geometry.h,
            last_resize_time: 0,
        });
        sink.push(MARKER_RESIZING, CursorHint::Resizing, true);
        debug!(id, "started resizing portal");
    }

    fn stop_resizing(&mut self, sink: &mut dyn MarkerSink) {
        if self.resize.take().is_some() {
            sink.pop(MARKER_RESIZING);
        }
    }

    /// Resizes the bottom-right corner being dragged, enforcing
    /// `MINIMUM_PORTAL_WIDTH`/`MINIMUM_PORTAL_HEIGHT` (spec §4.6 edge case).
    /// The origin never moves: only the bottom-right corner is draggable, so
    /// clamping only ever shrinks width/height, never shifts `x`/`y`.
    fn update_resizing<X: XConn>(
        &mut self,
        conn: &X,
        registry: &mut PortalRegistry,
        x_root: i32,
        y_root: i32,
        event_time: u32,
        throttle_ms: u32,
    ) -> Result<()> {
        let Some(resize) = &mut self.resize else { return Ok(()) };
        if event_time.wrapping_sub(resize.last_resize_time) < throttle_ms {
            return Ok(());
        }
        let delta_x = x_root - resize.mouse_start_x;
        let delta_y = y_root - resize.mouse_start_y;
        let new_w = (resize.original_w as i32 + delta_x).max(MINIMUM_PORTAL_WIDTH as i32) as u32;
        let new_h = (resize.original_h as i32 + delta_y).max(MINIMUM_PORTAL_HEIGHT as i32) as u32;
        let id = resize.portal;
        resize.last_resize_time = event_time;
        crate::lifecycle::resize_portal(conn, registry, id, new_w, new_h)
    }

    /// Aborts whichever operation `id` is the subject of (mirrors
    /// `dragging.c`'s `HANDLE(PortalDestroyed)`).
    pub fn on_portal_destroyed(&mut self, sink: &mut dyn MarkerSink, id: PortalId) {
        if self.drag.as_ref().map(|d| d.portal) == Some(id) {
            self.stop_dragging(sink);
        }
        if self.resize.as_ref().map(|r| r.portal) == Some(id) {
            self.stop_resizing(sink);
        }
    }
}

/// `HANDLE(RawButtonPress)`: locates the portal under the pointer and routes
/// the click to a trigger, the resize corner, or the title bar (drag start).
/// Non-primary buttons and override-redirect portals are ignored.
pub fn handle_button_press<X: XConn>(
    conn: &X,
    registry: &mut PortalRegistry,
    state: &mut InteractionState,
    sink: &mut dyn MarkerSink,
    detail: u8,
) -> Result<()> {
    if detail != 1 {
        return Ok(());
    }
    let cursor = conn.cursor_position()?;
    let Some(id) = registry.find_at(cursor.x, cursor.y) else {
        return Ok(());
    };
    let portal = registry.get(id).ok_or(Error::UnknownPortal(Default::default()))?;
    if portal.override_redirect {
        return Ok(());
    }

    let rel_x = cursor.x - portal.geometry.x;
    let rel_y = cursor.y - portal.geometry.y;

    let width = portal.geometry.w;
    if decoration::is_close_trigger(width, rel_x, rel_y) || decoration::is_arrange_trigger(width, rel_x, rel_y) {
        decoration::handle_trigger_click(conn, registry, id, rel_x, rel_y)?;
        return Ok(());
    }

    if InteractionState::is_resize_area(portal, rel_x, rel_y) {
        if !state.is_resizing() {
            state.start_resizing(sink, id, portal, cursor.x, cursor.y);
        }
        return Ok(());
    }

    if decoration::is_frame_area(width, rel_x, rel_y) {
        if !state.is_dragging() {
            state.start_dragging(sink, id, portal, cursor.x, cursor.y);
        }
    }
    Ok(())
}

/// `HANDLE(RawButtonRelease)`: ends whichever operation is active.
pub fn handle_button_release(state: &mut InteractionState, sink: &mut dyn MarkerSink, detail: u8) {
    if detail != 1 {
        return;
    }
    state.stop_dragging(sink);
    state.stop_resizing(sink);
}

/// `HANDLE(RawMotionNotify)`: drives the active drag/resize, or (if neither
/// is active) updates hover markers for the resize corner and title bar.
pub fn handle_motion<X: XConn>(
    conn: &X,
    registry: &mut PortalRegistry,
    state: &mut InteractionState,
    sink: &mut dyn MarkerSink,
    event_time: u32,
    throttle_ms: u32,
) -> Result<()> {
    let cursor = conn.cursor_position()?;

    if state.is_dragging() {
        return state.update_dragging(conn, registry, cursor.x, cursor.y, event_time, throttle_ms);
    }
    if state.is_resizing() {
        return state.update_resizing(conn, registry, cursor.x, cursor.y, event_time, throttle_ms);
    }

    let mut in_resize_area = false;
    let mut in_frame_area = false;
    if let Some(id) = registry.find_at(cursor.x, cursor.y) {
        if let Some(portal) = registry.get(id) {
            let rel_x = cursor.x - portal.geometry.x;
            let rel_y = cursor.y - portal.geometry.y;
            if InteractionState::is_resize_area(portal, rel_x, rel_y) {
                in_resize_area = true;
            } else if decoration::is_frame_area(portal.geometry.w, rel_x, rel_y) {
                in_frame_area = true;
            }
        }
    }

    if in_resize_area {
        sink.push(MARKER_HOVER_RESIZE, CursorHint::HoverResize, false);
    } else {
        sink.pop(MARKER_HOVER_RESIZE);
    }
    if in_frame_area {
        sink.push(MARKER_HOVER_FRAME, CursorHint::HoverFrame, false);
    } else {
        sink.pop(MARKER_HOVER_FRAME);
    }
    Ok(())
}

/// `_NET_WM_MOVERESIZE` (spec §4.10, `ewmh/moveresize.c`): a CSD client
/// asking the core to start (or cancel) a drag/resize on its behalf.
pub const MOVERESIZE_SIZE_BOTTOMRIGHT: u32 = 4;
pub const MOVERESIZE_MOVE: u32 = 8;
pub const MOVERESIZE_MOVE_KEYBOARD: u32 = 10;
pub const MOVERESIZE_CANCEL: u32 = 11;

pub fn handle_net_wm_moveresize(
    registry: &PortalRegistry,
    state: &mut InteractionState,
    sink: &mut dyn MarkerSink,
    id: PortalId,
    x_root: i32,
    y_root: i32,
    direction: u32,
) {
    if direction == MOVERESIZE_CANCEL {
        state.stop_dragging(sink);
        state.stop_resizing(sink);
        return;
    }
    let Some(portal) = registry.get(id) else { return };

    if direction == MOVERESIZE_MOVE || direction == MOVERESIZE_MOVE_KEYBOARD {
        if !state.is_dragging() {
            state.start_dragging(sink, id, portal, x_root, y_root);
        }
        return;
    }
    if direction == MOVERESIZE_SIZE_BOTTOMRIGHT && !state.is_resizing() {
        state.start_resizing(sink, id, portal, x_root, y_root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect};
    use crate::portal::Xid;
    use crate::x::mock::MockXConn;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        pushed: Vec<(u64, CursorHint, bool)>,
        popped: Vec<u64>,
    }

    impl MarkerSink for RecordingSink {
        fn push(&mut self, id: u64, hint: CursorHint, grab: bool) {
            self.pushed.push((id, hint, grab));
        }
        fn pop(&mut self, id: u64) {
            self.popped.push(id);
        }
    }

    struct FakeConn {
        cursor: RefCell<Point>,
    }

    impl MockXConn for FakeConn {
        fn mock_cursor_position(&self) -> Result<Point> {
            Ok(*self.cursor.borrow())
        }
        fn mock_move_window(&self, _window: Xid, _x: i32, _y: i32) -> Result<()> {
            Ok(())
        }
        fn mock_resize_window(&self, _window: Xid, _w: u32, _h: u32) -> Result<()> {
            Ok(())
        }
        fn mock_send_synthetic_configure_notify(
            &self,
            _window: Xid,
            _x: i32,
            _y: i32,
            _w: u32,
            _h: u32,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn framed_portal(registry: &mut PortalRegistry, x: i32, y: i32, w: u32, h: u32) -> PortalId {
        let id = registry.create(Xid(1)).unwrap();
        let portal = registry.get_mut(id).unwrap();
        portal.initialized = true;
        portal.frame_window = Some(Xid(2));
        portal.geometry = Rect { x, y, w, h };
        portal.visibility = crate::visibility::Visibility::Visible;
        registry.set_sorted(vec![id]);
        id
    }

    #[test]
    fn click_on_bottom_right_corner_starts_a_resize() {
        let mut registry = PortalRegistry::new();
        let id = framed_portal(&mut registry, 100, 100, 400, 300);
        let conn = FakeConn {
            cursor: RefCell::new(Point { x: 100 + 395, y: 100 + 295 }),
        };
        let mut state = InteractionState::new();
        let mut sink = RecordingSink::default();

        handle_button_press(&conn, &mut registry, &mut state, &mut sink, 1).unwrap();

        assert!(state.is_resizing());
        assert!(!state.is_dragging());
        assert_eq!(sink.pushed, vec![(MARKER_RESIZING, CursorHint::Resizing, true)]);
        let _ = id;
    }

    #[test]
    fn click_on_titlebar_away_from_corner_starts_a_drag() {
        let mut registry = PortalRegistry::new();
        framed_portal(&mut registry, 100, 100, 400, 300);
        let conn = FakeConn {
            cursor: RefCell::new(Point { x: 100 + 100, y: 100 + 5 }),
        };
        let mut state = InteractionState::new();
        let mut sink = RecordingSink::default();

        handle_button_press(&conn, &mut registry, &mut state, &mut sink, 1).unwrap();

        assert!(state.is_dragging());
        assert!(!state.is_resizing());
    }

    #[test]
    fn dragging_moves_the_portal_by_the_pointer_delta() {
        let mut registry = PortalRegistry::new();
        let id = framed_portal(&mut registry, 100, 100, 400, 300);
        let conn = FakeConn {
            cursor: RefCell::new(Point { x: 150, y: 110 }),
        };
        let mut state = InteractionState::new();
        let mut sink = RecordingSink::default();

        handle_button_press(&conn, &mut registry, &mut state, &mut sink, 1).unwrap();
        assert!(state.is_dragging());

        *conn.cursor.borrow_mut() = Point { x: 180, y: 140 };
        handle_motion(&conn, &mut registry, &mut state, &mut sink, 100, 16).unwrap();

        let portal = registry.get(id).unwrap();
        assert_eq!(portal.geometry.x, 130);
        assert_eq!(portal.geometry.y, 130);
    }

    #[test]
    fn drag_updates_are_throttled() {
        let mut registry = PortalRegistry::new();
        let id = framed_portal(&mut registry, 100, 100, 400, 300);
        let conn = FakeConn {
            cursor: RefCell::new(Point { x: 150, y: 110 }),
        };
        let mut state = InteractionState::new();
        let mut sink = RecordingSink::default();
        handle_button_press(&conn, &mut registry, &mut state, &mut sink, 1).unwrap();

        *conn.cursor.borrow_mut() = Point { x: 200, y: 110 };
        handle_motion(&conn, &mut registry, &mut state, &mut sink, 5, 16).unwrap();
        assert_eq!(registry.get(id).unwrap().geometry.x, 100, "update inside throttle window is dropped");

        handle_motion(&conn, &mut registry, &mut state, &mut sink, 20, 16).unwrap();
        assert_eq!(registry.get(id).unwrap().geometry.x, 150);
    }

    #[test]
    fn resize_clamps_to_the_minimum_size() {
        let mut registry = PortalRegistry::new();
        let id = framed_portal(&mut registry, 100, 100, 400, 300);
        let conn = FakeConn {
            cursor: RefCell::new(Point { x: 495, y: 395 }),
        };
        let mut state = InteractionState::new();
        let mut sink = RecordingSink::default();
        handle_button_press(&conn, &mut registry, &mut state, &mut sink, 1).unwrap();
        assert!(state.is_resizing());

        *conn.cursor.borrow_mut() = Point { x: 150, y: 120 };
        handle_motion(&conn, &mut registry, &mut state, &mut sink, 100, 16).unwrap();

        let portal = registry.get(id).unwrap();
        assert_eq!(portal.geometry.w, MINIMUM_PORTAL_WIDTH);
        assert_eq!(portal.geometry.h, MINIMUM_PORTAL_HEIGHT);
        assert_eq!(portal.geometry.x, 100, "bottom-right resize never moves the origin");
    }

    #[test]
    fn button_release_clears_both_operations_and_pops_markers() {
        let mut registry = PortalRegistry::new();
        framed_portal(&mut registry, 100, 100, 400, 300);
        let conn = FakeConn {
            cursor: RefCell::new(Point { x: 150, y: 110 }),
        };
        let mut state = InteractionState::new();
        let mut sink = RecordingSink::default();
        handle_button_press(&conn, &mut registry, &mut state, &mut sink, 1).unwrap();
        assert!(state.is_dragging());

        handle_button_release(&mut state, &mut sink, 1);

        assert!(!state.is_dragging());
        assert!(!state.is_resizing());
        assert_eq!(sink.popped, vec![MARKER_DRAGGING]);
    }

    #[test]
    fn portal_destroyed_mid_drag_aborts_the_drag() {
        let mut registry = PortalRegistry::new();
        let id = framed_portal(&mut registry, 100, 100, 400, 300);
        let conn = FakeConn {
            cursor: RefCell::new(Point { x: 150, y: 110 }),
        };
        let mut state = InteractionState::new();
        let mut sink = RecordingSink::default();
        handle_button_press(&conn, &mut registry, &mut state, &mut sink, 1).unwrap();
        assert!(state.is_dragging());

        state.on_portal_destroyed(&mut sink, id);

        assert!(!state.is_dragging());
        assert_eq!(sink.popped, vec![MARKER_DRAGGING]);
    }

    #[test]
    fn net_wm_moveresize_cancel_stops_an_active_drag() {
        let mut registry = PortalRegistry::new();
        let id = framed_portal(&mut registry, 100, 100, 400, 300);
        let mut state = InteractionState::new();
        let mut sink = RecordingSink::default();
        state.start_dragging(&mut sink, id, registry.get(id).unwrap(), 150, 110);

        handle_net_wm_moveresize(&registry, &mut state, &mut sink, id, 0, 0, MOVERESIZE_CANCEL);

        assert!(!state.is_dragging());
    }
}
