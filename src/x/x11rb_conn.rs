//! The real [`XConn`] backend, talking to the X server through `x11rb`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::os::unix::io::{AsRawFd, RawFd};
use std::str::FromStr;

use strum::IntoEnumIterator;
use tracing::{debug, trace, warn};
use x11rb::connection::Connection;
use x11rb::protocol::composite::{ConnectionExt as _, Redirect};
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xinput;
use x11rb::protocol::xproto::{
    AtomEnum, ChangeWindowAttributesAux, ClientMessageData, ClientMessageEvent,
    ConfigureWindowAux, ConnectionExt as _, CreateWindowAux, EventMask, GetPropertyReply,
    InputFocus, PropMode, StackMode, Window, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::COPY_DEPTH_FROM_PARENT;

use super::{
    CompositePixmap, CompositeRedirect, ClientMessage, MotifHints, Prop, RawEvent, WinType,
    WindowAttributes, WindowGeometry, WmNormalHints, XConn, XEvent,
};
use crate::atom::Atom;
use crate::geometry::{Point, Rect};
use crate::portal::Xid;
use crate::{Error, Result};

fn xerr<E: std::fmt::Display>(e: E) -> Error {
    Error::XConnection(e.to_string())
}

/// The `x11rb`-backed [`XConn`] implementation.
///
/// Holds a live connection plus the bits of server-side state cheaper to
/// cache than to requery per request: the interned atom table and whether
/// XComposite is available (spec §4.9 falls back to direct rendering when
/// it is not).
pub struct X11rbConn {
    conn: RustConnection,
    root: Window,
    atoms: HashMap<Atom, Xid>,
    composite_available: bool,
    // x11rb's blocking wait_for_event can return more than one logical
    // XEvent's worth of information in a single underlying Event (it never
    // does, but PropertyNotify/ClientMessage decoding can choose to ignore
    // an event and loop); queueing keeps poll_event's contract of "at most
    // one XEvent per call" cheap to implement.
    pending: RefCell<std::collections::VecDeque<XEvent>>,
}

impl X11rbConn {
    /// Connect to the display named by `$DISPLAY` (or `display_name` if
    /// given) and perform one-time setup: atom interning, RandR/Composite/
    /// XInput2 extension queries, and root event selection.
    pub fn connect(display_name: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(display_name).map_err(xerr)?;
        let root = conn.setup().roots[screen_num].root;

        let atoms = Atom::iter()
            .map(|atom| {
                let cookie = conn.intern_atom(false, atom.as_ref().as_bytes()).map_err(xerr)?;
                Ok((atom, Xid(cookie.reply().map_err(xerr)?.atom)))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        let composite_available = conn
            .extension_information(x11rb::protocol::composite::X11_EXTENSION_NAME)
            .map_err(xerr)?
            .is_some();

        conn.extension_information(x11rb::protocol::xinput::X11_EXTENSION_NAME)
            .map_err(xerr)?
            .ok_or_else(|| Error::Fatal("XInput2 extension is required but not present".into()))?;

        let this = X11rbConn {
            conn,
            root,
            atoms,
            composite_available,
            pending: RefCell::new(std::collections::VecDeque::new()),
        };

        if composite_available {
            debug!("XComposite extension detected");
        } else {
            warn!("XComposite extension not available; compositing disabled");
        }

        Ok(this)
    }

    fn known_atom(&self, atom: Atom) -> Xid {
        *self
            .atoms
            .get(&atom)
            .expect("AtomCache::prepare interns every Atom::iter() member")
    }

    fn atom_id(&self, name: &str) -> Result<Xid> {
        if let Ok(known) = Atom::from_str(name) {
            return Ok(self.known_atom(known));
        }
        let cookie = self.conn.intern_atom(false, name.as_bytes()).map_err(xerr)?;
        Ok(Xid(cookie.reply().map_err(xerr)?.atom))
    }

    fn get_property_raw(&self, window: Xid, atom: Xid) -> Result<Option<GetPropertyReply>> {
        let cookie = self
            .conn
            .get_property(false, window.0, atom.0, AtomEnum::ANY, 0, 1024)
            .map_err(xerr)?;
        match cookie.reply() {
            Ok(reply) if reply.value_len > 0 || !reply.value.is_empty() => Ok(Some(reply)),
            Ok(_) => Ok(None),
            Err(_) => Ok(None),
        }
    }

    fn select_xi2_raw(&self, window: Window) -> Result<()> {
        use xinput::{EventMask as XiEventMask, XIEventMask};
        let mask = XIEventMask::RAW_BUTTON_PRESS
            | XIEventMask::RAW_BUTTON_RELEASE
            | XIEventMask::RAW_MOTION
            | XIEventMask::RAW_KEY_PRESS
            | XIEventMask::RAW_KEY_RELEASE;
        self.conn
            .xinput_xi_select_events(
                window,
                &[XiEventMask {
                    deviceid: xinput::Device::ALL_MASTER.into(),
                    mask: vec![mask],
                }],
            )
            .map_err(xerr)?;
        Ok(())
    }

    fn decode_client_message(&self, ev: x11rb::protocol::xproto::ClientMessageEvent) -> ClientMessage {
        let window = Xid(ev.window);
        let data = ev.data.as_data32();
        if ev.type_ == self.known_atom(Atom::NetWmState).0 {
            ClientMessage::NetWmState {
                window,
                action: data[0],
                first: Xid(data[1]),
                second: Xid(data[2]),
            }
        } else if ev.type_ == self.known_atom(Atom::NetWmMoveresize).0 {
            ClientMessage::NetWmMoveresize {
                window,
                x_root: data[0] as i32,
                y_root: data[1] as i32,
                direction: data[2],
            }
        } else if ev.type_ == self.known_atom(Atom::NetCloseWindow).0 {
            ClientMessage::NetCloseWindow { window }
        } else {
            ClientMessage::Other {
                window,
                message_type: Xid(ev.type_),
            }
        }
    }

    fn translate_event(&self, event: Event) -> Option<XEvent> {
        match event {
            Event::CreateNotify(ev) => Some(XEvent::CreateNotify { window: Xid(ev.window) }),
            Event::MapRequest(ev) => Some(XEvent::MapRequest { window: Xid(ev.window) }),
            Event::MapNotify(ev) => Some(XEvent::MapNotify { window: Xid(ev.window) }),
            Event::UnmapNotify(ev) => Some(XEvent::UnmapNotify { window: Xid(ev.window) }),
            Event::DestroyNotify(ev) => Some(XEvent::DestroyNotify { window: Xid(ev.window) }),
            Event::ConfigureRequest(ev) => {
                use x11rb::protocol::xproto::ConfigWindow;
                let mask = ev.value_mask;
                Some(XEvent::ConfigureRequest {
                    window: Xid(ev.window),
                    x: mask.contains(ConfigWindow::X).then_some(ev.x as i32),
                    y: mask.contains(ConfigWindow::Y).then_some(ev.y as i32),
                    width: mask.contains(ConfigWindow::WIDTH).then_some(ev.width as u32),
                    height: mask.contains(ConfigWindow::HEIGHT).then_some(ev.height as u32),
                })
            }
            Event::ConfigureNotify(ev) => Some(XEvent::ConfigureNotify {
                window: Xid(ev.window),
                x: ev.x as i32,
                y: ev.y as i32,
                width: ev.width as u32,
                height: ev.height as u32,
            }),
            Event::PropertyNotify(ev) => Some(XEvent::PropertyNotify {
                window: Xid(ev.window),
                atom: Xid(ev.atom),
            }),
            Event::ClientMessage(ev) => Some(XEvent::ClientMessage(self.decode_client_message(ev))),
            Event::XinputRawButtonPress(ev) => Some(XEvent::Raw(RawEvent::ButtonPress { detail: ev.detail as u8 })),
            Event::XinputRawButtonRelease(ev) => Some(XEvent::Raw(RawEvent::ButtonRelease { detail: ev.detail as u8 })),
            Event::XinputRawMotion(ev) => Some(XEvent::Raw(RawEvent::Motion { time: ev.time })),
            Event::XinputRawKeyPress(ev) => Some(XEvent::Raw(RawEvent::KeyPress { keycode: ev.detail as u8 })),
            Event::XinputRawKeyRelease(ev) => Some(XEvent::Raw(RawEvent::KeyRelease { keycode: ev.detail as u8 })),
            other => {
                trace!(?other, "unhandled core event");
                None
            }
        }
    }
}

impl XConn for X11rbConn {
    fn root(&self) -> Xid {
        Xid(self.root)
    }

    fn screen_size(&self) -> Result<(u32, u32)> {
        let resources = self.conn.randr_get_screen_resources(self.root).map_err(xerr)?.reply().map_err(xerr)?;
        for crtc in &resources.crtcs {
            let info = self.conn.randr_get_crtc_info(*crtc, 0).map_err(xerr)?.reply().map_err(xerr)?;
            if info.width > 0 && info.height > 0 {
                return Ok((info.width as u32, info.height as u32));
            }
        }
        let setup = self.conn.setup();
        let screen = &setup.roots[0];
        Ok((screen.width_in_pixels as u32, screen.height_in_pixels as u32))
    }

    fn cursor_position(&self) -> Result<Point> {
        let reply = self.conn.query_pointer(self.root).map_err(xerr)?.reply().map_err(xerr)?;
        Ok(Point::new(reply.root_x as i32, reply.root_y as i32))
    }

    fn intern_atom(&self, name: &str) -> Result<Xid> {
        self.atom_id(name)
    }

    fn query_tree(&self, window: Xid) -> Result<Vec<Xid>> {
        let reply = self.conn.query_tree(window.0).map_err(xerr)?.reply().map_err(xerr)?;
        Ok(reply.children.into_iter().map(Xid).collect())
    }

    fn get_window_attributes(&self, window: Xid) -> Result<WindowAttributes> {
        let reply = self.conn.get_window_attributes(window.0).map_err(xerr)?.reply().map_err(xerr)?;
        Ok(WindowAttributes {
            override_redirect: reply.override_redirect,
            viewable: reply.map_state == x11rb::protocol::xproto::MapState::VIEWABLE,
        })
    }

    fn get_geometry(&self, window: Xid) -> Result<WindowGeometry> {
        let reply = self.conn.get_geometry(window.0).map_err(xerr)?.reply().map_err(xerr)?;
        Ok(WindowGeometry {
            rect: Rect::new(reply.x as i32, reply.y as i32, reply.width as u32, reply.height as u32),
            parent: Xid(reply.root),
        })
    }

    fn translate_to_root(&self, from: Xid, x: i32, y: i32) -> Result<Point> {
        let reply = self
            .conn
            .translate_coordinates(from.0, self.root, x as i16, y as i16)
            .map_err(xerr)?
            .reply()
            .map_err(xerr)?;
        Ok(Point::new(reply.dst_x as i32, reply.dst_y as i32))
    }

    fn create_window(&self, ty: WinType, r: Rect) -> Result<Xid> {
        let id = self.conn.generate_id().map_err(xerr)?;
        let aux = match ty {
            WinType::CheckWin => CreateWindowAux::new().override_redirect(1),
            WinType::Frame => CreateWindowAux::new().event_mask(
                EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
            ),
        };
        self.conn
            .create_window(
                COPY_DEPTH_FROM_PARENT,
                id,
                self.root,
                r.x as i16,
                r.y as i16,
                r.w as u16,
                r.h as u16,
                0,
                WindowClass::INPUT_OUTPUT,
                0,
                &aux,
            )
            .map_err(xerr)?;
        Ok(Xid(id))
    }

    fn destroy_window(&self, window: Xid) -> Result<()> {
        self.conn.destroy_window(window.0).map_err(xerr)?;
        Ok(())
    }

    fn reparent_window(&self, window: Xid, parent: Xid, x: i32, y: i32) -> Result<()> {
        self.conn.reparent_window(window.0, parent.0, x as i16, y as i16).map_err(xerr)?;
        Ok(())
    }

    fn add_to_save_set(&self, window: Xid) -> Result<()> {
        use x11rb::protocol::xproto::SetMode;
        self.conn.change_save_set(SetMode::INSERT, window.0).map_err(xerr)?;
        Ok(())
    }

    fn map_window(&self, window: Xid) -> Result<()> {
        self.conn.map_window(window.0).map_err(xerr)?;
        Ok(())
    }

    fn unmap_window(&self, window: Xid) -> Result<()> {
        self.conn.unmap_window(window.0).map_err(xerr)?;
        Ok(())
    }

    fn kill_window(&self, window: Xid) -> Result<()> {
        self.conn.kill_client(window.0).map_err(xerr)?;
        Ok(())
    }

    fn move_window(&self, window: Xid, x: i32, y: i32) -> Result<()> {
        let aux = ConfigureWindowAux::new().x(x).y(y);
        // A racing DestroyNotify/ReparentNotify on the target is not a
        // programming error: swallow BadWindow here rather than bubble it.
        let _ = self.conn.configure_window(window.0, &aux).map_err(xerr)?.check();
        Ok(())
    }

    fn resize_window(&self, window: Xid, width: u32, height: u32) -> Result<()> {
        let aux = ConfigureWindowAux::new().width(width).height(height);
        let _ = self.conn.configure_window(window.0, &aux).map_err(xerr)?.check();
        Ok(())
    }

    fn raise_window(&self, window: Xid) -> Result<()> {
        let aux = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
        self.conn.configure_window(window.0, &aux).map_err(xerr)?;
        Ok(())
    }

    fn stack_above(&self, window: Xid, sibling: Xid) -> Result<()> {
        let aux = ConfigureWindowAux::new().sibling(sibling.0).stack_mode(StackMode::ABOVE);
        self.conn.configure_window(window.0, &aux).map_err(xerr)?;
        Ok(())
    }

    fn configure_window_passthrough(
        &self,
        window: Xid,
        x: Option<i32>,
        y: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<()> {
        let mut aux = ConfigureWindowAux::new();
        if let Some(x) = x {
            aux = aux.x(x);
        }
        if let Some(y) = y {
            aux = aux.y(y);
        }
        if let Some(width) = width {
            aux = aux.width(width);
        }
        if let Some(height) = height {
            aux = aux.height(height);
        }
        self.conn.configure_window(window.0, &aux).map_err(xerr)?;
        Ok(())
    }

    fn set_input_focus(&self, window: Xid) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::PARENT, window.0, x11rb::CURRENT_TIME)
            .map_err(xerr)?;
        let active = self.known_atom(Atom::NetActiveWindow);
        self.conn
            .change_property32(PropMode::REPLACE, self.root, active.0, AtomEnum::WINDOW, &[window.0])
            .map_err(xerr)?;
        Ok(())
    }

    fn send_synthetic_configure_notify(
        &self,
        window: Xid,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<()> {
        use x11rb::protocol::xproto::ConfigureNotifyEvent;
        let event = ConfigureNotifyEvent {
            response_type: x11rb::protocol::xproto::CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window.0,
            window: window.0,
            above_sibling: x11rb::NONE,
            x: x as i16,
            y: y as i16,
            width: width as u16,
            height: height as u16,
            border_width: 0,
            override_redirect: false,
        };
        self.conn
            .send_event(false, window.0, EventMask::STRUCTURE_NOTIFY, event)
            .map_err(xerr)?;
        Ok(())
    }

    fn send_delete_window(&self, window: Xid) -> Result<()> {
        let wm_delete = self.known_atom(Atom::WmDeleteWindow);
        let wm_protocols = self.known_atom(Atom::WmProtocols);
        let event = ClientMessageEvent {
            response_type: x11rb::protocol::xproto::CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window: window.0,
            type_: wm_protocols.0,
            data: ClientMessageData::from([wm_delete.0, x11rb::CURRENT_TIME, 0, 0, 0]),
        };
        self.conn
            .send_event(false, window.0, EventMask::NO_EVENT, event)
            .map_err(xerr)?;
        Ok(())
    }

    fn get_prop(&self, window: Xid, name: &str) -> Result<Option<Prop>> {
        let atom = self.atom_id(name)?;
        let Some(reply) = self.get_property_raw(window, atom)? else {
            return Ok(None);
        };

        let parsed_atom = Atom::from_str(name).ok();
        match parsed_atom {
            Some(Atom::WmNormalHints) => {
                let Some(mut it) = reply.value32() else { return Ok(None) };
                let flags = it.next().unwrap_or(0);
                let rest: Vec<u32> = it.collect();
                let has_user_specified_position = flags & 0x1 != 0 || flags & 0x4 != 0;
                let x = rest.get(0).copied().unwrap_or(0) as i32;
                let y = rest.get(1).copied().unwrap_or(0) as i32;
                let min_width = rest.get(3).copied();
                let min_height = rest.get(4).copied();
                Ok(Some(Prop::NormalHints(WmNormalHints {
                    has_user_specified_position,
                    x,
                    y,
                    min_width,
                    min_height,
                })))
            }
            Some(Atom::MotifWmHints) => {
                let Some(mut it) = reply.value32() else { return Ok(None) };
                let flags = it.next().unwrap_or(0);
                let _functions = it.next();
                let decorations = it.next().unwrap_or(0);
                Ok(Some(Prop::MotifHints(MotifHints {
                    decorations_set: flags & 0x2 != 0,
                    decorations: decorations != 0,
                })))
            }
            Some(Atom::WmClass) => {
                let parts: Vec<String> = reply
                    .value
                    .split(|b| *b == 0)
                    .filter(|s| !s.is_empty())
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .collect();
                Ok(Some(Prop::Strings(parts)))
            }
            Some(Atom::WmTransientFor) => {
                let windows: Vec<Xid> = reply.value32().into_iter().flatten().map(Xid).collect();
                Ok(Some(Prop::Window(windows)))
            }
            Some(Atom::NetWmState) | Some(Atom::NetWmWindowType) | Some(Atom::WmProtocols) => {
                let atoms: Vec<Xid> = reply.value32().into_iter().flatten().map(Xid).collect();
                Ok(Some(Prop::Atom(atoms)))
            }
            Some(Atom::WmState) => {
                let cardinals: Vec<u32> = reply.value32().into_iter().flatten().collect();
                Ok(Some(Prop::Cardinal(cardinals)))
            }
            _ if reply.type_ == AtomEnum::STRING.into() || reply.type_ == self.known_atom(Atom::Utf8String).0 => {
                Ok(Some(Prop::Strings(vec![String::from_utf8_lossy(&reply.value).into_owned()])))
            }
            _ => {
                if let Some(values) = reply.value32() {
                    Ok(Some(Prop::Cardinal(values.collect())))
                } else {
                    Ok(Some(Prop::Strings(vec![String::from_utf8_lossy(&reply.value).into_owned()])))
                }
            }
        }
    }

    fn set_prop(&self, window: Xid, name: &str, value: Prop) -> Result<()> {
        let atom = self.atom_id(name)?;
        match value {
            Prop::Cardinal(data) => {
                self.conn
                    .change_property32(PropMode::REPLACE, window.0, atom.0, AtomEnum::CARDINAL, &data)
                    .map_err(xerr)?;
            }
            Prop::Atom(data) => {
                let data: Vec<u32> = data.into_iter().map(|x| x.0).collect();
                self.conn
                    .change_property32(PropMode::REPLACE, window.0, atom.0, AtomEnum::ATOM, &data)
                    .map_err(xerr)?;
            }
            Prop::Window(data) => {
                let data: Vec<u32> = data.into_iter().map(|x| x.0).collect();
                self.conn
                    .change_property32(PropMode::REPLACE, window.0, atom.0, AtomEnum::WINDOW, &data)
                    .map_err(xerr)?;
            }
            Prop::Strings(strings) => {
                let joined = strings.join("\0");
                let string_atom = self.known_atom(Atom::Utf8String);
                self.conn
                    .change_property8(PropMode::REPLACE, window.0, atom.0, string_atom.0, joined.as_bytes())
                    .map_err(xerr)?;
            }
            Prop::NormalHints(_) | Prop::MotifHints(_) => {
                // The core never writes these back; they are read-only client hints.
                return Err(Error::XConnection(format!("{name} is read-only")));
            }
        }
        Ok(())
    }

    fn delete_prop(&self, window: Xid, name: &str) -> Result<()> {
        let atom = self.atom_id(name)?;
        self.conn.delete_property(window.0, atom.0).map_err(xerr)?;
        Ok(())
    }

    fn supports_protocol(&self, window: Xid, proto: &str) -> Result<bool> {
        let wm_protocols = self.known_atom(Atom::WmProtocols);
        let Some(reply) = self.get_property_raw(window, wm_protocols)? else {
            return Ok(false);
        };
        let target = self.atom_id(proto)?;
        Ok(reply.value32().into_iter().flatten().any(|a| a == target.0))
    }

    fn grab_server(&self) -> Result<()> {
        self.conn.grab_server().map_err(xerr)?;
        Ok(())
    }

    fn ungrab_server(&self) -> Result<()> {
        self.conn.ungrab_server().map_err(xerr)?;
        Ok(())
    }

    fn select_root_input(&self) -> Result<()> {
        let mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::PROPERTY_CHANGE
            | EventMask::STRUCTURE_NOTIFY;
        let aux = ChangeWindowAttributesAux::new().event_mask(mask);
        self.conn.change_window_attributes(self.root, &aux).map_err(xerr)?;
        self.select_xi2_raw(self.root)?;
        self.conn.flush().map_err(xerr)?;
        Ok(())
    }

    fn select_client_input(&self, window: Xid) -> Result<()> {
        let mask = EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY;
        let aux = ChangeWindowAttributesAux::new().event_mask(mask);
        self.conn.change_window_attributes(window.0, &aux).map_err(xerr)?;
        Ok(())
    }

    fn poll_event(&self) -> Result<Option<XEvent>> {
        if let Some(ev) = self.pending.borrow_mut().pop_front() {
            return Ok(Some(ev));
        }
        loop {
            let Some(event) = self.conn.poll_for_event().map_err(xerr)? else {
                return Ok(None);
            };
            if let Some(xev) = self.translate_event(event) {
                return Ok(Some(xev));
            }
            // translate_event dropped the event (unhandled kind); keep polling
            // without blocking so the caller's timeout budget is respected.
        }
    }

    fn flush(&self) {
        let _ = self.conn.flush();
    }

    fn connection_fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }

    fn composite_available(&self) -> bool {
        self.composite_available
    }

    fn composite_redirect_subwindows(&self, window: Xid) -> Result<()> {
        self.conn
            .composite_redirect_subwindows(window.0, Redirect::MANUAL)
            .map_err(xerr)?;
        Ok(())
    }

    fn composite_redirect_window(&self, window: Xid, mode: CompositeRedirect) -> Result<()> {
        let redirect = match mode {
            CompositeRedirect::Manual => Redirect::MANUAL,
            CompositeRedirect::Automatic => Redirect::AUTOMATIC,
        };
        self.conn.composite_redirect_window(window.0, redirect).map_err(xerr)?;
        Ok(())
    }

    fn composite_unredirect_window(&self, window: Xid) -> Result<()> {
        self.conn
            .composite_unredirect_window(window.0, Redirect::MANUAL)
            .map_err(xerr)?;
        Ok(())
    }

    fn composite_name_window_pixmap(&self, window: Xid) -> Result<CompositePixmap> {
        let pixmap = self.conn.generate_id().map_err(xerr)?;
        self.conn.composite_name_window_pixmap(window.0, pixmap).map_err(xerr)?;
        Ok(CompositePixmap(Xid(pixmap)))
    }

    fn free_pixmap(&self, pixmap: CompositePixmap) -> Result<()> {
        self.conn.free_pixmap(pixmap.0 .0).map_err(xerr)?;
        Ok(())
    }

    fn get_image_strip(&self, window: Xid, x: i32, y: i32, len: u32) -> Result<Vec<(u8, u8, u8)>> {
        use x11rb::protocol::xproto::ImageFormat;
        let reply = self
            .conn
            .get_image(ImageFormat::Z_PIXMAP, window.0, x as i16, y as i16, len as u16, 1, !0)
            .map_err(xerr)?
            .reply()
            .map_err(xerr)?;
        // 24/32-bit TrueColor servers lay out BGRx per pixel; this matches
        // the default visual used for the root and all frame windows.
        Ok(reply
            .data
            .chunks_exact(4)
            .map(|px| (px[2], px[1], px[0]))
            .collect())
    }
}
