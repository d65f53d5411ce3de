//! A mock implementation of [`XConn`], easier to stand up in a test than a
//! real X connection.
//!
//! Any type implementing [`MockXConn`] automatically implements [`XConn`] by
//! forwarding each call to the matching `mock_*` method. Every `mock_*`
//! method defaults to `Err(Error::UnimplementedMock)` (or an inert no-op for
//! the handful of infallible methods), so a test only overrides the methods
//! its scenario actually exercises.

#![allow(unused_variables)]

use super::{
    CompositePixmap, CompositeRedirect, Prop, WinType, WindowAttributes, WindowGeometry, XConn,
    XEvent,
};
use crate::geometry::{Point, Rect};
use crate::portal::Xid;
use crate::{Error, Result};
use std::os::unix::io::RawFd;

pub trait MockXConn {
    fn mock_root(&self) -> Xid {
        Xid(0)
    }

    fn mock_screen_size(&self) -> Result<(u32, u32)> {
        Err(Error::UnimplementedMock)
    }

    fn mock_cursor_position(&self) -> Result<Point> {
        Err(Error::UnimplementedMock)
    }

    fn mock_intern_atom(&self, name: &str) -> Result<Xid> {
        Err(Error::UnimplementedMock)
    }

    fn mock_query_tree(&self, window: Xid) -> Result<Vec<Xid>> {
        Err(Error::UnimplementedMock)
    }

    fn mock_get_window_attributes(&self, window: Xid) -> Result<WindowAttributes> {
        Err(Error::UnimplementedMock)
    }

    fn mock_get_geometry(&self, window: Xid) -> Result<WindowGeometry> {
        Err(Error::UnimplementedMock)
    }

    fn mock_translate_to_root(&self, from: Xid, x: i32, y: i32) -> Result<Point> {
        Err(Error::UnimplementedMock)
    }

    fn mock_create_window(&self, ty: WinType, r: Rect) -> Result<Xid> {
        Err(Error::UnimplementedMock)
    }

    fn mock_destroy_window(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_reparent_window(&self, window: Xid, parent: Xid, x: i32, y: i32) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_add_to_save_set(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_map_window(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_unmap_window(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_kill_window(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_move_window(&self, window: Xid, x: i32, y: i32) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_resize_window(&self, window: Xid, width: u32, height: u32) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_raise_window(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_stack_above(&self, window: Xid, sibling: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_configure_window_passthrough(
        &self,
        window: Xid,
        x: Option<i32>,
        y: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_set_input_focus(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_send_synthetic_configure_notify(
        &self,
        window: Xid,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_send_delete_window(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_get_prop(&self, window: Xid, name: &str) -> Result<Option<Prop>> {
        Err(Error::UnimplementedMock)
    }

    fn mock_set_prop(&self, window: Xid, name: &str, value: Prop) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_delete_prop(&self, window: Xid, name: &str) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_supports_protocol(&self, window: Xid, proto: &str) -> Result<bool> {
        Err(Error::UnimplementedMock)
    }

    fn mock_grab_server(&self) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_ungrab_server(&self) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_select_root_input(&self) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_select_client_input(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_poll_event(&self) -> Result<Option<XEvent>> {
        Ok(None)
    }

    fn mock_flush(&self) {}

    fn mock_connection_fd(&self) -> RawFd {
        -1
    }

    fn mock_composite_available(&self) -> bool {
        false
    }

    fn mock_composite_redirect_subwindows(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_composite_redirect_window(&self, window: Xid, mode: CompositeRedirect) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_composite_unredirect_window(&self, window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_composite_name_window_pixmap(&self, window: Xid) -> Result<CompositePixmap> {
        Err(Error::UnimplementedMock)
    }

    fn mock_free_pixmap(&self, pixmap: CompositePixmap) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_get_image_strip(
        &self,
        window: Xid,
        x: i32,
        y: i32,
        len: u32,
    ) -> Result<Vec<(u8, u8, u8)>> {
        Err(Error::UnimplementedMock)
    }
}

impl<T> XConn for T
where
    T: MockXConn,
{
    fn root(&self) -> Xid {
        self.mock_root()
    }

    fn screen_size(&self) -> Result<(u32, u32)> {
        self.mock_screen_size()
    }

    fn cursor_position(&self) -> Result<Point> {
        self.mock_cursor_position()
    }

    fn intern_atom(&self, name: &str) -> Result<Xid> {
        self.mock_intern_atom(name)
    }

    fn query_tree(&self, window: Xid) -> Result<Vec<Xid>> {
        self.mock_query_tree(window)
    }

    fn get_window_attributes(&self, window: Xid) -> Result<WindowAttributes> {
        self.mock_get_window_attributes(window)
    }

    fn get_geometry(&self, window: Xid) -> Result<WindowGeometry> {
        self.mock_get_geometry(window)
    }

    fn translate_to_root(&self, from: Xid, x: i32, y: i32) -> Result<Point> {
        self.mock_translate_to_root(from, x, y)
    }

    fn create_window(&self, ty: WinType, r: Rect) -> Result<Xid> {
        self.mock_create_window(ty, r)
    }

    fn destroy_window(&self, window: Xid) -> Result<()> {
        self.mock_destroy_window(window)
    }

    fn reparent_window(&self, window: Xid, parent: Xid, x: i32, y: i32) -> Result<()> {
        self.mock_reparent_window(window, parent, x, y)
    }

    fn add_to_save_set(&self, window: Xid) -> Result<()> {
        self.mock_add_to_save_set(window)
    }

    fn map_window(&self, window: Xid) -> Result<()> {
        self.mock_map_window(window)
    }

    fn unmap_window(&self, window: Xid) -> Result<()> {
        self.mock_unmap_window(window)
    }

    fn kill_window(&self, window: Xid) -> Result<()> {
        self.mock_kill_window(window)
    }

    fn move_window(&self, window: Xid, x: i32, y: i32) -> Result<()> {
        self.mock_move_window(window, x, y)
    }

    fn resize_window(&self, window: Xid, width: u32, height: u32) -> Result<()> {
        self.mock_resize_window(window, width, height)
    }

    fn raise_window(&self, window: Xid) -> Result<()> {
        self.mock_raise_window(window)
    }

    fn stack_above(&self, window: Xid, sibling: Xid) -> Result<()> {
        self.mock_stack_above(window, sibling)
    }

    fn configure_window_passthrough(
        &self,
        window: Xid,
        x: Option<i32>,
        y: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<()> {
        self.mock_configure_window_passthrough(window, x, y, width, height)
    }

    fn set_input_focus(&self, window: Xid) -> Result<()> {
        self.mock_set_input_focus(window)
    }

    fn send_synthetic_configure_notify(
        &self,
        window: Xid,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<()> {
        self.mock_send_synthetic_configure_notify(window, x, y, width, height)
    }

    fn send_delete_window(&self, window: Xid) -> Result<()> {
        self.mock_send_delete_window(window)
    }

    fn get_prop(&self, window: Xid, name: &str) -> Result<Option<Prop>> {
        self.mock_get_prop(window, name)
    }

    fn set_prop(&self, window: Xid, name: &str, value: Prop) -> Result<()> {
        self.mock_set_prop(window, name, value)
    }

    fn delete_prop(&self, window: Xid, name: &str) -> Result<()> {
        self.mock_delete_prop(window, name)
    }

    fn supports_protocol(&self, window: Xid, proto: &str) -> Result<bool> {
        self.mock_supports_protocol(window, proto)
    }

    fn grab_server(&self) -> Result<()> {
        self.mock_grab_server()
    }

    fn ungrab_server(&self) -> Result<()> {
        self.mock_ungrab_server()
    }

    fn select_root_input(&self) -> Result<()> {
        self.mock_select_root_input()
    }

    fn select_client_input(&self, window: Xid) -> Result<()> {
        self.mock_select_client_input(window)
    }

    fn poll_event(&self) -> Result<Option<XEvent>> {
        self.mock_poll_event()
    }

    fn flush(&self) {
        self.mock_flush()
    }

    fn connection_fd(&self) -> RawFd {
        self.mock_connection_fd()
    }

    fn composite_available(&self) -> bool {
        self.mock_composite_available()
    }

    fn composite_redirect_subwindows(&self, window: Xid) -> Result<()> {
        self.mock_composite_redirect_subwindows(window)
    }

    fn composite_redirect_window(&self, window: Xid, mode: CompositeRedirect) -> Result<()> {
        self.mock_composite_redirect_window(window, mode)
    }

    fn composite_unredirect_window(&self, window: Xid) -> Result<()> {
        self.mock_composite_unredirect_window(window)
    }

    fn composite_name_window_pixmap(&self, window: Xid) -> Result<CompositePixmap> {
        self.mock_composite_name_window_pixmap(window)
    }

    fn free_pixmap(&self, pixmap: CompositePixmap) -> Result<()> {
        self.mock_free_pixmap(pixmap)
    }

    fn get_image_strip(&self, window: Xid, x: i32, y: i32, len: u32) -> Result<Vec<(u8, u8, u8)>> {
        self.mock_get_image_strip(window, x, y, len)
    }
}

/// The simplest possible [`MockXConn`]: every method uses its default
/// (`Err(Error::UnimplementedMock)` or no-op). Useful as a base a test wraps
/// with `RefCell`-backed state rather than writing out every default again.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubXConn;

impl MockXConn for StubXConn {}
