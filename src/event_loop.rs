//! The single-threaded, cooperative event loop (C3, spec §4.11).
//!
//! Grounded in the teacher's `core::WindowManager::run` blocking
//! `next_event`/`flush` loop shape, adapted to X11rb's non-blocking
//! `poll_event` plus an explicit `poll(2)` wait so a compositor `Update`
//! tick can fire even when no X event arrives (timeout-driven rather than
//! purely event-driven). The `poll(2)` wait itself follows the raw-fd
//! `PollFd`/timeout pattern used for the same problem in glazier's X11
//! backend.

use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

use nix::poll::{poll, PollFd, PollFlags};
use tracing::error;

use crate::hooks::{BackgroundPainter, MarkerSink, PixmapPainter};
use crate::wm::WindowManager;
use crate::x::{XConn, XEvent};
use crate::{Error, Result};

/// Spec §4.11 step 2 / §5 "Resource caps": never drain more than this many
/// X events in one iteration, so a flood of input can't starve the
/// compositor tick.
const MAX_EVENTS_PER_ITERATION: usize = 50;

/// Run `wm` against `conn` until a fatal connection error occurs. Blocks
/// only in the top-of-loop `poll(2)` wait; every handler runs synchronously
/// on this thread (spec §5 "Scheduling").
pub fn run<X: XConn>(
    conn: &X,
    wm: &mut WindowManager,
    sink: &mut dyn MarkerSink,
    background: &mut dyn BackgroundPainter,
    painter: &mut dyn PixmapPainter,
    buffer_cr: &cairo::Context,
) -> Result<()> {
    let throttle = Duration::from_millis(wm.config().throttle_ms());
    let mut last_update = Instant::now();

    loop {
        let timeout = throttle.saturating_sub(last_update.elapsed());
        wait_for_readable(conn.connection_fd(), timeout)?;

        for _ in 0..MAX_EVENTS_PER_ITERATION {
            match conn.poll_event() {
                Ok(Some(event)) => {
                    dispatch(conn, wm, event, sink);
                    conn.flush();
                }
                Ok(None) => break,
                Err(e) => {
                    error!(%e, "error pulling next X event");
                    break;
                }
            }
        }

        if last_update.elapsed() >= throttle {
            dispatch(conn, wm, XEvent::Update, sink);
            if let Err(e) = wm.tick(conn, buffer_cr, background, painter) {
                error!(%e, "error during compositor tick");
            }
            conn.flush();
            last_update = Instant::now();
        }
    }
}

fn dispatch<X: XConn>(conn: &X, wm: &mut WindowManager, event: XEvent, sink: &mut dyn MarkerSink) {
    if let Err(e) = wm.handle_event(conn, event, sink) {
        error!(%e, "error handling event");
    }
}

/// Block until `fd` is readable or `timeout` elapses, whichever first.
/// `EINTR` (a delivered signal) is not an error: the next loop iteration
/// will just recompute a shorter timeout and retry.
fn wait_for_readable(fd: RawFd, timeout: Duration) -> Result<()> {
    let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
    match poll(&mut fds, millis) {
        Ok(_) => Ok(()),
        Err(nix::errno::Errno::EINTR) => Ok(()),
        Err(e) => Err(Error::XConnection(e.to_string())),
    }
}
