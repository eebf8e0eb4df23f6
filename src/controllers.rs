//! Controllers for interacting with graph windows from external code.
//!
//! [`LiveController`] lets non-UI code close, pause or clear a live graph and
//! observe its state. [`XRangeLink`] keeps the x range (zoom) of two graph
//! windows in step.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

// ─────────────────────────────────────────────────────────────────────────────
// Live graph control
// ─────────────────────────────────────────────────────────────────────────────

/// State published by a live graph after each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveInfo {
    pub paused: bool,
    /// Samples currently held per field.
    pub samples: Vec<usize>,
    pub closed: bool,
}

/// Handle to a running live graph.
#[derive(Clone, Default)]
pub struct LiveController {
    pub(crate) inner: Arc<Mutex<LiveCtrlInner>>, // crate-visible for UI
}

#[derive(Default)]
pub(crate) struct LiveCtrlInner {
    pub(crate) request_close: bool,
    pub(crate) request_pause: Option<bool>,
    pub(crate) request_clear: bool,
    pub(crate) request_screenshot_to: Option<PathBuf>,
    pub(crate) listeners: Vec<Sender<LiveInfo>>,
}

impl LiveController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the window to close at the next tick.
    pub fn request_close(&self) {
        self.inner.lock().unwrap().request_close = true;
    }

    pub fn pause(&self) {
        self.inner.lock().unwrap().request_pause = Some(true);
    }

    pub fn resume(&self) {
        self.inner.lock().unwrap().request_pause = Some(false);
    }

    /// Discard the accumulated history at the next tick.
    pub fn clear(&self) {
        self.inner.lock().unwrap().request_clear = true;
    }

    /// Save a PNG of the window to `path` without a dialog.
    pub fn request_save_png<P: Into<PathBuf>>(&self, path: P) {
        self.inner.lock().unwrap().request_screenshot_to = Some(path.into());
    }

    /// Receive a [`LiveInfo`] after every tick.
    pub fn subscribe(&self) -> Receiver<LiveInfo> {
        let (tx, rx) = mpsc::channel();
        self.inner.lock().unwrap().listeners.push(tx);
        rx
    }

    pub(crate) fn take_close(&self) -> bool {
        std::mem::take(&mut self.inner.lock().unwrap().request_close)
    }

    pub(crate) fn take_pause(&self) -> Option<bool> {
        self.inner.lock().unwrap().request_pause.take()
    }

    pub(crate) fn take_clear(&self) -> bool {
        std::mem::take(&mut self.inner.lock().unwrap().request_clear)
    }

    pub(crate) fn take_screenshot_path(&self) -> Option<PathBuf> {
        self.inner.lock().unwrap().request_screenshot_to.take()
    }

    pub(crate) fn publish(&self, info: LiveInfo) {
        let mut inner = self.inner.lock().unwrap();
        inner.listeners.retain(|tx| tx.send(info.clone()).is_ok());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// X-range link
// ─────────────────────────────────────────────────────────────────────────────

/// Visible x range `(min, max)` in plot coordinates.
pub type XRange = (f64, f64);

/// One end of a bidirectional zoom link.
///
/// Both directions are latest-wins: [`poll`](Self::poll) drains whatever is
/// pending and keeps only the newest range. A range is only sent when it
/// differs from the last one sent or received, so two linked windows do not
/// echo changes back and forth.
pub struct XRangeLink {
    tx: Sender<XRange>,
    rx: Receiver<XRange>,
    last: Option<XRange>,
}

impl XRangeLink {
    /// Two connected ends.
    pub fn pair() -> (XRangeLink, XRangeLink) {
        let (tx_a, rx_b) = mpsc::channel();
        let (tx_b, rx_a) = mpsc::channel();
        (
            XRangeLink {
                tx: tx_a,
                rx: rx_a,
                last: None,
            },
            XRangeLink {
                tx: tx_b,
                rx: rx_b,
                last: None,
            },
        )
    }

    /// Send `range` to the other end if it changed. Returns whether it was sent.
    pub fn publish(&mut self, range: XRange) -> bool {
        if self.last == Some(range) {
            return false;
        }
        self.last = Some(range);
        self.tx.send(range).is_ok()
    }

    /// Newest range received since the last poll, if it differs from the
    /// current one. Never blocks.
    pub fn poll(&mut self) -> Option<XRange> {
        let mut newest = None;
        loop {
            match self.rx.try_recv() {
                Ok(r) => newest = Some(r),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        match newest {
            Some(r) if self.last != Some(r) => {
                self.last = Some(r);
                Some(r)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_range_is_not_resent() {
        let (mut a, mut b) = XRangeLink::pair();
        assert!(a.publish((0.0, 1.0)));
        assert!(!a.publish((0.0, 1.0)));
        assert_eq!(b.poll(), Some((0.0, 1.0)));
        assert_eq!(b.poll(), None);
        // b now knows this range; echoing it back is suppressed
        assert!(!b.publish((0.0, 1.0)));
    }

    #[test]
    fn poll_keeps_latest() {
        let (mut a, mut b) = XRangeLink::pair();
        a.publish((0.0, 1.0));
        a.publish((0.0, 2.0));
        a.publish((0.5, 2.0));
        assert_eq!(b.poll(), Some((0.5, 2.0)));
    }

    #[test]
    fn live_controller_requests_are_one_shot() {
        let c = LiveController::new();
        c.clear();
        c.pause();
        assert!(c.take_clear());
        assert!(!c.take_clear());
        assert_eq!(c.take_pause(), Some(true));
        assert_eq!(c.take_pause(), None);
    }
}
