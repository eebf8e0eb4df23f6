//! Channel for feeding values into a live graph.
//!
//! The producer sends one [`LiveUpdate`] per sample instant: a vector with one
//! entry per field, `None` meaning "no new value for this field". The graph
//! drains the channel on each tick and keeps only the newest update
//! (latest-wins); older pending updates are dropped, not queued per field.

use std::sync::mpsc::{Receiver, SendError, Sender, TryRecvError};

/// A value as delivered to the live graph.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveValue {
    Scalar(f64),
    /// Not plottable; a live graph closes when it receives one.
    Array(Vec<f64>),
}

impl From<f64> for LiveValue {
    fn from(v: f64) -> Self {
        LiveValue::Scalar(v)
    }
}

impl From<Vec<f64>> for LiveValue {
    fn from(v: Vec<f64>) -> Self {
        LiveValue::Array(v)
    }
}

/// Snapshot of every field, parallel to the graph's field list.
pub type LiveUpdate = Vec<Option<LiveValue>>;

/// Sending half, cheap to clone into producer threads.
#[derive(Clone)]
pub struct LiveSink {
    tx: Sender<LiveUpdate>,
}

impl LiveSink {
    pub fn send(&self, update: LiveUpdate) -> Result<(), SendError<LiveUpdate>> {
        self.tx.send(update)
    }

    /// Send a full set of scalar values.
    pub fn send_values(&self, values: &[f64]) -> Result<(), SendError<LiveUpdate>> {
        self.send(values.iter().map(|v| Some(LiveValue::Scalar(*v))).collect())
    }
}

/// Receiving half, owned by the live graph.
pub struct LiveReceiver {
    rx: Receiver<LiveUpdate>,
    disconnected: bool,
}

impl LiveReceiver {
    /// Drain everything pending and return the newest update. Never blocks.
    pub fn latest(&mut self) -> Option<LiveUpdate> {
        let mut newest = None;
        loop {
            match self.rx.try_recv() {
                Ok(u) => newest = Some(u),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        log::debug!("live value producer disconnected");
                    }
                    self.disconnected = true;
                    break;
                }
            }
        }
        newest
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

/// Create a connected `(LiveSink, LiveReceiver)` pair.
pub fn channel_live() -> (LiveSink, LiveReceiver) {
    let (tx, rx) = std::sync::mpsc::channel();
    (
        LiveSink { tx },
        LiveReceiver {
            rx,
            disconnected: false,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_wins() {
        let (tx, mut rx) = channel_live();
        tx.send_values(&[1.0, 2.0]).unwrap();
        tx.send_values(&[3.0, 4.0]).unwrap();
        assert_eq!(
            rx.latest(),
            Some(vec![Some(LiveValue::Scalar(3.0)), Some(LiveValue::Scalar(4.0))])
        );
        assert_eq!(rx.latest(), None);
    }

    #[test]
    fn disconnect_is_reported() {
        let (tx, mut rx) = channel_live();
        drop(tx);
        assert_eq!(rx.latest(), None);
        assert!(rx.is_disconnected());
    }
}
