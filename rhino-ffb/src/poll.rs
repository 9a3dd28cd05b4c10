//! Dedicated device poll thread
//!
//! Calls [`DeviceConnection::tick`] every `poll_interval` until shut down.
//! A tick drains pending input reports while connected and attempts a
//! reconnect (rate limited by `reconnect_delay`) while disconnected.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info};

use crate::connection::DeviceConnection;

/// Thread name of the poll loop
pub const POLL_THREAD_NAME: &str = "ffb-poll";

/// Running poll loop; joined on drop
pub struct PollLoop {
    shutdown: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl PollLoop {
    /// Spawn the poll thread for `connection`
    pub fn spawn(connection: DeviceConnection) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));
        let shutdown_clone = shutdown.clone();
        let ticks_clone = ticks.clone();

        let thread = std::thread::Builder::new()
            .name(POLL_THREAD_NAME.into())
            .spawn(move || run_poll_loop(connection, shutdown_clone, ticks_clone))?;

        Ok(Self {
            shutdown,
            ticks,
            thread: Some(thread),
        })
    }

    /// Completed ticks so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the thread and wait for it to exit
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                debug!("Poll thread panicked");
            }
        }
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_poll_loop(connection: DeviceConnection, shutdown: Arc<AtomicBool>, ticks: Arc<AtomicU64>) {
    let interval = connection.config().poll_interval;
    info!("Poll loop started ({:?} interval)", interval);

    while !shutdown.load(Ordering::SeqCst) {
        connection.tick();
        ticks.fetch_add(1, Ordering::Relaxed);
        std::thread::sleep(interval);
    }

    info!("Poll loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionConfig, LinkState};
    use rhino_transport::mock::{MockOpener, MockTransport};
    use rhino_transport::InputReport;
    use std::time::{Duration, Instant};

    fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        done()
    }

    #[test]
    fn test_poll_loop_drains_reports() {
        let mock = MockTransport::new();
        let conn =
            DeviceConnection::with_opener(MockOpener::new(mock.clone()), ConnectionConfig::default())
                .unwrap();
        let mut poll = PollLoop::spawn(conn.clone()).unwrap();
        assert!(poll.is_running());

        mock.queue_report(&InputReport::new(100, -100, 0, 0b101));
        assert!(wait_until(Duration::from_secs(2), || conn
            .get_input()
            .is_some_and(|i| i.x() == 100)));
        assert_eq!(mock.pending_reads(), 0);

        poll.shutdown();
        assert!(!poll.is_running());
        assert!(poll.ticks() > 0);
    }

    #[test]
    fn test_poll_loop_reconnects() {
        let mock = MockTransport::new();
        let opener = MockOpener::new(mock.clone());
        let config = ConnectionConfig {
            reconnect_delay: Duration::from_millis(10),
            ..ConnectionConfig::default()
        };
        let conn = DeviceConnection::with_opener(opener.clone(), config).unwrap();
        let _poll = PollLoop::spawn(conn.clone()).unwrap();

        mock.disconnect();
        assert!(wait_until(Duration::from_secs(2), || conn.state()
            != LinkState::Connected));
        assert_eq!(opener.open_count(), 1);

        mock.reconnect();
        assert!(wait_until(Duration::from_secs(2), || conn.is_connected()));
        assert_eq!(opener.open_count(), 2);
    }
}
