use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Background display tick for the run timer.
///
/// Publishes the milliseconds elapsed since `origin` every interval. Purely
/// observational: nothing in judging reads it. Stops when dropped.
pub struct StatsTicker {
    elapsed_ms: Arc<AtomicU64>,
    paused: Arc<AtomicBool>,
    stop_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl StatsTicker {
    pub fn start(interval: Duration, origin: Instant) -> io::Result<Self> {
        let elapsed_ms = Arc::new(AtomicU64::new(0));
        let paused = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = {
            let elapsed_ms = Arc::clone(&elapsed_ms);
            let paused = Arc::clone(&paused);
            thread::Builder::new()
                .name("drill-stats-ticker".into())
                .spawn(move || loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            if !paused.load(Ordering::Relaxed) {
                                let ms = u64::try_from(origin.elapsed().as_millis())
                                    .unwrap_or(u64::MAX);
                                elapsed_ms.store(ms, Ordering::Relaxed);
                            }
                        }
                        // stop requested or ticker dropped
                        _ => break,
                    }
                })?
        };

        Ok(Self {
            elapsed_ms,
            paused,
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Last published value.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms.load(Ordering::Relaxed)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}

impl Drop for StatsTicker {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
