//! Tracing setup for tests and a capture buffer for asserting on log output.

use std::collections::VecDeque;
use std::io;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriter;

/// Environment variable holding the log filter for tests.
pub const LOG_ENV: &str = "TESTTHINGS_LOG";

const DEFAULT_FILTER: &str = "info";

/// Default capture size: 1 MiB
const DEFAULT_CAPTURE_BYTES: usize = 1024 * 1024;

/// Install a fmt subscriber that writes through the test harness.
///
/// The filter comes from `TESTTHINGS_LOG`, then `RUST_LOG`, then `info`.
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Captures formatted tracing output in a bounded buffer.
///
/// Only the most recent bytes are kept once capacity is exceeded.
///
/// ```
/// use testthings::logging::LogCapture;
///
/// let capture = LogCapture::new();
/// let subscriber = tracing_subscriber::fmt()
///     .with_writer(capture.make_writer())
///     .with_ansi(false)
///     .finish();
/// tracing::subscriber::with_default(subscriber, || tracing::info!("hello"));
/// assert!(capture.contents().contains("hello"));
/// ```
#[derive(Clone)]
pub struct LogCapture {
    ring: Arc<Mutex<RingBuffer>>,
}

impl Default for LogCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl LogCapture {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPTURE_BYTES)
    }

    pub fn with_capacity(max_bytes: usize) -> Self {
        Self {
            ring: Arc::new(Mutex::new(RingBuffer::new(max_bytes))),
        }
    }

    /// Writer factory for use with tracing-subscriber.
    pub fn make_writer(&self) -> CaptureMakeWriter {
        CaptureMakeWriter {
            ring: Arc::clone(&self.ring),
        }
    }

    /// Captured output, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let bytes = self.ring().snapshot_bytes();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Captured output split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.ring().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.ring().clear();
    }

    fn ring(&self) -> std::sync::MutexGuard<'_, RingBuffer> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Writer factory handed to tracing-subscriber.
#[derive(Clone)]
pub struct CaptureMakeWriter {
    ring: Arc<Mutex<RingBuffer>>,
}

impl<'a> MakeWriter<'a> for CaptureMakeWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            ring: Arc::clone(&self.ring),
        }
    }
}

/// Writer that appends to the capture buffer.
pub struct CaptureWriter {
    ring: Arc<Mutex<RingBuffer>>,
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fixed-capacity ring buffer that evicts oldest bytes when full.
struct RingBuffer {
    max: usize,
    buf: VecDeque<u8>,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            max: capacity,
            buf: VecDeque::new(),
        }
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn clear(&mut self) {
        self.buf.clear();
    }

    fn push_bytes(&mut self, data: &[u8]) {
        if data.is_empty() || self.max == 0 {
            return;
        }
        if data.len() >= self.max {
            self.buf.clear();
            self.buf.extend(&data[data.len() - self.max..]);
            return;
        }
        let overflow = (self.buf.len() + data.len()).saturating_sub(self.max);
        self.buf.drain(..overflow);
        self.buf.extend(data);
    }

    fn snapshot_bytes(&self) -> Vec<u8> {
        self.buf.iter().copied().collect()
    }
}
