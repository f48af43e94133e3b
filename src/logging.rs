//! `tracing` output for the browser console.
//!
//! Native callers install their own subscriber; inside the browser there is
//! no stdout, so formatted events are forwarded to `console.log` line by line.

use crate::schema::QuoteError;
use std::io;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;

type Sink = fn(&str);

fn browser_console(line: &str) {
    web_sys::console::log_1(&JsValue::from_str(line));
}

/// Buffers one formatted event and emits it on flush or drop.
pub struct ConsoleWriter {
    buf: Vec<u8>,
    sink: Sink,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            let text = String::from_utf8_lossy(&self.buf);
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                (self.sink)(line);
            }
            self.buf.clear();
        }
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

#[derive(Clone, Copy)]
pub struct ConsoleMakeWriter {
    sink: Sink,
}

impl Default for ConsoleMakeWriter {
    fn default() -> Self {
        Self { sink: browser_console }
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            buf: Vec::new(),
            sink: self.sink,
        }
    }
}

/// Installs the global subscriber. `level` is an `EnvFilter` directive such
/// as `"debug"` or `"print_quote_wasm=debug"`; `info` when not given.
pub fn init_console_logging(level: Option<&str>) -> Result<(), QuoteError> {
    let filter = EnvFilter::try_new(level.unwrap_or("info"))
        .map_err(|e| QuoteError::InvalidInput(format!("log filter: {}", e)))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(ConsoleMakeWriter::default())
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .try_init()
        .map_err(|e| QuoteError::InvalidInput(format!("logging already initialised: {}", e)))
}
