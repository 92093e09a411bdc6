// tracing subscriber setup. Output goes to the browser console under wasm and
// to stderr elsewhere.

use std::io::{self, Write};

use tracing_subscriber::EnvFilter;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(line: &str);
}

/// Installs the global subscriber. Later calls keep the first one.
///
/// `level` is an `EnvFilter` directive such as `"debug"` or
/// `"browsing_core::navigation=trace,info"`; unparsable input falls back to `info`.
pub fn init(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .without_time()
        .with_writer(ConsoleWriter::default)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level, "logging initialized");
    }
}

/// Buffers one formatted event and emits it as a single console line on drop.
#[derive(Debug, Default)]
pub struct ConsoleWriter {
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn take_line(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.buffer)
            .trim_end_matches('\n')
            .to_string();
        self.buffer.clear();
        Some(text)
    }
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if let Some(line) = self.take_line() {
            emit(&line);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(line: &str) {
    console_log(line);
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(line: &str) {
    let _ = writeln!(io::stderr(), "{}", line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_joins_fragments_into_one_line() {
        let mut writer = ConsoleWriter::default();
        write!(writer, " INFO browsing_core: ").unwrap();
        writeln!(writer, "flushed url=https://example.com").unwrap();
        assert_eq!(
            writer.take_line().as_deref(),
            Some(" INFO browsing_core: flushed url=https://example.com")
        );
        assert_eq!(writer.take_line(), None);
    }

    #[test]
    fn init_is_idempotent() {
        init("debug");
        init("not a [valid directive");
        tracing::info!("still logging");
    }
}
