//! ---
//! tbus_section: "05-command-harness"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Discovery, publish, echo and request commands over a messaging node."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// The two output streams a command writes to.
///
/// Clones share the underlying writers. Write failures (a closed pipe, for
/// instance) are logged at trace level and otherwise ignored.
#[derive(Clone)]
pub struct Console {
    out: SharedWriter,
    err: SharedWriter,
}

impl Console {
    /// Console over arbitrary writers.
    pub fn new(out: impl Write + Send + 'static, err: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
            err: Arc::new(Mutex::new(Box::new(err))),
        }
    }

    /// Console over the process stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    /// Console writing into in-memory buffers, returned alongside it.
    pub fn captured() -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        let console = Self::new(captured.out.clone(), captured.err.clone());
        (console, captured)
    }

    /// Write `line` and a newline to stdout.
    pub fn out_line(&self, line: &str) {
        write_line(&self.out, "stdout", line);
    }

    /// Write `line` and a newline to stderr.
    pub fn err_line(&self, line: &str) {
        write_line(&self.err, "stderr", line);
    }
}

fn write_line(writer: &SharedWriter, stream: &'static str, line: &str) {
    let mut writer = writer.lock();
    let result = writer
        .write_all(line.as_bytes())
        .and_then(|()| writer.write_all(b"\n"))
        .and_then(|()| writer.flush());
    if let Err(err) = result {
        trace!(stream, error = %err, "console write failed");
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read side of [`Console::captured`].
#[derive(Clone, Default)]
pub struct CapturedOutput {
    out: SharedBuffer,
    err: SharedBuffer,
}

impl CapturedOutput {
    /// Everything written to stdout so far.
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.out.0.lock()).into_owned()
    }

    /// Everything written to stderr so far.
    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.err.0.lock()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn captured_streams_are_separate() {
        let (console, captured) = Console::captured();
        console.out_line("data");
        console.err_line("diagnostic");
        console.clone().out_line("more");
        assert_eq!(captured.stdout(), "data\nmore\n");
        assert_eq!(captured.stderr(), "diagnostic\n");
    }

    #[test]
    fn broken_pipe_is_ignored() {
        let console = Console::new(ClosedPipe, ClosedPipe);
        console.out_line("dropped");
        console.err_line("dropped");
    }
}
