//! Destinations for `PRINT`.
//!
//! The engine never writes to stdout itself; callers inject an
//! [`OutputSink`]. [`StdoutSink`] prints one decimal value per line and
//! `Vec<i64>` captures values for tests and embedding.

use std::io::{self, Write};

/// Receiver of values emitted by `PRINT`.
pub trait OutputSink {
    /// Emits a single resolved value.
    fn emit(&mut self, value: i64);
}

/// Writes each value as a line on standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, value: i64) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{value}");
    }
}

impl OutputSink for Vec<i64> {
    fn emit(&mut self, value: i64) {
        self.push(value);
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn emit(&mut self, value: i64) {
        (**self).emit(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_captures_in_order() {
        let mut sink: Vec<i64> = Vec::new();
        sink.emit(3);
        sink.emit(-1);
        assert_eq!(sink, vec![3, -1]);
    }

    #[test]
    fn borrowed_sink_forwards() {
        fn emit_all<S: OutputSink>(mut sink: S, values: &[i64]) {
            for v in values {
                sink.emit(*v);
            }
        }

        let mut sink: Vec<i64> = Vec::new();
        emit_all(&mut sink, &[9, 8]);
        assert_eq!(sink, vec![9, 8]);
    }
}
