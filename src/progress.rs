// Console progress line, rewritten in place with a carriage return each tick

use std::io::Write;

use crate::telemetry::TelemetrySnapshot;

/// Single-line flight status for an interactive terminal.
pub struct ProgressLine<W: Write> {
    out: W,
    total_seconds: f64,
    dirty: bool,
}

impl<W: Write> ProgressLine<W> {
    pub fn new(out: W, total_seconds: f64) -> Self {
        ProgressLine {
            out,
            total_seconds,
            dirty: false,
        }
    }

    pub fn render(&self, snap: &TelemetrySnapshot) -> String {
        format!(
            "Phase {} | Time: {:>3}s / {}s | Alt: {:>5}ft | Lat: {:.4} Lon: {:.4} Heading: {:.1}",
            snap.phase,
            snap.elapsed_seconds as i64,
            self.total_seconds as i64,
            snap.altitude_ft as i64,
            snap.lat,
            snap.lon,
            snap.heading,
        )
    }

    /// Overwrite the current line. Console errors are ignored.
    pub fn update(&mut self, snap: &TelemetrySnapshot) {
        let line = self.render(snap);
        let _ = write!(self.out, "{}    \r", line);
        let _ = self.out.flush();
        self.dirty = true;
    }

    /// Move past the progress line so following output starts on a fresh line.
    pub fn finish(&mut self) {
        if self.dirty {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
            self.dirty = false;
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
