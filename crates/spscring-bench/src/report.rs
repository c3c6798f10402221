use crate::cli::{Mode, Variant};
use std::fmt::Write;
use std::time::Duration;

/// One measured run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub variant: Variant,
    pub mode: Mode,
    pub ops: u64,
    pub elapsed: Duration,
}

impl RunResult {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1e3
    }

    /// Operations per millisecond; zero for an unmeasurably short run.
    pub fn ops_per_ms(&self) -> f64 {
        let ms = self.elapsed_ms();
        if ms > 0.0 {
            self.ops as f64 / ms
        } else {
            0.0
        }
    }
}

/// Renders the results as a markdown table.
pub fn render(results: &[RunResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "| variant | mode | ops | elapsed (ms) | ops/ms |");
    let _ = writeln!(out, "|---------|------|----:|-------------:|-------:|");
    for r in results {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.1} | {:.0} |",
            r.variant,
            r.mode,
            r.ops,
            r.elapsed_ms(),
            r.ops_per_ms()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ops_per_ms() {
        let r = RunResult {
            variant: Variant::Cached,
            mode: Mode::Two,
            ops: 1_000_000,
            elapsed: Duration::from_millis(250),
        };
        assert!((r.ops_per_ms() - 4000.0).abs() < 1e-6);

        let instant = RunResult {
            elapsed: Duration::ZERO,
            ..r
        };
        assert_eq!(instant.ops_per_ms(), 0.0);
    }

    #[test]
    fn test_render_table() {
        let table = render(&[
            RunResult {
                variant: Variant::Sequential,
                mode: Mode::Single,
                ops: 2000,
                elapsed: Duration::from_millis(2),
            },
            RunResult {
                variant: Variant::LockFree,
                mode: Mode::Two,
                ops: 3000,
                elapsed: Duration::from_millis(1),
            },
        ]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "| variant | mode | ops | elapsed (ms) | ops/ms |");
        assert_eq!(lines[2], "| sequential | single-thread | 2000 | 2.0 | 1000 |");
        assert_eq!(lines[3], "| lockfree | two-thread | 3000 | 1.0 | 3000 |");
    }
}
