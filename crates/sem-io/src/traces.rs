//! Receiver trace output.
//!
//! One text file per receiver: a short header, then one row per time
//! sample with the recorded field components.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Write a receiver's trace as a whitespace-separated table.
pub fn write_trace_file(
    path: &Path,
    receiver: &str,
    location: &[f64; 3],
    components: &[&str],
    times: &[f64],
    traces: &[Vec<f64>],
) -> Result<()> {
    debug_assert_eq!(components.len(), traces.len());
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "# receiver: {receiver}")?;
    writeln!(
        out,
        "# location: {:.9e} {:.9e} {:.9e}",
        location[0], location[1], location[2]
    )?;
    write!(out, "# time")?;
    for c in components {
        write!(out, " {c}")?;
    }
    writeln!(out)?;

    for (i, &t) in times.iter().enumerate() {
        write!(out, "{t:.9e}")?;
        for trace in traces {
            write!(out, " {:.9e}", trace[i])?;
        }
        writeln!(out)?;
    }
    Ok(())
}
