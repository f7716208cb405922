//! JSON output for the CLI
//!
//! One JSON object per line on stdout.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Write one step of output to stdout
pub fn write_step(step: &str, result: Value) -> CliResult<()> {
    let line = serde_json::json!({
        "step": step,
        "result": result
    });
    write_line(&mut io::stdout(), &line)
}

/// Write a bare JSON value to stdout
pub fn write_value(value: &Value) -> CliResult<()> {
    write_line(&mut io::stdout(), value)
}

fn write_line<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
