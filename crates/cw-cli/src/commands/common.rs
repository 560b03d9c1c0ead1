//! Helpers shared by command implementations

use anyhow::Result;
use serde::Serialize;
use std::fmt;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and the connection is closed properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main never prints it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Pretty-print `value` as JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `"1 table"` / `"3 tables"`
pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "version"), "1 version");
        assert_eq!(plural(0, "version"), "0 versions");
        assert_eq!(plural(16, "version"), "16 versions");
    }

    #[test]
    fn exit_code_has_no_message() {
        let err: anyhow::Error = ExitCode(1).into();
        assert_eq!(err.to_string(), "");
        assert_eq!(err.downcast_ref::<ExitCode>().map(|c| c.0), Some(1));
    }
}
