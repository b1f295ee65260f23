//! Serialized command-line length, as counted against the platform ceiling.
//!
//! Lengths are UTF-16 code units (the unit of the Windows limit). Arguments are
//! joined by one space; an argument that is empty or contains whitespace or a
//! double quote is counted with surrounding quotes. Inside quotes each `"`
//! gets a backslash, and backslashes that end up before a `"` (including the
//! closing one) are doubled.

use std::path::Path;

/// Length of one argument once quoted for a command line.
pub fn arg_len(arg: &str) -> usize {
    let base = arg.encode_utf16().count();
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        return base;
    }
    let mut escapes = 0;
    let mut backslashes = 0;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                escapes += backslashes + 1;
                backslashes = 0;
            }
            _ => backslashes = 0,
        }
    }
    // Trailing run sits before the closing quote.
    base + 2 + escapes + backslashes
}

/// Length of `program arg1 arg2 ...`.
pub fn command_len<S: AsRef<str>>(program: &Path, args: &[S]) -> usize {
    let program = program.to_string_lossy();
    args.iter()
        .fold(arg_len(&program), |acc, a| acc + 1 + arg_len(a.as_ref()))
}
