//! Yes/no confirmation on the terminal.

use std::io::{BufRead, Write};

/// Ask `msg` and read one line. Accepts yes/y/1/yeah and no/n/0/nah in any
/// case; anything else, including EOF or a read error, yields `default`.
pub fn ask_yes_no<R: BufRead, W: Write>(
    msg: &str,
    default: bool,
    input: &mut R,
    output: &mut W,
) -> bool {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    if write!(output, "{} {}: ", msg, hint).and_then(|_| output.flush()).is_err() {
        return default;
    }
    let mut line = String::new();
    if input.read_line(&mut line).is_err() {
        return default;
    }
    match line.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "1" | "yeah" => true,
        "no" | "n" | "0" | "nah" => false,
        _ => default,
    }
}
