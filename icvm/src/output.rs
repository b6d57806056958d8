//! Rendering VM output values for the terminal

use num_traits::ToPrimitive;

use crate::constants::ASCII_MAX;
use crate::word::Word;

/// Render one output value. In ASCII mode values in `0..=127` become their
/// character; anything larger (typically a final numeric answer) is printed
/// as a number on its own line.
pub fn render_value(value: &Word, ascii: bool) -> String {
    match value.to_u8() {
        Some(byte) if ascii && i64::from(byte) <= ASCII_MAX => char::from(byte).to_string(),
        _ => format!("{value}\n"),
    }
}

/// Render a sequence of output values
pub fn render_values(values: &[Word], ascii: bool) -> String {
    values.iter().map(|v| render_value(v, ascii)).collect()
}

/// Expand `\n`, `\r` and `\t` escapes in text typed on the command line
pub fn unescape_text(text: &str) -> String {
    text.replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
}
