/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Replaces every character of `value` except the last `visible` ones with `*`.
///
/// Values no longer than `visible` are fully masked, so that short references never leak in full.
pub fn mask_tail(value: &str, visible: usize) -> String {
    let chars = value.chars().collect::<Vec<char>>();
    if chars.len() <= visible {
        return "*".repeat(chars.len());
    }
    let hidden = chars.len() - visible;
    let tail = chars[hidden..].iter().collect::<String>();
    format!("{}{tail}", "*".repeat(hidden))
}
