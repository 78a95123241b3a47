//! Four-character plugin ids.

/// Packs a four-character id such as `"ABCD"` into its big-endian `u32`.
///
/// Anything other than exactly four bytes yields 0.
pub fn id_from_str(id: &str) -> u32 {
    match <[u8; 4]>::try_from(id.as_bytes()) {
        Ok(bytes) => u32::from_be_bytes(bytes),
        Err(_) => 0,
    }
}

/// Inverse of [`id_from_str`]. Non-printable bytes are shown as `.`.
pub fn id_to_string(id: u32) -> String {
    id.to_be_bytes()
        .iter()
        .map(|b| {
            if b.is_ascii_graphic() || *b == b' ' {
                *b as char
            } else {
                '.'
            }
        })
        .collect()
}

/// Splits `"Name:ABCD"` into the module name and its shell sub-id.
///
/// The suffix is only taken when it is exactly four characters, so drive
/// letters and paths containing colons pass through untouched.
pub fn split_shell_id(name: &str) -> (&str, Option<u32>) {
    match name.rsplit_once(':') {
        Some((module, sub_id))
            if !module.is_empty()
                && sub_id.len() == 4
                && !sub_id.contains(['/', '\\']) =>
        {
            (module, Some(id_from_str(sub_id)))
        }
        _ => (name, None),
    }
}
