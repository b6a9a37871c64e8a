use sha2::{Digest, Sha256};

/// Ceiling on derived folder and file names, in bytes.
pub const NAME_MAX_LEN: usize = 127;

/// Derives a filesystem-safe folder or file name from an arbitrary hint
/// string (usually a URL). Path-structural characters are replaced with
/// underscores; names at or above [`NAME_MAX_LEN`] are truncated and
/// suffixed with the digest of the pre-truncation name, so distinct
/// inputs keep distinct, stable names across runs.
pub fn derived_name(hint: &str) -> String {
    let sanitized: String = hint
        .chars()
        .map(|c| if matches!(c, ':' | '/' | '#') { '_' } else { c })
        .collect();
    shorten(sanitized)
}

fn shorten(name: String) -> String {
    if name.len() < NAME_MAX_LEN {
        return name;
    }
    let digest = hex_digest(&name);
    let mut cut = NAME_MAX_LEN - digest.len();
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &name[..cut], digest)
}

fn hex_digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
