// src/core/diff.rs

/// Returns the zero-based byte index at which two hex digests first diverge.
///
/// Hex characters are compared pairwise over the common length. When one
/// digest is a prefix of the other the first extra byte is reported. Two
/// identical digests yield `None`.
pub fn first_divergent_byte(hex_a: &str, hex_b: &str) -> Option<usize> {
    let a = hex_a.as_bytes();
    let b = hex_b.as_bytes();
    let common = a.len().min(b.len());

    if let Some(pos) = a[..common].iter().zip(&b[..common]).position(|(x, y)| x != y) {
        return Some(pos / 2);
    }
    if a.len() != b.len() {
        return Some(common / 2);
    }
    None
}
