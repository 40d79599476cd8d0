//! Shared text-decoding helper for the indexer and reconciler (§4.1).

/// Attempts an encoding cascade on file bytes; `None` means binary. Any non-null-byte
/// content always decodes — UTF-8 first, then a byte-as-char fallback — so the same file
/// is never "supported" on one run and "unsupported" on the next.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    let probe_len = bytes.len().min(512);
    if bytes[..probe_len].contains(&0) {
        return None;
    }
    String::from_utf8(bytes.to_vec())
        .ok()
        .or_else(|| Some(bytes.iter().map(|&b| b as char).collect()))
}
