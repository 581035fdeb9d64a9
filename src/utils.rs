use std::time::Duration;

pub fn to_millis(duration: Duration) -> u64 {
    (duration.as_secs() * 1_000) + (duration.subsec_nanos() / 1_000_000) as u64
}

/// Splits `len` elements into at most `num_parts` contiguous chunks of near equal size.
pub fn chunk_size(len: usize, num_parts: usize) -> usize {
    let num_parts = num_parts.max(1);
    ((len + num_parts - 1) / num_parts).max(1)
}
