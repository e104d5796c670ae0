/// Fallback duration estimate for recordings without a stored duration:
/// seconds ≈ file size / this divisor. A crude linear heuristic, kept on
/// purpose instead of a real WEBM decode.
pub const RECORDING_ESTIMATE_BYTES_PER_SECOND: u64 = 10_000;

/// How many 1 ms timestamp bumps to try before giving up on a free filename.
pub const ID_ALLOC_RETRY_LIMIT: u32 = 64;
