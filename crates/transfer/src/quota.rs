//! Quota bookkeeping for a single transfer.
//!
//! Pure arithmetic; the orchestrator calls [`decide`] once per chunk before
//! issuing the write.

/// How much of a chunk may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    /// Bytes to write, never more than the chunk length.
    pub bytes_to_write: usize,
    /// The chunk did not fit in the remaining quota. The allowed prefix is
    /// still written before the transfer fails.
    pub exceeded: bool,
}

impl QuotaDecision {
    pub(crate) fn unlimited(chunk_len: usize) -> Self {
        Self {
            bytes_to_write: chunk_len,
            exceeded: false,
        }
    }
}

/// Computes `ceiling - (baseline + written)` and truncates the chunk to it.
///
/// A non-positive remainder yields `(0, exceeded)`.
pub fn decide(ceiling: i64, baseline: i64, written: u64, chunk_len: usize) -> QuotaDecision {
    let written = i64::try_from(written).unwrap_or(i64::MAX);
    let remaining = ceiling.saturating_sub(baseline.saturating_add(written));
    if remaining <= 0 {
        return QuotaDecision {
            bytes_to_write: 0,
            exceeded: true,
        };
    }

    // remaining > 0 here, so the cast is lossless.
    let remaining = remaining as u64;
    if remaining < chunk_len as u64 {
        QuotaDecision {
            // remaining < chunk_len, so it fits in usize.
            bytes_to_write: remaining as usize,
            exceeded: true,
        }
    } else {
        QuotaDecision {
            bytes_to_write: chunk_len,
            exceeded: false,
        }
    }
}
