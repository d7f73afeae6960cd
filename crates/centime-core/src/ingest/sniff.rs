//! Delimiter detection for statement exports
//!
//! Banks export "CSV" with whatever separator their locale fancies. The
//! sniffer counts candidate bytes in a short sample and picks the most
//! frequent one. Best effort: a quoted field full of semicolons can fool it.

/// Candidate separators, in tie-break priority order
const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// How much of the file the sniffer looks at
pub const SNIFF_SAMPLE_LEN: usize = 1024;

/// Infer the field separator from a raw sample
///
/// Returns the candidate with the highest occurrence count in the first
/// `SNIFF_SAMPLE_LEN` bytes. Ties go to the earlier candidate; an empty
/// sample deterministically yields a comma. Never fails.
pub fn sniff_delimiter(data: &[u8]) -> u8 {
    let sample = &data[..data.len().min(SNIFF_SAMPLE_LEN)];

    let mut best = CANDIDATES[0];
    let mut best_count = 0usize;
    for candidate in CANDIDATES {
        let count = sample.iter().filter(|&&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}
