//! Invoice number sequencing.
//!
//! Invoice numbers have the form `INV-<year>-<4-digit-sequence>`, e.g.
//! `INV-2026-0001`. Sequences are per owner per year and derived from
//! the greatest existing number, so deleted invoices leave gaps rather
//! than being reused. The allocator in the db layer owns the lookup and
//! retry loop; the parsing and formatting rules live here.

/// Maximum allocation attempts before falling back to a
/// timestamp-derived suffix.
pub const MAX_NUMBER_ATTEMPTS: u32 = 100;

/// Returns the invoice number prefix for a year, e.g. `INV-2026-`.
#[must_use]
pub fn prefix_for_year(year: i32) -> String {
    format!("INV-{year}-")
}

/// Formats an invoice number from a year and sequence.
///
/// The sequence is zero-padded to 4 digits; wider sequences print
/// unpadded.
#[must_use]
pub fn format_number(year: i32, sequence: u32) -> String {
    format!("INV-{year}-{sequence:04}")
}

/// Parses the sequence suffix out of an invoice number.
///
/// Returns `None` for anything that does not look like
/// `INV-<year>-<digits>`.
#[must_use]
pub fn parse_sequence(number: &str) -> Option<u32> {
    let mut parts = number.split('-');
    if parts.next() != Some("INV") {
        return None;
    }
    let year = parts.next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sequence = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    sequence.parse().ok()
}

/// Computes the next sequence from the greatest existing number.
///
/// A missing or unparseable last number starts the sequence at 1.
#[must_use]
pub fn next_sequence(last_number: Option<&str>) -> u32 {
    last_number
        .and_then(parse_sequence)
        .map_or(1, |seq| seq + 1)
}

/// Builds the timestamp-fallback number used once retries exhaust.
///
/// Takes the last 4 digits of a unix-millisecond timestamp. This
/// sacrifices dense sequencing for liveness; callers tolerate gaps.
#[must_use]
pub fn fallback_number(year: i32, unix_millis: i64) -> String {
    let digits = unix_millis.unsigned_abs() % 10_000;
    format!("INV-{year}-{digits:04}")
}
