use tracing::debug;

use crate::models::{Charges, Direction, PartialResult, Session};

// ── Field parsing ─────────────────────────────────────────────────────────────

/// Outcome of parsing one raw numeric attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    /// The attribute was absent or empty.
    Missing,
    /// The attribute parsed to a finite number.
    Parsed(f64),
    /// The attribute was present but not a finite number.
    Invalid,
}

impl Amount {
    /// Parse a raw attribute value exactly as written (no trimming).
    ///
    /// ```
    /// use cdr_core::calculations::Amount;
    ///
    /// assert_eq!(Amount::parse("1.50"), Amount::Parsed(1.5));
    /// assert_eq!(Amount::parse(""), Amount::Missing);
    /// assert_eq!(Amount::parse("n/a"), Amount::Invalid);
    /// assert_eq!(Amount::parse("NaN"), Amount::Invalid);
    /// ```
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Amount::Missing;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Amount::Parsed(v),
            _ => Amount::Invalid,
        }
    }

    /// The numeric value, with `0.0` standing in for missing or invalid input.
    pub fn value(self) -> f64 {
        match self {
            Amount::Parsed(v) => v,
            Amount::Missing | Amount::Invalid => 0.0,
        }
    }
}

// ── Worker computation ────────────────────────────────────────────────────────

/// Compute the contribution of one session.
///
/// Every numeric field is parsed leniently: a value that does not parse
/// contributes `0.0` and is counted in [`PartialResult::invalid_fields`].
/// Sessions with an [`Direction::Unknown`] direction produce a result with
/// zero charges and no call increment.
pub fn compute(session: Session) -> PartialResult {
    let mut invalid_fields = 0u32;
    let mut field = |name: &str, raw: &str| -> f64 {
        let amount = Amount::parse(raw);
        if amount == Amount::Invalid {
            invalid_fields += 1;
            debug!(field = name, value = raw, "unparseable numeric field, using 0.0");
        }
        amount.value()
    };

    let charges = Charges {
        duration: field("durationMinutes", &session.duration),
        transport: field("transportCharges", &session.transport),
        total_charges: field("totalCharges", &session.total_charges),
        platform_rate: field("platformRate", &session.platform_rate),
        transfer: field("transferCharges", &session.transfer_charges),
        recording: field("recordingCharges", &session.recording_charges),
        conferencing: field("conferencingCharges", &session.conferencing_charges),
        payphone: field("payphoneCharges", &session.payphone_charges),
    };

    let charges = match session.direction {
        Direction::Inbound | Direction::Outbound => charges,
        Direction::Unknown => {
            debug!(
                direction = %session.direction_raw,
                "session with unrecognised direction excluded from totals"
            );
            Charges::default()
        }
    };

    PartialResult {
        direction: session.direction,
        charges,
        invalid_fields,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
