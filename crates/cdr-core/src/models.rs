use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Classification of a call by its `direction` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
    /// Any value other than exactly `"inbound"` or `"outbound"`.
    #[default]
    Unknown,
}

impl Direction {
    /// Classify a raw attribute value. Matching is exact and case-sensitive.
    ///
    /// ```
    /// use cdr_core::models::Direction;
    ///
    /// assert_eq!(Direction::from_attr("inbound"), Direction::Inbound);
    /// assert_eq!(Direction::from_attr("outbound"), Direction::Outbound);
    /// assert_eq!(Direction::from_attr("Inbound"), Direction::Unknown);
    /// assert_eq!(Direction::from_attr(""), Direction::Unknown);
    /// ```
    pub fn from_attr(value: &str) -> Self {
        match value {
            "inbound" => Direction::Inbound,
            "outbound" => Direction::Outbound,
            _ => Direction::Unknown,
        }
    }
}

/// The nested `<outboundDialString>` element of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialString {
    pub description: String,
    pub prefix: String,
}

/// One decoded `<session>` record.
///
/// Numeric fields are kept as the raw attribute text; parsing happens in the
/// worker so that a bad value never stops extraction. Missing attributes are
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub direction: Direction,
    /// Raw `direction` attribute, kept for diagnostics.
    pub direction_raw: String,
    /// `durationMinutes`
    pub duration: String,
    /// `transportCharges`
    pub transport: String,
    /// `totalCharges`
    pub total_charges: String,
    /// `platformRate`
    pub platform_rate: String,
    /// `transferCharges`
    pub transfer_charges: String,
    /// `recordingCharges`
    pub recording_charges: String,
    /// `conferencingCharges`
    pub conferencing_charges: String,
    /// `payphoneCharges`
    pub payphone_charges: String,
    /// Nested `<outboundDialString>`.
    pub dial_string: DialString,
}

/// Numeric contribution of a single record, one value per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Charges {
    pub duration: f64,
    pub transport: f64,
    pub total_charges: f64,
    pub platform_rate: f64,
    pub transfer: f64,
    pub recording: f64,
    pub conferencing: f64,
    pub payphone: f64,
}

/// The output of one worker: which bucket the record belongs to and what it
/// adds to that bucket.
///
/// A result carries a single [`Direction`], so it can never populate both the
/// inbound and the outbound side. `Unknown` results carry zero charges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialResult {
    pub direction: Direction,
    pub charges: Charges,
    /// Number of numeric fields that could not be parsed and fell back to `0.0`.
    pub invalid_fields: u32,
}

impl PartialResult {
    /// Number of calls this result adds to its bucket.
    pub fn call_increment(&self) -> u64 {
        match self.direction {
            Direction::Inbound | Direction::Outbound => 1,
            Direction::Unknown => 0,
        }
    }
}

/// An inbound/outbound pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Split<T = f64> {
    pub inbound: T,
    pub outbound: T,
}

impl<T: Copy + Add<Output = T>> Split<T> {
    /// Inbound plus outbound.
    pub fn total(&self) -> T {
        self.inbound + self.outbound
    }
}

impl<T: Copy + AddAssign> Split<T> {
    /// Add `value` to the side named by `direction`. `Unknown` is a no-op.
    pub fn add(&mut self, direction: Direction, value: T) {
        match direction {
            Direction::Inbound => self.inbound += value,
            Direction::Outbound => self.outbound += value,
            Direction::Unknown => {}
        }
    }
}

/// Aggregate of every merged [`PartialResult`].
///
/// Only the aggregator writes to this struct; it is read once the
/// aggregator has drained its input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub duration: Split,
    pub transport: Split,
    pub total_charges: Split,
    pub platform_rate: Split,
    pub transfer: Split,
    pub recording: Split,
    pub conferencing: Split,
    pub payphone: Split,
    pub calls: Split<u64>,
    /// Records merged, including those with an unknown direction.
    pub count: u64,
    /// Records merged whose direction was neither inbound nor outbound.
    pub excluded: u64,
    /// Numeric fields that fell back to `0.0`.
    pub invalid_fields: u64,
}

impl Totals {
    /// Category-wise addition of one record's contribution.
    pub fn merge(&mut self, result: &PartialResult) {
        let d = result.direction;
        let c = &result.charges;

        self.duration.add(d, c.duration);
        self.transport.add(d, c.transport);
        self.total_charges.add(d, c.total_charges);
        self.platform_rate.add(d, c.platform_rate);
        self.transfer.add(d, c.transfer);
        self.recording.add(d, c.recording);
        self.conferencing.add(d, c.conferencing);
        self.payphone.add(d, c.payphone);
        self.calls.add(d, result.call_increment());

        self.count += 1;
        if d == Direction::Unknown {
            self.excluded += 1;
        }
        self.invalid_fields += u64::from(result.invalid_fields);
    }

    /// False once any running sum has overflowed to infinity or NaN.
    pub fn all_finite(&self) -> bool {
        let itemized = self.itemized();
        [self.duration, self.total_charges]
            .iter()
            .chain(itemized.iter().map(|(_, split)| split))
            .all(|s| s.inbound.is_finite() && s.outbound.is_finite() && s.total().is_finite())
    }

    /// The itemized charge categories in report order.
    pub fn itemized(&self) -> [(&'static str, Split); 6] {
        [
            ("Transport", self.transport),
            ("Platform", self.platform_rate),
            ("Payphone", self.payphone),
            ("Transfer", self.transfer),
            ("Recording", self.recording),
            ("Conferencing", self.conferencing),
        ]
    }
}
