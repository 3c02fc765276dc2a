//! The two totals reports and their JSON form.

use cdr_core::formatting::{
    format_amount, format_count, format_currency, format_minutes, NOT_A_NUMBER,
};
use cdr_core::models::Totals;
use cdr_core::Result;
use cdr_runtime::pipeline::{PipelineOutcome, RunMetadata};
use serde::Serialize;

use crate::table_view::TextTable;

const HEADER: [&str; 4] = ["Category", "Inbound", "Outbound", "Total"];

/// Call counts and duration.
pub fn summary_table(totals: &Totals) -> TextTable {
    TextTable::new(HEADER)
        .row([
            "CDR Counts".to_string(),
            format_count(totals.calls.inbound),
            format_count(totals.calls.outbound),
            format_count(totals.count),
        ])
        .row([
            "Duration (Minutes)".to_string(),
            format_minutes(totals.duration.inbound),
            format_minutes(totals.duration.outbound),
            format_minutes(totals.duration.total()),
        ])
}

/// Itemized charges with a total-charges footer.
pub fn itemized_table(totals: &Totals) -> TextTable {
    let table = totals
        .itemized()
        .into_iter()
        .fold(TextTable::new(HEADER), |table, (label, split)| {
            table.row([
                label.to_string(),
                format_amount(split.inbound),
                format_amount(split.outbound),
                format_amount(split.total()),
            ])
        });

    table.footer([
        "Total Charges".to_string(),
        format_currency(totals.total_charges.inbound),
        format_currency(totals.total_charges.outbound),
        format_currency(totals.total_charges.total()),
    ])
}

/// Notes about records or fields that did not contribute to the buckets.
pub fn notes(totals: &Totals) -> Vec<String> {
    let mut notes = Vec::new();
    if totals.excluded > 0 {
        notes.push(format!(
            "Note: {} record(s) had an unrecognised direction and are excluded from the inbound/outbound columns.",
            format_count(totals.excluded)
        ));
    }
    if !totals.all_finite() {
        notes.push(format!(
            "Note: one or more totals overflowed and are shown as {NOT_A_NUMBER}."
        ));
    }
    if totals.invalid_fields > 0 {
        notes.push(format!(
            "Note: {} numeric field(s) could not be parsed and were counted as 0.",
            format_count(totals.invalid_fields)
        ));
    }
    notes
}

/// Both tables followed by any notes.
pub fn render_text(totals: &Totals) -> String {
    let mut out = summary_table(totals).render();
    out.push_str(&itemized_table(totals).render());
    for note in notes(totals) {
        out.push_str(&note);
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    totals: &'a Totals,
    metadata: &'a RunMetadata,
}

/// Totals and run metadata as pretty-printed JSON.
pub fn render_json(outcome: &PipelineOutcome) -> Result<String> {
    let report = JsonReport {
        totals: &outcome.totals,
        metadata: &outcome.metadata,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
