//! Entity extraction
//!
//! Fixed lexical shapes only; any match is accepted as-is, with no
//! check-digit validation. Matches are upper-cased on output.

use crate::state::{ExtractedEntities, RequestState};
use once_cell::sync::Lazy;
use regex::Regex;

// Container: 4 letters + 7 digits (e.g. ABCD1234567)
static CONTAINER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z]{4}\d{7}\b").expect("container pattern compiles"));

// Purchase order: PO prefix + 5-10 digits
static PURCHASE_ORDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPO\d{5,10}\b").expect("po pattern compiles"));

// Bill of lading: OBL prefix + 5-12 alphanumerics
static BILL_OF_LADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bOBL[a-zA-Z0-9]{5,12}\b").expect("obl pattern compiles"));

fn matches_upper(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .find_iter(text)
        .map(|m| m.as_str().to_uppercase())
        .collect()
}

/// Pull container, purchase-order, and bill-of-lading codes out of the
/// normalized question. All three kinds are always present in the result.
#[must_use]
pub fn extract(mut state: RequestState) -> RequestState {
    let text = state.effective_question().to_string();

    let entities = ExtractedEntities {
        containers: matches_upper(&CONTAINER, &text),
        purchase_orders: matches_upper(&PURCHASE_ORDER, &text),
        bills_of_lading: matches_upper(&BILL_OF_LADING, &text),
    };

    let count = entities.containers.len()
        + entities.purchase_orders.len()
        + entities.bills_of_lading.len();
    tracing::debug!(count, "extracted entities");

    state.entities = entities;
    state
}
