//! When to pass a reply through the humanizer.

use super::dispatch::{DispatchOutcome, Status};
use super::Processor;
use cuentas_core::intent::ClassifiedIntent;
use tracing::{debug, warn};

/// Phrases showing the user asked for a narrower view than the full report.
const NARROWING_KEYWORDS: &[&str] = &["solo", "sólo", "únicamente", "unicamente", "en la categoría"];

impl Processor {
    /// Rewrite the reply when policy allows; on any failure keep the original.
    pub(super) async fn maybe_humanize(
        &self,
        query: &str,
        intents: &[ClassifiedIntent],
        outcome: DispatchOutcome,
    ) -> DispatchOutcome {
        let Some(humanizer) = self.humanizer.as_ref() else {
            return outcome;
        };
        if !should_humanize(query, intents, &outcome, self.config.humanizer.min_length) {
            return outcome;
        }
        let kind = intents[0].kind;
        match humanizer.humanize(&outcome.text, query, kind).await {
            Ok(text) => {
                debug!("humanized {kind} reply ({} chars)", text.chars().count());
                DispatchOutcome { text, ..outcome }
            }
            Err(e) => {
                warn!("humanizer failed, keeping raw reply: {e}");
                outcome
            }
        }
    }
}

/// Only long, successful replies to a single unfiltered read-heavy query.
pub(super) fn should_humanize(
    query: &str,
    intents: &[ClassifiedIntent],
    outcome: &DispatchOutcome,
    min_length: usize,
) -> bool {
    let [intent] = intents else {
        return false;
    };
    if !intent.kind.is_read_heavy() || outcome.status != Status::Completed {
        return false;
    }
    if outcome.text.chars().count() <= min_length {
        return false;
    }
    if intent.category.is_some() || intent.query.is_some() || intent.transaction_type.is_some() {
        return false;
    }
    let lowered = query.to_lowercase();
    !NARROWING_KEYWORDS.iter().any(|k| lowered.contains(k))
}
