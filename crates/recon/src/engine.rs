use serde::Serialize;

use crate::anomaly::detect_anomalies;
use crate::matcher::pair_documents;
use crate::model::{PairingOutput, Record, SequenceResult, Warning};
use crate::sequence::sort_documents;

/// Reconciliation stage, reported before the stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pairing,
    Sorting,
    Detecting,
}

/// Everything derived from one record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub pairing: PairingOutput,
    pub sequence: SequenceResult,
    pub warnings: Vec<Warning>,
}

/// Run matching → sequencing → anomaly detection over the full record set.
pub fn reconcile(records: &[Record]) -> Reconciliation {
    reconcile_with(records, |_| {})
}

/// Like [`reconcile`], calling `on_stage` at each stage boundary.
pub fn reconcile_with(records: &[Record], mut on_stage: impl FnMut(Stage)) -> Reconciliation {
    on_stage(Stage::Pairing);
    let pairing = pair_documents(records);

    on_stage(Stage::Sorting);
    let sequence = sort_documents(records, &pairing.pairs);

    on_stage(Stage::Detecting);
    let warnings = detect_anomalies(records, Some(&pairing.pairs));

    Reconciliation {
        pairing,
        sequence,
        warnings,
    }
}
