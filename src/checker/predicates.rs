//! Row predicate evaluation

use tracing::debug;

use super::report::{PredicateFailure, PredicateRef, RowPredicateReport};
use super::scan::Scan;
use crate::schema::{FailureResponse, PredicateOutcome, Triviality};

pub(super) fn find(scan: &Scan<'_>) -> RowPredicateReport {
    let mut report = RowPredicateReport::default();

    for table in scan.tables() {
        if table.def.predicates.is_empty() {
            continue;
        }
        let rows = table.representatives();

        for predicate in &table.def.predicates {
            if predicate.triviality() != Triviality::Evaluated {
                debug!(
                    table = table.name,
                    predicate = predicate.name.as_str(),
                    "trivial predicate skipped"
                );
                continue;
            }

            let mut failure = PredicateFailure::default();
            for row in &rows {
                let view = table.view(row).with_parameters(scan.parameters());
                if let PredicateOutcome::Rejected { message } = predicate.evaluate(&view) {
                    let message = match predicate.failure_response {
                        FailureResponse::ErrorMessage => message,
                        FailureResponse::Boolean => None,
                    };
                    failure.record(row.id.clone(), message);
                }
            }

            debug!(
                table = table.name,
                predicate = predicate.name.as_str(),
                failures = failure.len(),
                "predicate evaluated"
            );
            report.insert(PredicateRef::new(table.name, &predicate.name), failure);
        }
    }

    report
}
