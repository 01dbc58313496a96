//! Duplicate primary-key detection

use std::collections::BTreeMap;

use tracing::debug;

use super::report::DuplicateReport;
use super::scan::Scan;
use crate::data::{KeyTuple, RowId};

pub(super) fn find(scan: &Scan<'_>) -> DuplicateReport {
    let mut report = DuplicateReport::default();

    for table in scan.tables().filter(|t| t.def.is_keyed()) {
        let mut counts: BTreeMap<&KeyTuple, usize> = BTreeMap::new();
        for row in &table.rows {
            if let RowId::Key(key) = &row.id {
                *counts.entry(key).or_default() += 1;
            }
        }

        let duplicates: BTreeMap<KeyTuple, usize> = counts
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(key, count)| (key.clone(), count))
            .collect();

        debug!(
            table = table.name,
            rows = table.rows.len(),
            duplicated_keys = duplicates.len(),
            "duplicates scanned"
        );
        report.insert(table.name, duplicates);
    }

    report
}
