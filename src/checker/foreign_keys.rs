//! Foreign-key reference checking
//!
//! The parent side is every row of the foreign table; the child side is the
//! first row per primary key of the native table. Child tuples holding a
//! null in any mapped field are not checked.

use std::collections::HashSet;

use tracing::debug;

use super::integrity::Verbosity;
use super::report::{ForeignKeyFailure, ForeignKeyReport};
use super::scan::{Scan, ScannedTable};
use crate::schema::ForeignKey;

pub(super) fn find(scan: &Scan<'_>, links: &[ForeignKey], verbosity: Verbosity) -> ForeignKeyReport {
    let mut report = ForeignKeyReport::default();

    for link in links {
        let (Some(native), Some(foreign)) =
            (scan.table(&link.native_table), scan.table(&link.foreign_table))
        else {
            continue;
        };
        let Some(native_positions) = positions(native, link.native_fields()) else {
            continue;
        };
        let Some(foreign_positions) = positions(foreign, link.foreign_fields()) else {
            continue;
        };

        let parents: HashSet<_> = foreign
            .rows
            .iter()
            .map(|row| foreign.project(row, &foreign_positions))
            .collect();

        let mut failure = ForeignKeyFailure::default();
        for row in native.representatives() {
            let value = native.project(row, &native_positions);
            if value.has_null() || parents.contains(&value) {
                continue;
            }
            let contents = match verbosity {
                Verbosity::High => Some(native.to_row(row)),
                Verbosity::Low => None,
            };
            failure.record(value, row.id.clone(), contents);
        }

        debug!(
            link = %link,
            parent_values = parents.len(),
            missing_values = failure.len(),
            "foreign key checked"
        );
        report.insert(link.clone(), failure);
    }

    report
}

fn positions<'f>(table: &ScannedTable<'_>, fields: impl Iterator<Item = &'f str>) -> Option<Vec<usize>> {
    fields.map(|f| table.index_of(f)).collect()
}
