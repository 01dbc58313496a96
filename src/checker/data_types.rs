//! Per-field data-type validation
//!
//! Supplied parameter values are checked against their parameter's type and
//! reported under `parameters.Value`.

use tracing::debug;

use super::report::{DataTypeReport, FieldRef, TypeFailure};
use super::scan::Scan;
use crate::schema::{PARAMETERS_TABLE, PARAMETER_NAME_FIELD, PARAMETER_VALUE_FIELD};

pub(super) fn find(scan: &Scan<'_>) -> DataTypeReport {
    let mut report = DataTypeReport::default();

    for table in scan.tables() {
        if table.def.data_types.is_empty() {
            continue;
        }
        let rows = table.representatives();

        for (field, data_type) in &table.def.data_types {
            let Some(index) = table.index_of(field) else {
                continue;
            };

            let mut failure = TypeFailure::default();
            for row in &rows {
                let value = &row.values[index];
                if !data_type.accepts(value) {
                    failure.record(value, row.id.clone());
                }
            }

            debug!(
                table = table.name,
                field = field.as_str(),
                bad_values = failure.len(),
                "data type checked"
            );
            report.insert(FieldRef::new(table.name, field), failure);
        }
    }

    report.insert(
        FieldRef::new(PARAMETERS_TABLE, PARAMETER_VALUE_FIELD),
        parameter_failures(scan),
    );
    report
}

fn parameter_failures(scan: &Scan<'_>) -> TypeFailure {
    let mut failure = TypeFailure::default();
    let declared = &scan.schema().parameters;
    let Some(table) = scan.table(PARAMETERS_TABLE) else {
        return failure;
    };
    let (Some(name_at), Some(value_at)) = (
        table.index_of(PARAMETER_NAME_FIELD),
        table.index_of(PARAMETER_VALUE_FIELD),
    ) else {
        return failure;
    };

    for row in table.representatives() {
        let parameter = row.values[name_at]
            .as_text()
            .and_then(|name| declared.get(name));
        if let Some(parameter) = parameter {
            let value = &row.values[value_at];
            if !parameter.accepts(value) {
                failure.record(value, row.id.clone());
            }
        }
    }
    failure
}
