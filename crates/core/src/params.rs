//! Parameter slot layout and debug-info name recovery.

use std::collections::BTreeMap;

use apistub_model::{Annotation, LocalStart, SourceMethod, descriptor};

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord<'a> {
    /// Local variable slot in the emitted method.
    pub slot: u16,
    pub name: Option<String>,
    pub parameter_type: &'a str,
    pub signature: Option<String>,
    pub annotations: &'a [Annotation],
    /// Distance of the parameter's first register from the end of the
    /// register window. Only meaningful during recovery.
    register_id: u16,
}

/// Lays out the parameters of `method`, recovering missing names from the
/// local-variable debug entries when possible.
pub fn parameter_records(method: &SourceMethod) -> Vec<ParameterRecord<'_>> {
    let mut slot = if method.is_static() { 0 } else { 1 };
    let mut records: Vec<ParameterRecord<'_>> = method
        .parameters
        .iter()
        .map(|parameter| {
            let record = ParameterRecord {
                slot,
                name: parameter.name.clone(),
                parameter_type: &parameter.parameter_type,
                signature: parameter.signature.clone(),
                annotations: &parameter.annotations,
                register_id: 0,
            };
            slot += descriptor::slot_width(&parameter.parameter_type);
            record
        })
        .collect();

    let needs_recovery = records.iter().any(|record| record.name.is_none());
    if !needs_recovery || method.is_abstract() {
        return records;
    }
    let Some(implementation) = &method.implementation else {
        return records;
    };

    let mut register_id = 0;
    for record in records.iter_mut().rev() {
        register_id += descriptor::slot_width(record.parameter_type);
        record.register_id = register_id;
    }
    recover_names(&mut records, implementation.register_count, &implementation.locals);
    records
}

/// Tries each group of local starts sharing a code address, earliest first,
/// and keeps the first group that names every nameless parameter.
fn recover_names(records: &mut [ParameterRecord<'_>], register_count: u16, locals: &[LocalStart]) {
    let mut groups: BTreeMap<u32, Vec<&LocalStart>> = BTreeMap::new();
    for local in locals {
        groups.entry(local.address).or_default().push(local);
    }

    for group in groups.values() {
        let mut found = Vec::new();
        let resolved = records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.name.is_none())
            .all(|(index, record)| match find_local(record, register_count, group) {
                Some(local) => {
                    found.push((index, local));
                    true
                }
                None => false,
            });
        if !resolved {
            continue;
        }
        for (index, local) in found {
            records[index].name = local.name.clone();
            records[index].signature = local.signature.clone();
        }
        return;
    }
}

fn find_local<'l>(
    record: &ParameterRecord<'_>,
    register_count: u16,
    group: &[&'l LocalStart],
) -> Option<&'l LocalStart> {
    group.iter().copied().find(|local| {
        local.name.is_some()
            && register_count.checked_sub(local.register) == Some(record.register_id)
            && local.local_type.as_deref() == Some(record.parameter_type)
    })
}

/// First free local slot after `this` and the parameters.
pub fn max_locals(method: &SourceMethod) -> u16 {
    let receiver = if method.is_static() { 0 } else { 1 };
    receiver
        + method
            .parameter_types()
            .map(descriptor::slot_width)
            .sum::<u16>()
}
