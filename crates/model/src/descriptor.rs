//! Helpers for dex type descriptors (`Ljava/lang/Object;`, `[I`, `J`, ...).

use crate::error::{ModelError, Result};

pub const OBJECT: &str = "Ljava/lang/Object;";
pub const STRING: &str = "Ljava/lang/String;";
pub const VOID: &str = "V";

/// Converts a reference descriptor to its class-file internal name.
///
/// `Lfoo/Bar;` becomes `foo/Bar`. Array descriptors are already valid
/// internal names for class constants and are returned unchanged.
pub fn internal_name(descriptor: &str) -> &str {
    descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .unwrap_or(descriptor)
}

/// Converts an internal name back to a reference descriptor.
pub fn from_internal_name(internal: &str) -> String {
    if internal.starts_with('[') {
        internal.to_string()
    } else {
        format!("L{};", internal)
    }
}

/// Strips array dimensions, returning the element type descriptor.
pub fn component_type(descriptor: &str) -> &str {
    descriptor.trim_start_matches('[')
}

/// True for `L...;` descriptors and arrays of them.
pub fn is_reference(descriptor: &str) -> bool {
    component_type(descriptor).starts_with('L')
}

/// Number of local slots a value of this type occupies.
pub fn slot_width(descriptor: &str) -> u16 {
    match descriptor.as_bytes().first() {
        Some(b'J') | Some(b'D') => 2,
        _ => 1,
    }
}

pub fn method_descriptor<S: AsRef<str>>(parameter_types: &[S], return_type: &str) -> String {
    let mut descriptor = String::from("(");
    for parameter in parameter_types {
        descriptor.push_str(parameter.as_ref());
    }
    descriptor.push(')');
    descriptor.push_str(return_type);
    descriptor
}

/// Name of the outermost class of a nested type: everything up to the first
/// `$` that follows the package separator.
///
/// `android/view/View$OnClickListener` yields `android/view/View`.
pub fn outer_name(internal: &str) -> Option<&str> {
    let package_end = internal.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    internal[package_end..]
        .find('$')
        .map(|idx| &internal[..package_end + idx])
}

/// Checks that `descriptor` is a single well-formed field type.
pub fn validate(descriptor: &str) -> Result<()> {
    let element = component_type(descriptor);
    let valid = match element.as_bytes().first() {
        Some(b'Z' | b'B' | b'S' | b'C' | b'I' | b'J' | b'F' | b'D') => element.len() == 1,
        Some(b'L') => element.len() > 2 && element.ends_with(';'),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ModelError::MalformedDescriptor(descriptor.to_string()))
    }
}
