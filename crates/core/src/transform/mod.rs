//! Source classes to class-file trees.
//!
//! Accessible classes become full stubs ([`class::ClassTransformer`]),
//! referenced inaccessible ones become member-less skeletons
//! ([`skeleton::skeleton`]). Both share the access normalization below.

pub mod class;
pub mod hidden_api;
pub mod skeleton;

use apistub_classfile::{V1_8, V17};
use apistub_model::access::{self, ACC_DEPRECATED, ACC_INTERFACE, ACC_RECORD, ACC_SUPER};
use apistub_model::{Annotation, SourceClass, annotation};

use crate::error::Result;

/// Dex-only bits above the shared 16-bit range.
const DEX_ONLY_FLAGS: u32 = 0xffff_0000;

pub use class::ClassTransformer;
pub use skeleton::skeleton;

/// Output entry name for an internal class name.
pub fn entry_name(internal_name: &str) -> String {
    format!("{internal_name}.class")
}

/// Sets or clears the deprecated pseudo flag from the annotations alone.
pub fn with_deprecation(access_flags: u32, annotations: &[Annotation]) -> u32 {
    if annotation::is_deprecated(annotations) {
        access_flags | ACC_DEPRECATED
    } else {
        access_flags & !ACC_DEPRECATED
    }
}

/// Member access flags with dex-only bits removed and deprecation
/// recomputed.
pub fn member_access(access_flags: u32, annotations: &[Annotation]) -> u32 {
    with_deprecation(access_flags & !DEX_ONLY_FLAGS, annotations)
}

pub fn class_access(class: &SourceClass) -> u32 {
    let mut access_flags = class.access_flags & !DEX_ONLY_FLAGS;
    if access_flags & ACC_INTERFACE == 0 {
        access_flags |= ACC_SUPER;
    }
    if annotation::is_record(&class.annotations) {
        access_flags |= ACC_RECORD;
    }
    with_deprecation(access_flags, &class.annotations)
}

pub fn class_version(access_flags: u32) -> u16 {
    if access_flags & ACC_RECORD != 0 { V17 } else { V1_8 }
}

/// True when the class is a nested class whose own inner-class flags make it
/// inaccessible. Such classes are never emitted.
pub fn is_hidden_nested(class: &SourceClass) -> Result<bool> {
    Ok(class
        .inner_class_record()?
        .is_some_and(|record| access::is_inaccessible(record.access_flags)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apistub_model::access::{ACC_ABSTRACT, ACC_PUBLIC, ACC_STATIC};
    use apistub_model::annotation::{DEPRECATED, INNER_CLASS, RECORD};
    use apistub_model::{AnnotationElement, EncodedValue, Visibility};

    #[test]
    fn test_class_access_normalization() {
        let mut class = SourceClass::new("Lpkg/Point;", ACC_PUBLIC | ACC_DEPRECATED);
        assert_eq!(class_access(&class), ACC_PUBLIC | ACC_SUPER);

        class
            .annotations
            .push(Annotation::new(Visibility::Runtime, DEPRECATED, vec![]));
        class
            .annotations
            .push(Annotation::new(Visibility::System, RECORD, vec![]));
        let access_flags = class_access(&class);
        assert_eq!(
            access_flags,
            ACC_PUBLIC | ACC_SUPER | ACC_RECORD | ACC_DEPRECATED
        );
        assert_eq!(class_version(access_flags), V17);

        let interface = SourceClass::new("Lpkg/Api;", ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT);
        let access_flags = class_access(&interface);
        assert_eq!(access_flags & ACC_SUPER, 0);
        assert_eq!(class_version(access_flags), V1_8);
    }

    #[test]
    fn test_member_access_drops_dex_bits() {
        // constructor bit collides with the record pseudo flag
        let access_flags = member_access(ACC_PUBLIC | 0x1_0000, &[]);
        assert_eq!(access_flags, ACC_PUBLIC);
    }

    #[test]
    fn test_hidden_nested_class() {
        let mut class = SourceClass::new("Lpkg/Outer$Impl;", ACC_PUBLIC);
        assert!(!is_hidden_nested(&class).unwrap());

        class.annotations.push(Annotation::new(
            Visibility::System,
            INNER_CLASS,
            vec![
                AnnotationElement::new("accessFlags", EncodedValue::Int(ACC_STATIC as i32)),
                AnnotationElement::new("name", EncodedValue::String("Impl".into())),
            ],
        ));
        assert!(is_hidden_nested(&class).unwrap());
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name("android/view/View$OnClickListener"), "android/view/View$OnClickListener.class");
    }
}
