//! Stub method bodies.

use apistub_classfile::{Code, Insn, Instruction, LocalVariableNode};
use apistub_model::descriptor::{self, OBJECT};
use apistub_model::{SourceClass, SourceMethod};

use crate::params::{self, ParameterRecord};

pub const STUB_EXCEPTION: &str = "java/lang/RuntimeException";
pub const STUB_MESSAGE: &str = "Stub!";

/// Instructions returning the zero value of `return_type`, and the stack
/// depth they need.
pub fn zero_return(return_type: &str) -> (Vec<Insn>, u16) {
    let (constant, ret, max_stack) = match return_type.as_bytes().first() {
        Some(b'Z' | b'B' | b'S' | b'C' | b'I') => (Instruction::Iconst_0, Instruction::Ireturn, 1),
        Some(b'F') => (Instruction::Fconst_0, Instruction::Freturn, 1),
        Some(b'J') => (Instruction::Lconst_0, Instruction::Lreturn, 2),
        Some(b'D') => (Instruction::Dconst_0, Instruction::Dreturn, 2),
        Some(b'V') => return (vec![Insn::Simple(Instruction::Return)], 0),
        _ => (Instruction::Aconst_null, Instruction::Areturn, 1),
    };
    (vec![Insn::Simple(constant), Insn::Simple(ret)], max_stack)
}

/// Superclass whose no-arg constructor a stub constructor of `method` calls,
/// if it gets such a body.
fn chained_superclass<'c>(class: &'c SourceClass, method: &SourceMethod) -> Option<&'c str> {
    if method.name != "<init>"
        || method.is_static()
        || method.return_type != descriptor::VOID
        || method.defining_class == OBJECT
    {
        return None;
    }
    class.superclass.as_deref().map(descriptor::internal_name)
}

/// Body for an emitted method that had an implementation.
pub fn stub_body(class: &SourceClass, method: &SourceMethod, parameters: &[ParameterRecord<'_>]) -> Code {
    let (instructions, max_stack) = match chained_superclass(class, method) {
        Some(superclass) => (
            vec![
                Insn::Simple(Instruction::Aload_0),
                Insn::InvokeSpecial {
                    owner: superclass.to_string(),
                    name: "<init>".to_string(),
                    descriptor: "()V".to_string(),
                },
                Insn::Simple(Instruction::Return),
            ],
            1,
        ),
        None => zero_return(&method.return_type),
    };

    let mut local_variables = Vec::new();
    if !method.is_static() {
        local_variables.push(LocalVariableNode {
            name: "this".to_string(),
            descriptor: method.defining_class.clone(),
            signature: None,
            index: 0,
        });
    }
    for (index, parameter) in parameters.iter().enumerate() {
        if parameter.name.is_none() && parameter.signature.is_none() {
            continue;
        }
        let name = parameter
            .name
            .clone()
            .unwrap_or_else(|| format!("p{index}"));
        local_variables.push(LocalVariableNode {
            name,
            descriptor: parameter.parameter_type.to_string(),
            signature: parameter.signature.clone(),
            index: parameter.slot,
        });
    }

    Code {
        max_stack,
        max_locals: params::max_locals(method),
        instructions,
        local_variables,
    }
}

/// `throw new RuntimeException("Stub!")`
pub fn stub_initializer_body() -> Code {
    Code {
        max_stack: 3,
        max_locals: 0,
        instructions: vec![
            Insn::New(STUB_EXCEPTION.to_string()),
            Insn::Simple(Instruction::Dup),
            Insn::LdcString(STUB_MESSAGE.to_string()),
            Insn::InvokeSpecial {
                owner: STUB_EXCEPTION.to_string(),
                name: "<init>".to_string(),
                descriptor: "(Ljava/lang/String;)V".to_string(),
            },
            Insn::Simple(Instruction::Athrow),
        ],
        local_variables: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apistub_model::access::{ACC_CONSTRUCTOR, ACC_PUBLIC, ACC_STATIC};
    use apistub_model::{MethodImplementation, MethodParameter};

    fn widget() -> SourceClass {
        let mut class = SourceClass::new("Lpkg/Widget;", ACC_PUBLIC);
        class.superclass = Some("Lpkg/Base;".into());
        class
    }

    fn method(name: &str, access_flags: u32, parameters: &[&str], return_type: &str) -> SourceMethod {
        SourceMethod {
            defining_class: "Lpkg/Widget;".into(),
            name: name.into(),
            access_flags,
            parameters: parameters.iter().map(|t| MethodParameter::new(*t)).collect(),
            return_type: return_type.into(),
            implementation: Some(MethodImplementation::default()),
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_return_per_category() {
        let cases = [
            ("Z", Instruction::Iconst_0, Instruction::Ireturn),
            ("C", Instruction::Iconst_0, Instruction::Ireturn),
            ("I", Instruction::Iconst_0, Instruction::Ireturn),
            ("F", Instruction::Fconst_0, Instruction::Freturn),
            ("J", Instruction::Lconst_0, Instruction::Lreturn),
            ("D", Instruction::Dconst_0, Instruction::Dreturn),
            ("Ljava/lang/String;", Instruction::Aconst_null, Instruction::Areturn),
            ("[I", Instruction::Aconst_null, Instruction::Areturn),
        ];
        for (return_type, constant, ret) in cases {
            let (instructions, _) = zero_return(return_type);
            assert_eq!(
                instructions,
                vec![Insn::Simple(constant), Insn::Simple(ret)],
                "{return_type}"
            );
        }
        assert_eq!(zero_return("V"), (vec![Insn::Simple(Instruction::Return)], 0));
        assert_eq!(zero_return("J").1, 2);
    }

    #[test]
    fn test_constructor_chains_to_superclass() {
        let class = widget();
        let ctor = method("<init>", ACC_PUBLIC | ACC_CONSTRUCTOR, &["I"], "V");
        let records = params::parameter_records(&ctor);
        let code = stub_body(&class, &ctor, &records);
        assert_eq!(
            code.instructions,
            vec![
                Insn::Simple(Instruction::Aload_0),
                Insn::InvokeSpecial {
                    owner: "pkg/Base".into(),
                    name: "<init>".into(),
                    descriptor: "()V".into(),
                },
                Insn::Simple(Instruction::Return),
            ]
        );
        assert_eq!((code.max_stack, code.max_locals), (1, 2));
    }

    #[test]
    fn test_object_constructor_is_a_bare_return() {
        let class = SourceClass::new(OBJECT, ACC_PUBLIC);
        let mut ctor = method("<init>", ACC_PUBLIC | ACC_CONSTRUCTOR, &[], "V");
        ctor.defining_class = OBJECT.into();
        let code = stub_body(&class, &ctor, &[]);
        assert_eq!(code.instructions, vec![Insn::Simple(Instruction::Return)]);
    }

    #[test]
    fn test_local_variables() {
        let class = widget();
        let mut put = method("put", ACC_PUBLIC | ACC_STATIC, &["J", "Ljava/util/List;", "I"], "Z");
        put.parameters[0].name = Some("key".into());
        put.parameters[1].signature = Some("Ljava/util/List<Ljava/lang/String;>;".into());
        let records = params::parameter_records(&put);
        let code = stub_body(&class, &put, &records);

        let locals: Vec<(&str, u16, Option<&str>)> = code
            .local_variables
            .iter()
            .map(|l| (l.name.as_str(), l.index, l.signature.as_deref()))
            .collect();
        assert_eq!(
            locals,
            vec![
                ("key", 0, None),
                ("p1", 2, Some("Ljava/util/List<Ljava/lang/String;>;")),
            ]
        );
        assert_eq!(code.max_locals, 4);
    }

    #[test]
    fn test_instance_method_declares_this() {
        let class = widget();
        let run = method("run", ACC_PUBLIC, &[], "V");
        let code = stub_body(&class, &run, &[]);
        assert_eq!(code.local_variables.len(), 1);
        assert_eq!(code.local_variables[0].name, "this");
        assert_eq!(code.local_variables[0].descriptor, "Lpkg/Widget;");
        assert_eq!(code.max_locals, 1);
    }
}
