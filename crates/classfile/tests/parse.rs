use std::io::Cursor;

use apistub_classfile::{
    AnnotationNode, ClassNode, ClassWriter, Code, ConstantValue, ElementValue, FieldNode, Insn,
    InnerClassNode, Instruction, LocalVariableNode, MethodNode, ParameterNode, V1_8,
};
use ristretto_classfile::{ClassAccessFlags, ClassFile, FieldAccessFlags, MethodAccessFlags};

fn stub_class() -> ClassNode {
    let mut class = ClassNode::new(V1_8, 0x0421, "pkg/Widget");
    class.super_name = Some("pkg/Base".into());
    class.interfaces.push("java/lang/Runnable".into());
    class.source_file = Some("Widget.java".into());
    class.signature = Some("Lpkg/Base<Ljava/lang/String;>;Ljava/lang/Runnable;".into());
    class.inner_classes.push(InnerClassNode {
        name: "pkg/Widget$Builder".into(),
        outer_name: Some("pkg/Widget".into()),
        inner_name: Some("Builder".into()),
        access: 0x0009,
    });
    class.add_annotation(
        AnnotationNode::new("Landroid/annotation/SystemApi;").with_value(
            "client",
            ElementValue::Enum {
                descriptor: "Landroid/annotation/SystemApi$Client;".into(),
                name: "PRIVILEGED_APPS".into(),
            },
        ),
        false,
    );

    let mut field = FieldNode::new(0x0019, "MAX", "J");
    field.value = Some(ConstantValue::Long(1 << 40));
    class.fields.push(field);
    let mut label = FieldNode::new(0x0019, "LABEL", "Ljava/lang/String;");
    label.value = Some(ConstantValue::String("widget".into()));
    class.fields.push(label);

    let mut init = MethodNode::new(0x0001, "<init>", "(ILjava/lang/String;)V");
    init.parameters = vec![
        ParameterNode {
            name: "count".into(),
            access: 0,
        },
        ParameterNode {
            name: "label".into(),
            access: 0,
        },
    ];
    init.add_parameter_annotation(
        1,
        2,
        AnnotationNode::new("Landroid/annotation/NonNull;"),
        false,
    );
    init.code = Some(Code {
        max_stack: 1,
        max_locals: 3,
        instructions: vec![
            Insn::Simple(Instruction::Aload_0),
            Insn::InvokeSpecial {
                owner: "pkg/Base".into(),
                name: "<init>".into(),
                descriptor: "()V".into(),
            },
            Insn::Simple(Instruction::Return),
        ],
        local_variables: vec![
            LocalVariableNode {
                name: "this".into(),
                descriptor: "Lpkg/Widget;".into(),
                signature: None,
                index: 0,
            },
            LocalVariableNode {
                name: "count".into(),
                descriptor: "I".into(),
                signature: None,
                index: 1,
            },
        ],
    });
    class.methods.push(init);

    let mut run = MethodNode::new(0x0401, "run", "()V");
    run.exceptions.push("java/io/IOException".into());
    class.methods.push(run);

    let mut clinit = MethodNode::new(0x0008, "<clinit>", "()V");
    clinit.code = Some(Code {
        max_stack: 3,
        max_locals: 0,
        instructions: vec![
            Insn::New("java/lang/RuntimeException".into()),
            Insn::Simple(Instruction::Dup),
            Insn::LdcString("Stub!".into()),
            Insn::InvokeSpecial {
                owner: "java/lang/RuntimeException".into(),
                name: "<init>".into(),
                descriptor: "(Ljava/lang/String;)V".into(),
            },
            Insn::Simple(Instruction::Athrow),
        ],
        local_variables: Vec::new(),
    });
    class.methods.push(clinit);
    class
}

#[test]
fn test_written_class_parses() {
    let bytes = ClassWriter::write(&stub_class()).unwrap();
    let class = ClassFile::from_bytes(&mut Cursor::new(bytes)).unwrap();

    assert!(class.access_flags.contains(ClassAccessFlags::PUBLIC));
    assert!(!class.access_flags.contains(ClassAccessFlags::INTERFACE));

    let field_names: Vec<_> = class
        .fields
        .iter()
        .map(|field| {
            class
                .constant_pool
                .try_get_utf8(field.name_index)
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(field_names, vec!["MAX", "LABEL"]);
    assert!(class.fields[0].access_flags.contains(FieldAccessFlags::STATIC));
    assert!(class.fields[0].access_flags.contains(FieldAccessFlags::FINAL));

    let methods: Vec<_> = class
        .methods
        .iter()
        .map(|method| {
            let name = class.constant_pool.try_get_utf8(method.name_index).unwrap();
            let descriptor = class
                .constant_pool
                .try_get_utf8(method.descriptor_index)
                .unwrap();
            format!("{name}{descriptor}")
        })
        .collect();
    assert_eq!(
        methods,
        vec!["<init>(ILjava/lang/String;)V", "run()V", "<clinit>()V"]
    );
    assert!(class.methods[1].access_flags.contains(MethodAccessFlags::ABSTRACT));
    assert!(class.methods[2].access_flags.contains(MethodAccessFlags::STATIC));
}

#[test]
fn test_annotation_type_flags() {
    let mut class = ClassNode::new(V1_8, 0x2601, "android/annotation/HiddenApiRestriction");
    class.super_name = Some("java/lang/Object".into());
    class.interfaces.push("java/lang/annotation/Annotation".into());
    class
        .methods
        .push(MethodNode::new(0x0401, "value", "()[Ljava/lang/String;"));

    let bytes = ClassWriter::write(&class).unwrap();
    let parsed = ClassFile::from_bytes(&mut Cursor::new(bytes)).unwrap();
    assert!(parsed.access_flags.contains(ClassAccessFlags::ANNOTATION));
    assert!(parsed.access_flags.contains(ClassAccessFlags::INTERFACE));
    assert!(parsed.access_flags.contains(ClassAccessFlags::ABSTRACT));
    assert_eq!(parsed.methods.len(), 1);
}

#[test]
fn test_lowered_class_survives_reparse() {
    let mut class = ClassNode::new(V1_8, 0x0021, "pkg/Widget");
    class.super_name = Some("java/lang/Object".into());
    class.add_annotation(
        AnnotationNode::new("Landroid/annotation/HiddenApiRestriction;").with_value(
            "value",
            ElementValue::Array(vec![ElementValue::String("blacklist".into())]),
        ),
        false,
    );
    let mut init = MethodNode::new(0x0001, "<init>", "()V");
    init.code = Some(Code {
        max_stack: 1,
        max_locals: 1,
        instructions: vec![
            Insn::Simple(Instruction::Aload_0),
            Insn::InvokeSpecial {
                owner: "java/lang/Object".into(),
                name: "<init>".into(),
                descriptor: "()V".into(),
            },
            Insn::Simple(Instruction::Return),
        ],
        local_variables: Vec::new(),
    });
    class.methods.push(init);

    let lowered = ClassWriter::lower(&class).unwrap();
    let bytes = ClassWriter::write(&class).unwrap();
    let parsed = ClassFile::from_bytes(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(parsed, lowered);
}
