//! End-to-end extraction over dex images assembled in memory.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use apistub_classfile::{ClassNode, ConstantValue, Insn, Instruction, ParameterNode};
use apistub_core::reachability;
use apistub_core::transform::ClassTransformer;
use apistub_core::{ClassMap, Extractor, ExtractorConfig};
use apistub_dex::testing::{
    ClassSpec, CodeSpec, DebugEvent, DexBuilder, FieldSpec, MethodSpec, Value,
};
use apistub_model::access;
use ristretto_classfile::{ClassFile, MethodAccessFlags};
use tempfile::TempDir;
use zip::ZipArchive;

fn config() -> ExtractorConfig {
    ExtractorConfig {
        append_resource_blocks: false,
        append_resource_files: false,
        ..Default::default()
    }
}

fn write_dex(dir: &Path, name: &str, builder: DexBuilder) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, builder.build()).unwrap();
    path
}

fn class_spec(access_flags: u32, superclass: &str) -> ClassSpec {
    ClassSpec {
        access_flags,
        superclass: Some(superclass.to_string()),
        ..Default::default()
    }
}

fn code(registers: u16, insns: &[u16]) -> CodeSpec {
    CodeSpec {
        registers,
        insns: insns.to_vec(),
        debug_info: None,
    }
}

fn jar_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).unwrap();
            (entry.name().to_string(), bytes)
        })
        .collect()
}

fn parse(entries: &[(String, Vec<u8>)], name: &str) -> ClassFile {
    let (_, bytes) = entries.iter().find(|(entry, _)| entry == name).unwrap();
    ClassFile::from_bytes(&mut Cursor::new(bytes.clone())).unwrap()
}

fn method_signatures(class: &ClassFile) -> Vec<String> {
    class
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
        .collect()
}

/// Transforms one class of a freshly loaded dex image without writing it.
fn transform_one(dex: &Path, type_name: &str, config: &ExtractorConfig) -> ClassNode {
    let extractor = Extractor::new(config.clone());
    let classes: ClassMap = extractor.load(&[dex.to_path_buf()]).unwrap();
    let referenced = reachability::find_referenced(&classes);
    let mut transformer = ClassTransformer::new(&classes, &referenced, config);
    transformer.transform(&classes[type_name]).unwrap().unwrap()
}

fn widget_dex(dir: &Path) -> PathBuf {
    let mut builder = DexBuilder::new();
    let size = builder.value(&Value::Int(4));

    let mut widget = class_spec(0x0001, "Lpkg/Base;");
    widget.source_file = Some("Widget.java".into());
    widget.static_fields = vec![FieldSpec::new("SIZE", "I", 0x0019)];
    widget.static_values = vec![size];
    widget.direct_methods = vec![
        // invoke-direct {v0}, Base.<init>; return-void
        MethodSpec::new("<init>", &[], "V", 0x1_0001).with_code(code(1, &[0x1070, 0, 0, 0x000e])),
    ];
    widget.virtual_methods = vec![
        // const/4 v0, 0; return v0
        MethodSpec::new("getSize", &[], "I", 0x0001).with_code(code(2, &[0x0012, 0x000f])),
    ];
    builder.class("Lpkg/Widget;", widget);

    let mut base = class_spec(0x0000, "Ljava/lang/Object;");
    base.instance_fields = vec![FieldSpec::new("hidden", "I", 0x0001)];
    base.virtual_methods =
        vec![MethodSpec::new("helper", &[], "V", 0x0001).with_code(code(1, &[0x000e]))];
    builder.class("Lpkg/Base;", base);

    builder.class("Lpkg/Widget$1;", class_spec(0x1000, "Lpkg/Base;"));
    builder.class("Lpkg/Unused;", class_spec(0x0000, "Ljava/lang/Object;"));

    write_dex(dir, "widget.dex", builder)
}

#[test]
fn test_widget_extending_hidden_base() {
    let dir = TempDir::new().unwrap();
    let dex = widget_dex(dir.path());
    let output = dir.path().join("android.jar");

    let summary = Extractor::new(config()).run(&[dex], &output).unwrap();
    assert_eq!(summary.classes, 3);
    assert_eq!(summary.referenced, 1);
    assert_eq!(summary.package.stubs, 1);
    assert_eq!(summary.package.skeletons, 1);
    assert!(!summary.package.restriction_type);

    let entries = jar_entries(&output);
    let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["pkg/Widget.class", "pkg/Base.class"]);

    let widget = parse(&entries, "pkg/Widget.class");
    assert_eq!(widget.fields.len(), 1);
    assert_eq!(
        method_signatures(&widget),
        vec!["<init>()V", "getSize()I", "<clinit>()V"]
    );

    let base = parse(&entries, "pkg/Base.class");
    assert!(base.fields.is_empty());
    assert!(base.methods.is_empty());
}

#[test]
fn test_runs_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let dex = widget_dex(dir.path());
    let first = dir.path().join("first.jar");
    let second = dir.path().join("second.jar");

    let extractor = Extractor::new(config());
    extractor.run(&[dex.clone()], &first).unwrap();
    extractor.run(&[dex], &second).unwrap();
    assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
}

#[test]
fn test_constant_kinds_are_preserved() {
    let dir = TempDir::new().unwrap();
    let mut builder = DexBuilder::new();
    let kinds: [(&str, &str, Value<'_>); 8] = [
        ("FLAG", "Z", Value::Boolean(true)),
        ("BYTE", "B", Value::Byte(-7)),
        ("CHAR", "C", Value::Char(0x263a)),
        ("INT", "I", Value::Int(-100_000)),
        ("LONG", "J", Value::Long(1 << 42)),
        ("FLOAT", "F", Value::Float(2.5)),
        ("DOUBLE", "D", Value::Double(-0.125)),
        ("TEXT", "Ljava/lang/String;", Value::String("stub")),
    ];
    let mut spec = class_spec(0x0001, "Ljava/lang/Object;");
    for (name, field_type, value) in &kinds {
        spec.static_fields.push(FieldSpec::new(name, field_type, 0x0019));
        spec.static_values.push(builder.value(value));
    }
    builder.class("Lpkg/Constants;", spec);
    let dex = write_dex(dir.path(), "constants.dex", builder);

    let node = transform_one(&dex, "Lpkg/Constants;", &config());
    let values: Vec<Option<ConstantValue>> =
        node.fields.iter().map(|field| field.value.clone()).collect();
    assert_eq!(
        values,
        vec![
            Some(ConstantValue::Int(1)),
            Some(ConstantValue::Int(-7)),
            Some(ConstantValue::Int(0x263a)),
            Some(ConstantValue::Int(-100_000)),
            Some(ConstantValue::Long(1 << 42)),
            Some(ConstantValue::Float(2.5)),
            Some(ConstantValue::Double(-0.125)),
            Some(ConstantValue::String("stub".into())),
        ]
    );
}

#[test]
fn test_return_categories() {
    let dir = TempDir::new().unwrap();
    let mut builder = DexBuilder::new();
    let cases = [
        ("isOn", "Z", Instruction::Iconst_0, Instruction::Ireturn),
        ("getByte", "B", Instruction::Iconst_0, Instruction::Ireturn),
        ("getShort", "S", Instruction::Iconst_0, Instruction::Ireturn),
        ("getChar", "C", Instruction::Iconst_0, Instruction::Ireturn),
        ("getInt", "I", Instruction::Iconst_0, Instruction::Ireturn),
        ("getFloat", "F", Instruction::Fconst_0, Instruction::Freturn),
        ("getLong", "J", Instruction::Lconst_0, Instruction::Lreturn),
        ("getDouble", "D", Instruction::Dconst_0, Instruction::Dreturn),
        ("getName", "Ljava/lang/String;", Instruction::Aconst_null, Instruction::Areturn),
        ("getItems", "[Ljava/lang/Object;", Instruction::Aconst_null, Instruction::Areturn),
    ];
    let mut spec = class_spec(0x0001, "Ljava/lang/Object;");
    for (name, return_type, _, _) in &cases {
        spec.virtual_methods.push(
            MethodSpec::new(name, &[], return_type, 0x0001).with_code(code(3, &[0x000e])),
        );
    }
    spec.virtual_methods
        .push(MethodSpec::new("reset", &[], "V", 0x0001).with_code(code(1, &[0x000e])));
    builder.class("Lpkg/Values;", spec);
    let dex = write_dex(dir.path(), "values.dex", builder);

    let node = transform_one(&dex, "Lpkg/Values;", &config());
    for (name, _, constant, ret) in cases {
        let method = node.methods.iter().find(|m| m.name == name).unwrap();
        assert_eq!(
            method.code.as_ref().unwrap().instructions,
            vec![Insn::Simple(constant), Insn::Simple(ret)],
            "{name}"
        );
    }
    let reset = node.methods.iter().find(|m| m.name == "reset").unwrap();
    assert_eq!(
        reset.code.as_ref().unwrap().instructions,
        vec![Insn::Simple(Instruction::Return)]
    );
}

#[test]
fn test_parameter_names_from_first_complete_group() {
    let dir = TempDir::new().unwrap();
    let mut builder = DexBuilder::new();
    // static put(int, long) with 4 registers: v0 scratch, v1 int, v2-v3 long
    let debug = builder.debug_info(
        &[None, None],
        &[
            DebugEvent::StartLocal {
                register: 1,
                name: "stale",
                local_type: "I",
            },
            DebugEvent::AdvancePc(1),
            DebugEvent::StartLocal {
                register: 1,
                name: "key",
                local_type: "I",
            },
            DebugEvent::StartLocal {
                register: 2,
                name: "value",
                local_type: "J",
            },
        ],
    );
    let put = MethodSpec::new("put", &["I", "J"], "V", 0x0009).with_code(CodeSpec {
        registers: 4,
        insns: vec![0x0000, 0x000e],
        debug_info: Some(debug),
    });
    let mut spec = class_spec(0x0001, "Ljava/lang/Object;");
    spec.direct_methods = vec![put];
    builder.class("Lpkg/Store;", spec);
    let dex = write_dex(dir.path(), "store.dex", builder);

    let node = transform_one(&dex, "Lpkg/Store;", &config());
    let put = node.methods.iter().find(|m| m.name == "put").unwrap();
    assert_eq!(
        put.parameters,
        vec![
            ParameterNode {
                name: "key".into(),
                access: 0
            },
            ParameterNode {
                name: "value".into(),
                access: 0
            },
        ]
    );
    let code = put.code.as_ref().unwrap();
    let locals: Vec<(&str, u16)> = code
        .local_variables
        .iter()
        .map(|local| (local.name.as_str(), local.index))
        .collect();
    assert_eq!(locals, vec![("key", 0), ("value", 1)]);
    assert_eq!(code.max_locals, 3);
}

#[test]
fn test_synchronized_follows_monitor_enter() {
    let dir = TempDir::new().unwrap();
    let mut builder = DexBuilder::new();
    // monitor-enter v0; monitor-exit v0; return-void
    let locked = [0x001d, 0x001e, 0x000e];
    let mut spec = class_spec(0x0001, "Ljava/lang/Object;");
    spec.virtual_methods = vec![
        MethodSpec::new("declared", &[], "V", 0x2_0001).with_code(code(1, &locked)),
        MethodSpec::new("inner", &[], "V", 0x0001).with_code(code(1, &locked)),
        MethodSpec::new("unused", &[], "V", 0x2_0001).with_code(code(1, &[0x000e])),
    ];
    builder.class("Lpkg/Lock;", spec);
    let dex = write_dex(dir.path(), "lock.dex", builder);
    let output = dir.path().join("lock.jar");
    Extractor::new(config()).run(&[dex], &output).unwrap();

    let entries = jar_entries(&output);
    let class = parse(&entries, "pkg/Lock.class");
    let synchronized: Vec<(String, bool)> = method_signatures(&class)
        .into_iter()
        .zip(&class.methods)
        .map(|(name, method)| {
            (
                name,
                method.access_flags.contains(MethodAccessFlags::SYNCHRONIZED),
            )
        })
        .collect();
    assert_eq!(
        synchronized,
        vec![
            ("declared()V".to_string(), true),
            ("inner()V".to_string(), false),
            ("unused()V".to_string(), false),
            ("<clinit>()V".to_string(), false),
        ]
    );
}

#[test]
fn test_restriction_type_is_appended_when_used() {
    let dir = TempDir::new().unwrap();
    let mut builder = DexBuilder::new();
    let mut spec = class_spec(0x0001, "Ljava/lang/Object;");
    spec.virtual_methods = vec![
        MethodSpec::new("open", &[], "V", 0x0001).with_code(code(1, &[0x000e])),
        MethodSpec::new("internal", &[], "V", 0x0001).with_code(code(1, &[0x000e])),
    ];
    // whitelist, blacklist
    spec.hidden_api = Some(vec![0x0, 0x2]);
    builder.class("Lpkg/Api;", spec);
    builder.class("Lpkg/Gone;", class_spec(0x0000, "Ljava/lang/Object;"));
    let dex = write_dex(dir.path(), "api.dex", builder);

    let node = transform_one(&dex, "Lpkg/Api;", &config());
    assert!(node.methods[0].invisible_annotations.is_empty());
    assert_eq!(
        node.methods[1].invisible_annotations[0].descriptor,
        "Landroid/annotation/HiddenApiRestriction;"
    );

    let output = dir.path().join("api.jar");
    let summary = Extractor::new(config()).run(&[dex.clone()], &output).unwrap();
    assert!(summary.package.restriction_type);
    let entries = jar_entries(&output);
    assert_eq!(
        entries.last().map(|(name, _)| name.as_str()),
        Some("android/annotation/HiddenApiRestriction.class")
    );

    let disabled = ExtractorConfig {
        hidden_api_annotations: false,
        ..config()
    };
    let output = dir.path().join("plain.jar");
    let summary = Extractor::new(disabled).run(&[dex], &output).unwrap();
    assert!(!summary.package.restriction_type);
    assert_eq!(jar_entries(&output).len(), 1);
}

#[test]
fn test_referenced_set_is_closed_over_supertypes() {
    let dir = TempDir::new().unwrap();
    let mut builder = DexBuilder::new();

    let mut api = class_spec(0x0001, "Lpkg/Impl;");
    api.virtual_methods = vec![
        MethodSpec::new("token", &[], "Lpkg/Token;", 0x0001).with_code(code(1, &[0x000e])),
    ];
    builder.class("Lpkg/Api;", api);
    let mut implementation = class_spec(0x0000, "Lpkg/AbstractImpl;");
    implementation.interfaces = vec!["Lpkg/Callback;".into()];
    builder.class("Lpkg/Impl;", implementation);
    builder.class("Lpkg/AbstractImpl;", class_spec(0x0400, "Ljava/lang/Object;"));
    let mut callback = class_spec(0x0600, "Ljava/lang/Object;");
    callback.interfaces = vec!["Lpkg/Listener;".into()];
    builder.class("Lpkg/Callback;", callback);
    builder.class("Lpkg/Listener;", class_spec(0x0600, "Ljava/lang/Object;"));
    builder.class("Lpkg/Token;", class_spec(0x0010, "Lpkg/TokenBase;"));
    builder.class("Lpkg/TokenBase;", class_spec(0x0000, "Ljava/lang/Object;"));
    builder.class("Lpkg/Island;", class_spec(0x0000, "Lpkg/TokenBase;"));
    let dex = write_dex(dir.path(), "graph.dex", builder);

    let classes = Extractor::new(config()).load(&[dex]).unwrap();
    let referenced = reachability::find_referenced(&classes);
    let names: Vec<&str> = referenced
        .classes()
        .map(|class| class.type_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "Lpkg/AbstractImpl;",
            "Lpkg/Callback;",
            "Lpkg/Impl;",
            "Lpkg/Listener;",
            "Lpkg/Token;",
            "Lpkg/TokenBase;",
        ]
    );

    for class in referenced.classes() {
        for supertype in class.supertypes() {
            if let Some(parent) = classes.get(supertype) {
                if access::is_inaccessible(parent.access_flags) {
                    assert!(referenced.contains(supertype), "{supertype}");
                }
            }
        }
    }
}
