//! End-to-end tests for the generation pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use modgen_core::manifest::ManifestStore;
use modgen_core::{CancellationToken, DriftStatus, Error, Orchestrator};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
[project]
name = "fixture"

[platforms.rust]
out_dir = "native/src/generated"

[platforms.cxx]
out_dir = "cpp/generated"

[platforms.typescript]
out_dir = "src/generated"
"#;

const CALCULATOR: &str = r#"
import { NativeModuleRegistry, type NativeModule } from 'modgen-modules';

export interface Spec extends NativeModule {
  add(a: number, b: number): number;
  subtract(a: number, b: number): number;
}

export default NativeModuleRegistry.getEnforcing<Spec>('Calculator');
"#;

const CRABY_TEST: &str = r#"
import type { TurboModule } from 'react-native';
import { TurboModuleRegistry } from 'react-native';

export interface TestObject {
  foo: string;
  bar: number;
  baz: boolean;
}

export enum MyEnum {
  FOO = 'FOO',
  BAR = 'BAR',
  BAZ = 'BAZ',
}

export interface Spec extends TurboModule {
  numericMethod(arg: number): number;
  objectMethod(arg: TestObject): TestObject;
  enumMethod(arg: MyEnum): MyEnum;
  nullableMethod(arg: number | null): number | null;
  promiseMethod(arg: number): Promise<number>;
}

export default TurboModuleRegistry.getEnforcing<Spec>('CrabyTest');
"#;

const CALCULATOR_OUTPUTS: [&str; 6] = [
    "cpp/generated/CalculatorSpec.h",
    "cpp/generated/ModgenModules.h",
    "native/src/generated/calculator.rs",
    "native/src/generated/mod.rs",
    "src/generated/NativeCalculator.ts",
    "src/generated/index.ts",
];

fn project(specs: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("modgen.toml"), CONFIG).unwrap();
    for (name, source) in specs {
        write_spec(dir.path(), name, source);
    }
    dir
}

fn write_spec(root: &Path, name: &str, source: &str) {
    let path = root.join("specs").join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, source).unwrap();
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

fn run(root: &Path) -> modgen_core::CodegenReport {
    modgen_core::codegen(root, &CancellationToken::new()).unwrap()
}

#[test]
fn test_codegen_writes_every_platform_and_manifest() {
    let dir = project(&[("NativeCalculator.ts", CALCULATOR)]);
    let report = run(dir.path());

    assert!(report.is_success(), "{:?}", report.diagnostics);
    assert_eq!(report.modules, vec!["Calculator"]);
    assert_eq!(report.written, CALCULATOR_OUTPUTS.to_vec());

    let manifest = Orchestrator::load(dir.path())
        .unwrap()
        .manifest_store()
        .load()
        .unwrap();
    let record = &manifest.modules["Calculator"];
    assert_eq!(record.source, "specs/NativeCalculator.ts");
    assert_eq!(record.outputs, CALCULATOR_OUTPUTS.to_vec());
    assert_eq!(manifest.emitters.len(), 3);

    let ts = read(dir.path(), "src/generated/NativeCalculator.ts");
    assert!(ts.contains("add(a: number, b: number): number;"));
    assert!(ts.contains("getEnforcing<Spec>(\"Calculator\")"));
}

#[test]
fn test_second_run_is_idempotent() {
    let dir = project(&[("NativeCalculator.ts", CALCULATOR)]);
    run(dir.path());
    let before: Vec<String> = CALCULATOR_OUTPUTS
        .iter()
        .map(|p| read(dir.path(), p))
        .collect();

    let report = run(dir.path());
    assert!(report.written.is_empty());
    assert_eq!(report.unchanged, CALCULATOR_OUTPUTS.len());
    assert!(report.drift.is_clean());

    let after: Vec<String> = CALCULATOR_OUTPUTS
        .iter()
        .map(|p| read(dir.path(), p))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_enum_object_nullable_and_promise_bindings() {
    let dir = project(&[("NativeCrabyTest.ts", CRABY_TEST)]);
    let report = run(dir.path());
    assert!(report.is_success(), "{:?}", report.diagnostics);

    let rust = read(dir.path(), "native/src/generated/craby_test.rs");
    assert!(rust.contains("pub enum MyEnum"));
    for variant in ["Foo", "Bar", "Baz"] {
        assert!(rust.contains(variant), "missing variant {variant}");
    }
    assert!(rust.contains("pub struct TestObject"));
    assert!(rust.contains("Option<f64>"));
    assert!(rust.contains("Promise<f64>"));

    let ts = read(dir.path(), "src/generated/NativeCrabyTest.ts");
    assert!(ts.contains("FOO: \"FOO\""));
    assert!(ts.contains("nullableMethod(arg: number | null): number | null;"));
    assert!(ts.contains("promiseMethod(arg: number): Promise<number>;"));

    let header = read(dir.path(), "cpp/generated/CrabyTestSpec.h");
    assert!(header.contains("enum class MyEnum"));
    assert!(header.contains("std::optional<double>"));
}

#[test]
fn test_same_method_name_in_two_modules() {
    let other = CALCULATOR.replace("'Calculator'", "'Scientific'");
    let dir = project(&[
        ("NativeCalculator.ts", CALCULATOR),
        ("NativeScientific.ts", &other),
    ]);
    let report = run(dir.path());
    assert!(report.is_success(), "{:?}", report.diagnostics);
    assert_eq!(report.modules, vec!["Calculator", "Scientific"]);

    let index = read(dir.path(), "native/src/generated/mod.rs");
    assert!(index.contains("pub mod calculator;"));
    assert!(index.contains("pub mod scientific;"));
}

#[test]
fn test_duplicate_method_fails_only_its_unit() {
    let broken = r#"
interface Spec extends NativeModule {
  add(a: number): number;
  add(a: number, b: number): number;
}
export default NativeModuleRegistry.getEnforcing<Spec>('Broken');
"#;
    let dir = project(&[
        ("NativeBroken.ts", broken),
        ("NativeCalculator.ts", CALCULATOR),
    ]);
    let report = run(dir.path());

    assert!(!report.is_success());
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].kind, "DuplicateMethod");
    assert_eq!(report.diagnostics[0].unit, "specs/NativeBroken.ts");

    // The healthy unit is still generated; the manifest is not written
    assert!(dir.path().join("native/src/generated/calculator.rs").is_file());
    assert!(report.manifest.is_none());
    assert!(!dir.path().join(".modgen/manifest.json").exists());
}

#[test]
fn test_deleted_type_is_unresolved() {
    let types = "export interface Point { x: number; y: number; }\n";
    let module = r#"
interface Spec extends NativeModule {
  distance(a: Point, b: Point): number;
}
export default NativeModuleRegistry.getEnforcing<Spec>('Geometry');
"#;
    let dir = project(&[("types.ts", types), ("NativeGeometry.ts", module)]);
    assert!(run(dir.path()).is_success());

    fs::remove_file(dir.path().join("specs/types.ts")).unwrap();
    let err = modgen_core::doctor(dir.path()).unwrap_err();
    let Error::Failed(diagnostics) = err else {
        unreachable!("expected collected diagnostics, got {err:?}");
    };
    assert!(diagnostics.iter().any(|d| d.kind == "UnresolvedType"));
    assert!(diagnostics.iter().all(|d| d.unit == "specs/NativeGeometry.ts"));
}

#[test]
fn test_changed_module_is_reported_then_regenerated() {
    let dir = project(&[("NativeCalculator.ts", CALCULATOR)]);
    run(dir.path());

    let changed = CALCULATOR.replace("subtract(a: number, b: number)", "subtract(a: number)");
    write_spec(dir.path(), "NativeCalculator.ts", &changed);

    let show = modgen_core::show(dir.path()).unwrap();
    assert!(matches!(show.modules[0].status, DriftStatus::Changed { .. }));
    assert_eq!(show.modules[0].methods[1], "subtract(a: number): number");

    let doctor = modgen_core::doctor(dir.path()).unwrap();
    assert!(!doctor.is_healthy());
    assert!(
        doctor
            .problems()
            .contains(&"module Calculator is changed".to_string())
    );

    let report = run(dir.path());
    assert!(matches!(
        report.drift.status("Calculator"),
        Some(DriftStatus::Changed { .. })
    ));
    assert!(modgen_core::doctor(dir.path()).unwrap().is_healthy());
}

#[test]
fn test_switching_lookup_is_drift() {
    let dir = project(&[("NativeCalculator.ts", CALCULATOR)]);
    run(dir.path());

    let nullable = CALCULATOR.replace("getEnforcing<Spec>", "get<Spec>");
    write_spec(dir.path(), "NativeCalculator.ts", &nullable);

    let show = modgen_core::show(dir.path()).unwrap();
    assert!(matches!(show.modules[0].status, DriftStatus::Changed { .. }));

    let report = run(dir.path());
    assert!(report.is_success(), "{:?}", report.diagnostics);
    let ts = read(dir.path(), "src/generated/NativeCalculator.ts");
    assert!(ts.contains("export default NativeModuleRegistry.get<Spec>(\"Calculator\");"));
    assert!(modgen_core::doctor(dir.path()).unwrap().is_healthy());
}

#[test]
fn test_removed_module_is_pruned() {
    let other = CALCULATOR.replace("'Calculator'", "'Scientific'");
    let dir = project(&[
        ("NativeCalculator.ts", CALCULATOR),
        ("NativeScientific.ts", &other),
    ]);
    run(dir.path());
    fs::remove_file(dir.path().join("specs/NativeScientific.ts")).unwrap();

    let show = modgen_core::show(dir.path()).unwrap();
    assert_eq!(show.removed, vec!["Scientific"]);

    let report = run(dir.path());
    assert_eq!(report.drift.status("Scientific"), Some(&DriftStatus::Removed));
    assert_eq!(
        report.pruned,
        vec![
            "cpp/generated/ScientificSpec.h",
            "native/src/generated/scientific.rs",
            "src/generated/NativeScientific.ts",
        ]
    );
    assert!(!dir.path().join("native/src/generated/scientific.rs").exists());
    assert!(
        !read(dir.path(), "native/src/generated/mod.rs").contains("scientific")
    );
    assert!(modgen_core::doctor(dir.path()).unwrap().is_healthy());
}

#[test]
fn test_doctor_reports_hand_edits_and_missing_files() {
    let dir = project(&[("NativeCalculator.ts", CALCULATOR)]);
    run(dir.path());

    let edited = dir.path().join("src/generated/NativeCalculator.ts");
    let original = fs::read_to_string(&edited).unwrap();
    fs::write(&edited, original.replace("subtract", "minus")).unwrap();
    fs::remove_file(dir.path().join("cpp/generated/CalculatorSpec.h")).unwrap();

    let report = modgen_core::doctor(dir.path()).unwrap();
    assert!(report.drift.is_clean());
    assert_eq!(report.missing, vec!["cpp/generated/CalculatorSpec.h"]);
    assert_eq!(report.mismatched.len(), 1);

    let diff = report.mismatched[0].unified_diff();
    assert!(diff.contains("-  minus(a: number, b: number): number;"));
    assert!(diff.contains("+  subtract(a: number, b: number): number;"));
}

#[test]
fn test_build_refuses_out_of_date_bindings() {
    let dir = project(&[("NativeCalculator.ts", CALCULATOR)]);
    let err = modgen_core::build(dir.path(), &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, Error::OutOfDate(_)));
}

#[cfg(unix)]
#[test]
fn test_build_runs_command_when_up_to_date() {
    let dir = project(&[("NativeCalculator.ts", CALCULATOR)]);
    let config = format!("{CONFIG}\n[build]\ncommand = [\"true\"]\n");
    fs::write(dir.path().join("modgen.toml"), &config).unwrap();
    run(dir.path());

    let report = modgen_core::build(dir.path(), &CancellationToken::new()).unwrap();
    assert_eq!(report.command, vec!["true"]);

    fs::write(
        dir.path().join("modgen.toml"),
        config.replace("[\"true\"]", "[\"false\"]"),
    )
    .unwrap();
    let err = modgen_core::build(dir.path(), &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, Error::Build { .. }));
}

#[test]
fn test_clean_removes_outputs_and_manifest() {
    let dir = project(&[("NativeCalculator.ts", CALCULATOR)]);
    run(dir.path());

    let report = modgen_core::clean(dir.path()).unwrap();
    assert_eq!(report.removed, CALCULATOR_OUTPUTS.to_vec());
    assert!(!dir.path().join(".modgen/manifest.json").exists());
    for output in CALCULATOR_OUTPUTS {
        assert!(!dir.path().join(output).exists());
    }
    assert!(dir.path().join("specs/NativeCalculator.ts").is_file());
}

#[test]
fn test_cancelled_run_writes_nothing() {
    let dir = project(&[("NativeCalculator.ts", CALCULATOR)]);
    let token = CancellationToken::new();
    token.cancel();

    let err = modgen_core::codegen(dir.path(), &token).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(!dir.path().join("native").exists());
    assert!(!dir.path().join(".modgen").exists());
}

#[test]
fn test_init_then_codegen() {
    let dir = TempDir::new().unwrap();
    let root = modgen_core::init(dir.path(), "math-kit").unwrap();

    let report = run(&root);
    assert!(report.is_success(), "{:?}", report.diagnostics);
    assert_eq!(report.modules, vec!["MathKit"]);
    assert!(root.join("native/src/generated/math_kit.rs").is_file());
    assert!(root.join("src/generated/NativeMathKit.ts").is_file());
    assert!(root.join("cpp/generated/MathKitSpec.h").is_file());
}
