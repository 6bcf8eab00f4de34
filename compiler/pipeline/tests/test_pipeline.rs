use std::fs;
use std::path::{Path, PathBuf};

use codegen_backend::Artifact;
use config::Config;
use ir::{Parameter, Section};
use codegen_backend::Regeneration;
use pipeline::{
    compile, compile_with, load_document, Driver, ExpansionStage, RunReport, Stage, Terminal,
};
use tempfile::TempDir;

fn data_dir() -> PathBuf { Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data") }

fn config() -> Config {
    Config { include: vec![data_dir().display().to_string()], ..Config::default() }
}

/// Write `yaml` as a wiring document in a scratch directory and run the
/// standard stages over it.
fn run_document(yaml: &str, artifacts: &[Artifact]) -> RunReport {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let doc = dir.path().join("wiring.miml");
    fs::write(&doc, yaml).expect("Failed to write wiring document");
    compile(&doc, &config(), artifacts).expect("pipeline run")
}

fn code_for(report: &RunReport) -> String {
    report
        .output
        .as_ref()
        .and_then(|out| out.render(Artifact::Code))
        .expect("code artifact")
}

fn errors(report: &RunReport) -> Vec<String> {
    report.diagnostics.errors().map(str::to_string).collect()
}

#[test]
fn test_app_generates_one_dispatcher_per_message() {
    let report = compile(&data_dir().join("app.miml"), &config(), &[Artifact::Code])
        .expect("pipeline run");
    assert!(report.succeeded(), "{:?}", report.diagnostics);

    let code = code_for(&report);
    assert!(
        code.contains("void tick(int count){\n\tonTick(count);\n\tlogTick(count);\n}\n"),
        "{}",
        code
    );
    assert!(code.contains("void status(int _arg1, char * name){\n\tonStatus(_arg1, name);\n}\n"));
    assert_eq!(code.matches("){\n\ton").count(), 2);
}

#[test]
fn test_init_and_final_order() {
    let report = compile(&data_dir().join("app.miml"), &config(), &[Artifact::Code])
        .expect("pipeline run");
    let code = code_for(&report);

    assert!(code.contains(
        "static void modules_initialize(int argc, char *argv[]){\n\tA_init();\n\tB_init(argc, argv);\n\tC_init();\n\tatexit(modules_finalize);\n}"
    ), "{}", code);
    assert!(code.contains(
        "static void modules_finalize(void){\n\tC_final();\n\tB_final();\n\tA_final();\n}"
    ));
}

#[test]
fn test_includes_follow_module_order() {
    let report = compile(&data_dir().join("app.miml"), &config(), &[Artifact::Code])
        .expect("pipeline run");
    let code = code_for(&report);
    assert!(code.contains("#include \"a.h\"\n#include \"b.h\"\n#include \"c.h\"\n"));
}

#[test]
fn test_makefile_lists_objects_and_regeneration_rule() {
    let report = compile(&data_dir().join("app.miml"), &config(), &[Artifact::Code, Artifact::Make])
        .expect("pipeline run");
    let make = report
        .output
        .as_ref()
        .and_then(|out| out.render(Artifact::Make))
        .expect("make artifact");

    assert!(make.starts_with("OBJECTS += A.o\nOBJECTS += B.o\nOBJECTS += C.o\n"), "{}", make);
    let a_path = data_dir().join("a.h").display().to_string();
    assert!(make.contains(&a_path));
    let doc = data_dir().join("app.miml").display().to_string();
    assert!(make.contains(&format!("\t./mimlc -c -m {}\n", doc)), "{}", make);
    assert!(make.contains("main: $(OBJECTS)"));
}

#[test]
fn test_regeneration_rule_repeats_invocation() {
    let regeneration = Regeneration {
        config_file: Some("cg.toml".to_string()),
        output_dir: Some("gen".to_string()),
    };
    let artifacts = [Artifact::Code, Artifact::Make, Artifact::Dot];
    let report = compile_with(&data_dir().join("app.miml"), &config(), &artifacts, regeneration)
        .expect("pipeline run");
    let make = report
        .output
        .as_ref()
        .and_then(|out| out.render(Artifact::Make))
        .expect("make artifact");

    let doc = data_dir().join("app.miml").display().to_string();
    assert!(make.contains(&format!("gen/main.c gen/wiring.dot: {}", doc)), "{}", make);
    assert!(make.contains(&format!("\t./mimlc -c -d -m -g cg.toml -o gen {}\n", doc)), "{}", make);
}

#[test]
fn test_end_to_end_tick() {
    let report = run_document(
        "sources:\n  - [A, a.h]\n  - [B, b.h]\nmessages:\n  A.tick: [B.onTick]\n",
        &[Artifact::Code],
    );
    assert!(report.succeeded(), "{:?}", report.diagnostics);
    let code = code_for(&report);
    assert!(code.contains("void tick(int count){\n\tonTick(count);\n}\n"));
    assert_eq!(code.matches("onTick(count);").count(), 1);
}

#[test]
fn test_arity_mismatch_is_reported() {
    let report = run_document(
        "sources:\n  - [A, a.h]\n  - [B, b.h]\nmessages:\n  A.tick: [B.onPair]\n",
        &[Artifact::Code],
    );
    assert_eq!(report.state, Terminal::Failure("Validate".to_string()));
    assert_eq!(
        errors(&report),
        ["Message 'A.tick': receiver 'B.onPair' takes 2 argument(s) but the sender provides 1"]
    );
    assert!(report.output.is_none());
}

#[test]
fn test_names_may_differ_between_sender_and_receiver() {
    let report = run_document(
        "sources:\n  - [A, a.h]\n  - [B, b.h]\nmessages:\n  A.status: [B.onStatus]\n",
        &[Artifact::Code],
    );
    assert!(report.succeeded(), "{:?}", report.diagnostics);
}

#[test]
fn test_unloaded_module_is_reported_without_output() {
    let report = run_document(
        "sources:\n  - [A, a.h]\n  - [B, b.h]\nmessages:\n  Z.tick: [B.onTick]\n",
        &[Artifact::Code],
    );
    assert_eq!(report.state, Terminal::Failure("Validate".to_string()));
    let errors = errors(&report);
    assert_eq!(errors, ["Message 'Z.tick': module Z is not loaded"]);
    assert!(report.output.is_none());
}

#[test]
fn test_unknown_key_is_unhandled_content() {
    let report = run_document(
        "sources:\n  - [A, a.h]\nmesages:\n  A.tick: [B.onTick]\n",
        &[Artifact::Code],
    );
    assert_eq!(report.state, Terminal::Failure("Expand".to_string()));
    assert_eq!(errors(&report), ["unhandled content: mesages"]);
    assert!(report.output.is_none());
}

#[test]
fn test_user_modules_key_is_unhandled_content() {
    let report = run_document("sources:\n  - [A, a.h]\nmodules: {}\n", &[Artifact::Code]);
    assert_eq!(report.state, Terminal::Failure("Expand".to_string()));
    assert_eq!(errors(&report), ["unhandled content: modules"]);
}

#[test]
fn test_missing_header_is_reported() {
    let report = run_document("sources:\n  - [A, nowhere.h]\n", &[Artifact::Code]);
    assert_eq!(report.state, Terminal::Failure("Expand".to_string()));
    let errors = errors(&report);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Could not find header file"), "{}", errors[0]);
    assert!(errors[0].contains("nowhere.h"));
}

#[test]
fn test_duplicate_init_stops_before_validation() {
    let report = run_document(
        "sources:\n  - [T, twoinits.h]\nmessages:\n  Z.tick: [B.onTick]\n",
        &[Artifact::Code],
    );
    assert_eq!(report.state, Terminal::Failure("Expand".to_string()));
    let errors = errors(&report);
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors[0].starts_with("More than one miml init specified for "));
}

#[test]
fn test_dead_conditional_branches_are_not_extracted() {
    let report = run_document("sources:\n  - [V, variant.h]\nmessages: {}\n", &[]);
    assert!(report.succeeded(), "{:?}", report.diagnostics);
    let module = report.tree.modules().and_then(|m| m.get("V")).expect("module V");
    assert_eq!(module.senders.len(), 1);
    assert_eq!(module.senders["out"], [Parameter::new("int", "v")]);
    assert_eq!(module.init.as_ref().map(|h| h.function.as_str()), Some("V_init"));
}

#[test]
fn test_declarations_from_other_files_are_skipped() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let header = dir.path().join("own.h");
    let full_path = header.display().to_string();
    let text = format!(
        "# 1 \"cousin.h\"\nvoid MIML_SENDER cousin_out(int x);\n# 5 \"{}\"\nvoid MIML_SENDER own_out(int x);\n",
        full_path
    );
    fs::write(&header, text).expect("Failed to write header");
    let doc = dir.path().join("wiring.miml");
    fs::write(&doc, "sources:\n  - [O, own.h]\nmessages: {}\n").expect("Failed to write document");

    let config = Config { include: vec![dir.path().display().to_string()], ..Config::default() };
    let report = compile(&doc, &config, &[]).expect("pipeline run");
    assert!(report.succeeded(), "{:?}", report.diagnostics);
    let module = report.tree.modules().and_then(|m| m.get("O")).expect("module O");
    assert_eq!(module.path, full_path);
    assert!(module.senders.contains_key("own_out"));
    assert!(!module.senders.contains_key("cousin_out"));
}

#[test]
fn test_duplicate_sender_is_reported() {
    let report = run_document("sources:\n  - [D, dupsender.h]\n", &[Artifact::Code]);
    assert_eq!(report.state, Terminal::Failure("Expand".to_string()));
    let errors = errors(&report);
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors[0].starts_with("Duplicate miml sender ping in "), "{}", errors[0]);
    assert!(errors[0].ends_with("dupsender.h"));
}

#[test]
fn test_dispatcher_named_like_a_receiver_is_rejected() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("p.h"), "void MIML_SENDER tick(int count);\n").expect("write p.h");
    fs::write(dir.path().join("q.h"), "void MIML_RECEIVER tick(int n);\n").expect("write q.h");
    let doc = dir.path().join("wiring.miml");
    fs::write(&doc, "sources:\n  - [P, p.h]\n  - [Q, q.h]\nmessages:\n  P.tick: [Q.tick]\n")
        .expect("Failed to write document");

    let config = Config { include: vec![dir.path().display().to_string()], ..Config::default() };
    let report = compile(&doc, &config, &[Artifact::Code]).expect("pipeline run");
    assert_eq!(report.state, Terminal::Failure("Validate".to_string()));
    assert_eq!(
        errors(&report),
        ["Message 'P.tick': dispatcher tick would redefine receiver Q.tick"]
    );
    assert!(report.output.is_none());
}

#[test]
fn test_synthetic_names_in_module_table() {
    let report = run_document("sources:\n  - [A, a.h]\n  - [C, c.h]\nmessages: {}\n", &[]);
    assert!(report.succeeded(), "{:?}", report.diagnostics);
    let modules = report.tree.modules().expect("module table");

    let status = &modules.get("A").expect("module A").senders["status"];
    assert_eq!(status, &[Parameter::new("int", "_arg1"), Parameter::new("char *", "name")]);
    let log_tick = &modules.get("C").expect("module C").receivers["logTick"];
    assert_eq!(log_tick, &[Parameter::new("const int", "_arg1")]);
}

#[test]
fn test_expansion_is_idempotent() {
    let doc = data_dir().join("app.miml");
    let stage = ExpansionStage::default();
    let tree = load_document(&doc, &config()).expect("load");

    let dump = || {
        let outcome = stage.handle(&tree).expect("expand");
        assert!(!outcome.diagnostics.has_errors(), "{:?}", outcome.diagnostics);
        match outcome.sections.into_iter().next() {
            Some(Section::Modules(table)) => table.to_yaml().expect("yaml"),
            other => panic!("Expected modules section, got {:?}", other),
        }
    };
    assert_eq!(dump(), dump());
}

#[test]
fn test_standard_stage_order() {
    let driver = Driver::standard(Default::default(), &[Artifact::Code]).expect("driver");
    assert_eq!(driver.stage_names(), ["Expand", "Validate", "Generate"]);
}
