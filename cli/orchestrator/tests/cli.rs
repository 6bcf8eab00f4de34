// run mimlc against a scratch project and inspect the written artifacts
use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

const SENDER_H: &str = "void MIML_INIT A_init(void);\nvoid MIML_SENDER tick(int count);\n";
const RECEIVER_H: &str = "void MIML_FINAL B_final(void);\nvoid MIML_RECEIVER onTick(int n);\n";

/// A project with two modules in `tmp` and an empty config file.
fn project(messages: &str) -> TempDir {
    let tmp = tempdir().expect("Failed to create temp dir");
    fs::write(tmp.path().join("a.h"), SENDER_H).expect("write a.h");
    fs::write(tmp.path().join("b.h"), RECEIVER_H).expect("write b.h");
    fs::write(tmp.path().join("cg.toml"), "").expect("write cg.toml");
    let doc = format!("sources:\n  - [A, a.h]\n  - [B, b.h]\nmessages:\n{}", messages);
    fs::write(tmp.path().join("app.miml"), doc).expect("write app.miml");
    tmp
}

fn mimlc(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mimlc"));
    cmd.current_dir(dir).args(["-g", "cg.toml"]);
    cmd
}

#[test]
fn default_run_writes_code_and_make() {
    let tmp = project("  A.tick: [B.onTick]\n");
    let out = tmp.path().join("gen");
    mimlc(tmp.path()).args(["-o", "gen", "app.miml"]).assert().success();

    let code = fs::read_to_string(out.join("main.c")).expect("main.c");
    assert!(code.contains("void tick(int count){\n\tonTick(count);\n}\n"));
    assert!(code.contains("\tA_init();"));
    let make = fs::read_to_string(out.join("Makefile.miml")).expect("Makefile.miml");
    assert!(make.starts_with("OBJECTS += A.o\nOBJECTS += B.o\n"));
    assert!(make.contains("gen/main.c: app.miml"), "{}", make);
    assert!(make.contains("\t./mimlc -c -m -g cg.toml -o gen app.miml\n"), "{}", make);
    assert!(!out.join("main.h").exists());
}

#[test]
fn header_and_dot_flags() {
    let tmp = project("  A.tick: [B.onTick]\n");
    mimlc(tmp.path()).args(["-c", "-H", "-d", "app.miml"]).assert().success();

    let header = fs::read_to_string(tmp.path().join("main.h")).expect("main.h");
    assert!(header.contains("#ifndef MAIN_H_"));
    assert!(header.contains("void tick(int count);"));
    let code = fs::read_to_string(tmp.path().join("main.c")).expect("main.c");
    assert!(code.contains("#include \"main.h\""));
    assert!(tmp.path().join("wiring.dot").exists());
    assert!(!tmp.path().join("Makefile.miml").exists());
}

#[test]
fn validation_failure_writes_nothing() {
    let tmp = project("  Z.tick: [B.onTick]\n");
    mimlc(tmp.path())
        .arg("app.miml")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("module Z is not loaded"));
    assert!(!tmp.path().join("main.c").exists());
    assert!(!tmp.path().join("Makefile.miml").exists());
}

#[test]
fn unknown_key_is_rejected() {
    let tmp = project("  A.tick: [B.onTick]\nmesages: {}\n");
    mimlc(tmp.path())
        .arg("app.miml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unhandled content: mesages"));
}

#[test]
fn dump_modules_prints_yaml() {
    let tmp = project("  A.tick: [B.onTick]\n");
    mimlc(tmp.path())
        .args(["--dump-modules", "-o", "gen", "app.miml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("onTick"))
        .stdout(predicate::str::contains("A_init"));
}

#[test]
fn dump_modules_as_json() {
    let tmp = project("  A.tick: [B.onTick]\n");
    mimlc(tmp.path())
        .args(["--dump-modules=json", "-o", "gen", "app.miml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("\"onTick\""))
        .stdout(predicate::str::contains("\"A_init\""));
}

#[test]
fn missing_config_file_fails() {
    let tmp = project("  A.tick: [B.onTick]\n");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mimlc"));
    cmd.current_dir(tmp.path())
        .args(["-g", "absent.toml", "app.miml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn missing_document_argument_is_a_usage_error() {
    let tmp = tempdir().expect("Failed to create temp dir");
    Command::new(assert_cmd::cargo::cargo_bin!("mimlc"))
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
