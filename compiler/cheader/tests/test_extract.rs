use cheader::{AnnotationKind, ExtractError, ExtractedParam, Extractor, Signature};

fn signatures(path: &str) -> Vec<Signature> {
    Extractor::builtin()
        .signatures(path)
        .expect("header should lex")
        .collect::<Result<Vec<_>, _>>()
        .expect("header should extract")
}

fn param(ctype: &str, name: Option<&str>) -> ExtractedParam {
    ExtractedParam { ctype: ctype.to_string(), name: name.map(str::to_string) }
}

#[test]
fn test_adis_header() {
    let sigs = signatures("tests/data/adis.h");
    assert_eq!(sigs.len(), 2);

    assert_eq!(sigs[0].name, "adis_out");
    assert_eq!(sigs[0].kind, AnnotationKind::Sender);
    assert_eq!(sigs[0].params, [param("ADISMessage *", None)]);
    assert_eq!(sigs[0].file, "tests/data/adis.h");
    assert_eq!(sigs[0].line, 7);

    assert_eq!(sigs[1].name, "adis_raw");
    assert_eq!(sigs[1].kind, AnnotationKind::Receiver);
    assert_eq!(
        sigs[1].params,
        [param("unsigned char *", None), param("unsigned int", None), param("unsigned char *", None)]
    );
}

#[test]
fn test_ethmux_header() {
    let sigs = signatures("tests/data/ethmux.h");
    let kinds: Vec<_> = sigs.iter().map(|s| (s.name.as_str(), s.kind)).collect();
    assert_eq!(
        kinds,
        [
            ("ethmux_init", AnnotationKind::Init),
            ("ethmux_final", AnnotationKind::Final),
            ("demuxed_ADIS", AnnotationKind::Sender),
            ("demuxed_RC", AnnotationKind::Sender),
        ]
    );
    assert_eq!(sigs[0].params, [param("int", Some("argc")), param("char *", Some("argv"))]);
    assert!(sigs[1].params.is_empty());
    assert_eq!(
        sigs[2].params,
        [
            param("unsigned char *", Some("buffer")),
            param("unsigned int", Some("length")),
            param("unsigned char *", Some("timestamp")),
        ]
    );
}

#[test]
fn test_includes_are_not_followed_without_a_preprocessor() {
    let sigs = signatures("tests/data/logger.h");
    assert_eq!(sigs.len(), 4);
    assert!(sigs.iter().all(|s| s.file == "tests/data/logger.h"));
}

#[test]
fn test_preprocessed_output_keeps_originating_files() {
    let text = std::fs::read_to_string("tests/data/logger.i").expect("read fixture");
    let sigs: Vec<Signature> = Extractor::signatures_from_str("tests/data/logger.h", &text)
        .expect("lex")
        .collect::<Result<_, _>>()
        .expect("extract");

    let from_adis: Vec<_> =
        sigs.iter().filter(|s| s.file == "tests/data/adis.h").map(|s| s.name.as_str()).collect();
    assert_eq!(from_adis, ["adis_out", "adis_raw"]);

    let own: Vec<_> = sigs
        .iter()
        .filter(|s| s.file == "tests/data/logger.h")
        .map(|s| (s.name.as_str(), s.kind, s.line))
        .collect();
    assert_eq!(
        own,
        [
            ("logger_final", AnnotationKind::Final, 6),
            ("logger_init", AnnotationKind::Init, 7),
            ("log_receive_adis", AnnotationKind::Receiver, 8),
        ]
    );
}

#[test]
fn test_non_void_return_names_function_and_file() {
    let results: Vec<_> =
        Extractor::builtin().signatures("tests/data/badreturn.h").expect("lex").collect();
    assert!(results[0].is_ok());
    match &results[1] {
        Err(e @ ExtractError::ReturnType { .. }) => {
            let message = e.to_string();
            assert!(message.contains("bad_count"), "{}", message);
            assert!(message.contains("tests/data/badreturn.h"), "{}", message);
        }
        other => panic!("Expected ReturnType error, got {:?}", other),
    }
}

#[test]
fn test_final_with_parameters_is_rejected() {
    let mut results = Extractor::builtin().signatures("tests/data/badfinal.h").expect("lex");
    match results.next() {
        Some(Err(ExtractError::FinalArguments { function, .. })) => assert_eq!(function, "bad_final"),
        other => panic!("Expected FinalArguments error, got {:?}", other),
    }
    assert!(results.next().is_none());
}

#[test]
fn test_duplicate_inits_are_both_reported_to_the_caller() {
    let sigs = signatures("tests/data/twoinits.h");
    assert!(sigs.iter().all(|s| s.kind == AnnotationKind::Init));
    assert_eq!(sigs.len(), 2);
}

#[test]
fn test_malformed_annotation_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("twice.h");
    std::fs::write(&path, "void MIML_SENDER MIML_RECEIVER both(int x);\n").expect("write header");
    let path = path.to_str().expect("utf-8 path");

    let mut results = Extractor::builtin().signatures(path).expect("lex");
    match results.next() {
        Some(Err(ExtractError::MalformedAnnotation { line, .. })) => assert_eq!(line, 1),
        other => panic!("Expected MalformedAnnotation error, got {:?}", other),
    }
}

#[test]
fn test_unterminated_comment_aborts_the_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.h");
    std::fs::write(&path, "void MIML_INIT ok(void);\n/* oops\n").expect("write header");

    match Extractor::builtin().signatures(path.to_str().expect("utf-8 path")) {
        Err(e @ ExtractError::Syntax { .. }) => assert!(e.to_string().contains("broken.h")),
        other => panic!("Expected Syntax error, got {:?}", other.map(|s| s.count())),
    }
}
