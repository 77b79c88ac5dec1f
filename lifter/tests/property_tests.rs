// Property-based tests for the rewrite passes.
//
// Categories:
// 1. Unwrap: identity on inputs without the artifact, strictness when real
//    code sits between the braces, exactly one brace removed otherwise
// 2. Lift: fall-through merge, default exclusion, failure on a second run
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use dlift::config::{LiftConfig, TransformConfig};
use dlift::error::{Structure, TransformError};
use dlift::lift::lift_switch;
use dlift::pipeline::transform;
use dlift::unwrap::unwrap_braces;
use proptest::prelude::*;

// ── Generators ──────────────────────────────────────────────────────────────

/// Whitespace, `//` comments and `/* */` comments in any mix.
fn arb_filler() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[ \t\n]{1,3}",
        "[a-z ]{0,10}".prop_map(|t| format!("//{t}\n")),
        "[a-z \n]{0,10}".prop_map(|t| format!("/*{t}*/")),
    ];
    prop::collection::vec(piece, 0..4).prop_map(|v| v.concat())
}

fn arb_statement() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_map(|name| format!("{name}();"))
}

/// Label groups: each inner vec is one fall-through set, sized 1..=3.
fn arb_groups() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..=3, 1..6)
}

/// Interpreter whose switch has one labelled block per group, opcodes
/// numbered in order, and a `default:` inserted before group `default_at`.
/// With `shared`, one extra case label falls through into `default:`.
fn interpreter(groups: &[usize], default_at: usize, default_body: &str, shared: bool) -> String {
    let mut src = String::from("namespace core {\nbool f(uint8_t opcode) {\n    switch (opcode) {\n");
    let mut next = 0;
    let push_default = |src: &mut String, next: &mut usize| {
        if shared {
            src.push_str(&format!("        case OP_{next}:\n"));
            *next += 1;
        }
        src.push_str("        default:\n");
        src.push_str(&format!("            {default_body}\n"));
    };
    for (g, &size) in groups.iter().enumerate() {
        if g == default_at {
            push_default(&mut src, &mut next);
        }
        for _ in 0..size {
            src.push_str(&format!("        case OP_{next}:\n"));
            next += 1;
        }
        src.push_str(&format!("            handle_{g}();\n            break;\n"));
    }
    if default_at >= groups.len() {
        push_default(&mut src, &mut next);
    }
    src.push_str("    }\n    return true;\n}\n} // namespace core\n");
    src
}

fn lift_config() -> LiftConfig {
    LiftConfig {
        constructor: None,
        ..LiftConfig::default()
    }
}

// ── 1. Unwrap ───────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn unwrap_is_identity_without_while_zero(src in "[a-z{}/* \n;]{0,120}") {
        let result = unwrap_braces(&src);
        prop_assert_eq!(&result.text, &src);
        prop_assert!(result.sites.is_empty());
    }

    #[test]
    fn unwrap_is_identity_without_closing_braces(src in "[a-z0-9 ;(){\n/*]{0,120}") {
        prop_assert_eq!(unwrap_braces(&src).text, src);
    }

    #[test]
    fn real_code_between_braces_is_never_collapsed(
        before in arb_filler(),
        stmt in arb_statement(),
        after in arb_filler(),
    ) {
        let src = format!("}}{before}{stmt}{after}}} while(0);");
        prop_assert_eq!(unwrap_braces(&src).text, src);
    }

    #[test]
    fn artifact_loses_exactly_the_second_brace(
        prefix in "[a-z; \n]{0,20}",
        filler in arb_filler(),
        gap in "[ \n]{0,3}",
    ) {
        let src = format!("{prefix}}}{filler}}}{gap}while(0);\n");
        let result = unwrap_braces(&src);
        prop_assert_eq!(result.sites.len(), 1);
        prop_assert_eq!(result.text, format!("{prefix}}}{filler}while(0);\n"));
    }
}

// ── 2. Lift ─────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn fall_through_labels_share_one_handler(groups in arb_groups()) {
        let src = interpreter(&groups, groups.len(), "fail();", false);
        let result = lift_switch(&src, &lift_config(), false).unwrap();

        prop_assert_eq!(result.partition.cases.len(), groups.len());
        let mut next = 0;
        for (case, &size) in result.partition.cases.iter().zip(&groups) {
            let expected: Vec<String> = (next..next + size).map(|i| format!("OP_{i}")).collect();
            prop_assert_eq!(&case.opcodes, &expected);
            next += size;

            let chain = expected
                .iter()
                .map(|op| format!("instructionTable[{op}]"))
                .collect::<Vec<_>>()
                .join(" = ");
            let assignment = format!("    {chain} = [this](");
            prop_assert_eq!(result.text.matches(assignment.as_str()).count(), 1);
        }
    }

    #[test]
    fn default_body_never_reaches_the_table(
        groups in arb_groups(),
        default_at in 0usize..6,
        marker in "zz_[a-z]{4,8}",
        shared in any::<bool>(),
    ) {
        let body = format!("{marker}();");
        let src = interpreter(&groups, default_at, &body, shared);
        let result = lift_switch(&src, &lift_config(), false).unwrap();
        prop_assert!(!result.text.contains(&marker));
        prop_assert!(result.partition.default.is_some());
        prop_assert_eq!(result.partition.dangling.len(), usize::from(shared));
    }

    #[test]
    fn second_run_is_not_found(groups in arb_groups()) {
        let mut config = TransformConfig::default();
        config.lift.constructor = None;
        let src = interpreter(&groups, groups.len(), "fail();", false);

        let once = transform(&src, &config).unwrap().text;
        let err = transform(&once, &config).unwrap_err();
        let is_switch_not_found = matches!(
            err.error,
            TransformError::NotFound { what: Structure::SwitchOpen, .. }
        );
        prop_assert!(is_switch_not_found);
    }
}

// ── End-to-end scenario ─────────────────────────────────────────────────────

#[test]
fn add_and_sub_get_distinct_handlers() {
    let src = "\
namespace core {
bool Interpreter::executeInstruction(std::shared_ptr<JavaThread> thread, std::shared_ptr<StackFrame> frame, util::DataReader& codeReader) {
    uint8_t opcode = codeReader.readU1();
    switch (opcode) {
        case OP_ADD: a=a+b; break; case OP_SUB: a=a-b; break; default: fail();
    }
    return true;
}
} // namespace core
";
    let result = lift_switch(src, &lift_config(), false).unwrap();
    let text = &result.text;

    assert_eq!(result.partition.cases.len(), 2);
    assert_eq!(text.matches("instructionTable[OP_ADD] = [this](").count(), 1);
    assert_eq!(text.matches("instructionTable[OP_SUB] = [this](").count(), 1);
    assert!(text.contains("            a=a+b; break;\n"));
    assert!(text.contains("            a=a-b; break;\n"));
    assert!(!text.contains("fail();"));

    // Every slot starts out with the shared unknown-opcode handler.
    assert!(text.contains("    instructionTable.resize(256);\n"));
    assert!(text.contains("    for(int i=0; i<256; i++) instructionTable[i] = []("));

    assert!(text.contains("    if (instructionTable[opcode]) {\n"));
    assert!(text.contains(
        "        return instructionTable[opcode](thread, frame, codeReader, opcode);\n"
    ));
    assert!(!text.contains("switch (opcode)"));
}
