//! Integration tests for the attrel REPL.
//!
//! These tests run line sequences through a `Repl` and check each output.

use attrel_kernel::EngineConfig;
use attrel_kernel::types::Zone;
use attrel_repl::Repl;

fn new_repl() -> Repl {
    Repl::with_config(EngineConfig::default().with_default_zone(Zone::utc()))
}

/// Run lines through a fresh REPL and collect the outputs, skipping lines
/// that print nothing.
fn run_script(script: &str) -> Vec<String> {
    let mut repl = new_repl();
    let mut outputs = Vec::new();
    for line in script.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match repl.process_line(line) {
            Ok(Some(output)) => outputs.push(output),
            Ok(None) => {}
            Err(e) => outputs.push(format!("Error: {e}")),
        }
    }
    outputs
}

/// Last output of a script.
fn last_output(script: &str) -> String {
    run_script(script).pop().unwrap_or_default()
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_set_and_reference() {
    let outputs = run_script(
        r#"
        /set name=world
        hello ${name}
        "#,
    );
    assert_eq!(outputs, vec![r#"name = "world""#, "        hello world"]);
}

#[test]
fn test_unset() {
    let outputs = run_script(
        r#"
        /set a=1
        /unset a
        /unset a
        [${a}]
        "#,
    );
    assert_eq!(outputs[1], "unset a");
    assert_eq!(outputs[2], "a is not set");
    assert_eq!(outputs[3].trim(), "[]");
}

#[test]
fn test_attrs_lists_json() {
    let outputs = run_script(
        r#"
        /attrs
        /set b=2
        /set a=1
        /attrs
        "#,
    );
    assert_eq!(outputs[0], "(no attributes set)");
    assert_eq!(outputs[3], "{\n  \"a\": \"1\",\n  \"b\": \"2\"\n}");
}

#[test]
fn test_set_usage() {
    assert_eq!(last_output("/set nothing"), "usage: /set name=value");
    assert_eq!(last_output("/set =x"), "usage: /set name=value");
}

#[test]
fn test_load_attributes() {
    let dir = std::env::temp_dir().join(format!("attrel-repl-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("attrs.json");
    std::fs::write(&path, r#"{"pi": "3.14159", "n": 2}"#).expect("write");

    let mut repl = new_repl();
    let loaded = repl
        .process_line(&format!("/load {}", path.display()))
        .expect("loads");
    assert!(loaded.expect("output").starts_with("loaded 2 attribute(s)"));
    assert_eq!(
        repl.process_line("${pi:toBigDecimal():divide(${n}, 2)}").expect("eval"),
        Some("1.57".to_string())
    );

    assert!(repl.process_line("/load /no/such/file.json").is_err());
    std::fs::remove_dir_all(&dir).ok();
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_decimal_session() {
    let outputs = run_script(
        r#"
        /set pi=3.1415926535897932384626433832795028841971693993751058209749445923078164062862089986280348253421170679
        /set number1=0.0100001
        ${pi:toBigDecimal():divide(${number1}, 7, 'up')}
        ${pi:toBigDecimal():min(${number1})}
        ${literal('0.3141592653589793'):toBigDecimal():setScale(4, 'HALF_UP'):toPercent()}
        "#,
    );
    let results: Vec<&str> = outputs[2..].iter().map(|s| s.trim()).collect();
    assert_eq!(results, vec!["314.1561238", "0.0100001", "31.42%"]);
}

#[test]
fn test_syntax_error_is_reported_not_fatal() {
    let mut repl = new_repl();
    let output = repl
        .process_line("${a:frob()}")
        .expect("errors are output")
        .expect("has output");
    assert!(output.contains("E001"), "{output}");
    assert!(output.contains('^'), "{output}");
    assert!(!repl.exit_requested());

    assert_eq!(
        repl.process_line("${literal(1):plus(1)}").expect("eval"),
        Some("2".to_string())
    );
}

#[test]
fn test_failed_block_is_empty() {
    let outputs = run_script(
        r#"
        /set a=oops
        <${a:toBigDecimal()}>
        "#,
    );
    assert_eq!(outputs[1].trim(), "<>");
}

#[test]
fn test_empty_line_prints_nothing() {
    let mut repl = new_repl();
    assert_eq!(repl.process_line("").expect("ok"), None);
    assert_eq!(repl.process_line("   ").expect("ok"), None);
}

// ============================================================================
// Meta-commands
// ============================================================================

#[test]
fn test_ast_mode() {
    let outputs = run_script(
        r#"
        /ast
        ${a:plus(1)}
        /ast
        "#,
    );
    assert_eq!(outputs[0], "AST mode: ON");
    assert!(outputs[1].ends_with("(call plus (attr a) (lit integer 1)))"), "{}", outputs[1]);
    assert_eq!(outputs[2], "AST mode: OFF");
}

#[test]
fn test_time_zone_switch() {
    let outputs = run_script(
        r#"
        /tz
        /set ms=1384741347678
        ${ms:toDate():getHourOfDay()}
        /tz Asia/Shanghai
        ${ms:toDate():getHourOfDay()}
        /tz Nowhere/Special
        "#,
    );
    assert_eq!(outputs[0], "time zone: UTC");
    assert_eq!(outputs[2].trim(), "2");
    assert_eq!(outputs[3], "time zone: Asia/Shanghai");
    assert_eq!(outputs[4].trim(), "10");
    assert!(outputs[5].starts_with("Error: unknown time zone"), "{}", outputs[5]);
}

#[test]
fn test_functions_listing() {
    let output = last_output("/functions getQuarter");
    assert!(output.contains("date:getQuarter()"), "{output}");
    assert!(output.contains("Quarter of the year"), "{output}");
}

#[test]
fn test_help() {
    let help = last_output("/help");
    assert!(help.contains("/set name=value"));
    assert_eq!(last_output("help"), help);
}

#[test]
fn test_unknown_command() {
    assert!(last_output("/frobnicate").starts_with("Unknown command: /frobnicate"));
}

#[test]
fn test_quit() {
    let mut repl = new_repl();
    assert_eq!(repl.process_line("/quit").expect("ok"), None);
    assert!(repl.exit_requested());
}
