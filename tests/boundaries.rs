// SPDX-License-Identifier: (MIT OR Apache-2.0)

use rulesig::{ParseOutcome, SigError};

mod common;
use common::new_engine;

#[test]
fn rule_with_63_options_is_accepted() {
    let mut engine = new_engine();
    let mut rule = String::from(r#"alert tcp any any -> any any (sid:1; msg:"t"; "#);
    for i in 0..61 {
        rule.push_str(&format!("reference:r{i};"));
    }
    rule.push(')');

    let outcome = engine.parse_rule(&rule).unwrap();
    assert_eq!(outcome, ParseOutcome::Parsed(()));
    assert_eq!(engine.signatures()[0].references.len(), 61);
}

#[test]
fn sid_absent_is_rejected_after_requires_pass() {
    let mut engine = new_engine();
    let err = engine.parse_rule(r#"alert tcp any any -> any any (msg:"t";)"#).unwrap_err();
    assert_eq!(err, SigError::MissingSid);
}

#[test]
fn port_1024_65536_is_out_of_range() {
    let mut engine = new_engine();
    let err = engine
        .parse_rule("alert tcp any 1024:65536 -> any any (sid:1;)")
        .unwrap_err();
    assert!(matches!(err, SigError::InvalidPort(_)));
}

#[test]
fn ordinary_app_hook_alert_is_not_forced_into_the_firewall_path() {
    use rulesig::SigFlags;

    let mut engine = new_engine();
    let outcome = engine.parse_rule("alert http:request_started any any -> any any (sid:1;)").unwrap();
    assert_eq!(outcome, ParseOutcome::Parsed(()));
    assert!(!engine.signatures()[0].flags.contains(SigFlags::FIREWALL));
}

#[test]
fn unbalanced_bracket_inside_a_quoted_content_value_does_not_break_option_splitting() {
    let mut engine = new_engine();
    let outcome = engine.parse_rule(r#"alert tcp any any -> any any (content:"["; sid:1;)"#).unwrap();
    assert_eq!(outcome, ParseOutcome::Parsed(()));
}

#[test]
fn buffer_vector_caps_at_64_distinct_buffers() {
    use rulesig::{legacy_list, ContentData, Signature, SigMatchCtx};

    let mut sig = Signature::new(1);
    for n in 0..64u16 {
        let list_id = legacy_list::THRESHOLD + 1 + n;
        sig.select_sticky_buffer(list_id).unwrap();
        sig.append_match(list_id, 0, SigMatchCtx::Content(ContentData::default())).unwrap();
    }
    assert_eq!(sig.buffers().len(), 64);

    let overflow_id = legacy_list::THRESHOLD + 1 + 64;
    assert!(matches!(sig.select_sticky_buffer(overflow_id), Err(SigError::Semantic(_))));
}
