// SPDX-License-Identifier: (MIT OR Apache-2.0)

use rulesig::{Action, ParseOutcome, SigError, SigFlags};

mod common;
use common::{new_engine, new_strict_engine};

#[test]
fn scenario_1_single_signature_with_negated_destination() {
    let mut engine = new_engine();
    let outcome = engine
        .parse_rule(r#"alert tcp 1.2.3.4 any -> !1.2.3.4 any (msg:"t"; sid:1;)"#)
        .unwrap();
    assert_eq!(outcome, ParseOutcome::Parsed(()));
    assert_eq!(engine.signatures().len(), 1);
    let sig = &engine.signatures()[0];
    assert!(sig.action.contains(Action::ALERT));
    assert!(!sig.src.is_any());
}

#[test]
fn scenario_2_bidirectional_with_equal_endpoints_is_not_cloned() {
    let mut engine = new_engine();
    engine.parse_rule("alert tcp any any <> any any (sid:1;)").unwrap();
    assert_eq!(engine.signatures().len(), 1);
    assert!(!engine.signatures()[0].flags.contains(SigFlags::INIT_BIDIREC));
}

#[test]
fn scenario_3_bidirectional_with_differing_endpoints_clones_both_flagged() {
    let mut engine = new_engine();
    engine
        .parse_rule("alert tcp 1.2.3.4 1024:65535 <> !1.2.3.4 any (msg:\"t\"; sid:1;)")
        .unwrap();
    assert_eq!(engine.signatures().len(), 2);
    let a = &engine.signatures()[0];
    let b = &engine.signatures()[1];
    assert_ne!(a.src, b.src);
    assert_ne!(a.dst, b.dst);
    assert!(a.flags.contains(SigFlags::INIT_BIDIREC));
    assert!(b.flags.contains(SigFlags::INIT_BIDIREC));
}

#[test]
fn scenario_4_dsize_forces_require_packet_only() {
    let mut engine = new_engine();
    engine
        .parse_rule(r#"alert tcp any any -> any any (content:"abc"; dsize:>0; sid:1;)"#)
        .unwrap();
    let sig = &engine.signatures()[0];
    assert!(sig.flags.contains(SigFlags::REQUIRE_PACKET));
    assert!(!sig.flags.contains(SigFlags::REQUIRE_STREAM));
}

#[test]
fn scenario_5_plain_content_infers_require_stream_only() {
    let mut engine = new_engine();
    engine
        .parse_rule(r#"alert tcp any any -> any any (content:"abc"; sid:1;)"#)
        .unwrap();
    let sig = &engine.signatures()[0];
    assert!(sig.flags.contains(SigFlags::REQUIRE_STREAM));
    assert!(!sig.flags.contains(SigFlags::REQUIRE_PACKET));
}

#[test]
fn scenario_6_revision_sequence_converges_on_highest() {
    let mut engine = new_engine();
    engine.parse_rule("alert tcp any any -> any any (sid:1; rev:1;)").unwrap();
    engine.parse_rule("alert tcp any any -> any any (sid:1; rev:2;)").unwrap();
    engine.parse_rule("alert tcp any any -> any any (sid:1; rev:1;)").unwrap();
    assert_eq!(engine.signatures().len(), 1);
    assert_eq!(engine.signatures()[0].rev, 2);
}

#[test]
fn scenario_7_negated_any_is_rejected() {
    let mut engine = new_engine();
    let err = engine.parse_rule("alert tcp any !any -> any any (sid:1;)").unwrap_err();
    assert_eq!(err, SigError::NegatedAny);
}

#[test]
fn scenario_8_rawbytes_incompatible_with_file_data_is_rejected() {
    let mut engine = new_engine();
    let err = engine
        .parse_rule(r#"alert http any any -> any any (file_data; content:"x"; rawbytes; sid:1;)"#)
        .unwrap_err();
    assert!(matches!(err, SigError::SetupFailed { .. }));
}

#[test]
fn deprecated_keyword_warns_but_parses_under_default_config() {
    let mut engine = new_engine();
    let outcome = engine
        .parse_rule(r#"alert http any any -> any any (content:"x"; http_uri; sid:1;)"#)
        .unwrap();
    assert_eq!(outcome, ParseOutcome::Parsed(()));
}

#[test]
fn deprecated_keyword_is_rejected_under_strict_parsing() {
    let mut engine = new_strict_engine();
    let err = engine
        .parse_rule(r#"alert http any any -> any any (content:"x"; http_uri; sid:1;)"#)
        .unwrap_err();
    assert!(matches!(err, SigError::SetupFailed { .. }));
}

#[test]
fn keyword_names_are_looked_up_case_insensitively() {
    let mut engine = new_engine();
    let outcome = engine.parse_rule(r#"alert tcp any any -> any any (MSG:"t"; SID:1;)"#).unwrap();
    assert_eq!(outcome, ParseOutcome::Parsed(()));
    assert_eq!(engine.signatures()[0].msg.as_deref(), Some("t"));
}
