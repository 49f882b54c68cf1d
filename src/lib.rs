// SPDX-License-Identifier: (MIT OR Apache-2.0)

#![warn(missing_docs)]

//! Parses and validates signature rules for a network intrusion detection
//! engine: the same rule language Suricata/Snort rulesets use, minus the
//! runtime matching itself.
//!
//! A rule line looks like
//!
//! ```text
//! alert http any any -> any any (msg:"example"; content:"GET"; http_uri; sid:1; rev:1;)
//! ```
//!
//! and runs through a fixed pipeline: tokenize the seven header fields and
//! the option list, parse the header into address/port/protocol/hook
//! fields, walk the options twice (once for `requires`/`sid`, once for
//! everything else) dispatching each one to its keyword's `Setup`, validate
//! the fully assembled signature against a dozen cross-cutting invariants,
//! clone it for `<>` bidirectional rules with differing endpoints, and fold
//! it into the running `(gid, sid)` duplicate index.
//!
//! ```
//! use rulesig::{EngineConfig, EngineCtx};
//!
//! let mut engine = EngineCtx::new(EngineConfig::default());
//! engine.parse_rule(r#"alert tcp any any -> any any (msg:"hello"; sid:1;)"#)?;
//! assert_eq!(engine.signatures().len(), 1);
//! # Ok::<(), rulesig::SigError>(())
//! ```
//!
//! [`EngineCtx`] is the single entry point: it owns the keyword registry,
//! the stand-in app-layer registry, and the accumulated signature list for
//! one parsing session. Nothing here is thread-safe by design (§5 of the
//! design notes) — run one [`EngineCtx`] per thread, each with its own
//! rule file or subset.

mod addr_port;
mod applayer;
mod bidir;
mod builtin_keywords;
mod dedup;
mod engine;
mod error;
mod header;
mod keyword;
mod lexer;
mod option_parser;
mod sigmatch;
mod signature;
mod tables;
mod validator;

pub use addr_port::{AddressLiteral, AddressSet, PortRange, PortSet};
pub use applayer::{AlProto, AppLayerRegistry, BufferTypeInfo, Direction, InspectEngine};
pub use engine::{EngineConfig, EngineCtx};
pub use error::{ParseOutcome, SigError};
pub use keyword::{
    KeywordFlags, KeywordId, KeywordRegistry, KeywordTableEntry, SetupFn, SetupInput, SetupOutcome,
};
pub use lexer::LexedRule;
pub use sigmatch::{CompareOp, ContentData, FlowData, SigMatch, SigMatchCtx, SigMatchFlags, SizeData};
pub use signature::{
    legacy_list, Action, ActionScope, Buffer, Hook, MatchScope, NetProto, Phase, SigFlags, Signature,
};
pub use tables::{BufferKind, DetectTable, SigType};

/// A convenience alias for a result whose error is always [`SigError`].
pub type Result<T> = std::result::Result<T, SigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_level_pipeline_smoke_test() {
        let mut engine = EngineCtx::new(EngineConfig::default());
        let outcome = engine
            .parse_rule(r#"alert tcp any any -> any any (msg:"smoke"; content:"GET"; sid:1; rev:1;)"#)
            .unwrap();
        assert_eq!(outcome, ParseOutcome::Parsed(()));
        assert_eq!(engine.signatures().len(), 1);
        assert_eq!(engine.signatures()[0].msg.as_deref(), Some("smoke"));
    }

    #[test]
    fn bytes_entry_point_rejects_invalid_utf8() {
        let mut engine = EngineCtx::new(EngineConfig::default());
        let err = engine.parse_rule_bytes(&[0xff, 0xfe, 0xfd]).unwrap_err();
        assert!(matches!(err, SigError::BadUtf8));
    }
}
