// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The engine context (§5): the single-threaded owner of everything that
//! persists across rule parses — the keyword registry, the app-layer
//! registry, the duplicate index, the per-keyword silent-error bookkeeping,
//! and the accumulated signature list.
//!
//! Upstream keeps most of this behind process-global statics populated once
//! at startup. A process-wide `static` has no safe-Rust equivalent without
//! `unsafe` or a lock that would serialize every parse, so [`EngineCtx`]
//! plays the role of "the process" instead: build one, parse every rule
//! through it, and read back `signatures()` when done.

use log::{debug, warn};

use crate::bidir::{endpoints_equal, swap_addresses};
use crate::dedup::{DedupOutcome, DuplicateIndex};
use crate::error::{ParseOutcome, SigError};
use crate::header::parse_header;
use crate::keyword::{KeywordRegistry, SilentErrorTracker};
use crate::lexer::{lex_rule, split_options};
use crate::option_parser::{parse_options, OptionPassOutcome};
use crate::signature::Signature;
use crate::validator::validate;
use crate::{applayer::AppLayerRegistry, builtin_keywords};

/// Runtime strictness/feature switches (§4.2's `apply_strict`), threaded
/// through [`EngineCtx::new`] rather than gated by Cargo features: whether a
/// rule parses strictly is a per-engine-context decision here, not a
/// build-time one.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Flips every keyword entry's `STRICT_PARSING` behavior on, the `all`
    /// value of the upstream CLI strict-mode switch.
    pub strict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { strict: false }
    }
}

/// The single-threaded owner of one parsing session: a built keyword table,
/// an app-layer registry, and the signature list and duplicate index that
/// grow as rules are parsed.
pub struct EngineCtx {
    registry: KeywordRegistry,
    app_layer: AppLayerRegistry,
    silent_errors: SilentErrorTracker,
    dedup: DuplicateIndex,
    signatures: Vec<Signature>,
}

impl EngineCtx {
    /// Builds a fresh engine context: registers the built-in keyword set
    /// (`crate::builtin_keywords::register_all`) and the stand-in app-layer
    /// registry, the way upstream's startup sequence populates the
    /// process-wide tables once before any parse begins.
    pub fn new(config: EngineConfig) -> Self {
        let mut registry = KeywordRegistry::empty();
        builtin_keywords::register_all(&mut registry);
        registry.set_strict(config.strict);

        let silent_errors = SilentErrorTracker::new(&registry);

        EngineCtx {
            registry,
            app_layer: AppLayerRegistry::new(),
            silent_errors,
            dedup: DuplicateIndex::new(),
            signatures: Vec::new(),
        }
    }

    /// The accumulated, validated signature list (§6, "Produced artifact").
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The built-in keyword table this context parses against.
    pub fn registry(&self) -> &KeywordRegistry {
        &self.registry
    }

    /// The stand-in app-layer registry this context parses against.
    pub fn app_layer(&self) -> &AppLayerRegistry {
        &self.app_layer
    }

    /// Parses one rule from `&[u8]`, rejecting non-UTF-8 input before
    /// reaching the shared `&str` tokenizer (§4.1 ambient note: both entry
    /// points share one `nom`-based lexer, and only this one can produce
    /// `BadUtf8`).
    pub fn parse_rule_bytes(&mut self, rule: &[u8]) -> Result<ParseOutcome<()>, SigError> {
        let text = std::str::from_utf8(rule).map_err(|_| SigError::BadUtf8)?;
        self.parse_rule(text)
    }

    /// Parses, validates, and (unless dropped) appends one rule to
    /// [`signatures`](Self::signatures). Runs the full C1→C8 pipeline:
    /// lexer, header parser, two-pass option parser, validator, duplicate
    /// detector, bidirectional cloner.
    pub fn parse_rule(&mut self, rule: &str) -> Result<ParseOutcome<()>, SigError> {
        let lexed = lex_rule(rule)?;
        let raw_options = split_options(lexed.options)?;

        let mut sig = parse_header(&lexed, &self.app_layer)?;
        match parse_options(&raw_options, &self.registry, &self.app_layer, &mut sig, &mut self.silent_errors)? {
            OptionPassOutcome::SilentSkip(msg) => {
                debug!("rule silently skipped: {}", if msg.is_empty() { "requires/silent predicate not met" } else { &msg });
                return Ok(ParseOutcome::SilentSkip(msg));
            }
            OptionPassOutcome::Ready => {}
        }

        validate(&mut sig, &self.app_layer, &self.registry)?;

        let mut sigs = vec![sig];
        if sigs[0].flags.contains(crate::signature::SigFlags::INIT_BIDIREC) {
            if endpoints_equal(&sigs[0]) {
                sigs[0].flags.remove(crate::signature::SigFlags::INIT_BIDIREC);
            } else {
                let swapped_lexed = swap_addresses(&lexed);
                let mut sibling = parse_header(&swapped_lexed, &self.app_layer)?;
                match parse_options(&raw_options, &self.registry, &self.app_layer, &mut sibling, &mut self.silent_errors)? {
                    OptionPassOutcome::SilentSkip(msg) => return Ok(ParseOutcome::SilentSkip(msg)),
                    OptionPassOutcome::Ready => {}
                }
                validate(&mut sibling, &self.app_layer, &self.registry)?;
                sigs.push(sibling);
            }
        }

        match self.dedup.insert(&mut self.signatures, sigs) {
            DedupOutcome::New | DedupOutcome::Replaced => Ok(ParseOutcome::Parsed(())),
            DedupOutcome::DropNew => Ok(ParseOutcome::DuplicateDropped),
        }
    }
}

impl Default for EngineCtx {
    fn default() -> Self {
        warn!("EngineCtx::default() uses a non-strict configuration");
        EngineCtx::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseOutcome;

    #[test]
    fn parses_simple_rule() {
        let mut engine = EngineCtx::new(EngineConfig::default());
        let outcome = engine.parse_rule(r#"alert tcp any any -> any any (msg:"t"; sid:1;)"#).unwrap();
        assert_eq!(outcome, ParseOutcome::Parsed(()));
        assert_eq!(engine.signatures().len(), 1);
    }

    #[test]
    fn rejects_missing_sid() {
        let mut engine = EngineCtx::new(EngineConfig::default());
        let err = engine.parse_rule(r#"alert tcp any any -> any any (msg:"t";)"#).unwrap_err();
        assert!(matches!(err, SigError::MissingSid));
    }

    #[test]
    fn bidirectional_rule_with_differing_endpoints_clones() {
        let mut engine = EngineCtx::new(EngineConfig::default());
        engine
            .parse_rule("alert tcp 1.2.3.4 1024:65535 <> !1.2.3.4 any (msg:\"t\"; sid:1;)")
            .unwrap();
        assert_eq!(engine.signatures().len(), 2);
        assert_ne!(engine.signatures()[0].src, engine.signatures()[1].src);
    }

    #[test]
    fn bidirectional_rule_with_equal_endpoints_is_not_cloned() {
        let mut engine = EngineCtx::new(EngineConfig::default());
        engine.parse_rule("alert tcp any any <> any any (sid:1;)").unwrap();
        assert_eq!(engine.signatures().len(), 1);
        assert!(!engine.signatures()[0].flags.contains(crate::signature::SigFlags::INIT_BIDIREC));
    }

    #[test]
    fn duplicate_revision_sequence_keeps_highest() {
        let mut engine = EngineCtx::new(EngineConfig::default());
        engine.parse_rule("alert tcp any any -> any any (sid:1; rev:1;)").unwrap();
        engine.parse_rule("alert tcp any any -> any any (sid:1; rev:2;)").unwrap();
        let outcome = engine.parse_rule("alert tcp any any -> any any (sid:1; rev:1;)").unwrap();
        assert_eq!(outcome, ParseOutcome::DuplicateDropped);
        assert_eq!(engine.signatures().len(), 1);
        assert_eq!(engine.signatures()[0].rev, 2);
    }
}
