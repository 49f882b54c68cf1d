// SPDX-License-Identifier: (MIT OR Apache-2.0)

use rulesig::{EngineConfig, EngineCtx, ParseOutcome};

pub fn new_engine() -> EngineCtx {
    EngineCtx::new(EngineConfig::default())
}

pub fn new_strict_engine() -> EngineCtx {
    EngineCtx::new(EngineConfig { strict: true })
}

pub fn parse_ok(engine: &mut EngineCtx, rule: &str) {
    match engine.parse_rule(rule) {
        Ok(ParseOutcome::Parsed(())) => {}
        other => panic!("expected rule to parse, got {other:?} for {rule:?}"),
    }
}
