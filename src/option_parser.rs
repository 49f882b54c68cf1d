// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The option parser (C4): the two-pass walk over a rule's option list,
//! dispatching each option to its keyword's `Setup` via the registry.

use log::warn;

use crate::applayer::{AppLayerRegistry, Direction};
use crate::error::SigError;
use crate::keyword::{KeywordFlags, KeywordRegistry, SetupInput, SetupOutcome, SilentErrorTracker};
use crate::signature::Signature;

/// What happened after running the full option pass: either the signature
/// is ready for validation, or it should be dropped without a user-visible
/// error (§4.4 steps 10-11).
pub enum OptionPassOutcome {
    Ready,
    SilentSkip(String),
}

/// Isolates name and (optional) value at the first `:` (§4.4 step 1).
/// Brackets play no role here — the same bug class as `split_options`'
/// bracket-depth gate (an unbalanced `[`/`]` inside a quoted value must not
/// shift where the name/value boundary is found).
fn split_name_value(option: &str) -> (&str, Option<&str>) {
    match option.find(':') {
        Some(i) => {
            let name = option[..i].trim();
            let value = option[i + 1..].trim();
            (name, Some(value))
        }
        None => (option.trim(), None),
    }
}

fn unquote<'a>(name: &str, value: &'a str, flags: KeywordFlags) -> Result<&'a str, SigError> {
    let is_quoted = value.starts_with('"') && value.ends_with('"') && value.len() >= 2;

    if flags.contains(KeywordFlags::QUOTES_MANDATORY) {
        if !is_quoted {
            return Err(SigError::QuotingMismatch(name.to_string()));
        }
        Ok(&value[1..value.len() - 1])
    } else if flags.contains(KeywordFlags::QUOTES_OPTIONAL) {
        if is_quoted {
            Ok(&value[1..value.len() - 1])
        } else {
            Ok(value)
        }
    } else {
        if value.starts_with('"') {
            return Err(SigError::QuotingMismatch(name.to_string()));
        }
        Ok(value)
    }
}

fn consume_direction(value: &str) -> (Option<Direction>, &str) {
    if let Some(rest) = value.strip_prefix("to_client") {
        (Some(Direction::ToClient), rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace()))
    } else if let Some(rest) = value.strip_prefix("to_server") {
        (Some(Direction::ToServer), rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace()))
    } else {
        (None, value)
    }
}

/// Runs one option through lookup, validation, and `Setup` dispatch
/// (§4.4, per-option steps 1-11).
fn run_option(
    option: &str,
    registry: &KeywordRegistry,
    app_layer: &AppLayerRegistry,
    sig: &mut Signature,
    silent_errors: &mut SilentErrorTracker,
) -> Result<SetupOutcome, SigError> {
    let (name, raw_value) = split_name_value(option);

    let (id, entry) = registry.lookup(name).ok_or_else(|| SigError::UnknownKeyword(name.to_string()))?;

    let has_noopt = entry.flags.contains(KeywordFlags::NOOPT);
    let has_optional = entry.flags.contains(KeywordFlags::OPTIONAL_OPT);
    match (raw_value, has_noopt, has_optional) {
        (Some(_), true, _) => return Err(SigError::OptionValueMismatch(name.to_string())),
        (None, false, false) => return Err(SigError::OptionValueMismatch(name.to_string())),
        _ => {}
    }

    let mut value = raw_value;
    let mut negated = false;
    if entry.flags.contains(KeywordFlags::HANDLE_NEGATION) {
        if let Some(v) = value {
            if let Some(stripped) = v.strip_prefix('!') {
                negated = true;
                value = Some(stripped);
            }
        }
    }

    let value = match value {
        Some(v) => Some(unquote(name, v, entry.flags)?),
        None => None,
    };

    let mut forced_direction = None;
    let value = match value {
        Some(v) if entry.flags.contains(KeywordFlags::SUPPORT_DIR) => {
            let (dir, rest) = consume_direction(v);
            forced_direction = dir;
            Some(rest)
        }
        other => other,
    };
    match forced_direction {
        Some(Direction::ToServer) => sig.flags.insert(crate::signature::SigFlags::INIT_FORCE_TOSERVER),
        Some(Direction::ToClient) => sig.flags.insert(crate::signature::SigFlags::INIT_FORCE_TOCLIENT),
        None => {}
    }

    if !entry.flags.contains(KeywordFlags::SUPPORT_FIREWALL) && sig.is_firewall() {
        warn!("keyword '{name}' has no documented firewall-rule behavior");
    }
    if entry.flags.contains(KeywordFlags::INFO_DEPRECATED) {
        let elevate = entry.flags.contains(KeywordFlags::STRICT_PARSING) && registry.is_strict();
        match (entry.alternative, elevate) {
            (Some(alt), true) => {
                return Err(SigError::SetupFailed {
                    keyword: name.to_string(),
                    message: format!("deprecated, use '{alt}' instead (rejected under strict parsing)"),
                })
            }
            (None, true) => {
                return Err(SigError::SetupFailed {
                    keyword: name.to_string(),
                    message: "deprecated (rejected under strict parsing)".to_string(),
                })
            }
            (Some(alt), false) => warn!("keyword '{name}' is deprecated, use '{alt}' instead"),
            (None, false) => warn!("keyword '{name}' is deprecated"),
        }
    }

    let outcome = (entry.setup)(
        app_layer,
        sig,
        SetupInput {
            value,
            negated,
            forced_direction,
        },
        id,
    );

    sig.flags.remove(crate::signature::SigFlags::INIT_FORCE_TOSERVER | crate::signature::SigFlags::INIT_FORCE_TOCLIENT);

    if let SetupOutcome::SilentOnce(msg) = &outcome {
        if silent_errors.mark(id) {
            warn!("keyword '{name}' (first occurrence): {msg}");
        }
    }

    Ok(outcome)
}

/// Runs the two-pass option walk (§4.4).
pub fn parse_options(
    raw_options: &[String],
    registry: &KeywordRegistry,
    app_layer: &AppLayerRegistry,
    sig: &mut Signature,
    silent_errors: &mut SilentErrorTracker,
) -> Result<OptionPassOutcome, SigError> {
    let is_requires_or_sid = |opt: &str| {
        let (name, _) = split_name_value(opt);
        name.eq_ignore_ascii_case("requires") || name.eq_ignore_ascii_case("sid")
    };

    for opt in raw_options.iter().filter(|o| is_requires_or_sid(o)) {
        let outcome = run_option(opt, registry, app_layer, sig, silent_errors)?;
        if let Some(err) = SigError::from_setup_failure(split_name_value(opt).0, &outcome) {
            return Err(err);
        }
        match outcome {
            SetupOutcome::SilentOnce(msg) => return Ok(OptionPassOutcome::SilentSkip(msg)),
            SetupOutcome::SilentOk => return Ok(OptionPassOutcome::SilentSkip(String::new())),
            SetupOutcome::RequiresNotMet => return Ok(OptionPassOutcome::SilentSkip(String::new())),
            _ => {}
        }
    }

    if sig.sid.is_none() {
        return Err(SigError::MissingSid);
    }

    for opt in raw_options.iter().filter(|o| !is_requires_or_sid(o)) {
        let outcome = run_option(opt, registry, app_layer, sig, silent_errors)?;
        if let Some(err) = SigError::from_setup_failure(split_name_value(opt).0, &outcome) {
            return Err(err);
        }
        match outcome {
            SetupOutcome::SilentOnce(msg) => return Ok(OptionPassOutcome::SilentSkip(msg)),
            SetupOutcome::SilentOk => return Ok(OptionPassOutcome::SilentSkip(String::new())),
            SetupOutcome::RequiresNotMet => return Ok(OptionPassOutcome::SilentSkip(String::new())),
            _ => {}
        }
    }

    Ok(OptionPassOutcome::Ready)
}
