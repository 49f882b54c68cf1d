// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The header parser (C3): action/scope, protocol/hook resolution,
//! addresses/ports, and the direction marker.

use crate::addr_port::{parse_address, parse_port};
use crate::applayer::{AlProto, AppLayerRegistry, Direction};
use crate::error::SigError;
use crate::lexer::LexedRule;
use crate::signature::{Action, ActionScope, Hook, NetProto, Phase, Signature, SigFlags};

const BUILTIN_APP_HOOKS: [&str; 4] = ["request_started", "request_complete", "response_started", "response_complete"];

fn hook_direction(hook_name: &str) -> Option<Direction> {
    if hook_name.starts_with("request") {
        Some(Direction::ToServer)
    } else if hook_name.starts_with("response") {
        Some(Direction::ToClient)
    } else {
        None
    }
}

/// Parses the seven header fields into a freshly built [`Signature`],
/// stopping short of option parsing (§4.3).
pub fn parse_header(lexed: &LexedRule, app_layer: &AppLayerRegistry) -> Result<Signature, SigError> {
    let mut sig = Signature::new(1);

    let (action_name, scope_name) = split_once(lexed.action);
    let action = Action::by_name(action_name).ok_or_else(|| SigError::UnknownAction(action_name.to_string()))?;
    sig.action = action;

    let scope = match scope_name {
        Some(name) => {
            let scope = ActionScope::by_name(name)
                .ok_or_else(|| SigError::MalformedHeader(format!("unknown action scope '{name}'")))?;
            if !ActionScope::allowed_for(action_name).contains(&scope) {
                return Err(SigError::ActionScopeNotAllowed {
                    action: action_name.to_string(),
                    scope: name.to_string(),
                });
            }
            Some(scope)
        }
        None => None,
    };
    sig.action_scope = scope;

    if lexed.proto.len() > 32 {
        return Err(SigError::ProtoHookTooLong);
    }
    let (proto_name, hook_name) = split_once(lexed.proto);
    // Firewall-ness is carried by the action's scope (`action:scope`), not by
    // the presence of a protocol hook: an ordinary alert may still target an
    // app-layer hook (`http:request_started`) without becoming a firewall
    // rule. The hook-is-set precondition for firewall rules is enforced by
    // the validator once the whole header has been assembled.
    let is_firewall = scope.is_some();

    if is_firewall {
        sig.flags.insert(SigFlags::FIREWALL);
    }
    if action_name == "pass" && is_firewall {
        return Err(SigError::PassNotFirewallCompatible);
    }
    if action_name == "accept" && !is_firewall {
        return Err(SigError::AcceptRequiresFirewall);
    }

    let is_app_level = if let Some(net) = NetProto::by_name(proto_name) {
        sig.proto = net;
        false
    } else if let Some(al) = AlProto::by_name(proto_name) {
        sig.set_alproto(al)?;
        true
    } else {
        return Err(SigError::UnknownProtocol(proto_name.to_string()));
    };

    if let Some(hook_name) = hook_name {
        sig.hook = if !is_app_level {
            let phase = Phase::by_name(hook_name).ok_or_else(|| SigError::UnknownHook {
                proto: proto_name.to_string(),
                hook: hook_name.to_string(),
            })?;
            Hook::Pkt(phase)
        } else {
            let derived_direction = hook_direction(hook_name).ok_or_else(|| SigError::UnknownHook {
                proto: proto_name.to_string(),
                hook: hook_name.to_string(),
            })?;

            let (progress, direction) = match app_layer.progress_by_name(sig.alproto, hook_name) {
                Some((progress, direction)) => (progress, direction),
                None if BUILTIN_APP_HOOKS.contains(&hook_name) => {
                    let progress = BUILTIN_APP_HOOKS.iter().position(|h| *h == hook_name).unwrap() as u8;
                    (progress, derived_direction)
                }
                None => {
                    return Err(SigError::UnknownHook {
                        proto: proto_name.to_string(),
                        hook: hook_name.to_string(),
                    })
                }
            };

            let list_id = app_layer
                .generic_hook_buffer(proto_name, hook_name)
                .ok_or_else(|| SigError::MissingGenericBuffer {
                    proto: proto_name.to_string(),
                    hook: hook_name.to_string(),
                })?;

            match direction {
                Direction::ToServer => sig.flags.insert(SigFlags::TOSERVER),
                Direction::ToClient => sig.flags.insert(SigFlags::TOCLIENT),
            }

            Hook::App {
                alproto: sig.alproto,
                progress,
                list_id,
            }
        };
    }

    let src_text = strip_negation(lexed.src)?;
    sig.src = parse_address(src_text)?;
    sig.src_text = src_text.to_string();
    if is_negated(lexed.src) && sig.src.is_any() {
        return Err(SigError::NegatedAny);
    }
    let dst_text = strip_negation(lexed.dst)?;
    sig.dst = parse_address(dst_text)?;
    sig.dst_text = dst_text.to_string();
    if is_negated(lexed.dst) && sig.dst.is_any() {
        return Err(SigError::NegatedAny);
    }
    let sp_text = strip_negation(lexed.sp)?;
    sig.sp = parse_port(sp_text)?;
    if is_negated(lexed.sp) && sig.sp.is_any() {
        return Err(SigError::NegatedAny);
    }
    let dp_text = strip_negation(lexed.dp)?;
    sig.dp = parse_port(dp_text)?;
    if is_negated(lexed.dp) && sig.dp.is_any() {
        return Err(SigError::NegatedAny);
    }

    match lexed.dir {
        "->" => {}
        "<>" => sig.flags.insert(SigFlags::INIT_BIDIREC),
        "=>" => {
            if sig.is_firewall() {
                return Err(SigError::TxBothDirNotFirewallCompatible);
            }
            sig.flags.insert(SigFlags::TXBOTHDIR);
        }
        other => return Err(SigError::UnknownDirection(other.to_string())),
    }

    Ok(sig)
}

fn split_once(field: &str) -> (&str, Option<&str>) {
    match field.split_once(':') {
        Some((a, b)) => (a, Some(b)),
        None => (field, None),
    }
}

fn is_negated(field: &str) -> bool {
    field.starts_with('!')
}

fn strip_negation(field: &str) -> Result<&str, SigError> {
    Ok(field.strip_prefix('!').unwrap_or(field))
}
