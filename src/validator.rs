// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The validator/consolidator (C6): the ordered cross-cutting checks run
//! after a signature's full option pass completes.

use crate::addr_port::parse_address;
use crate::applayer::{AppLayerRegistry, BufferTypeInfo};
use crate::error::SigError;
use crate::keyword::KeywordRegistry;
use crate::signature::{legacy_list, Hook, NetProto, Signature, SigFlags};
use crate::sigmatch::SigMatchCtx;
use crate::tables::{BufferKind, DetectTable, SigType};

fn buffer_kind(app_layer: &AppLayerRegistry, buf_id: u16) -> Option<BufferKind> {
    app_layer.buffer_info(buf_id).map(|b: &BufferTypeInfo| b.kind)
}

/// Runs all checks in order, mutating `sig` with the final
/// classification (`sig_type`, `table`) (§4.6).
pub fn validate(sig: &mut Signature, app_layer: &AppLayerRegistry, registry: &KeywordRegistry) -> Result<(), SigError> {
    check_firewall_preconditions(sig)?;
    check_packet_vs_stream(sig)?;
    check_no_empty_sticky_buffers(sig)?;
    check_buffer_mix(sig, app_layer)?;
    check_direction_derivation(sig, app_layer)?;
    check_hook_progress_match(sig, app_layer)?;
    check_tcp_consolidation(sig, registry)?;
    classify_type_and_table(sig, app_layer);
    check_table_keyword_compatibility(sig, registry)?;
    check_file_handling(sig)?;
    check_ip_only_reparse(sig)?;
    Ok(())
}

/// Step 1: a firewall rule's hook must be set.
fn check_firewall_preconditions(sig: &Signature) -> Result<(), SigError> {
    if sig.is_firewall() && matches!(sig.hook, Hook::NotSet) {
        return Err(SigError::Validation("firewall rule requires an explicit hook".to_string()));
    }
    Ok(())
}

/// Step 2: `REQUIRE_PACKET` and `REQUIRE_STREAM` are mutually exclusive when
/// both were set explicitly by the user (not inferred in step 6, which runs
/// after this check).
fn check_packet_vs_stream(sig: &Signature) -> Result<(), SigError> {
    if sig.flags.contains(SigFlags::REQUIRE_PACKET) && sig.flags.contains(SigFlags::REQUIRE_STREAM) {
        return Err(SigError::Validation(
            "a rule cannot require both packet and stream matching".to_string(),
        ));
    }
    Ok(())
}

/// Step 3: a buffer allocated in the growable vector but never appended to
/// (data-model invariant 4, "sticky buffer with no matches is an error at
/// validation time") means a sticky-buffer keyword ran with nothing after it
/// before the rule ended.
fn check_no_empty_sticky_buffers(sig: &Signature) -> Result<(), SigError> {
    for buf in sig.buffers() {
        if buf.list.is_empty() {
            return Err(SigError::Validation(format!("sticky buffer {} was selected but never matched against", buf.id)));
        }
    }
    Ok(())
}

/// Step 4: classify every referenced buffer and reject disallowed mixes.
fn check_buffer_mix(sig: &Signature, app_layer: &AppLayerRegistry) -> Result<(), SigError> {
    let has_pmatch = !sig.legacy_list(legacy_list::PMATCH).is_empty();
    let has_pkt_only = !sig.legacy_list(legacy_list::MATCH).is_empty();

    let mut has_frame = false;
    let mut has_app = false;
    for buf in sig.buffers() {
        match buffer_kind(app_layer, buf.id) {
            Some(BufferKind::Frame) => has_frame = true,
            Some(BufferKind::App) => has_app = true,
            Some(BufferKind::Packet) | None => {}
        }
    }

    if has_frame && (has_pmatch || has_app || has_pkt_only) {
        return Err(SigError::Validation(
            "frame buffers cannot be combined with pmatch, app, or packet-only matches".to_string(),
        ));
    }
    Ok(())
}

/// Step 5: accumulate to-server/to-client observations across every buffer's
/// registered inspect engines and reconcile with the direction marker.
fn check_direction_derivation(sig: &mut Signature, app_layer: &AppLayerRegistry) -> Result<(), SigError> {
    let mut saw_ts = false;
    let mut saw_tc = false;

    for buf in sig.buffers() {
        let engines = app_layer.inspect_engines_for(buf.id, sig.alproto);
        for engine in &engines {
            match engine.direction {
                crate::applayer::Direction::ToServer => saw_ts = true,
                crate::applayer::Direction::ToClient => saw_tc = true,
            }
        }
    }

    if sig.flags.contains(SigFlags::TXBOTHDIR) {
        if !(saw_ts && saw_tc) {
            return Err(SigError::Validation(
                "'=>' direction requires buffers exclusive to each side".to_string(),
            ));
        }
        return Ok(());
    }

    if saw_ts && saw_tc {
        return Err(SigError::Validation(
            "conflicting direction observed across buffers; use '=>' for transactional bidirectional rules".to_string(),
        ));
    }
    if saw_ts {
        sig.flags.insert(SigFlags::TOSERVER);
    } else if saw_tc {
        sig.flags.insert(SigFlags::TOCLIENT);
    }
    Ok(())
}

/// Step 6: for an `App` hook, every attached inspect engine's progress must
/// match the hook's progress.
fn check_hook_progress_match(sig: &Signature, app_layer: &AppLayerRegistry) -> Result<(), SigError> {
    if let Hook::App { progress, .. } = sig.hook {
        for buf in sig.buffers() {
            for engine in app_layer.inspect_engines_for(buf.id, sig.alproto) {
                if engine.progress != progress {
                    return Err(SigError::Validation(format!(
                        "buffer {} has an inspect engine at progress {} but the rule's hook is at progress {}",
                        buf.id, engine.progress, progress
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Step 7: infer `REQUIRE_STREAM`/`REQUIRE_PACKET` for TCP rules that didn't
/// set either explicitly.
fn check_tcp_consolidation(sig: &mut Signature, registry: &KeywordRegistry) -> Result<(), SigError> {
    if !sig.proto.contains(NetProto::TCP) {
        return Ok(());
    }
    let pmatch_nonempty = !sig.legacy_list(legacy_list::PMATCH).is_empty();
    if !pmatch_nonempty {
        return Ok(());
    }
    if !sig.flags.intersects(SigFlags::REQUIRE_PACKET | SigFlags::REQUIRE_STREAM) {
        sig.flags.insert(SigFlags::REQUIRE_STREAM);
    }

    let has_depth_or_offset = pmatch_contents(sig).any(|c| c.depth.is_some() || c.offset.is_some());

    let has_stream_size = registry.lookup("stream_size").is_some_and(|(id, _)| {
        match_list_iter(sig, legacy_list::MATCH).any(|kw| kw == id)
    });

    if has_depth_or_offset || has_stream_size {
        sig.flags.insert(SigFlags::REQUIRE_PACKET);
    }
    Ok(())
}

fn pmatch_contents(sig: &Signature) -> impl Iterator<Item = &crate::sigmatch::ContentData> {
    sig.iter_legacy(legacy_list::PMATCH).filter_map(|sm| sm.as_content())
}

fn match_list_iter(sig: &Signature, list_id: u16) -> impl Iterator<Item = crate::keyword::KeywordId> + '_ {
    sig.iter_legacy(list_id).map(|sm| sm.kw)
}

/// Step 8: classify the signature's type and detection table.
fn classify_type_and_table(sig: &mut Signature, app_layer: &AppLayerRegistry) {
    let has_payload = !sig.legacy_list(legacy_list::PMATCH).is_empty()
        || sig.buffers().iter().any(|b| matches!(buffer_kind(app_layer, b.id), Some(BufferKind::Packet)));
    let has_app = sig.flags.contains(SigFlags::APPLAYER)
        || sig.buffers().iter().any(|b| matches!(buffer_kind(app_layer, b.id), Some(BufferKind::App)));

    sig.sig_type = Some(if has_app {
        SigType::AppTx
    } else if has_payload || !sig.legacy_list(legacy_list::MATCH).is_empty() {
        SigType::Pkt
    } else {
        SigType::IpOnly
    });

    sig.table = Some(if sig.is_firewall() {
        match (&sig.hook, sig.sig_type.unwrap()) {
            (Hook::App { .. }, _) => DetectTable::APP_FILTER,
            (Hook::Pkt(crate::signature::Phase::PreStream), _) => DetectTable::PACKET_PRE_STREAM,
            (Hook::Pkt(crate::signature::Phase::PreFlow), _) => DetectTable::PACKET_PRE_FLOW,
            _ => DetectTable::PACKET_FILTER,
        }
    } else if matches!(sig.sig_type, Some(SigType::AppTx)) {
        DetectTable::APP_TD
    } else {
        DetectTable::PACKET_TD
    });
}

/// Step 9: every keyword on the MATCH list must support the chosen table.
fn check_table_keyword_compatibility(sig: &Signature, registry: &KeywordRegistry) -> Result<(), SigError> {
    let table = sig.table.expect("classified in step 7");
    for sm in sig.iter_legacy(legacy_list::MATCH) {
        let entry = registry.entry(sm.kw);
        if !entry.tables.contains(table) {
            return Err(SigError::Validation(format!(
                "keyword '{}' is not compatible with detection table {:?}",
                entry.name, table
            )));
        }
    }
    Ok(())
}

/// Step 10: file-data inspection compatibility with the resolved alproto.
fn check_file_handling(sig: &Signature) -> Result<(), SigError> {
    if sig.flags.contains(SigFlags::INIT_FILEDATA) {
        if !sig.alproto.supports_file_inspection() {
            return Err(SigError::Validation(format!(
                "{:?} does not support file inspection",
                sig.alproto
            )));
        }
        if sig.alproto.forbids_filename_match() {
            return Err(SigError::Validation(
                "this app-layer protocol forbids filename matching".to_string(),
            ));
        }
    }
    Ok(())
}

/// Step 11: if the signature is `IPONLY`, re-run address parsing for both
/// endpoints through the IP-only path. This crate's address collaborator has
/// no distinct IP-only grammar, so re-parsing the retained source text is
/// this stand-in's rendition of the upstream re-parse.
fn check_ip_only_reparse(sig: &mut Signature) -> Result<(), SigError> {
    if !matches!(sig.sig_type, Some(SigType::IpOnly)) {
        return Ok(());
    }
    sig.src = parse_address(&sig.src_text)?;
    sig.dst = parse_address(&sig.dst_text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_explicit_packet_and_stream_together() {
        let mut sig = Signature::new(1);
        sig.flags.insert(SigFlags::REQUIRE_PACKET | SigFlags::REQUIRE_STREAM);
        assert!(matches!(check_packet_vs_stream(&sig), Err(SigError::Validation(_))));
    }

    #[test]
    fn accepts_packet_alone() {
        let mut sig = Signature::new(1);
        sig.flags.insert(SigFlags::REQUIRE_PACKET);
        assert!(check_packet_vs_stream(&sig).is_ok());
    }

    #[test]
    fn rejects_sticky_buffer_with_no_matches() {
        let mut sig = Signature::new(1);
        sig.select_sticky_buffer(crate::applayer::LIST_MAX).unwrap();
        assert!(matches!(check_no_empty_sticky_buffers(&sig), Err(SigError::Validation(_))));
    }

    #[test]
    fn accepts_sticky_buffer_with_a_match() {
        use crate::sigmatch::{ContentData, SigMatchCtx};
        let mut sig = Signature::new(1);
        sig.select_sticky_buffer(crate::applayer::LIST_MAX).unwrap();
        sig.append_match(crate::applayer::LIST_MAX, 0, SigMatchCtx::Content(ContentData::default())).unwrap();
        assert!(check_no_empty_sticky_buffers(&sig).is_ok());
    }
}
