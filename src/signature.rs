// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The in-progress signature and the builder API its keywords' `Setup`
//! callbacks are invoked against.

use bitflags::bitflags;
use log::{debug, warn};

use crate::addr_port::{AddressSet, PortSet};
use crate::applayer::{AlProto, AppLayerRegistry, Direction};
use crate::error::SigError;
use crate::keyword::KeywordId;
use crate::sigmatch::{MatchList, SigMatch, SigMatchCtx};
use crate::tables::{DetectTable, SigType};

bitflags! {
    /// The action a matching signature takes, plus the `DROP`/`ALERT`/
    /// `REJECT` bundles each named action expands into.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct Action: u16 {
        const ALERT = 1 << 0;
        const DROP = 1 << 1;
        const PASS = 1 << 2;
        const REJECT = 1 << 3;
        const REJECT_DST = 1 << 4;
        const REJECT_BOTH = 1 << 5;
        const CONFIG = 1 << 6;
        const ACCEPT = 1 << 7;
    }
}

impl Action {
    /// Resolves an action keyword name to its flag bundle (§4.3).
    pub(crate) fn by_name(name: &str) -> Option<Action> {
        match name {
            "alert" => Some(Action::ALERT),
            "drop" => Some(Action::DROP | Action::ALERT),
            "pass" => Some(Action::PASS),
            "reject" | "rejectsrc" => Some(Action::REJECT | Action::DROP | Action::ALERT),
            "rejectdst" => Some(Action::REJECT_DST | Action::DROP | Action::ALERT),
            "rejectboth" => Some(Action::REJECT_BOTH | Action::DROP | Action::ALERT),
            "config" => Some(Action::CONFIG),
            "accept" => Some(Action::ACCEPT),
            _ => None,
        }
    }
}

/// `action:scope`. The scopes a firewall rule's action binds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionScope {
    Packet,
    Flow,
    Tx,
    Hook,
}

impl ActionScope {
    pub(crate) fn by_name(name: &str) -> Option<ActionScope> {
        match name {
            "packet" => Some(ActionScope::Packet),
            "flow" => Some(ActionScope::Flow),
            "tx" => Some(ActionScope::Tx),
            "hook" => Some(ActionScope::Hook),
            _ => None,
        }
    }

    /// The scopes permitted for a given action (§4.3).
    pub(crate) fn allowed_for(action_name: &str) -> &'static [ActionScope] {
        match action_name {
            "drop" | "pass" => &[ActionScope::Packet, ActionScope::Flow],
            "accept" => &[ActionScope::Packet, ActionScope::Flow, ActionScope::Tx, ActionScope::Hook],
            "config" => &[ActionScope::Packet],
            _ => &[],
        }
    }
}

bitflags! {
    /// Network-layer protocol mask (the `proto.proto` bitmask of §4.3).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct NetProto: u8 {
        const TCP = 1 << 0;
        const UDP = 1 << 1;
        const ICMP = 1 << 2;
        const IP = 1 << 3;
    }
}

impl NetProto {
    pub(crate) fn by_name(name: &str) -> Option<NetProto> {
        match name {
            "tcp" => Some(NetProto::TCP),
            "udp" => Some(NetProto::UDP),
            "icmp" => Some(NetProto::ICMP),
            "ip" => Some(NetProto::IP),
            _ => None,
        }
    }
}

bitflags! {
    /// Direction, requirement, and init-time flags (§3, Data Model).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct SigFlags: u32 {
        const TOSERVER = 1 << 0;
        const TOCLIENT = 1 << 1;
        const TXBOTHDIR = 1 << 2;
        const FIREWALL = 1 << 3;
        const REQUIRE_PACKET = 1 << 4;
        const REQUIRE_STREAM = 1 << 5;
        const APPLAYER = 1 << 6;
        const FILESTORE = 1 << 7;
        const INIT_BIDIREC = 1 << 8;
        const INIT_FORCE_TOSERVER = 1 << 9;
        const INIT_FORCE_TOCLIENT = 1 << 10;
        const INIT_PACKET = 1 << 11;
        const INIT_FLOW = 1 << 12;
        const INIT_FILEDATA = 1 << 13;
    }
}

/// A pkt-level hook's attachment phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    FlowStart,
    PreFlow,
    PreStream,
    All,
}

impl Phase {
    pub(crate) fn by_name(name: &str) -> Option<Phase> {
        match name {
            "flow_start" => Some(Phase::FlowStart),
            "pre_flow" => Some(Phase::PreFlow),
            "pre_stream" => Some(Phase::PreStream),
            "all" => Some(Phase::All),
            _ => None,
        }
    }
}

/// `Hook = NotSet | Pkt(Phase) | App(AlProto, Progress, ListId)` (§9, "Hooks
/// as tagged union"). Phase and Progress live in disjoint branches so the
/// pattern match stays exhaustive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hook {
    NotSet,
    Pkt(Phase),
    App {
        alproto: AlProto,
        progress: u8,
        list_id: u16,
    },
}

impl Default for Hook {
    fn default() -> Self {
        Hook::NotSet
    }
}

/// One entry of the growable buffer vector (§3, Match storage).
#[derive(Clone, Debug)]
pub struct Buffer {
    pub id: u16,
    pub list: MatchList,
    pub only_ts: bool,
    pub only_tc: bool,
    pub multi_capable: bool,
    pub sm_init: bool,
}

/// Built-in legacy list ids, in registration order (§3: MATCH, PMATCH,
/// BASE64_DATA, TMATCH, POSTMATCH, SUPPRESS, THRESHOLD).
pub mod legacy_list {
    pub const MATCH: u16 = 0;
    pub const PMATCH: u16 = 1;
    pub const BASE64_DATA: u16 = 2;
    pub const TMATCH: u16 = 3;
    pub const POSTMATCH: u16 = 4;
    pub const SUPPRESS: u16 = 5;
    pub const THRESHOLD: u16 = 6;
}

const MAX_BUFFERS: usize = 64;
const BUFFER_GROWTH: usize = 8;
const MAX_ALPROTOS: usize = 4;

/// The central entity: an in-progress, then frozen, rule (§3).
#[derive(Clone, Debug)]
pub struct Signature {
    pub gid: u32,
    pub sid: Option<u32>,
    pub rev: u32,
    pub prio: u8,

    pub action: Action,
    pub action_scope: Option<ActionScope>,

    pub proto: NetProto,
    pub alproto: AlProto,
    pub alprotos: Vec<AlProto>,

    pub src: AddressSet,
    pub dst: AddressSet,
    pub sp: PortSet,
    pub dp: PortSet,
    /// The original (unnegated) source/destination address text, kept
    /// around for the validator's IP-only re-parse step.
    pub src_text: String,
    pub dst_text: String,

    pub flags: SigFlags,
    pub hook: Hook,

    pub msg: Option<String>,
    pub classtype: Option<String>,
    pub references: Vec<String>,

    legacy_lists: [MatchList; 7],
    buffers: Vec<Buffer>,
    current_buffer: Option<u16>,

    matches: Vec<SigMatch>,
    sm_cnt: u64,

    pub sig_type: Option<SigType>,
    pub table: Option<DetectTable>,
}

impl Signature {
    pub fn new(gid: u32) -> Self {
        Signature {
            gid,
            sid: None,
            rev: 0,
            prio: 3,
            action: Action::empty(),
            action_scope: None,
            proto: NetProto::empty(),
            alproto: AlProto::Unknown,
            alprotos: Vec::new(),
            src: AddressSet::Any,
            dst: AddressSet::Any,
            sp: PortSet::Any,
            dp: PortSet::Any,
            src_text: String::new(),
            dst_text: String::new(),
            flags: SigFlags::empty(),
            hook: Hook::NotSet,
            msg: None,
            classtype: None,
            references: Vec::new(),
            legacy_lists: [MatchList::default(); 7],
            buffers: Vec::new(),
            current_buffer: None,
            matches: Vec::new(),
            sm_cnt: 0,
            sig_type: None,
            table: None,
        }
    }

    pub fn is_firewall(&self) -> bool {
        self.flags.contains(SigFlags::FIREWALL)
    }

    pub fn legacy_list(&self, list_id: u16) -> MatchList {
        self.legacy_lists[list_id as usize]
    }

    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    pub fn buffer(&self, id: u16) -> Option<&Buffer> {
        self.buffers.iter().find(|b| b.id == id)
    }

    pub fn current_buffer_id(&self) -> Option<u16> {
        self.current_buffer
    }

    fn next_idx(&mut self) -> u64 {
        let idx = self.sm_cnt;
        self.sm_cnt += 1;
        idx
    }

    fn link_tail(list: &mut MatchList, matches: &mut [SigMatch], new_idx: usize) {
        if let Some(tail) = list.tail {
            matches[tail].next = Some(new_idx);
            matches[new_idx].prev = Some(tail);
        } else {
            list.head = Some(new_idx);
        }
        list.tail = Some(new_idx);
    }

    /// Explicitly selects a sticky buffer, creating it if it does not yet
    /// exist. Unlike [`append_match`](Self::append_match)'s implicit buffer
    /// creation, this path never sets `sm_init` — the user deliberately
    /// picked this buffer.
    pub fn select_sticky_buffer(&mut self, list_id: u16) -> Result<(), SigError> {
        if !self.buffers.iter().any(|b| b.id == list_id) {
            self.allocate_buffer(list_id)?;
        }
        self.current_buffer = Some(list_id);
        Ok(())
    }

    fn allocate_buffer(&mut self, list_id: u16) -> Result<usize, SigError> {
        if self.buffers.len() >= MAX_BUFFERS {
            return Err(SigError::Semantic(format!(
                "buffer vector capacity ({MAX_BUFFERS}) exceeded adding list {list_id}"
            )));
        }
        // Growth is tracked for parity with the append-only, +8-at-a-time
        // upstream allocator; in safe Rust `Vec::push` already amortizes
        // this, so `BUFFER_GROWTH` only bounds how far past capacity we log.
        if self.buffers.len() % BUFFER_GROWTH == 0 {
            debug!("growing buffer vector past {} entries", self.buffers.len());
        }
        let only_ts = self.flags.contains(SigFlags::INIT_FORCE_TOSERVER);
        let only_tc = self.flags.contains(SigFlags::INIT_FORCE_TOCLIENT);
        self.buffers.push(Buffer {
            id: list_id,
            list: MatchList::default(),
            only_ts,
            only_tc,
            multi_capable: false,
            sm_init: false,
        });
        Ok(self.buffers.len() - 1)
    }

    /// `append_match(list_id, type, ctx)` (§4.5).
    pub fn append_match(&mut self, list_id: u16, kw: KeywordId, ctx: SigMatchCtx) -> Result<(), SigError> {
        let idx = self.next_idx();
        let node_idx = self.matches.len();
        self.matches.push(SigMatch::new(kw, ctx, idx));

        if list_id < crate::applayer::LIST_MAX {
            let mut list = self.legacy_lists[list_id as usize];
            Self::link_tail(&mut list, &mut self.matches, node_idx);
            self.legacy_lists[list_id as usize] = list;
            return Ok(());
        }

        let buf_pos = if self.current_buffer == Some(list_id) {
            self.buffers.iter().position(|b| b.id == list_id)
        } else {
            None
        };

        let buf_pos = match buf_pos {
            Some(pos) => pos,
            None => match self.buffers.iter().position(|b| b.id == list_id && !b.multi_capable) {
                Some(pos) => pos,
                None => {
                    let pos = self.allocate_buffer(list_id)?;
                    self.buffers[pos].sm_init = true;
                    pos
                }
            },
        };

        let mut list = self.buffers[buf_pos].list;
        Self::link_tail(&mut list, &mut self.matches, node_idx);
        self.buffers[buf_pos].list = list;
        self.current_buffer = Some(list_id);
        Ok(())
    }

    fn resolve_scope(&self, scope: MatchScope) -> Option<MatchList> {
        Some(match scope {
            MatchScope::Legacy(id) => self.legacy_lists[id as usize],
            MatchScope::CurrentBuffer => {
                let id = self.current_buffer?;
                self.buffers.iter().find(|b| b.id == id)?.list
            }
            MatchScope::Buffer(id) => self.buffers.iter().find(|b| b.id == id)?.list,
        })
    }

    /// `get_last_match(predicates...)` (§4.5): the SigMatch with the highest
    /// `idx` matching `pred`, searched within `scope`. Upstream expresses
    /// "predicates" as a set of keyword-type ids; here the predicate runs
    /// directly over each node's `ctx` (DESIGN NOTES §9, "replace with an
    /// explicit slice of keyword-type predicates"), which lets callers like
    /// the relative-offset keywords ask "the last content match" without
    /// needing to know `content`'s registered id.
    pub fn get_last_match(&self, pred: impl Fn(&SigMatch) -> bool, scope: MatchScope) -> Option<&SigMatch> {
        let list = self.resolve_scope(scope)?;
        self.iter_list(list).filter(|sm| pred(sm)).max_by_key(|sm| sm.idx)
    }

    /// Like [`get_last_match`](Self::get_last_match) but returns the arena
    /// index instead of a borrow, so the caller can mutate the match's `ctx`
    /// and/or its predecessor's flags afterwards without fighting the
    /// borrow checker.
    fn last_match_arena_idx(&self, pred: impl Fn(&SigMatch) -> bool, scope: MatchScope) -> Option<usize> {
        let list = self.resolve_scope(scope)?;
        std::iter::successors(list.head, move |&i| self.matches[i].next)
            .filter(|&i| pred(&self.matches[i]))
            .max_by_key(|&i| self.matches[i].idx)
    }

    /// The latest content match in `scope`, mutable. Used by keywords that
    /// modify the preceding content in place (`rawbytes`, `depth`, `offset`,
    /// `replace`).
    pub fn last_content_mut(&mut self, scope: MatchScope) -> Option<&mut crate::sigmatch::ContentData> {
        let idx = self.last_match_arena_idx(|sm| sm.as_content().is_some(), scope)?;
        self.matches[idx].as_content_mut()
    }

    /// Applies `apply` to the latest content match in `scope` and marks its
    /// *predecessor* `RELATIVE_NEXT` (§3, SigMatch): the shape `distance` and
    /// `within` both need, since they anchor the current content relative to
    /// the one before it.
    pub fn apply_relative_to_last_content(
        &mut self,
        scope: MatchScope,
        apply: impl FnOnce(&mut crate::sigmatch::ContentData),
    ) -> Result<(), SigError> {
        let idx = self
            .last_match_arena_idx(|sm| sm.as_content().is_some(), scope)
            .ok_or_else(|| SigError::Semantic("relative content modifier requires a preceding content match".to_string()))?;
        let content = self.matches[idx]
            .as_content_mut()
            .expect("last_match_arena_idx filtered to content matches");
        apply(content);
        if let Some(pred) = self.matches[idx].prev {
            self.matches[pred].flags.insert(crate::sigmatch::SigMatchFlags::RELATIVE_NEXT);
        }
        Ok(())
    }

    fn iter_list(&self, list: MatchList) -> impl Iterator<Item = &SigMatch> {
        std::iter::successors(list.head, move |&i| self.matches[i].next).map(move |i| &self.matches[i])
    }

    /// Iterates a legacy list's matches in insertion order.
    pub fn iter_legacy(&self, list_id: u16) -> impl Iterator<Item = &SigMatch> {
        self.iter_list(self.legacy_lists[list_id as usize])
    }

    /// Iterates a buffer's matches in insertion order.
    pub fn iter_buffer(&self, buffer_id: u16) -> impl Iterator<Item = &SigMatch> {
        let list = self.buffers.iter().find(|b| b.id == buffer_id).map(|b| b.list).unwrap_or_default();
        self.iter_list(list)
    }

    fn unlink_tail(list: &mut MatchList, matches: &mut [SigMatch]) -> Option<usize> {
        let tail = list.tail?;
        let prev = matches[tail].prev;
        match prev {
            Some(p) => {
                matches[p].next = None;
                list.tail = Some(p);
            }
            None => {
                list.head = None;
                list.tail = None;
            }
        }
        matches[tail].prev = None;
        matches[tail].next = None;
        Some(tail)
    }

    /// `content_modifier_transfer(sm_type, target_list, alproto)` (§4.5): the
    /// legacy content-modifier path (e.g. `http_uri` after `content:"..."`).
    /// Which keyword produced the tail match never matters here, only that
    /// it *was* a content match; checked structurally via `as_content`
    /// rather than by comparing `KeywordId`s.
    pub fn content_modifier_transfer(&mut self, target_list: u16, alproto: AlProto) -> Result<(), SigError> {
        if self.current_buffer.is_some() {
            return Err(SigError::Semantic(
                "content modifier cannot run with a sticky buffer already active".into(),
            ));
        }
        self.set_alproto(alproto)?;

        let mut pmatch = self.legacy_lists[legacy_list::PMATCH as usize];
        let tail_idx = pmatch.tail.ok_or_else(|| {
            SigError::Semantic("content modifier requires a preceding content match".to_string())
        })?;
        let moved = self.matches[tail_idx]
            .as_content()
            .cloned()
            .ok_or_else(|| SigError::Semantic("content modifier requires a preceding content match".to_string()))?;
        if moved.rawbytes {
            return Err(SigError::Semantic(
                "content modifier is incompatible with a rawbytes content".to_string(),
            ));
        }
        if moved.replace {
            return Err(SigError::Semantic(
                "content modifier is incompatible with a replace content".to_string(),
            ));
        }

        let has_relative = moved.within.is_some() || moved.distance.is_some();

        let moved_idx = Self::unlink_tail(&mut pmatch, &mut self.matches).expect("tail checked above");
        self.legacy_lists[legacy_list::PMATCH as usize] = pmatch;

        if has_relative {
            if let Some(new_tail) = pmatch.tail {
                self.matches[new_tail].flags.remove(crate::sigmatch::SigMatchFlags::RELATIVE_NEXT);
            }
        }

        let buf_pos = match self.buffers.iter().position(|b| b.id == target_list) {
            Some(pos) => pos,
            None => self.allocate_buffer(target_list)?,
        };

        if has_relative {
            if let Some(existing_tail) = self.buffers[buf_pos].list.tail {
                self.matches[existing_tail].flags.insert(crate::sigmatch::SigMatchFlags::RELATIVE_NEXT);
            }
        }

        let mut target = self.buffers[buf_pos].list;
        Self::link_tail(&mut target, &mut self.matches, moved_idx);
        self.buffers[buf_pos].list = target;
        self.flags.insert(SigFlags::APPLAYER);
        Ok(())
    }

    /// `set_alproto(single)` (§4.5): refuses to override an existing single
    /// alproto except through the "common family" relation.
    pub fn set_alproto(&mut self, alproto: AlProto) -> Result<(), SigError> {
        if alproto == AlProto::Unknown {
            return Ok(());
        }
        if self.alproto == AlProto::Unknown {
            self.alproto = alproto;
            self.flags.insert(SigFlags::APPLAYER);
            return Ok(());
        }
        if self.alproto == alproto || self.alproto.common_family() == alproto.common_family() {
            self.alproto = alproto.common_family();
            return Ok(());
        }
        Err(SigError::Semantic(format!(
            "conflicting app-layer protocol: already {:?}, cannot also be {:?}",
            self.alproto, alproto
        )))
    }

    /// `set_alprotos(multi-set)` (§4.5): intersects with any already-set
    /// alprotos, collapsing a singleton intersection into `set_alproto`.
    pub fn set_alprotos(&mut self, candidates: &[AlProto]) -> Result<(), SigError> {
        let candidates: Vec<AlProto> = candidates.iter().copied().filter(|&a| a != AlProto::Unknown).collect();
        if candidates.len() > MAX_ALPROTOS {
            warn!("multi-alproto set truncated to {MAX_ALPROTOS} entries");
        }
        let candidates: Vec<AlProto> = candidates.into_iter().take(MAX_ALPROTOS).collect();

        if self.alprotos.is_empty() && self.alproto == AlProto::Unknown {
            if candidates.len() == 1 {
                return self.set_alproto(candidates[0]);
            }
            self.alprotos = candidates;
            self.flags.insert(SigFlags::APPLAYER);
            return Ok(());
        }

        let existing: Vec<AlProto> = if self.alprotos.is_empty() {
            vec![self.alproto]
        } else {
            self.alprotos.clone()
        };
        let intersection: Vec<AlProto> = existing.into_iter().filter(|a| candidates.contains(a)).collect();

        if intersection.is_empty() {
            return Err(SigError::Semantic(
                "app-layer protocol intersection is empty".to_string(),
            ));
        }
        if intersection.len() == 1 {
            self.alprotos.clear();
            return self.set_alproto(intersection[0]);
        }
        self.alprotos = intersection;
        Ok(())
    }
}

/// Search scope for [`Signature::get_last_match`].
#[derive(Clone, Copy, Debug)]
pub enum MatchScope {
    Legacy(u16),
    CurrentBuffer,
    Buffer(u16),
}
