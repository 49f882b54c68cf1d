// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! `SigMatch` nodes and their per-keyword contexts.
//!
//! In upstream terms a `SigMatch` is a node in an intrusive doubly linked
//! list reached through raw pointers. Safe Rust has no equivalent, so each
//! [`crate::signature::Signature`] owns a `Vec<SigMatch>` arena and lists are
//! head/tail index pairs (`Option<usize>`) into that arena; "unlinking" and
//! "splicing" (content-modifier transfer) become index rewrites instead of
//! pointer surgery.

use bitflags::bitflags;

use crate::keyword::KeywordId;

bitflags! {
    /// Per-`SigMatch` flags. `RELATIVE_NEXT` marks a predecessor content/pcre
    /// whose successor was anchored to it with `distance`/`within`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct SigMatchFlags: u8 {
        const RELATIVE_NEXT = 1 << 0;
    }
}

/// A single option's arena node.
#[derive(Clone, Debug)]
pub struct SigMatch {
    pub kw: KeywordId,
    pub ctx: SigMatchCtx,
    /// Creation order; assigned from the owning signature's monotonic
    /// `sm_cnt` counter. Used for ordering and as the relative-offset
    /// linkage tie-break.
    pub idx: u64,
    pub flags: SigMatchFlags,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

/// A comparison operator for size-like keywords (`dsize`, `stream_size`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Gt,
    Range,
}

/// `content`'s match context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentData {
    pub pattern: Vec<u8>,
    pub negated: bool,
    pub depth: Option<u32>,
    pub offset: Option<u32>,
    pub distance: Option<i32>,
    pub within: Option<u32>,
    pub rawbytes: bool,
    pub replace: bool,
}

/// `dsize`/`stream_size`'s match context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeData {
    pub op: CompareOp,
    pub lo: u32,
    pub hi: u32,
}

/// `flow`'s match context: the subset of flow-state predicates this crate
/// models (established-ness is tracked but not consumed by the validator).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlowData {
    pub established: bool,
    pub to_server: bool,
    pub to_client: bool,
}

/// The sum type behind `ctx`. Each variant owns exactly the data its
/// keyword's `Setup` needs; there is no separate `Free` callback; dropping a
/// [`SigMatch`] drops its `ctx` variant directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SigMatchCtx {
    Content(ContentData),
    Size(SizeData),
    Flow(FlowData),
}

impl SigMatch {
    pub(crate) fn new(kw: KeywordId, ctx: SigMatchCtx, idx: u64) -> Self {
        SigMatch {
            kw,
            ctx,
            idx,
            flags: SigMatchFlags::empty(),
            prev: None,
            next: None,
        }
    }

    pub fn as_content(&self) -> Option<&ContentData> {
        match &self.ctx {
            SigMatchCtx::Content(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_content_mut(&mut self) -> Option<&mut ContentData> {
        match &mut self.ctx {
            SigMatchCtx::Content(c) => Some(c),
            _ => None,
        }
    }
}

/// A head/tail index pair into a [`Signature`](crate::signature::Signature)'s
/// match arena: what a legacy list or a buffer's `{head, tail}` resolves to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchList {
    pub head: Option<usize>,
    pub tail: Option<usize>,
}

impl MatchList {
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}
