// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The duplicate detector (C7): a hash index over `(gid, sid)` with
//! revision-wins replacement semantics.

use std::collections::HashMap;

use log::warn;

use crate::signature::Signature;

/// The outcome of inserting a signature into the duplicate index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    New,
    DropNew,
    Replaced,
}

/// Indexes an engine's signature list by `(gid, sid)`. The signature list
/// itself is a `Vec<Signature>`; upstream's intrusive-linked-list "unlink
/// and fix the predecessor pointer" collapses to a `Vec::remove` at the
/// index recorded here, including removing a bidirectional sibling that sits
/// adjacent to it (§4.7 ambient note).
#[derive(Default)]
pub struct DuplicateIndex {
    by_gid_sid: HashMap<(u32, u32), usize>,
}

impl DuplicateIndex {
    pub fn new() -> Self {
        DuplicateIndex::default()
    }

    /// Attempts to insert `sig` (occupying `rules[insert_at..]`, one or two
    /// adjacent slots for a bidirectional pair) into `rules`. Returns the
    /// outcome; `rules` is mutated in place for `Replaced`/`New`, left
    /// untouched for `DropNew`.
    pub fn insert(&mut self, rules: &mut Vec<Signature>, mut new_sigs: Vec<Signature>) -> DedupOutcome {
        let sid = new_sigs[0].sid.expect("sid required before dedup runs");
        let gid = new_sigs[0].gid;
        let key = (gid, sid);

        match self.by_gid_sid.get(&key).copied() {
            None => {
                let at = rules.len();
                self.by_gid_sid.insert(key, at);
                rules.append(&mut new_sigs);
                DedupOutcome::New
            }
            Some(old_idx) => {
                let old_rev = rules[old_idx].rev;
                if new_sigs[0].rev <= old_rev {
                    warn!("duplicate signature gid={gid} sid={sid} rev={}: dropped, existing rev={old_rev}", new_sigs[0].rev);
                    DedupOutcome::DropNew
                } else {
                    warn!("replacing signature gid={gid} sid={sid}: rev {old_rev} -> {}", new_sigs[0].rev);
                    let old_is_bidirectional_pair =
                        old_idx + 1 < rules.len() && rules[old_idx + 1].sid == Some(sid) && rules[old_idx + 1].gid == gid;
                    let remove_count = if old_is_bidirectional_pair { 2 } else { 1 };
                    for _ in 0..remove_count {
                        rules.remove(old_idx);
                    }
                    let at = old_idx;
                    for sig in new_sigs.into_iter().rev() {
                        rules.insert(at, sig);
                    }
                    self.by_gid_sid.insert(key, at);
                    Self::reindex_from(&mut self.by_gid_sid, rules, at);
                    DedupOutcome::Replaced
                }
            }
        }
    }

    fn reindex_from(index: &mut HashMap<(u32, u32), usize>, rules: &[Signature], from: usize) {
        for (i, sig) in rules.iter().enumerate().skip(from) {
            if let Some(sid) = sig.sid {
                index.insert((sig.gid, sid), i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(gid: u32, sid: u32, rev: u32) -> Signature {
        let mut s = Signature::new(gid);
        s.sid = Some(sid);
        s.rev = rev;
        s
    }

    #[test]
    fn first_insert_is_new() {
        let mut idx = DuplicateIndex::new();
        let mut rules = Vec::new();
        assert_eq!(idx.insert(&mut rules, vec![sig(1, 1, 1)]), DedupOutcome::New);
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn lower_or_equal_revision_is_dropped() {
        let mut idx = DuplicateIndex::new();
        let mut rules = Vec::new();
        idx.insert(&mut rules, vec![sig(1, 1, 2)]);
        assert_eq!(idx.insert(&mut rules, vec![sig(1, 1, 2)]), DedupOutcome::DropNew);
        assert_eq!(idx.insert(&mut rules, vec![sig(1, 1, 1)]), DedupOutcome::DropNew);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rev, 2);
    }

    #[test]
    fn higher_revision_replaces() {
        let mut idx = DuplicateIndex::new();
        let mut rules = Vec::new();
        idx.insert(&mut rules, vec![sig(1, 1, 1)]);
        assert_eq!(idx.insert(&mut rules, vec![sig(1, 1, 2)]), DedupOutcome::Replaced);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rev, 2);
    }
}
