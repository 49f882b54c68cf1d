// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The keyword registry: the table of known rule options, their parsing
//! requirements, and the dispatch that drives each one's `Setup`.
//!
//! Upstream keeps one process-global keyword table, registered once at
//! startup through a side-effecting `*Register()` function per keyword and
//! consulted by raw index into a fixed-size array. A global mutable table
//! has no safe Rust equivalent without `unsafe` or a `OnceLock<Mutex<_>>`
//! that would serialize every parse; instead each
//! [`crate::engine::EngineCtx`] owns its own [`KeywordRegistry`], built once
//! at construction and then read-only for the lifetime of the context. This
//! also makes it trivial to build a registry with a reduced keyword set for
//! testing.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::applayer::AppLayerRegistry;
use crate::signature::Signature;
use crate::tables::DetectTable;

bitflags! {
    /// Per-keyword parsing requirements and capabilities.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct KeywordFlags: u16 {
        /// The keyword takes no value; `name;` with a trailing value is an
        /// error.
        const NOOPT = 1 << 0;
        /// The keyword's value is optional (`name;` and `name:v;` both valid).
        const OPTIONAL_OPT = 1 << 1;
        /// The value may be quoted but need not be.
        const QUOTES_OPTIONAL = 1 << 2;
        /// The value must be quoted.
        const QUOTES_MANDATORY = 1 << 3;
        /// A leading `!` before the value is meaningful to this keyword.
        const HANDLE_NEGATION = 1 << 4;
        /// This keyword's `Setup` consults the engine context's strict-mode
        /// flag and may turn a normally-silent condition into a hard error.
        const STRICT_PARSING = 1 << 5;
        /// The keyword is deprecated; using it logs a warning but still
        /// applies normally.
        const INFO_DEPRECATED = 1 << 6;
        /// The keyword is meaningful in firewall rules.
        const SUPPORT_FIREWALL = 1 << 7;
        /// The keyword consumes a leading direction token
        /// (`to_server`/`to_client`) before the rest of its value.
        const SUPPORT_DIR = 1 << 8;
    }
}

/// The outcome of calling a keyword's `Setup`. Upstream returns a signed
/// integer sentinel (`0`/`-1`/`-2`/`-3`/`-4`); the distinct failure modes are
/// modeled here as enum variants instead of magic numbers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The option was applied to the signature.
    Applied,
    /// A hard, user-visible parse error.
    Error(String),
    /// Drop this rule without a user-visible error, logging at most once per
    /// (gid, sid) to avoid log floods from noisy rulesets.
    SilentOnce(String),
    /// Drop this rule without a user-visible error and without logging at
    /// all (e.g. an unmet `requires` predicate: expected, not exceptional).
    SilentOk,
    /// A `requires` precondition was not met; semantically identical to
    /// `SilentOk` but kept distinct so callers can tell the two apart in
    /// diagnostics.
    RequiresNotMet,
}

impl SetupOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SetupOutcome::Applied)
    }
}

/// A keyword's identity within a registry: its registration order. Stable
/// for the lifetime of one [`KeywordRegistry`], not across registries.
pub type KeywordId = u16;

/// The arguments the option parser has already resolved before invoking a
/// keyword's `Setup`: the (possibly absent) value with quoting stripped, the
/// negation flag lifted off a leading `!` (only meaningful when the
/// keyword's entry carries `HANDLE_NEGATION`), and a forced direction lifted
/// off a leading `to_server`/`to_client` token (only meaningful when the
/// entry carries `SUPPORT_DIR`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SetupInput<'a> {
    pub value: Option<&'a str>,
    pub negated: bool,
    pub forced_direction: Option<crate::applayer::Direction>,
}

/// `fn(app_layer, signature, input, self_id) -> outcome`. Plain function
/// pointers, not boxed closures: this mirrors upstream's static dispatch —
/// every built-in keyword's `Setup` is a free function with no captured
/// state, and the registry only ever needs to call it, never clone it. The
/// trailing `KeywordId` is this keyword's own id within the calling
/// registry, handed back so a `Setup` that calls
/// [`Signature::append_match`](crate::signature::Signature::append_match)
/// can tag the new node with it without needing a process-wide constant.
pub type SetupFn = fn(&AppLayerRegistry, &mut Signature, SetupInput, KeywordId) -> SetupOutcome;

/// One row of the keyword table.
#[derive(Clone, Copy)]
pub struct KeywordTableEntry {
    pub name: &'static str,
    /// An older spelling that resolves to the same entry (e.g. `http_uri`
    /// historically aliased to a content-modifier form of `http.uri`).
    pub alias: Option<&'static str>,
    pub flags: KeywordFlags,
    pub setup: SetupFn,
    /// When set, and this keyword's `Setup` returns `RequiresNotMet` or a
    /// silent outcome, the name of a fallback keyword the caller may retry
    /// with instead (unused by the built-in set, reserved for rules that
    /// carry a protocol-version fallback chain).
    pub alternative: Option<&'static str>,
    /// The detection tables this keyword is compatible with.
    pub tables: DetectTable,
}

/// A single engine context's keyword table, built once at
/// [`EngineCtx`](crate::engine::EngineCtx) construction.
pub struct KeywordRegistry {
    entries: Vec<KeywordTableEntry>,
    by_name: HashMap<String, KeywordId>,
    strict: bool,
}

impl KeywordRegistry {
    /// Builds an empty registry. Callers register keywords with
    /// [`register`](Self::register); `crate::builtin_keywords::register_all`
    /// populates the illustrative built-in set.
    pub fn empty() -> Self {
        KeywordRegistry {
            entries: Vec::new(),
            by_name: HashMap::new(),
            strict: false,
        }
    }

    pub fn register(&mut self, entry: KeywordTableEntry) -> KeywordId {
        let id = self.entries.len() as KeywordId;
        self.by_name.insert(entry.name.to_ascii_lowercase(), id);
        if let Some(alias) = entry.alias {
            self.by_name.insert(alias.to_ascii_lowercase(), id);
        }
        self.entries.push(entry);
        id
    }

    /// Turns on strict parsing: keywords carrying `STRICT_PARSING` treat
    /// conditions they would otherwise pass through silently as hard errors.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Case-insensitive by name, with fallback to alias (§4.2): both `name`
    /// and `alias` are lowercased at registration time, so a single lowercase
    /// comparison here handles any mix of case the rule text used.
    pub fn lookup(&self, name: &str) -> Option<(KeywordId, &KeywordTableEntry)> {
        self.by_name.get(&name.to_ascii_lowercase()).map(|&id| (id, &self.entries[id as usize]))
    }

    pub fn entry(&self, id: KeywordId) -> &KeywordTableEntry {
        &self.entries[id as usize]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-keyword "reported a silent error already" bookkeeping (§4.2:
/// `silent_error(id, ctx) -> bool`). Owned by the single-threaded engine
/// context (§5), not the read-only registry, since it is the one piece of
/// keyword-table-shaped state that actually mutates during parsing.
pub struct SilentErrorTracker {
    seen: Vec<bool>,
}

impl SilentErrorTracker {
    pub fn new(registry: &KeywordRegistry) -> Self {
        SilentErrorTracker {
            seen: vec![false; registry.len()],
        }
    }

    /// Records an occurrence for `id`; returns `true` if this is the first
    /// one (the caller should log it), `false` if it has already fired once
    /// (the caller should swallow it silently).
    pub fn mark(&mut self, id: KeywordId) -> bool {
        let slot = &mut self.seen[id as usize];
        let first = !*slot;
        *slot = true;
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applayer::AppLayerRegistry;
    use crate::tables::DetectTable;

    fn noop_setup(_: &AppLayerRegistry, _: &mut Signature, _: SetupInput, _: KeywordId) -> SetupOutcome {
        SetupOutcome::Applied
    }

    #[test]
    fn lookup_is_case_insensitive_with_alias_fallback() {
        let mut reg = KeywordRegistry::empty();
        reg.register(KeywordTableEntry {
            name: "Content",
            alias: Some("PAYLOAD"),
            flags: KeywordFlags::empty(),
            setup: noop_setup,
            alternative: None,
            tables: DetectTable::empty(),
        });

        assert!(reg.lookup("content").is_some());
        assert!(reg.lookup("CONTENT").is_some());
        assert!(reg.lookup("CoNtEnT").is_some());
        assert!(reg.lookup("payload").is_some());
        assert!(reg.lookup("PAYLOAD").is_some());
        assert!(reg.lookup("nope").is_none());
    }
}
