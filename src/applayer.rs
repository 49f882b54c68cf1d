// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Stand-ins for the app-layer collaborators a full engine sources from its
//! app-layer parser registry: protocol-by-name, progress-by-name lookup,
//! buffer-type-by-name lookup, and inspect-engine registration. Here they are
//! a small, static table covering exactly the protocols and buffers the
//! built-in keyword set (`crate::builtin_keywords`) references.

use std::collections::HashMap;

use crate::tables::BufferKind;

/// An application-layer protocol identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AlProto {
    /// Sentinel for "no app-layer protocol", and the multi-alproto array
    /// terminator.
    Unknown,
    /// The generic `http` family identifier; the target of the `http1`
    /// "common" relation.
    Http,
    /// HTTP/1.x specifically.
    Http1,
    /// HTTP/2; used only to exercise the file-inspection/filename
    /// incompatibility rule in the validator.
    Http2,
}

impl AlProto {
    pub(crate) fn by_name(name: &str) -> Option<AlProto> {
        match name {
            "http" => Some(AlProto::Http),
            "http1" => Some(AlProto::Http1),
            "http2" => Some(AlProto::Http2),
            _ => None,
        }
    }

    /// The "common" family relation: `set_alproto` refuses to override an
    /// existing single alproto with an unrelated value except through this
    /// relation (e.g. `http1` and `http` are both members of the `http`
    /// family).
    pub(crate) fn common_family(self) -> AlProto {
        match self {
            AlProto::Http | AlProto::Http1 => AlProto::Http,
            other => other,
        }
    }

    /// Whether this alproto supports file inspection.
    pub(crate) fn supports_file_inspection(self) -> bool {
        matches!(self, AlProto::Http | AlProto::Http1 | AlProto::Http2)
    }

    /// HTTP/2 forbids filename matching.
    pub(crate) fn forbids_filename_match(self) -> bool {
        matches!(self, AlProto::Http2)
    }
}

/// Traffic direction, derived from a hook name (request → to-server, response
/// → to-client) or accumulated from app-inspection engines.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    ToServer,
    ToClient,
}

/// A registered buffer's static metadata: its list id, display name, mix
/// classification, and whether more than one instance of the buffer may
/// coexist on a signature.
#[derive(Clone, Debug)]
pub struct BufferTypeInfo {
    pub id: u16,
    pub name: &'static str,
    pub kind: BufferKind,
    pub multi_capable: bool,
}

/// One app-inspection engine attached to a buffer for a given alproto,
/// used by the validator's direction derivation and hook-progress match
/// checks.
#[derive(Clone, Copy, Debug)]
pub struct InspectEngine {
    pub buffer_id: u16,
    pub alproto: AlProto,
    pub progress: u8,
    pub direction: Direction,
}

/// The first buffer id handed out to app-layer/custom buffers; legacy lists
/// occupy `0..LIST_MAX`.
pub const LIST_MAX: u16 = 7;

/// Stand-in app-layer registry: protocol/progress/buffer metadata that in a
/// full engine lives in the app-layer parser registry, scoped here to what
/// the illustrative keyword set needs.
pub struct AppLayerRegistry {
    buffers: Vec<BufferTypeInfo>,
    buffers_by_name: HashMap<&'static str, u16>,
    inspect_engines: Vec<InspectEngine>,
    generic_hooks: HashMap<(String, String), u16>,
    progress_names: HashMap<(AlProto, String), (u8, Direction)>,
}

impl AppLayerRegistry {
    pub fn new() -> Self {
        let mut reg = AppLayerRegistry {
            buffers: Vec::new(),
            buffers_by_name: HashMap::new(),
            inspect_engines: Vec::new(),
            generic_hooks: HashMap::new(),
            progress_names: HashMap::new(),
        };

        reg.register_buffer("http.uri", BufferKind::App, false);
        reg.register_buffer("http.uri:generic", BufferKind::App, false);
        reg.register_buffer("file_data", BufferKind::App, false);

        reg.inspect_engines.push(InspectEngine {
            buffer_id: reg.buffer_id("http.uri").unwrap(),
            alproto: AlProto::Http,
            progress: 0,
            direction: Direction::ToServer,
        });
        reg.inspect_engines.push(InspectEngine {
            buffer_id: reg.buffer_id("file_data").unwrap(),
            alproto: AlProto::Http,
            progress: 1,
            direction: Direction::ToClient,
        });

        reg.generic_hooks.insert(
            ("http".to_string(), "request_started".to_string()),
            reg.buffer_id("http.uri:generic").unwrap(),
        );

        reg.progress_names
            .insert((AlProto::Http, "request_line".to_string()), (0, Direction::ToServer));
        reg.progress_names
            .insert((AlProto::Http, "response_complete".to_string()), (1, Direction::ToClient));

        reg
    }

    fn register_buffer(&mut self, name: &'static str, kind: BufferKind, multi_capable: bool) -> u16 {
        let id = LIST_MAX + self.buffers.len() as u16;
        self.buffers.push(BufferTypeInfo {
            id,
            name,
            kind,
            multi_capable,
        });
        self.buffers_by_name.insert(name, id);
        id
    }

    pub fn buffer_id(&self, name: &str) -> Option<u16> {
        self.buffers_by_name.get(name).copied()
    }

    pub fn buffer_info(&self, id: u16) -> Option<&BufferTypeInfo> {
        self.buffers.iter().find(|b| b.id == id)
    }

    /// Resolves a protocol-defined named progress slot.
    pub fn progress_by_name(&self, alproto: AlProto, name: &str) -> Option<(u8, Direction)> {
        self.progress_names.get(&(alproto, name.to_string())).copied()
    }

    /// The `<proto>:<hook>:generic` buffer lookup required when a rule uses
    /// a built-in app-level hook.
    pub fn generic_hook_buffer(&self, proto: &str, hook: &str) -> Option<u16> {
        self.generic_hooks.get(&(proto.to_string(), hook.to_string())).copied()
    }

    /// Inspection engines registered for a given buffer id and alproto.
    pub fn inspect_engines_for(&self, buffer_id: u16, alproto: AlProto) -> Vec<InspectEngine> {
        self.inspect_engines
            .iter()
            .filter(|e| e.buffer_id == buffer_id && e.alproto == alproto)
            .copied()
            .collect()
    }
}

impl Default for AppLayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
