// SPDX-License-Identifier: (MIT OR Apache-2.0)

use bitflags::bitflags;

bitflags! {
    /// Detection tables a keyword, or a fully consolidated signature, can
    /// run against. Assigned to a signature by the validator's
    /// classification step and checked per-keyword by its compatibility
    /// step.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DetectTable: u16 {
        /// Ordinary packet-matching (non-firewall).
        const PACKET_TD = 1 << 0;
        /// Ordinary app-layer transaction matching (non-firewall).
        const APP_TD = 1 << 1;
        /// Firewall packet rule hooked at the generic packet filter point.
        const PACKET_FILTER = 1 << 2;
        /// Firewall packet rule hooked pre-stream.
        const PACKET_PRE_STREAM = 1 << 3;
        /// Firewall packet rule hooked pre-flow.
        const PACKET_PRE_FLOW = 1 << 4;
        /// Firewall app-layer rule.
        const APP_FILTER = 1 << 5;
    }
}

/// The buffer-kind classification used by the validator's buffer mix check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    /// A decoded-frame buffer (e.g. a protocol frame boundary).
    Frame,
    /// An app-layer transaction buffer (e.g. `http.uri`, `file_data`).
    App,
    /// A raw packet-payload buffer.
    Packet,
}

/// The final classification of a fully consolidated signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SigType {
    /// No payload matches, no app-level matches: addresses/ports only.
    IpOnly,
    /// Packet-level matching only.
    Pkt,
    /// App-layer transaction matching.
    AppTx,
}
