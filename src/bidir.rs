// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The bidirectional cloner (C8): when a rule's direction marker is `<>`,
//! the engine reparses the same rule text with source/destination addresses
//! swapped rather than deep-copying a half-built signature. This isolates
//! the swap to address parsing only; option parsing and validation run
//! identically for both siblings.

use crate::lexer::LexedRule;
use crate::signature::Signature;

/// Whether the source and destination endpoint sets are equal, per
/// set-equivalence (not list-order) comparison. When true, the clone is
/// suppressed and `INIT_BIDIREC` is cleared on the sole signature.
pub fn endpoints_equal(sig: &Signature) -> bool {
    sig.src == sig.dst && sig.sp == sig.dp
}

/// Builds the sibling `LexedRule` with source and destination address text
/// swapped. Ports and every other field are left untouched, matching the
/// "isolates the swap logic in address-parse only" design.
pub fn swap_addresses<'a>(lexed: &LexedRule<'a>) -> LexedRule<'a> {
    LexedRule {
        src: lexed.dst,
        dst: lexed.src,
        ..lexed.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr_port::{AddressSet, PortSet};
    use crate::signature::Signature;

    #[test]
    fn equal_endpoints_detected() {
        let mut sig = Signature::new(1);
        sig.src = AddressSet::Any;
        sig.dst = AddressSet::Any;
        sig.sp = PortSet::Any;
        sig.dp = PortSet::Any;
        assert!(endpoints_equal(&sig));
    }

    #[test]
    fn swap_addresses_swaps_only_src_dst() {
        let lexed = LexedRule {
            action: "alert",
            proto: "tcp",
            src: "1.1.1.1",
            sp: "80",
            dir: "<>",
            dst: "2.2.2.2",
            dp: "443",
            options: "sid:1;",
        };
        let swapped = swap_addresses(&lexed);
        assert_eq!(swapped.src, "2.2.2.2");
        assert_eq!(swapped.dst, "1.1.1.1");
        assert_eq!(swapped.sp, "80");
        assert_eq!(swapped.dp, "443");
    }
}
