// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Stand-in implementations of the address/CIDR and port/range collaborators
//! a full engine would source from a production address database. These are
//! deliberately small: a literal-or-CIDR, comma/bracket-list grammar for
//! addresses and a literal-or-range, comma/bracket-list grammar for ports.
//! They exist so the header parser, the bidirectional cloner's
//! set-equivalence check, and the validator's IP-only re-parse can be
//! exercised end to end without a production address/CIDR database.

use std::net::{Ipv4Addr, Ipv6Addr};

use itertools::Itertools;
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::char,
    combinator::{all_consuming, map_res},
    multi::separated_list1,
    sequence::separated_pair,
};

use crate::error::{NomRes, SigError};

/// A single address literal: an IPv4 or IPv6 network, expressed as an
/// address plus prefix length (a bare address is a `/32` or `/128`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AddressLiteral {
    V4(Ipv4Addr, u8),
    V6(Ipv6Addr, u8),
}

/// The parsed form of a source or destination address field, with `any`
/// tracked separately from an explicit, possibly-singleton, list (§3,
/// `SRC_ANY`/`DST_ANY`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressSet {
    Any,
    List(Vec<AddressLiteral>),
}

impl AddressSet {
    pub fn is_any(&self) -> bool {
        matches!(self, AddressSet::Any)
    }
}

fn ipv4_literal(i: &str) -> NomRes<Ipv4Addr> {
    map_res(
        take_while1(|c: char| c.is_ascii_digit() || c == '.'),
        |s: &str| s.parse::<Ipv4Addr>(),
    )(i)
}

fn ipv6_literal(i: &str) -> NomRes<Ipv6Addr> {
    map_res(
        take_while1(|c: char| c.is_ascii_hexdigit() || c == ':'),
        |s: &str| s.parse::<Ipv6Addr>(),
    )(i)
}

fn address_literal(i: &str) -> NomRes<AddressLiteral> {
    alt((
        map_res(
            separated_pair(ipv4_literal, char('/'), take_while1(|c: char| c.is_ascii_digit())),
            |(addr, bits): (Ipv4Addr, &str)| -> Result<AddressLiteral, std::num::ParseIntError> {
                Ok(AddressLiteral::V4(addr, bits.parse()?))
            },
        ),
        nom::combinator::map(ipv4_literal, |addr| AddressLiteral::V4(addr, 32)),
        map_res(
            separated_pair(ipv6_literal, char('/'), take_while1(|c: char| c.is_ascii_digit())),
            |(addr, bits): (Ipv6Addr, &str)| -> Result<AddressLiteral, std::num::ParseIntError> {
                Ok(AddressLiteral::V6(addr, bits.parse()?))
            },
        ),
        nom::combinator::map(ipv6_literal, |addr| AddressLiteral::V6(addr, 128)),
    ))(i)
}

fn bracket_list(i: &str) -> NomRes<Vec<AddressLiteral>> {
    nom::sequence::delimited(
        char('['),
        separated_list1(char(','), address_literal),
        char(']'),
    )(i)
}

/// Parses a single (already-unnegated) address field: `any`, a literal/CIDR,
/// or a bracketed comma list. The result is normalized (sorted, deduplicated)
/// so that [`AddressSet`] equality implements set-equivalence rather than
/// list-order equivalence, which is what the bidirectional cloner's
/// same-endpoints check needs.
pub fn parse_address(text: &str) -> Result<AddressSet, SigError> {
    if text == "any" {
        return Ok(AddressSet::Any);
    }

    let parsed = all_consuming(alt((bracket_list, nom::combinator::map(address_literal, |a| vec![a]))))(text)
        .map_err(|_| SigError::InvalidAddress(text.to_string()))?
        .1;

    let normalized = parsed.into_iter().sorted().dedup().collect();
    Ok(AddressSet::List(normalized))
}

/// A single port or inclusive port range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PortRange {
    pub lo: u16,
    pub hi: u16,
}

/// The parsed form of a source or destination port field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortSet {
    Any,
    List(Vec<PortRange>),
}

impl PortSet {
    pub fn is_any(&self) -> bool {
        matches!(self, PortSet::Any)
    }
}

fn port_number(i: &str) -> NomRes<&str> {
    take_while1(|c: char| c.is_ascii_digit())(i)
}

fn port_value(text: &str) -> Result<u32, SigError> {
    text.parse::<u32>()
        .map_err(|_| SigError::InvalidPort(text.to_string()))
}

fn port_range(i: &str) -> NomRes<PortRange> {
    map_res(
        separated_pair(port_number, char(':'), port_number),
        |(lo, hi): (&str, &str)| -> Result<PortRange, SigError> {
            let lo = port_value(lo)?;
            let hi = port_value(hi)?;
            if lo > u16::MAX as u32 || hi > u16::MAX as u32 {
                return Err(SigError::InvalidPort(format!("{lo}:{hi}")));
            }
            Ok(PortRange {
                lo: lo as u16,
                hi: hi as u16,
            })
        },
    )(i)
}

fn port_single(i: &str) -> NomRes<PortRange> {
    map_res(port_number, |s: &str| -> Result<PortRange, SigError> {
        let v = port_value(s)?;
        if v > u16::MAX as u32 {
            return Err(SigError::InvalidPort(s.to_string()));
        }
        Ok(PortRange {
            lo: v as u16,
            hi: v as u16,
        })
    })(i)
}

fn port_bracket_list(i: &str) -> NomRes<Vec<PortRange>> {
    nom::sequence::delimited(
        char('['),
        separated_list1(char(','), alt((port_range, port_single))),
        char(']'),
    )(i)
}

/// Parses a single source/destination port field: `any`, a literal, a
/// `lo:hi` range, or a bracketed comma list of either.
pub fn parse_port(text: &str) -> Result<PortSet, SigError> {
    if text == "any" {
        return Ok(PortSet::Any);
    }

    let parsed = all_consuming(alt((
        port_bracket_list,
        nom::combinator::map(alt((port_range, port_single)), |p| vec![p]),
    )))(text)
    .map_err(|_| SigError::InvalidPort(text.to_string()))?
    .1;

    let normalized = parsed.into_iter().sorted().dedup().collect();
    Ok(PortSet::List(normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_any() {
        assert_eq!(parse_address("any").unwrap(), AddressSet::Any);
        assert_eq!(parse_port("any").unwrap(), PortSet::Any);
    }

    #[test]
    fn parses_single_v4() {
        let set = parse_address("1.2.3.4").unwrap();
        assert_eq!(
            set,
            AddressSet::List(vec![AddressLiteral::V4("1.2.3.4".parse().unwrap(), 32)])
        );
    }

    #[test]
    fn parses_cidr() {
        let set = parse_address("10.0.0.0/8").unwrap();
        assert_eq!(
            set,
            AddressSet::List(vec![AddressLiteral::V4("10.0.0.0".parse().unwrap(), 8)])
        );
    }

    #[test]
    fn parses_bracket_list_and_normalizes() {
        let a = parse_address("[2.2.2.2,1.1.1.1]").unwrap();
        let b = parse_address("[1.1.1.1,2.2.2.2]").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_garbage_address() {
        assert!(parse_address("not-an-address").is_err());
    }

    #[test]
    fn parses_port_range() {
        let set = parse_port("1024:65535").unwrap();
        assert_eq!(set, PortSet::List(vec![PortRange { lo: 1024, hi: 65535 }]));
    }

    #[test]
    fn rejects_out_of_range_port() {
        assert!(parse_port("1024:65536").is_err());
    }

    #[test]
    fn parses_port_bracket_list() {
        let set = parse_port("[80,443,8000:8080]").unwrap();
        assert_eq!(
            set,
            PortSet::List(vec![
                PortRange { lo: 80, hi: 80 },
                PortRange { lo: 443, hi: 443 },
                PortRange { lo: 8000, hi: 8080 },
            ])
        );
    }
}
