//! IP address literals: a bare address, a CIDR block, or a dash-range
//! span of two full addresses.
//!
//! `ipnetwork` models CIDR blocks natively; the dash-range form is not a
//! CIDR block in general, so it is represented separately as an inclusive
//! span and compared by ordering rather than prefix masking.

use ipnetwork::IpNetwork;
use std::cmp::Ordering;
use std::fmt;
use std::net::IpAddr;

/// Either a CIDR block or an explicit `low-high` address span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpRange {
    Cidr(IpNetwork),
    Span(IpAddr, IpAddr),
}

impl IpRange {
    pub fn contains(&self, addr: IpAddr) -> bool {
        match self {
            IpRange::Cidr(net) => net.contains(addr),
            IpRange::Span(lo, hi) => same_family(addr, *lo) && in_span(addr, *lo, *hi),
        }
    }

    /// Ordering used for `<`/`<=`/`>`/`>=` against another range or a bare
    /// address: by the range's lower bound.
    pub fn lower_bound(&self) -> IpAddr {
        match self {
            IpRange::Cidr(net) => net.network(),
            IpRange::Span(lo, _) => *lo,
        }
    }
}

fn same_family(a: IpAddr, b: IpAddr) -> bool {
    a.is_ipv4() == b.is_ipv4()
}

fn in_span(addr: IpAddr, lo: IpAddr, hi: IpAddr) -> bool {
    addr_key(addr)
        .map(|k| {
            let lo_k = addr_key(lo).unwrap_or(k);
            let hi_k = addr_key(hi).unwrap_or(k);
            k >= lo_k && k <= hi_k
        })
        .unwrap_or(false)
}

fn addr_key(addr: IpAddr) -> Option<u128> {
    match addr {
        IpAddr::V4(v4) => Some(u32::from(v4) as u128),
        IpAddr::V6(v6) => Some(u128::from(v6)),
    }
}

/// A literal that is either a single address or a range; this is what an
/// `IPv4`/`IPv6` node carries once typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpLit {
    Addr(IpAddr),
    Range(IpRange),
}

impl IpLit {
    pub fn contains(&self, addr: IpAddr) -> bool {
        match self {
            IpLit::Addr(a) => *a == addr,
            IpLit::Range(r) => r.contains(addr),
        }
    }

    pub fn cmp_key(&self) -> IpAddr {
        match self {
            IpLit::Addr(a) => *a,
            IpLit::Range(r) => r.lower_bound(),
        }
    }
}

impl PartialOrd for IpLit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (IpLit::Addr(a), IpLit::Addr(b)) => a.partial_cmp(b),
            _ => addr_key(self.cmp_key())?.partial_cmp(&addr_key(other.cmp_key())?),
        }
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpRange::Cidr(net) => write!(f, "{net}"),
            IpRange::Span(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

impl fmt::Display for IpLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpLit::Addr(a) => write!(f, "{a}"),
            IpLit::Range(r) => write!(f, "{r}"),
        }
    }
}

/// Parses the surface IP literal forms: bare address, CIDR (`a/len`),
/// and dash-range (`a-b`). "Dot-range" is not specified precisely enough
/// upstream to give it distinct, testable semantics, so it is treated as a
/// variant of dash-range with a bare final octet on the right-hand side is
/// NOT supported here (see DESIGN.md Open Questions).
pub fn parse_ip_lit(raw: &str) -> Option<IpLit> {
    if let Some((lo, hi)) = raw.split_once('-') {
        let lo: IpAddr = lo.trim().parse().ok()?;
        let hi: IpAddr = hi.trim().parse().ok()?;
        return Some(IpLit::Range(IpRange::Span(lo, hi)));
    }
    if raw.contains('/') {
        let net: IpNetwork = raw.parse().ok()?;
        return Some(IpLit::Range(IpRange::Cidr(net)));
    }
    let addr: IpAddr = raw.parse().ok()?;
    Some(IpLit::Addr(addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_address() {
        assert_eq!(
            parse_ip_lit("127.0.0.1"),
            Some(IpLit::Addr("127.0.0.1".parse().unwrap()))
        );
    }

    #[test]
    fn parses_cidr() {
        let lit = parse_ip_lit("188.14.166.0/24").unwrap();
        assert!(lit.contains("188.14.166.39".parse().unwrap()));
        assert!(!lit.contains("188.14.167.1".parse().unwrap()));
    }

    #[test]
    fn parses_dash_range() {
        let lit = parse_ip_lit("10.0.0.0-10.0.0.255").unwrap();
        assert!(lit.contains("10.0.0.128".parse().unwrap()));
        assert!(!lit.contains("10.0.1.0".parse().unwrap()));
    }
}
