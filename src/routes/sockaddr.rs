// Address substructures packed after a routing message header
//
// Every address starts with the BSD `sa_len`/`sa_family` pair. The kernel
// packs one address per bit set in `rtm_addrs`, in ascending slot order, each
// padded to a 4-byte boundary.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::ops::Range;

use crate::error::{AppError, AppResult};

// Darwin <sys/socket.h> families.
pub const AF_INET: u8 = 2;
pub const AF_LINK: u8 = 18;
pub const AF_INET6: u8 = 30;

// Slot ordinals from <net/route.h>.
pub const RTAX_DST: usize = 0;
pub const RTAX_GATEWAY: usize = 1;
pub const RTAX_NETMASK: usize = 2;
pub const RTAX_GENMASK: usize = 3;
pub const RTAX_IFP: usize = 4;
pub const RTAX_IFA: usize = 5;
pub const RTAX_AUTHOR: usize = 6;
pub const RTAX_BRD: usize = 7;
pub const RTAX_MAX: usize = 8;

const KERNEL_ALIGN: usize = 4;

const SIN_ADDR: Range<usize> = 4..8;
const SIN6_ADDR: Range<usize> = 8..24;
const SIN6_SCOPE_ID: Range<usize> = 24..28;
const SDL_HEADER_LEN: usize = 8;

/// A decoded socket address, tagged by the family byte it was read with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SockAddr {
    Inet4(Ipv4Addr),
    Inet6 { addr: Ipv6Addr, scope_id: u32 },
    /// `sockaddr_dl`: interface index, optional name and link-layer address.
    Link {
        index: u16,
        name: Option<String>,
        mac: Vec<u8>,
    },
    /// Anything else, including the family-less masks the kernel emits.
    Other { family: u8, raw: Vec<u8> },
}

impl SockAddr {
    /// Decode one address from exactly its `sa_len` bytes.
    ///
    /// Short addresses are legal (the kernel trims trailing zero bytes from
    /// masks), so missing address bytes read as zero.
    pub fn parse(b: &[u8]) -> SockAddr {
        let family = b.get(1).copied().unwrap_or(0);
        match family {
            AF_INET => SockAddr::Inet4(Ipv4Addr::from(copy_padded::<4>(b, SIN_ADDR))),
            AF_INET6 => {
                let mut octets = copy_padded::<16>(b, SIN6_ADDR);
                let mut scope_id = u32::from_ne_bytes(copy_padded::<4>(b, SIN6_SCOPE_ID));
                // KAME stacks embed the interface index in bytes 2..4 of
                // link-local and interface-local multicast addresses.
                if is_kame_scoped(&octets) {
                    let embedded = u16::from_be_bytes([octets[2], octets[3]]) as u32;
                    if embedded != 0 {
                        scope_id = embedded;
                        octets[2] = 0;
                        octets[3] = 0;
                    }
                }
                SockAddr::Inet6 {
                    addr: Ipv6Addr::from(octets),
                    scope_id,
                }
            }
            AF_LINK if b.len() >= SDL_HEADER_LEN => parse_link(b),
            _ => SockAddr::Other {
                family,
                raw: b.to_vec(),
            },
        }
    }

    pub fn family(&self) -> u8 {
        match self {
            SockAddr::Inet4(_) => AF_INET,
            SockAddr::Inet6 { .. } => AF_INET6,
            SockAddr::Link { .. } => AF_LINK,
            SockAddr::Other { family, .. } => *family,
        }
    }

    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            SockAddr::Inet4(addr) => Some(IpAddr::V4(*addr)),
            SockAddr::Inet6 { addr, .. } => Some(IpAddr::V6(*addr)),
            _ => None,
        }
    }

    /// Prefix length of this address read as a netmask for `family`.
    ///
    /// Netmask slots often carry no usable family of their own, so the
    /// destination's family decides where the mask bytes sit.
    pub fn prefix_len(&self, family: u8) -> u32 {
        match self {
            SockAddr::Inet4(mask) => leading_ones(&mask.octets()),
            SockAddr::Inet6 { addr, .. } => leading_ones(&addr.octets()),
            SockAddr::Other { raw, .. } => {
                let range = if family == AF_INET6 { SIN6_ADDR } else { SIN_ADDR };
                let end = range.end.min(raw.len());
                raw.get(range.start..end).map(leading_ones).unwrap_or(0)
            }
            SockAddr::Link { .. } => 0,
        }
    }
}

fn parse_link(b: &[u8]) -> SockAddr {
    let index = u16::from_ne_bytes([b[2], b[3]]);
    let nlen = b[5] as usize;
    let alen = b[6] as usize;
    let data = &b[SDL_HEADER_LEN..];

    let name = data
        .get(..nlen)
        .filter(|n| !n.is_empty())
        .map(|n| String::from_utf8_lossy(n).into_owned());
    let mac = data
        .get(nlen..nlen + alen)
        .map(<[u8]>::to_vec)
        .unwrap_or_default();

    SockAddr::Link { index, name, mac }
}

fn is_kame_scoped(octets: &[u8; 16]) -> bool {
    (octets[0] == 0xfe && octets[1] & 0xc0 == 0x80)
        || (octets[0] == 0xff && matches!(octets[1] & 0x0f, 0x01 | 0x02))
}

fn copy_padded<const N: usize>(b: &[u8], range: Range<usize>) -> [u8; N] {
    let mut out = [0u8; N];
    let end = range.end.min(b.len());
    if range.start < end {
        out[..end - range.start].copy_from_slice(&b[range.start..end]);
    }
    out
}

fn leading_ones(bytes: &[u8]) -> u32 {
    let mut bits = 0;
    for byte in bytes {
        bits += byte.leading_ones();
        if *byte != 0xff {
            break;
        }
    }
    bits
}

/// Bytes an address occupies in the packed buffer.
fn stride(sa_len: usize) -> usize {
    if sa_len == 0 {
        KERNEL_ALIGN
    } else {
        (sa_len + KERNEL_ALIGN - 1) & !(KERNEL_ALIGN - 1)
    }
}

/// One present address slot and the record bytes it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub addr: SockAddr,
    pub span: Range<usize>,
}

/// The fixed slot table of one routing record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSlots {
    slots: [Option<Slot>; RTAX_MAX],
}

impl AddressSlots {
    /// Decode the addresses selected by `bitmask` from `record[start..]`.
    ///
    /// Slots are filled in ascending ordinal order; an unset bit consumes no
    /// bytes. Fails if a present slot runs past the end of the record.
    pub fn decode(bitmask: i32, record: &[u8], start: usize) -> AppResult<Self> {
        let mut table = AddressSlots::default();
        let mut cursor = start;

        for ordinal in 0..RTAX_MAX {
            if bitmask & (1 << ordinal) == 0 {
                continue;
            }
            let Some(&sa_len) = record.get(cursor) else {
                return Err(AppError::MalformedRecord(format!(
                    "slot {} starts at {} past record end {}",
                    ordinal,
                    cursor,
                    record.len()
                )));
            };
            let sa_len = sa_len as usize;
            if cursor + sa_len > record.len() {
                return Err(AppError::MalformedRecord(format!(
                    "slot {} claims {} bytes at {} in a {}-byte record",
                    ordinal,
                    sa_len,
                    cursor,
                    record.len()
                )));
            }

            let span = cursor..cursor + sa_len;
            table.slots[ordinal] = Some(Slot {
                addr: SockAddr::parse(&record[span.clone()]),
                span,
            });
            cursor = (cursor + stride(sa_len)).min(record.len());
        }

        Ok(table)
    }

    pub fn get(&self, ordinal: usize) -> Option<&SockAddr> {
        self.slots
            .get(ordinal)
            .and_then(Option::as_ref)
            .map(|slot| &slot.addr)
    }

    pub fn slot(&self, ordinal: usize) -> Option<&Slot> {
        self.slots.get(ordinal).and_then(Option::as_ref)
    }

    /// Number of non-empty slots.
    pub fn present(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
