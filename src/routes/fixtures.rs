// Builders for routing socket buffers used by the decoder tests

use std::net::Ipv6Addr;

use super::kernel::{RT_MSGHDR_LEN, RTM_VERSION};
use super::sockaddr::{AF_INET, AF_INET6, AF_LINK};

pub fn sockaddr_in(ip: [u8; 4]) -> Vec<u8> {
    let mut b = vec![0u8; 16];
    b[0] = 16;
    b[1] = AF_INET;
    b[4..8].copy_from_slice(&ip);
    b
}

pub fn sockaddr_in6(ip: Ipv6Addr) -> Vec<u8> {
    let mut b = vec![0u8; 28];
    b[0] = 28;
    b[1] = AF_INET6;
    b[8..24].copy_from_slice(&ip.octets());
    b
}

/// A `sockaddr_dl` padded to the kernel's 20-byte minimum.
pub fn sockaddr_dl(index: u16, name: &str, mac: &[u8]) -> Vec<u8> {
    let len = (8 + name.len() + mac.len()).max(20);
    let mut b = vec![0u8; len];
    b[0] = len as u8;
    b[1] = AF_LINK;
    b[2..4].copy_from_slice(&index.to_ne_bytes());
    b[4] = 6; // IFT_ETHER
    b[5] = name.len() as u8;
    b[6] = mac.len() as u8;
    b[8..8 + name.len()].copy_from_slice(name.as_bytes());
    b[8 + name.len()..8 + name.len() + mac.len()].copy_from_slice(mac);
    b
}

/// An IPv4 netmask in the kernel's trimmed form: no family, trailing zero
/// bytes dropped from `sa_len`.
pub fn netmask_v4(prefix: u32) -> Vec<u8> {
    let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
    let octets = mask.to_be_bytes();
    let significant = octets.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    if significant == 0 {
        return vec![0u8; 4];
    }
    let mut b = vec![0u8; 4 + significant];
    b[0] = (4 + significant) as u8;
    b[4..].copy_from_slice(&octets[..significant]);
    b
}

/// One `rt_msghdr` record with its addresses packed in ordinal order.
pub struct RecordBuilder {
    flags: i32,
    index: u16,
    mtu: u32,
    expire: i32,
    addrs: Vec<(usize, Vec<u8>)>,
}

impl RecordBuilder {
    pub fn new(flags: i32) -> Self {
        RecordBuilder {
            flags,
            index: 0,
            mtu: 1500,
            expire: 0,
            addrs: Vec::new(),
        }
    }

    pub fn index(mut self, index: u16) -> Self {
        self.index = index;
        self
    }

    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn expire(mut self, expire: i32) -> Self {
        self.expire = expire;
        self
    }

    pub fn addr(mut self, ordinal: usize, sa: Vec<u8>) -> Self {
        self.addrs.push((ordinal, sa));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.addrs.sort_by_key(|(ordinal, _)| *ordinal);

        let mut b = vec![0u8; RT_MSGHDR_LEN];
        let mut bitmask = 0i32;
        for (ordinal, sa) in &self.addrs {
            bitmask |= 1 << ordinal;
            b.extend_from_slice(sa);
            while b.len() % 4 != 0 {
                b.push(0);
            }
        }

        let msglen = b.len() as u16;
        b[0..2].copy_from_slice(&msglen.to_ne_bytes());
        b[2] = RTM_VERSION;
        b[3] = 4; // RTM_GET
        b[4..6].copy_from_slice(&self.index.to_ne_bytes());
        b[8..12].copy_from_slice(&self.flags.to_ne_bytes());
        b[12..16].copy_from_slice(&bitmask.to_ne_bytes());
        b[40..44].copy_from_slice(&self.mtu.to_ne_bytes());
        b[48..52].copy_from_slice(&self.expire.to_ne_bytes());
        b
    }
}
