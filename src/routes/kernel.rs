// Routing socket table decoder
//
// The kernel answers a `NET_RT_FLAGS` sysctl with a run of variable-length
// `rt_msghdr` records. Each record reports its own length, carries a bitmask
// of which address slots follow the header, and packs those addresses in
// ascending slot order.

use tracing::{debug, warn};

use super::interfaces::InterfaceIndexMap;
use super::project;
use super::sockaddr::{AddressSlots, RTAX_GATEWAY, SockAddr};
use super::{Row, RouteTypeFilter};
use crate::error::{AppError, AppResult};

// Darwin `struct rt_msghdr` layout.
pub const RT_MSGHDR_LEN: usize = 92;
pub const RTM_VERSION: u8 = 5;
const OFF_MSGLEN: usize = 0;
const OFF_VERSION: usize = 2;
const OFF_INDEX: usize = 4;
const OFF_FLAGS: usize = 8;
const OFF_ADDRS: usize = 12;
const OFF_RMX: usize = 36;
const RMX_MTU: usize = OFF_RMX + 4;
const RMX_EXPIRE: usize = OFF_RMX + 12;

/// Metrics carried in `rtm_rmx`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMetrics {
    pub mtu: u32,
    /// Zero for entries that never expire.
    pub expire: i32,
}

/// One decoded routing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub flags: i32,
    /// `rtm_index`: interface the route is attached to.
    pub index: u16,
    pub metrics: RouteMetrics,
    pub addrs: AddressSlots,
}

impl RouteRecord {
    /// Decode one record from exactly its `rtm_msglen` bytes.
    pub fn parse(b: &[u8]) -> AppResult<Self> {
        if b.len() < RT_MSGHDR_LEN {
            return Err(AppError::MalformedRecord(format!(
                "{}-byte record is shorter than the {}-byte header",
                b.len(),
                RT_MSGHDR_LEN
            )));
        }

        let bitmask = read_i32(b, OFF_ADDRS);
        Ok(RouteRecord {
            flags: read_i32(b, OFF_FLAGS),
            index: u16::from_ne_bytes([b[OFF_INDEX], b[OFF_INDEX + 1]]),
            metrics: RouteMetrics {
                mtu: read_i32(b, RMX_MTU) as u32,
                expire: read_i32(b, RMX_EXPIRE),
            },
            addrs: AddressSlots::decode(bitmask, b, RT_MSGHDR_LEN)?,
        })
    }

    /// Interface index from a link-layer gateway, else the header's index.
    pub fn interface_index(&self) -> Option<u32> {
        match self.addrs.get(RTAX_GATEWAY) {
            Some(SockAddr::Link { index, .. }) if *index != 0 => Some(*index as u32),
            _ if self.index != 0 => Some(self.index as u32),
            _ => None,
        }
    }
}

fn read_i32(b: &[u8], offset: usize) -> i32 {
    i32::from_ne_bytes([b[offset], b[offset + 1], b[offset + 2], b[offset + 3]])
}

/// Split a raw table buffer into records.
///
/// A record that fails to decode is dropped. A length too short to reach the
/// version byte, or one that runs past the buffer, ends the walk, keeping
/// what was decoded before it.
pub fn parse_records(buf: &[u8]) -> Vec<RouteRecord> {
    let mut records = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        let rest = &buf[offset..];
        if rest.len() < OFF_VERSION + 1 {
            warn!(offset, remaining = rest.len(), "Trailing bytes in route table");
            break;
        }

        let msglen = u16::from_ne_bytes([rest[OFF_MSGLEN], rest[OFF_MSGLEN + 1]]) as usize;
        if msglen <= OFF_VERSION {
            warn!(offset, msglen, "Route record length too short to walk");
            break;
        }
        if msglen > rest.len() {
            warn!(offset, msglen, remaining = rest.len(), "Route table truncated");
            break;
        }

        let record = &rest[..msglen];
        if record[OFF_VERSION] != RTM_VERSION {
            debug!(offset, version = record[OFF_VERSION], "Skipping route record with unknown version");
        } else {
            match RouteRecord::parse(record) {
                Ok(r) => records.push(r),
                Err(e) => debug!(offset, "Skipping route record: {}", e),
            }
        }

        offset += msglen;
    }

    records
}

/// Turn a raw table buffer into rows for `filter`.
pub fn decode_buffer(buf: &[u8], filter: &RouteTypeFilter, interfaces: &InterfaceIndexMap) -> Vec<Row> {
    parse_records(buf)
        .iter()
        .filter_map(|record| {
            let interface = record
                .interface_index()
                .and_then(|index| interfaces.get(&index))
                .map(String::as_str)
                .unwrap_or("");

            if filter.is_link_layer() {
                project::arp_row(record, interface)
            } else {
                Some(project::route_row(record, filter.label, interface))
            }
        })
        .collect()
}

/// Where raw routing table buffers come from.
pub trait RouteTableSource {
    /// Fetch every entry carrying `flag`. An empty buffer means no entries.
    fn fetch(&self, flag: i32) -> AppResult<Vec<u8>>;
}

/// Reads tables with the two-call `sysctl` protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysctlSource;

impl RouteTableSource for SysctlSource {
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    fn fetch(&self, flag: i32) -> AppResult<Vec<u8>> {
        let mut mib: [libc::c_int; 6] = [
            libc::CTL_NET,
            libc::PF_ROUTE,
            0,
            libc::AF_UNSPEC,
            libc::NET_RT_FLAGS,
            flag,
        ];

        let mut size: libc::size_t = 0;
        let rc = unsafe {
            libc::sysctl(
                mib.as_mut_ptr(),
                mib.len() as libc::c_uint,
                std::ptr::null_mut(),
                &mut size,
                std::ptr::null_mut(),
                0,
            )
        };
        if rc < 0 {
            return Err(AppError::SourceUnavailable(format!(
                "sysctl size query for flag {:#x}: {}",
                flag,
                std::io::Error::last_os_error()
            )));
        }
        if size == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; size];
        let rc = unsafe {
            libc::sysctl(
                mib.as_mut_ptr(),
                mib.len() as libc::c_uint,
                buf.as_mut_ptr().cast(),
                &mut size,
                std::ptr::null_mut(),
                0,
            )
        };
        if rc < 0 {
            return Err(AppError::SourceUnavailable(format!(
                "sysctl fetch for flag {:#x}: {}",
                flag,
                std::io::Error::last_os_error()
            )));
        }

        buf.truncate(size);
        Ok(buf)
    }

    #[cfg(not(any(target_os = "macos", target_os = "ios")))]
    fn fetch(&self, _flag: i32) -> AppResult<Vec<u8>> {
        Err(AppError::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }
}

/// Fetches and decodes one filter's table.
pub struct KernelRouteTableDecoder<S> {
    source: S,
}

impl<S: RouteTableSource> KernelRouteTableDecoder<S> {
    pub fn new(source: S) -> Self {
        KernelRouteTableDecoder { source }
    }

    /// Rows for every entry matching `filter`; empty if the table is unavailable.
    pub fn decode(&self, filter: &RouteTypeFilter, interfaces: &InterfaceIndexMap) -> Vec<Row> {
        let buf = match self.source.fetch(filter.flag) {
            Ok(buf) => buf,
            Err(e) => {
                warn!(table = filter.label, "Cannot read route table: {}", e);
                return Vec::new();
            }
        };

        let rows = decode_buffer(&buf, filter, interfaces);
        debug!(table = filter.label, bytes = buf.len(), rows = rows.len(), "Decoded route table");
        rows
    }
}
