// Linux IPv4 routing table reader (/proc/net/route)

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use tracing::debug;

use super::{Row, RouteTypeFilter};
use crate::error::AppResult;

pub const LINUX_ROUTE_TABLE: &str = "/proc/net/route";

// Linux <linux/route.h> flag values.
const RTF_GATEWAY: i32 = 0x2;
const RTF_DYNAMIC: i32 = 0x10;
const RTF_MODIFIED: i32 = 0x20;
const RTF_REJECT: i32 = 0x200;

/// First matching entry names the route type; anything else is a link route.
const LINUX_ROUTE_TYPES: &[RouteTypeFilter] = &[
    RouteTypeFilter { flag: RTF_GATEWAY, label: "gateway" },
    RouteTypeFilter { flag: RTF_REJECT, label: "blackhole" },
    RouteTypeFilter { flag: RTF_DYNAMIC, label: "dynamic" },
    RouteTypeFilter { flag: RTF_MODIFIED, label: "modified" },
];
const LINK_ROUTE: &str = "link";

const MIN_FIELDS: usize = 11;

/// Read and decode the routing table at `path`.
pub fn decode(path: &Path) -> Vec<Row> {
    let content = match read_table(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), "Cannot read route table: {}", e);
            return Vec::new();
        }
    };

    let rows = parse_route_table(&content);
    debug!(entries = rows.len(), "Route table parsed");
    rows
}

fn read_table(path: &Path) -> AppResult<String> {
    Ok(fs::read_to_string(path)?)
}

/// Decode table text; the first line is the column header.
///
/// Iface  Destination  Gateway   Flags  RefCnt  Use  Metric  Mask      MTU  Window  IRTT
/// eth0   00000000     0100A8C0  0003   0       0    100     00000000  0    0       0
pub fn parse_route_table(content: &str) -> Vec<Row> {
    content.lines().skip(1).filter_map(parse_route_line).collect()
}

fn parse_route_line(line: &str) -> Option<Row> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let destination = hex_to_ipv4(fields[1])?;
    let gateway = hex_to_ipv4(fields[2])?;
    let flags = i32::from_str_radix(fields[3], 16).ok()?;
    let mask = hex_to_ipv4(fields[7])?;

    let netmask = if destination.is_unspecified() {
        0
    } else {
        u32::from(mask).leading_ones()
    };

    let mut row = Row::new();
    row.set("destination", destination.to_string());
    row.set(
        "gateway",
        if flags & RTF_GATEWAY != 0 || !gateway.is_unspecified() {
            gateway.to_string()
        } else {
            String::new()
        },
    );
    row.set("netmask", netmask.to_string());
    row.set("source", "");
    row.set("flags", flags.to_string());
    row.set("interface", fields[0]);
    row.set("metric", fields[6]);
    row.set("mtu", fields[8]);
    row.set(
        "type",
        LINUX_ROUTE_TYPES
            .iter()
            .find(|t| flags & t.flag != 0)
            .map_or(LINK_ROUTE, |t| t.label),
    );
    Some(row)
}

/// The kernel prints each address as a host-order integer of network-order bytes.
fn hex_to_ipv4(field: &str) -> Option<Ipv4Addr> {
    u32::from_str_radix(field, 16)
        .ok()
        .map(|value| Ipv4Addr::from(value.to_ne_bytes()))
}
