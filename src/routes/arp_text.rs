// Linux ARP cache reader (/proc/net/arp)

use std::fs;
use std::path::Path;

use tracing::debug;

use super::Row;
use crate::error::AppResult;

pub const LINUX_ARP_TABLE: &str = "/proc/net/arp";

/// Flags column of a complete, permanent entry (ATF_COM | ATF_PERM).
const PERMANENT_FLAGS: &str = "0x6";

/// Read and decode the ARP table at `path`.
///
/// An unreadable or empty file yields no rows.
pub fn decode(path: &Path) -> Vec<Row> {
    let content = match read_table(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), "Cannot read arp table: {}", e);
            return Vec::new();
        }
    };
    if content.is_empty() {
        debug!(path = %path.display(), "Empty arp table");
        return Vec::new();
    }

    let rows = parse_arp_table(&content);
    debug!(entries = rows.len(), "ARP table parsed");
    rows
}

fn read_table(path: &Path) -> AppResult<String> {
    Ok(fs::read_to_string(path)?)
}

/// Decode table text; the first line is the column header.
///
/// Format of /proc/net/arp:
/// IP address       HW type     Flags       HW address            Mask     Device
/// 192.168.1.1      0x1         0x2         aa:bb:cc:dd:ee:ff     *        eth0
pub fn parse_arp_table(content: &str) -> Vec<Row> {
    content.lines().skip(1).filter_map(parse_arp_line).collect()
}

fn parse_arp_line(line: &str) -> Option<Row> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [address, _hw_type, flags, mac, _mask, device] = fields.as_slice() else {
        return None;
    };

    let mut row = Row::new();
    row.set("address", *address);
    row.set("mac", *mac);
    row.set("interface", *device);
    row.set("permanent", if *flags == PERMANENT_FLAGS { "1" } else { "0" });
    Some(row)
}
