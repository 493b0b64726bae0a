// Row projection for decoded routing records

use std::net::{IpAddr, Ipv4Addr};

use super::Row;
use super::kernel::RouteRecord;
use super::sockaddr::{AF_INET6, RTAX_DST, RTAX_GATEWAY, RTAX_NETMASK, SockAddr};

pub const DEFAULT_ROUTE: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// Project a route record. Route records are never rejected.
pub fn route_row(record: &RouteRecord, route_type: &str, interface: &str) -> Row {
    let mut row = Row::new();
    row.set("type", route_type);
    row.set("interface", interface);
    row.set("flags", record.flags.to_string());
    row.set("mtu", record.metrics.mtu.to_string());

    let destination = record.addrs.get(RTAX_DST);
    let dst_ip = destination.and_then(SockAddr::ip);
    row.set("destination", ip_string(dst_ip));
    row.set("gateway", ip_string(record.addrs.get(RTAX_GATEWAY).and_then(SockAddr::ip)));

    let netmask = if dst_ip == Some(IpAddr::V4(DEFAULT_ROUTE)) {
        0
    } else {
        let family = destination.map(SockAddr::family).unwrap_or_default();
        match record.addrs.get(RTAX_NETMASK) {
            Some(mask) => mask.prefix_len(family),
            // No mask means a host route.
            None if family == AF_INET6 => 128,
            None => 32,
        }
    };
    row.set("netmask", netmask.to_string());

    // Not reported by routing sockets.
    row.set("source", "");
    row.set("metric", "0");
    row
}

/// Project a link-layer record, or `None` if it is not an IPv4 neighbor.
///
/// The hardware address of an `RTF_LLINFO` entry is the `sockaddr_dl` in the
/// gateway slot.
pub fn arp_row(record: &RouteRecord, interface: &str) -> Option<Row> {
    let Some(SockAddr::Inet4(address)) = record.addrs.get(RTAX_DST) else {
        return None;
    };

    let mut row = Row::new();
    row.set("address", address.to_string());
    row.set("interface", interface);

    let mac = match record.addrs.get(RTAX_GATEWAY) {
        Some(SockAddr::Link { mac, .. }) if !mac.is_empty() => format_mac(mac),
        _ => "incomplete".to_string(),
    };
    row.set("mac", mac);
    row.set(
        "permanent",
        if record.metrics.expire == 0 { "1" } else { "0" },
    );

    Some(row)
}

fn ip_string(ip: Option<IpAddr>) -> String {
    ip.map(|ip| ip.to_string()).unwrap_or_default()
}

pub fn format_mac(mac: &[u8]) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::fixtures::{RecordBuilder, netmask_v4, sockaddr_dl, sockaddr_in, sockaddr_in6};

    fn record(builder: RecordBuilder) -> RouteRecord {
        RouteRecord::parse(&builder.build()).unwrap()
    }

    #[test]
    fn test_default_route_netmask_ignores_mask_slot() {
        let r = record(
            RecordBuilder::new(0x3)
                .addr(RTAX_DST, sockaddr_in([0, 0, 0, 0]))
                .addr(RTAX_GATEWAY, sockaddr_in([10, 0, 0, 1]))
                .addr(RTAX_NETMASK, netmask_v4(8)),
        );
        assert_eq!(route_row(&r, "gateway", "").get("netmask"), Some("0"));
    }

    #[test]
    fn test_netmask_from_mask_slot() {
        let r = record(
            RecordBuilder::new(0x1)
                .addr(RTAX_DST, sockaddr_in([192, 168, 1, 0]))
                .addr(RTAX_NETMASK, netmask_v4(24)),
        );
        assert_eq!(route_row(&r, "static", "").get("netmask"), Some("24"));
    }

    #[test]
    fn test_ipv4_host_route_defaults_to_32() {
        let r = record(RecordBuilder::new(0x1).addr(RTAX_DST, sockaddr_in([10, 0, 0, 7])));
        assert_eq!(route_row(&r, "local", "").get("netmask"), Some("32"));
    }

    #[test]
    fn test_ipv6_host_route_defaults_to_128() {
        let r = record(
            RecordBuilder::new(0x1).addr(RTAX_DST, sockaddr_in6("2001:db8::1".parse().unwrap())),
        );
        let row = route_row(&r, "local", "");
        assert_eq!(row.get("destination"), Some("2001:db8::1"));
        assert_eq!(row.get("netmask"), Some("128"));
    }

    #[test]
    fn test_ipv6_netmask_uses_destination_family() {
        let r = record(
            RecordBuilder::new(0x1)
                .addr(RTAX_DST, sockaddr_in6("2001:db8::".parse().unwrap()))
                .addr(RTAX_NETMASK, sockaddr_in6("ffff:ffff:ffff::".parse().unwrap())),
        );
        assert_eq!(route_row(&r, "static", "").get("netmask"), Some("48"));
    }

    #[test]
    fn test_route_row_shape() {
        let r = record(RecordBuilder::new(0x1).addr(RTAX_DST, sockaddr_in([10, 0, 0, 7])));
        let row = route_row(&r, "local", "en0");
        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(
            columns,
            ["destination", "flags", "gateway", "interface", "metric", "mtu", "netmask", "source", "type"]
        );
    }

    #[test]
    fn test_arp_skips_non_ipv4_destination() {
        let r = record(
            RecordBuilder::new(0x400)
                .addr(RTAX_DST, sockaddr_in6("fe80::1".parse().unwrap()))
                .addr(RTAX_GATEWAY, sockaddr_dl(4, "", &[1, 2, 3, 4, 5, 6])),
        );
        assert!(arp_row(&r, "en0").is_none());
    }

    #[test]
    fn test_arp_mac_comes_from_gateway_slot() {
        // The destination slot is an IPv4 address; only the gateway slot
        // carries the hardware address.
        let r = record(
            RecordBuilder::new(0x400)
                .addr(RTAX_DST, sockaddr_in([192, 168, 1, 5]))
                .addr(RTAX_GATEWAY, sockaddr_dl(4, "", &[0x00, 0x1c, 0x42, 0x0a, 0x0b, 0x0c])),
        );
        let row = arp_row(&r, "en0").unwrap();
        assert_eq!(row.get("address"), Some("192.168.1.5"));
        assert_eq!(row.get("mac"), Some("00:1c:42:0a:0b:0c"));
    }

    #[test]
    fn test_arp_incomplete_entry() {
        let r = record(
            RecordBuilder::new(0x400)
                .expire(30)
                .addr(RTAX_DST, sockaddr_in([192, 168, 1, 9]))
                .addr(RTAX_GATEWAY, sockaddr_dl(4, "", &[])),
        );
        let row = arp_row(&r, "en0").unwrap();
        assert_eq!(row.get("mac"), Some("incomplete"));
        assert_eq!(row.get("permanent"), Some("0"));
    }

    #[test]
    fn test_arp_permanent_when_never_expiring() {
        let r = record(
            RecordBuilder::new(0x400)
                .expire(0)
                .addr(RTAX_DST, sockaddr_in([192, 168, 1, 1]))
                .addr(RTAX_GATEWAY, sockaddr_dl(4, "", &[1, 2, 3, 4, 5, 6])),
        );
        assert_eq!(arp_row(&r, "").unwrap().get("permanent"), Some("1"));
    }

    #[test]
    fn test_format_mac() {
        assert_eq!(format_mac(&[0xde, 0xad, 0x00, 0x01, 0xbe, 0xef]), "de:ad:00:01:be:ef");
    }
}
