//! Normalized snapshots of the host routing table and ARP cache.
//!
//! On macOS the tables come from routing socket sysctls; on Linux from
//! `/proc/net/route` and `/proc/net/arp`. Both produce the same row shape.

pub mod api;
pub mod config;
pub mod error;
pub mod routes;
