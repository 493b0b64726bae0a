// Routes module - decodes the kernel routing table and ARP cache into rows

pub mod arp_text;
pub mod interfaces;
pub mod kernel;
pub mod proc_route;
pub mod project;
pub mod snapshot;
pub mod sockaddr;

#[cfg(test)]
pub(crate) mod fixtures;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One decoded table row, keyed by column name.
///
/// Route rows and ARP rows carry different column sets but share this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, String>);

impl Row {
    pub fn new() -> Self {
        Row(BTreeMap::new())
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.0.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// A complete set of rows produced by iterating a filter catalog once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub hostname: String,
    pub rows: Vec<Row>,
    pub timestamp: String,
}

impl Snapshot {
    pub fn new(rows: Vec<Row>) -> Self {
        Snapshot {
            hostname: get_hostname(),
            rows,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Render the rows as an aligned text table.
    pub fn to_text(&self) -> String {
        let Some(first) = self.rows.first() else {
            return String::new();
        };
        let columns: Vec<&str> = first.columns().collect();
        let widths: Vec<usize> = columns
            .iter()
            .map(|column| {
                self.rows
                    .iter()
                    .map(|row| row.get(column).unwrap_or("").len())
                    .max()
                    .unwrap_or(0)
                    .max(column.len())
            })
            .collect();

        let render = |cells: Vec<&str>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![render(columns.clone())];
        for row in &self.rows {
            lines.push(render(
                columns.iter().map(|c| row.get(c).unwrap_or("")).collect(),
            ));
        }
        lines.join("\n")
    }
}

/// A kernel route flag paired with the label used for the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTypeFilter {
    pub flag: i32,
    pub label: &'static str,
}

impl RouteTypeFilter {
    /// Link-layer entries are projected as ARP rows instead of route rows.
    pub fn is_link_layer(&self) -> bool {
        self.flag == RTF_LLINFO
    }
}

// Darwin <net/route.h> flag values.
pub const RTF_GATEWAY: i32 = 0x2;
pub const RTF_DYNAMIC: i32 = 0x10;
pub const RTF_MODIFIED: i32 = 0x20;
pub const RTF_LLINFO: i32 = 0x400;
pub const RTF_STATIC: i32 = 0x800;
pub const RTF_BLACKHOLE: i32 = 0x1000;
pub const RTF_LOCAL: i32 = 0x200000;
pub const RTF_PROXY: i32 = 0x8000000;
pub const RTF_ROUTER: i32 = 0x10000000;

/// Route queries in the order their rows appear in a snapshot.
pub const ROUTE_TYPES: &[RouteTypeFilter] = &[
    RouteTypeFilter { flag: RTF_LOCAL, label: "local" },
    RouteTypeFilter { flag: RTF_GATEWAY, label: "gateway" },
    RouteTypeFilter { flag: RTF_DYNAMIC, label: "dynamic" },
    RouteTypeFilter { flag: RTF_MODIFIED, label: "modified" },
    RouteTypeFilter { flag: RTF_STATIC, label: "static" },
    RouteTypeFilter { flag: RTF_BLACKHOLE, label: "blackhole" },
    RouteTypeFilter { flag: RTF_ROUTER, label: "router" },
    RouteTypeFilter { flag: RTF_PROXY, label: "proxy" },
];

pub const ARP_TYPES: &[RouteTypeFilter] = &[RouteTypeFilter {
    flag: RTF_LLINFO,
    label: "linklayer",
}];

pub fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
