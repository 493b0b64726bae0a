// Snapshot assembly across the filter catalogs

use std::path::PathBuf;

use tracing::debug;

use super::interfaces::{InterfaceIndexMap, resolve_interfaces};
use super::kernel::{KernelRouteTableDecoder, RouteTableSource, SysctlSource};
use super::{ARP_TYPES, ROUTE_TYPES, Row, RouteTypeFilter, Snapshot, arp_text, proc_route};
use crate::config::SourcePaths;

/// Builds fresh route and ARP snapshots; nothing is kept between calls.
pub struct SnapshotAssembler<S> {
    decoder: KernelRouteTableDecoder<S>,
    arp_path: PathBuf,
    route_path: PathBuf,
}

impl SnapshotAssembler<SysctlSource> {
    pub fn new(paths: &SourcePaths) -> Self {
        SnapshotAssembler::with_source(SysctlSource, paths)
    }
}

impl<S: RouteTableSource> SnapshotAssembler<S> {
    pub fn with_source(source: S, paths: &SourcePaths) -> Self {
        SnapshotAssembler {
            decoder: KernelRouteTableDecoder::new(source),
            arp_path: paths.arp_path.clone(),
            route_path: paths.route_path.clone(),
        }
    }

    pub fn routes(&self) -> Snapshot {
        let rows = if uses_proc_tables() {
            proc_route::decode(&self.route_path)
        } else {
            // Need a map from index->name for each route entry.
            let interfaces = resolve_interfaces();
            self.collect(ROUTE_TYPES, &interfaces)
        };
        Snapshot::new(rows)
    }

    pub fn arp(&self) -> Snapshot {
        let rows = if uses_proc_tables() {
            arp_text::decode(&self.arp_path)
        } else {
            let interfaces = resolve_interfaces();
            self.collect(ARP_TYPES, &interfaces)
        };
        Snapshot::new(rows)
    }

    /// Decode every filter of `catalog` in order and concatenate the rows.
    pub fn collect(&self, catalog: &[RouteTypeFilter], interfaces: &InterfaceIndexMap) -> Vec<Row> {
        let mut rows = Vec::new();
        for filter in catalog {
            rows.extend(self.decoder.decode(filter, interfaces));
        }
        debug!(filters = catalog.len(), rows = rows.len(), "Snapshot assembled");
        rows
    }
}

/// Linux has no routing socket sysctl; its tables are read from procfs.
fn uses_proc_tables() -> bool {
    cfg!(any(target_os = "linux", target_os = "android"))
}
