// Interface index to name resolution

use std::collections::HashMap;

use tracing::{debug, warn};

/// Kernel interface index to interface name, built once per snapshot.
pub type InterfaceIndexMap = HashMap<u32, String>;

/// Enumerate host interfaces and map each link-layer index to its name.
///
/// Returns an empty map if enumeration fails; rows then carry a blank
/// interface column.
pub fn resolve_interfaces() -> InterfaceIndexMap {
    let addrs = match nix::ifaddrs::getifaddrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            warn!("Failed to create interface map, getifaddrs() failed: {}", e);
            return InterfaceIndexMap::new();
        }
    };

    // The iterator owns the getifaddrs list and frees it on drop.
    let map = index_map(addrs.map(|ifaddr| {
        let index = ifaddr
            .address
            .as_ref()
            .and_then(|addr| addr.as_link_addr())
            .map(|link| link.ifindex() as u32);
        (ifaddr.interface_name, index)
    }));

    debug!(interfaces = map.len(), "Interface map built");
    map
}

/// Keep the first name seen for each link-layer index.
fn index_map<I>(entries: I) -> InterfaceIndexMap
where
    I: IntoIterator<Item = (String, Option<u32>)>,
{
    let mut map = InterfaceIndexMap::new();
    for (name, index) in entries {
        if let Some(index) = index {
            map.entry(index).or_insert(name);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_map_skips_non_link_entries() {
        let map = index_map(vec![
            ("lo0".to_string(), Some(1)),
            ("en0".to_string(), None),
            ("en0".to_string(), Some(4)),
            ("en0".to_string(), None),
        ]);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&1).map(String::as_str), Some("lo0"));
        assert_eq!(map.get(&4).map(String::as_str), Some("en0"));
    }

    #[test]
    fn test_index_map_keeps_first_name() {
        let map = index_map(vec![
            ("bridge0".to_string(), Some(7)),
            ("bridge0-alias".to_string(), Some(7)),
        ]);
        assert_eq!(map.get(&7).map(String::as_str), Some("bridge0"));
    }

    #[test]
    fn test_resolve_interfaces_names_are_non_empty() {
        for (index, name) in resolve_interfaces() {
            assert!(index > 0);
            assert!(!name.is_empty());
        }
    }
}
