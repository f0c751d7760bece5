//! Text formats for the static tables.
//!
//! Route table, one route per line:
//!
//! ```text
//! # prefix      next hop      mask            interface
//! 192.168.0.0   192.168.0.2   255.255.255.0   0
//! ```
//!
//! Neighbor table, one binding per line:
//!
//! ```text
//! 192.168.0.2   de:ad:be:ef:00:00
//! ```
//!
//! Fields are separated by any whitespace. Blank lines and lines starting with `#` are skipped.

use crate::state::{Neighbor, NeighborTable, Route, RouteTable};
use crate::{Result, RouterError};
use static_router_packets::MacAddr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::info;

pub fn load_route_table<P: AsRef<Path>>(path: P) -> Result<RouteTable> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = parse_route_table(BufReader::new(file), &path.display().to_string())?;
    info!(path = %path.display(), routes = table.len(), "loaded route table");
    Ok(table)
}

pub fn load_neighbor_table<P: AsRef<Path>>(path: P) -> Result<NeighborTable> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = parse_neighbor_table(BufReader::new(file), &path.display().to_string())?;
    info!(path = %path.display(), neighbors = table.len(), "loaded neighbor table");
    Ok(table)
}

/// Parses a route table. `source` names the input in error messages.
pub fn parse_route_table<R: BufRead>(reader: R, source: &str) -> Result<RouteTable> {
    let mut routes = vec![];
    for_each_entry(reader, source, |fields, error| {
        let (prefix, next_hop, mask, interface) = match fields {
            [prefix, next_hop, mask, interface] => (prefix, next_hop, mask, interface),
            _ => return Err(error(format!("expected 4 fields, found {}", fields.len()))),
        };
        let prefix = parse_addr(prefix, "prefix").map_err(error)?;
        let next_hop = parse_addr(next_hop, "next hop").map_err(error)?;
        let mask = parse_addr(mask, "mask").map_err(error)?;
        let interface = interface
            .parse::<usize>()
            .map_err(|_| error(format!("invalid interface id '{}'", interface)))?;

        let route = Route::new(prefix, mask, next_hop, interface).map_err(|e| error(e.to_string()))?;
        routes.push(route);
        Ok(())
    })?;
    RouteTable::new(routes)
}

/// Parses a neighbor table. `source` names the input in error messages.
pub fn parse_neighbor_table<R: BufRead>(reader: R, source: &str) -> Result<NeighborTable> {
    let mut neighbors = vec![];
    for_each_entry(reader, source, |fields, error| {
        let (ip, mac) = match fields {
            [ip, mac] => (ip, mac),
            _ => return Err(error(format!("expected 2 fields, found {}", fields.len()))),
        };
        let ip = parse_addr(ip, "address").map_err(error)?;
        let mac = mac
            .parse::<MacAddr>()
            .map_err(|e| error(format!("invalid MAC address '{}': {}", mac, e)))?;
        neighbors.push(Neighbor { ip, mac });
        Ok(())
    })?;
    Ok(NeighborTable::new(neighbors))
}

// Hands the fields of every meaningful line to `entry`, along with a constructor for errors
// pointing at that line.
fn for_each_entry<R, F>(reader: R, source: &str, mut entry: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(&[&str], &dyn Fn(String) -> RouterError) -> Result<()>,
{
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let error = |reason: String| RouterError::TableParse {
            path: source.to_owned(),
            line: index + 1,
            reason,
        };
        entry(&fields, &error)?;
    }
    Ok(())
}

fn parse_addr(field: &str, what: &str) -> std::result::Result<Ipv4Addr, String> {
    field
        .parse()
        .map_err(|_| format!("invalid {} '{}'", what, field))
}
