use crate::state::InterfaceId;
use crate::{Result, RouterError};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::warn;

/// A static route: datagrams whose destination falls inside `prefix`/`mask` are handed to
/// `next_hop` out of `interface`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub prefix: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub next_hop: Ipv4Addr,
    pub interface: InterfaceId,
}

impl Route {
    pub fn new(
        prefix: Ipv4Addr,
        mask: Ipv4Addr,
        next_hop: Ipv4Addr,
        interface: InterfaceId,
    ) -> Result<Route> {
        let route = Route {
            prefix,
            mask,
            next_hop,
            interface,
        };
        route.validate()?;
        Ok(route)
    }

    /// Masks must be a run of ones followed by zeros, and the prefix may not have bits set
    /// outside of the mask.
    pub fn validate(&self) -> Result<()> {
        let mask = u32::from(self.mask);
        if mask.leading_ones() + mask.trailing_zeros() != 32 {
            return Err(self.invalid("mask is not contiguous"));
        }
        if u32::from(self.prefix) & !mask != 0 {
            return Err(self.invalid("prefix has bits set outside of the mask"));
        }
        Ok(())
    }

    fn invalid(&self, reason: &'static str) -> RouterError {
        RouterError::InvalidRoute {
            prefix: self.prefix,
            mask: self.mask,
            reason,
        }
    }

    pub fn prefix_len(&self) -> u32 {
        u32::from(self.mask).leading_ones()
    }

    pub fn matches(&self, destination: Ipv4Addr) -> bool {
        u32::from(destination) & u32::from(self.mask) == u32::from(self.prefix)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}/{} via {} dev {}",
            self.prefix,
            self.prefix_len(),
            self.next_hop,
            self.interface
        )
    }
}

/// All routes sharing one mask, as a range into the sorted route vector.
#[derive(Debug, Clone)]
struct MaskRun {
    mask: u32,
    start: usize,
    end: usize,
}

/// Static route table answering longest prefix match queries.
///
/// Routes are stably sorted by prefix length, longest first, and then by prefix value. That
/// leaves one contiguous run per distinct mask, each ordered by the same masked value that a
/// lookup compares against, so every run can be binary searched on its own. Walking the runs
/// from the longest mask down, the first hit is the most specific route. A lookup costs at most
/// 33 binary searches.
///
/// Routes with identical prefix and mask are equally specific; the one listed first when the
/// table was built wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    runs: Vec<MaskRun>,
}

impl RouteTable {
    pub fn new(mut routes: Vec<Route>) -> Result<RouteTable> {
        for route in &routes {
            route.validate()?;
        }

        // sort_by is stable, which keeps duplicates in their original order
        routes.sort_by(|a, b| {
            b.prefix_len()
                .cmp(&a.prefix_len())
                .then_with(|| u32::from(a.prefix).cmp(&u32::from(b.prefix)))
        });

        for pair in routes.windows(2) {
            if pair[0].prefix == pair[1].prefix && pair[0].mask == pair[1].mask {
                warn!(kept = %pair[0], shadowed = %pair[1], "duplicate route");
            }
        }

        let mut runs: Vec<MaskRun> = vec![];
        for (index, route) in routes.iter().enumerate() {
            let mask = u32::from(route.mask);
            match runs.last_mut() {
                Some(run) if run.mask == mask => run.end = index + 1,
                _ => runs.push(MaskRun {
                    mask,
                    start: index,
                    end: index + 1,
                }),
            }
        }

        Ok(RouteTable { routes, runs })
    }

    /// Returns the most specific route covering `destination`, or `None` if no route does.
    pub fn lookup(&self, destination: Ipv4Addr) -> Option<&Route> {
        let destination = u32::from(destination);
        self.runs.iter().find_map(|run| {
            let key = destination & run.mask;
            let candidates = &self.routes[run.start..run.end];
            // Leftmost entry not below the key, so the first listed duplicate wins
            let index = candidates.partition_point(|route| u32::from(route.prefix) < key);
            candidates
                .get(index)
                .filter(|route| u32::from(route.prefix) == key)
        })
    }

    /// Routes in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(prefix: [u8; 4], prefix_len: u32, next_hop: [u8; 4], interface: usize) -> Route {
        let mask = if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - prefix_len)
        };
        Route::new(
            Ipv4Addr::from(prefix),
            Ipv4Addr::from(mask),
            Ipv4Addr::from(next_hop),
            interface,
        )
        .unwrap()
    }

    #[test]
    fn more_specific_route_wins() {
        let table = RouteTable::new(vec![
            route([10, 0, 0, 0], 8, [192, 168, 0, 1], 0),
            route([10, 0, 1, 0], 24, [192, 168, 1, 1], 1),
        ])
        .unwrap();

        let best = table.lookup(Ipv4Addr::new(10, 0, 1, 5)).unwrap();
        assert_eq!(best.prefix_len(), 24);
        assert_eq!(best.next_hop, Ipv4Addr::new(192, 168, 1, 1));

        let best = table.lookup(Ipv4Addr::new(10, 0, 2, 5)).unwrap();
        assert_eq!(best.prefix_len(), 8);
        assert_eq!(best.next_hop, Ipv4Addr::new(192, 168, 0, 1));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let table = RouteTable::new(vec![
            route([10, 0, 1, 0], 24, [192, 168, 1, 1], 1),
            route([10, 0, 0, 0], 8, [192, 168, 0, 1], 0),
            route([10, 0, 1, 128], 25, [192, 168, 2, 1], 2),
        ])
        .unwrap();

        assert_eq!(table.lookup(Ipv4Addr::new(10, 0, 1, 5)).unwrap().interface, 1);
        assert_eq!(table.lookup(Ipv4Addr::new(10, 0, 1, 200)).unwrap().interface, 2);
        assert_eq!(table.lookup(Ipv4Addr::new(10, 9, 9, 9)).unwrap().interface, 0);
    }

    #[test]
    fn no_route() {
        let table = RouteTable::new(vec![
            route([10, 0, 0, 0], 8, [192, 168, 0, 1], 0),
            route([172, 16, 0, 0], 12, [192, 168, 0, 2], 1),
        ])
        .unwrap();

        assert_eq!(table.lookup(Ipv4Addr::new(8, 8, 8, 8)), None);
        assert_eq!(table.lookup(Ipv4Addr::new(172, 32, 0, 1)), None);
        assert_eq!(RouteTable::default().lookup(Ipv4Addr::new(8, 8, 8, 8)), None);
    }

    #[test]
    fn default_route() {
        let table = RouteTable::new(vec![
            route([0, 0, 0, 0], 0, [192, 168, 0, 254], 3),
            route([10, 0, 0, 0], 8, [192, 168, 0, 1], 0),
        ])
        .unwrap();

        assert_eq!(table.lookup(Ipv4Addr::new(8, 8, 8, 8)).unwrap().interface, 3);
        assert_eq!(table.lookup(Ipv4Addr::new(10, 8, 8, 8)).unwrap().interface, 0);
    }

    #[test]
    fn host_route() {
        let table = RouteTable::new(vec![
            route([192, 168, 1, 0], 24, [192, 168, 1, 1], 0),
            route([192, 168, 1, 7], 32, [192, 168, 1, 7], 1),
        ])
        .unwrap();

        assert_eq!(table.lookup(Ipv4Addr::new(192, 168, 1, 7)).unwrap().interface, 1);
        assert_eq!(table.lookup(Ipv4Addr::new(192, 168, 1, 8)).unwrap().interface, 0);
    }

    #[test]
    fn first_duplicate_wins() {
        let table = RouteTable::new(vec![
            route([10, 1, 0, 0], 16, [192, 168, 0, 1], 0),
            route([10, 0, 0, 0], 16, [192, 168, 0, 9], 9),
            route([10, 1, 0, 0], 16, [192, 168, 0, 2], 1),
            route([10, 1, 0, 0], 16, [192, 168, 0, 3], 2),
        ])
        .unwrap();

        let best = table.lookup(Ipv4Addr::new(10, 1, 2, 3)).unwrap();
        assert_eq!(best.next_hop, Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn lookup_order() {
        let table = RouteTable::new(vec![
            route([10, 0, 0, 0], 8, [1, 1, 1, 1], 0),
            route([192, 168, 0, 0], 16, [1, 1, 1, 1], 0),
            route([10, 10, 0, 0], 16, [1, 1, 1, 1], 0),
            route([0, 0, 0, 0], 0, [1, 1, 1, 1], 0),
        ])
        .unwrap();

        let order: Vec<(Ipv4Addr, u32)> = table.iter().map(|r| (r.prefix, r.prefix_len())).collect();
        assert_eq!(
            order,
            vec![
                (Ipv4Addr::new(10, 10, 0, 0), 16),
                (Ipv4Addr::new(192, 168, 0, 0), 16),
                (Ipv4Addr::new(10, 0, 0, 0), 8),
                (Ipv4Addr::new(0, 0, 0, 0), 0),
            ]
        );
    }

    #[test]
    fn rejects_invalid_routes() {
        let non_contiguous = Route::new(
            Ipv4Addr::new(10, 0, 0, 0),
            Ipv4Addr::new(255, 0, 255, 0),
            Ipv4Addr::new(192, 168, 0, 1),
            0,
        );
        match non_contiguous {
            Err(RouterError::InvalidRoute { reason, .. }) => {
                assert_eq!(reason, "mask is not contiguous")
            }
            other => panic!("unexpected {:?}", other),
        }

        let host_bits = Route::new(
            Ipv4Addr::new(10, 0, 1, 0),
            Ipv4Addr::new(255, 255, 0, 0),
            Ipv4Addr::new(192, 168, 0, 1),
            0,
        );
        assert!(host_bits.is_err());

        let smuggled = Route {
            prefix: Ipv4Addr::new(10, 0, 0, 1),
            mask: Ipv4Addr::new(255, 0, 0, 0),
            next_hop: Ipv4Addr::new(192, 168, 0, 1),
            interface: 0,
        };
        assert!(RouteTable::new(vec![smuggled]).is_err());
    }

    #[test]
    fn display() {
        let r = route([10, 0, 1, 0], 24, [192, 168, 1, 1], 1);
        assert_eq!(r.to_string(), "10.0.1.0/24 via 192.168.1.1 dev 1");
    }
}
