use std::path::Path;
use std::process;

extern crate clap;
use clap::{App, Arg, ArgMatches};

use static_router_afpacket::AfPacketTransport;
use static_router_runtime::io::{load_neighbor_table, load_route_table};
use static_router_runtime::pipeline::{run, Forwarder, Router};
use static_router_runtime::Result;
use tracing::{error, info};

mod logging;

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("static-router")
        .version("0.1.0")
        .about("Forwards IPv4 between interfaces using static route and neighbor tables")
        .arg(
            Arg::with_name("rtable")
                .value_name("RTABLE")
                .help("Route table: one 'prefix next_hop mask interface' per line")
                .required(true)
                .index(1)
                .validator(is_file),
        )
        .arg(
            Arg::with_name("interface")
                .value_name("INTERFACE")
                .help("Interfaces to route between; interface ids in the route table are their positions")
                .required(true)
                .multiple(true)
                .index(2),
        )
        .arg(
            Arg::with_name("arp-table")
                .short("a")
                .long("arp-table")
                .value_name("ARP_TABLE")
                .help("Neighbor table: one 'ip mac' per line")
                .takes_value(true)
                .default_value("arp_table.txt"),
        )
        .arg(
            Arg::with_name("log-level")
                .short("l")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level, unless RUST_LOG is set")
                .takes_value(true)
                .possible_values(&["error", "warn", "info", "debug", "trace"])
                .default_value("info"),
        )
}

fn is_file(path: String) -> std::result::Result<(), String> {
    if Path::new(&path).is_file() {
        Ok(())
    } else {
        Err(format!("Path {} is not a regular file", path))
    }
}

fn start(matches: &ArgMatches) -> Result<()> {
    let names: Vec<String> = matches
        .values_of("interface")
        .map(|values| values.map(str::to_owned).collect())
        .unwrap_or_default();
    // Both arguments are required or defaulted, clap guarantees they are present
    let rtable = matches.value_of("rtable").unwrap_or_default();
    let arp_table = matches.value_of("arp-table").unwrap_or("arp_table.txt");

    let mut transport = AfPacketTransport::open(&names)?;
    let routes = load_route_table(rtable)?;
    let neighbors = load_neighbor_table(arp_table)?;
    let router = Router::new(routes, neighbors, transport.interfaces().to_vec())?;

    info!(
        interfaces = router.interfaces().len(),
        routes = router.routes().len(),
        neighbors = router.neighbors().len(),
        "router started"
    );
    let mut forwarder = Forwarder::new(router);
    run(&mut forwarder, &mut transport)
}

fn main() {
    let matches = app().get_matches();
    if let Err(e) = logging::init_logging(matches.value_of("log-level").unwrap_or("info")) {
        eprintln!("cannot install logger: {}", e);
    }

    if let Err(e) = start(&matches) {
        error!(error = %e, "router stopped");
        process::exit(1);
    }
}
