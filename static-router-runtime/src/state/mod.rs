mod interface;
pub use self::interface::*;

mod route_table;
pub use self::route_table::*;

mod neighbor_table;
pub use self::neighbor_table::*;
