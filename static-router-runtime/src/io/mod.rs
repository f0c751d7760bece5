mod tables;
pub use self::tables::*;
