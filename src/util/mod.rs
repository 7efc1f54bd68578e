//! Small string helpers shared by the selection layer and the parser.

pub mod case;
pub mod number;
pub mod qname;
