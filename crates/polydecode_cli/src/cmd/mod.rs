/// Schema-driven document decode command.
pub mod decode;
/// Destination tree printing.
pub mod print;
/// Schema listing command.
pub mod schema;
