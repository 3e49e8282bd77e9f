//! grf-townnames: compiles weighted town-name grammars into OpenTTD
//! NewGRF files.
//!
//! A grammar is an ordered list of nodes. Each node concatenates a
//! sequence of parts, and each part is a weighted choice among literal
//! strings and references to earlier nodes. The game draws one 32-bit
//! random number per town and reads each part's choice from its own bit
//! window of that number.

pub mod core;
pub mod schema;
