//! Built-in object types
//!
//! - `Str`: immutable, NUL-terminated byte string compared by content
//! - `UDict`: `Any -> Any` hash map with open addressing

pub mod dict;
pub mod string;


pub use dict::{UDict, UDictObj};
pub use string::{Str, StrObj};
