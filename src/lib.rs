//! anyrt - reference-counted object model with a type-erased value
//!
//! Architecture:
//! - `allocator`: header-prefixed object allocation and the intrusive refcount
//! - `registry`: process-wide type indices and content hash/equality hooks
//! - `rc`: `Ref<T>` / `ObjectRef` owning handles
//! - `objects`: the universal `Any` value with its hash/equality contract
//! - `builtins`: `Str` and `UDict`
//! - `config`, `logging`, `ffi`: ambient runtime services
//!
//! Reference counts are not atomic: handles are `!Send` and `!Sync`, and
//! every object graph belongs to a single thread.
//!
//! ```ignore
//! use anyrt::{udict, Any, UDict};
//!
//! let dict = udict! { "key1" => 1, "key2" => "value2", 3 => 4 };
//! assert_eq!(dict.at("key2")?, "value2");
//! ```

pub mod allocator;
pub mod builtins;
pub mod config;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod objects;
pub mod rc;
pub mod registry;

pub use builtins::{Str, StrObj, UDict, UDictObj};
pub use config::{DictConfig, RuntimeConfig};
pub use error::{Error, Result};
pub use objects::{any_equal, any_hash, Any, DataType, Device};
pub use rc::{ObjectRef, ObjectType, Ref};
pub use registry::TypeIndex;

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::OnceCell;
}

/// Initialize the runtime from `ANYRT_*` environment variables
///
/// Installs logging, registers the built-in types and activates the
/// configuration. Safe to call more than once.
pub fn runtime_init() -> Result<()> {
    runtime_init_with_config(RuntimeConfig::from_env()?)
}

/// Initialize the runtime with an explicit configuration
pub fn runtime_init_with_config(config: RuntimeConfig) -> Result<()> {
    let log_config = config.log.to_log_config()?;
    config::install(config)?;
    logging::init_with_config(log_config);
    registry::init();
    Ok(())
}

/// Flush logging output and restore the default configuration
///
/// Live objects are unaffected.
pub fn runtime_cleanup() {
    let stats = allocator::stats();
    logging::debug!(
        live_objects = stats.live_objects,
        objects_allocated = stats.objects_allocated,
        "runtime cleanup"
    );
    config::reset();
    logging::shutdown();
}
