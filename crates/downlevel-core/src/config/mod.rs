//! Configuration for downlevel
//!
//! - JSON (`.downlevelrc.json`, `downlevel.json`) and TOML
//!   (`.downlevelrc.toml`, `downlevel.toml`) files
//! - Auto-discovery by walking up from the first input path
//! - Strong typing with serde and JSON Schema generation via schemars
//!
//! ## Example Configuration
//!
//! ```json
//! {
//!   "files": { "include": ["**/*.cs"], "exclude": ["**/bin/**", "**/obj/**"], "skipGenerated": true },
//!   "output": { "backup": false, "backupSuffix": ".bak" },
//!   "passes": { "records": true, "nullable": true, "fileScopedNamespaces": true },
//!   "initializers": { "fields": false },
//!   "nullable": { "rewriteBodies": false, "annotate": true },
//!   "records": { "indentUnit": "    " }
//! }
//! ```

mod downlevel_config;
mod loader;

pub use downlevel_config::{
    DEFAULT_BACKUP_SUFFIX, DEFAULT_EXCLUDE, DEFAULT_INCLUDE, DownlevelConfig, FilesConfiguration,
    InitializersConfiguration, NullableConfiguration, OutputConfiguration, PassesConfiguration,
    RecordsConfiguration,
};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
