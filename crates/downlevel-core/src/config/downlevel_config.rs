//! Configuration types for downlevel
//!
//! Every section and every field is optional; the accessors on
//! [`DownlevelConfig`] resolve missing values to their defaults.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rewrite::{PassKind, RewriteOptions};

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DownlevelConfig {
    /// JSON Schema reference, ignored when loading
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<FilesConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub passes: Option<PassesConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub initializers: Option<InitializersConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<NullableConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<RecordsConfiguration>,
}

/// File discovery
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilesConfiguration {
    #[schemars(description = "Glob patterns of files to rewrite")]
    pub include: Option<Vec<String>>,

    #[schemars(description = "Glob patterns of files to leave alone")]
    pub exclude: Option<Vec<String>>,

    #[schemars(description = "Skip *.g.cs, *.g.i.cs and *.designer.cs files")]
    pub skip_generated: Option<bool>,
}

/// What happens to rewritten files
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfiguration {
    #[schemars(description = "Copy each file before overwriting it")]
    pub backup: Option<bool>,

    #[schemars(description = "Suffix appended to the file name of backups")]
    pub backup_suffix: Option<String>,
}

/// Switches for individual lowerings
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PassesConfiguration {
    pub expression_bodies: Option<bool>,
    pub property_initializers: Option<bool>,
    pub init_accessors: Option<bool>,
    pub records: Option<bool>,
    pub pattern_bindings: Option<bool>,
    pub nullable: Option<bool>,
    pub global_usings: Option<bool>,

    #[schemars(description = "Turn `namespace N;` into a block namespace before parsing")]
    pub file_scoped_namespaces: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitializersConfiguration {
    #[schemars(description = "Strip field initializers as well as property initializers")]
    pub fields: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NullableConfiguration {
    #[schemars(description = "Also rewrite locals, typeof and as expressions inside member bodies")]
    pub rewrite_bodies: Option<bool>,

    #[schemars(description = "Leave a comment with the original type where `?` was erased")]
    pub annotate: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordsConfiguration {
    #[schemars(description = "One indentation level in generated record members")]
    pub indent_unit: Option<String>,
}

pub const DEFAULT_INCLUDE: &[&str] = &["**/*.cs"];
pub const DEFAULT_EXCLUDE: &[&str] = &["**/bin/**", "**/obj/**"];
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

impl DownlevelConfig {
    pub fn include_patterns(&self) -> Vec<String> {
        self.files
            .as_ref()
            .and_then(|f| f.include.clone())
            .unwrap_or_else(|| DEFAULT_INCLUDE.iter().map(|p| p.to_string()).collect())
    }

    pub fn exclude_patterns(&self) -> Vec<String> {
        self.files
            .as_ref()
            .and_then(|f| f.exclude.clone())
            .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|p| p.to_string()).collect())
    }

    pub fn skip_generated(&self) -> bool {
        self.files
            .as_ref()
            .and_then(|f| f.skip_generated)
            .unwrap_or(true)
    }

    pub fn backup(&self) -> bool {
        self.output.as_ref().and_then(|o| o.backup).unwrap_or(false)
    }

    pub fn backup_suffix(&self) -> String {
        self.output
            .as_ref()
            .and_then(|o| o.backup_suffix.clone())
            .unwrap_or_else(|| DEFAULT_BACKUP_SUFFIX.to_string())
    }

    /// Whether `kind` runs; every pass is on unless switched off
    pub fn pass_enabled(&self, kind: PassKind) -> bool {
        let Some(passes) = &self.passes else {
            return true;
        };
        let switch = match kind {
            PassKind::ExpressionBodies => passes.expression_bodies,
            PassKind::PropertyInitializers => passes.property_initializers,
            PassKind::InitAccessors => passes.init_accessors,
            PassKind::Records => passes.records,
            PassKind::PatternBindings => passes.pattern_bindings,
            PassKind::Nullable => passes.nullable,
            PassKind::GlobalUsings => passes.global_usings,
        };
        switch.unwrap_or(true)
    }

    pub fn file_scoped_namespaces(&self) -> bool {
        self.passes
            .as_ref()
            .and_then(|p| p.file_scoped_namespaces)
            .unwrap_or(true)
    }

    pub fn rewrite_options(&self) -> RewriteOptions {
        let defaults = RewriteOptions::default();
        RewriteOptions {
            field_initializers: self
                .initializers
                .as_ref()
                .and_then(|i| i.fields)
                .unwrap_or(defaults.field_initializers),
            nullable_bodies: self
                .nullable
                .as_ref()
                .and_then(|n| n.rewrite_bodies)
                .unwrap_or(defaults.nullable_bodies),
            nullable_annotations: self
                .nullable
                .as_ref()
                .and_then(|n| n.annotate)
                .unwrap_or(defaults.nullable_annotations),
            indent_unit: self
                .records
                .as_ref()
                .and_then(|r| r.indent_unit.clone())
                .unwrap_or(defaults.indent_unit),
        }
    }

    /// JSON Schema of the configuration file
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(DownlevelConfig)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DownlevelConfig::default();
        assert_eq!(config.include_patterns(), vec!["**/*.cs"]);
        assert_eq!(config.exclude_patterns(), vec!["**/bin/**", "**/obj/**"]);
        assert!(config.skip_generated());
        assert!(!config.backup());
        assert_eq!(config.backup_suffix(), ".bak");
        assert!(config.file_scoped_namespaces());
        assert!(PassKind::ALL.iter().all(|kind| config.pass_enabled(*kind)));
        assert_eq!(config.rewrite_options(), RewriteOptions::default());
    }

    #[test]
    fn test_camel_case_sections() {
        let config: DownlevelConfig = serde_json::from_str(
            r#"{
                "passes": { "nullable": false, "fileScopedNamespaces": false },
                "initializers": { "fields": true },
                "nullable": { "rewriteBodies": true, "annotate": false },
                "records": { "indentUnit": "\t" },
                "output": { "backup": true, "backupSuffix": ".orig" }
            }"#,
        )
        .unwrap();

        assert!(!config.pass_enabled(PassKind::Nullable));
        assert!(config.pass_enabled(PassKind::Records));
        assert!(!config.file_scoped_namespaces());
        assert!(config.backup());
        assert_eq!(config.backup_suffix(), ".orig");
        assert_eq!(
            config.rewrite_options(),
            RewriteOptions {
                field_initializers: true,
                nullable_bodies: true,
                nullable_annotations: false,
                indent_unit: "\t".to_string(),
            }
        );
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = DownlevelConfig::json_schema();
        let properties = schema["properties"].as_object().unwrap();
        for section in ["files", "output", "passes", "initializers", "nullable", "records"] {
            assert!(properties.contains_key(section), "missing {section}");
        }
    }
}
