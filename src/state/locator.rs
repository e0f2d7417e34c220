use std::fmt;
use std::path::{Path, PathBuf};

/// The (account, database, schema) triple that keys persisted run-state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WarehouseIdentity {
    pub account: String,
    pub database: String,
    pub schema: String,
}

impl WarehouseIdentity {
    pub fn new(account: impl Into<String>, database: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            database: database.into(),
            schema: schema.into(),
        }
    }
}

impl fmt::Display for WarehouseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.account, self.database, self.schema)
    }
}

/// Directory holding the persisted manifest and run results for `identity`:
/// `<state_root>/<account>/<database>/<schema>`.
pub fn state_path(state_root: &Path, identity: &WarehouseIdentity) -> PathBuf {
    state_root
        .join(path_component(&identity.account))
        .join(path_component(&identity.database))
        .join(path_component(&identity.schema))
}

/// Maps an identity field onto exactly one path component. Ordinary
/// identifiers are returned unchanged.
fn path_component(value: &str) -> String {
    match value {
        "" => "%00".to_string(),
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => {
            let mut escaped = String::with_capacity(value.len());
            for c in value.chars() {
                match c {
                    '%' => escaped.push_str("%25"),
                    '/' => escaped.push_str("%2F"),
                    '\\' => escaped.push_str("%5C"),
                    _ => escaped.push(c),
                }
            }
            escaped
        }
    }
}
