use std::sync::Arc;

use binding::Binding;
use serde_json::{Map, Value};
use tracing::debug;

/// Per-request (or per-connection) context handed to every resolver
///
/// Always carries the data-access client. Caller-supplied values sit
/// next to it; a caller value named `db` never shadows the client.
#[derive(Clone, Debug)]
pub struct OperationContext {
    db: Arc<Binding>,
    values: Map<String, Value>,
}

impl OperationContext {
    pub fn new(db: Arc<Binding>, mut values: Map<String, Value>) -> Self {
        if values.remove("db").is_some() {
            debug!("Caller context value `db` dropped in favour of the data-access client");
        }
        Self { db, values }
    }

    /// Context carrying only the data-access client
    pub fn with_db(db: Arc<Binding>) -> Self {
        Self::new(db, Map::new())
    }

    pub fn db(&self) -> &Arc<Binding> {
        &self.db
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}
