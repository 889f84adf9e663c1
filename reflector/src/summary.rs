use reflector_core::ReflectionIndex;
use serde_json::json;

/// A JSON view of everything a reflection client can query from the index.
pub fn index_summary(index: &ReflectionIndex) -> serde_json::Value {
    json!({
        "services": index.service_names().collect::<Vec<_>>(),
        "files": index.files(),
        "symbols": index.symbols(),
        "extensions": index.extensions(),
    })
}
