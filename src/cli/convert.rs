//! `--data` JSON to evaluator inputs

use crate::{CompileConfig, JsonAccessor, Value};

use super::CliError;

/// Splits a data object into an accessor over its type tags and the values
/// of the direct symbols, in configured order.
///
/// Direct symbols may be keyed with or without their `$`; a missing one is
/// `undefined`. Every other key is a type tag.
pub fn data_bindings(
    config: &CompileConfig,
    data: serde_json::Value,
) -> Result<(JsonAccessor, Vec<Value>), CliError> {
    let serde_json::Value::Object(mut entries) = data else {
        return Err(CliError::InvalidData);
    };

    let mut direct = vec![];
    for symbol in config.direct_symbols() {
        let value = entries
            .remove(&format!("${}", symbol.name))
            .or_else(|| entries.remove(&symbol.name))
            .map(Value::from)
            .unwrap_or(Value::Undefined);
        direct.push(value);
    }

    let mut accessor = JsonAccessor::new();
    for (tag, document) in entries {
        accessor.insert(tag, document);
    }
    Ok((accessor, direct))
}
