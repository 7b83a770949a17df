// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use serde::Serialize;

/// Pretty-printed JSON for any AST node.
pub fn to_json<T: Serialize>(node: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(node)
}
