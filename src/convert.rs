use crate::error::{ErrorKind, FoldError};
use crate::model::{Node, NodeKind};

/// Converts a [`serde_json::Value`] into this crate's node tree so any
/// serializable value can be formatted without a round trip through JSON
/// text. `recursion_limit` bounds the depth; hitting it is reported as an
/// error rather than recursing forever on a cyclic structure.
pub(crate) fn node_from_value(
    value: &serde_json::Value,
    key: Option<&str>,
    recursion_limit: usize,
) -> Result<Node, FoldError> {
    if recursion_limit == 0 {
        return Err(FoldError::new(
            ErrorKind::Structural,
            "Depth limit exceeded - possible circular reference",
            None,
        ));
    }

    let mut node = Node::default();
    if let Some(key) = key {
        node.key = serde_json::to_string(key).unwrap_or_else(|_| format!("\"{}\"", key));
    }

    match value {
        serde_json::Value::Null => {
            node.kind = NodeKind::Null;
            node.text = "null".to_string();
        }
        serde_json::Value::Bool(flag) => {
            node.kind = if *flag { NodeKind::True } else { NodeKind::False };
            node.text = flag.to_string();
        }
        serde_json::Value::Number(number) => {
            node.kind = NodeKind::Number;
            node.text = number.to_string();
        }
        serde_json::Value::String(text) => {
            node.kind = NodeKind::String;
            node.text = serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text));
        }
        serde_json::Value::Array(items) => {
            node.kind = NodeKind::Array;
            node.children = items
                .iter()
                .map(|item| node_from_value(item, None, recursion_limit - 1))
                .collect::<Result<_, _>>()?;
        }
        serde_json::Value::Object(members) => {
            node.kind = NodeKind::Object;
            node.children = members
                .iter()
                .map(|(key, value)| node_from_value(value, Some(key), recursion_limit - 1))
                .collect::<Result<_, _>>()?;
        }
    }

    if !node.children.is_empty() {
        let deepest = node.children.iter().map(|c| c.complexity).max().unwrap_or(0);
        node.complexity = deepest + 1;
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_scalars_and_containers() {
        let value = serde_json::json!({"name": "a\"b", "items": [1, null, true]});
        let node = node_from_value(&value, None, 8).unwrap();
        assert_eq!(node.kind, NodeKind::Object);
        assert_eq!(node.complexity, 2);
        assert_eq!(node.children[1].key, "\"name\"");
        assert_eq!(node.children[1].text, r#""a\"b""#);
        let items = &node.children[0];
        assert_eq!(items.children[1].kind, NodeKind::Null);
        assert_eq!(items.children[2].text, "true");
    }

    #[test]
    fn depth_limit_fails_instead_of_recursing() {
        let value = serde_json::json!([[[1]]]);
        let err = node_from_value(&value, None, 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
    }
}
