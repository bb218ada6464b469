use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::Value;
use tracing::info;

use crate::models::user::{User, UserKey};
use crate::patch::assembler::Patch;
use crate::patch::path::{AttrPath, Segment};
use crate::storage::convert::{to_attribute_value, user_from_item, user_to_item};
use crate::storage::{StorageError, UserStore};

const KEY_ATTRIBUTE: &str = "user_id";
const EMPTY_LIST_TOKEN: &str = ":empty";

/// DynamoDB-backed [`UserStore`]. Point reads and writes against a single
/// table keyed by `user_id`; patches become one UpdateItem call.
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn key_attr(key: &UserKey) -> AttributeValue {
        AttributeValue::S(key.user_id.clone())
    }
}

#[async_trait]
impl UserStore for DynamoStore {
    async fn fetch_by_key(&self, key: &UserKey) -> Result<User, StorageError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, Self::key_attr(key))
            .send()
            .await
            .map_err(|err| StorageError::Request(err.to_string()))?;

        let item = output
            .item()
            .ok_or_else(|| StorageError::NotFound(key.user_id.clone()))?;
        user_from_item(item)
    }

    async fn create(&self, user: &User) -> Result<(), StorageError> {
        let item = user_to_item(user)?;
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| StorageError::Request(err.to_string()))?;

        info!(user_id = %user.user_id, "inserted resume record");
        Ok(())
    }

    async fn apply_patch(&self, key: &UserKey, patch: &Patch) -> Result<(), StorageError> {
        let rendered = render_update_expression(patch)?;
        self.client
            .update_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, Self::key_attr(key))
            .update_expression(rendered.expression)
            .set_expression_attribute_names(Some(rendered.names))
            .set_expression_attribute_values(Some(rendered.values))
            .send()
            .await
            .map_err(|err| StorageError::Request(err.to_string()))?;

        info!(user_id = %key.user_id, "updated resume record");
        Ok(())
    }

    async fn delete(&self, key: &UserKey) -> Result<(), StorageError> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, Self::key_attr(key))
            .send()
            .await
            .map_err(|err| StorageError::Request(err.to_string()))?;

        info!(user_id = %key.user_id, "deleted resume record");
        Ok(())
    }
}

pub struct RenderedUpdate {
    pub expression: String,
    /// expression token -> single attribute name
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Allocates DynamoDB expression-name tokens. Unlike the patch's name
/// table, these substitute one attribute *name* per token (DynamoDB does
/// not allow dots or indices inside a substituted name), so a nested path
/// renders as `#a0[0].#a1[1]`.
#[derive(Default)]
struct NameTokens {
    by_attr: HashMap<String, String>,
    names: HashMap<String, String>,
}

impl NameTokens {
    fn token_for(&mut self, attr: &str) -> String {
        if let Some(token) = self.by_attr.get(attr) {
            return token.clone();
        }
        let token = format!("#a{}", self.by_attr.len());
        self.by_attr.insert(attr.to_string(), token.clone());
        self.names.insert(token.clone(), attr.to_string());
        token
    }

    fn render_path(&mut self, path: &AttrPath) -> String {
        let mut out = String::new();
        for (i, segment) in path.segments().iter().enumerate() {
            match segment {
                Segment::Attr(name) => {
                    let token = self.token_for(name);
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(&token);
                }
                Segment::Index(idx) => {
                    out.push('[');
                    out.push_str(&idx.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

fn resolve_path(patch: &Patch, token: &str) -> Result<AttrPath, StorageError> {
    let raw = patch.names.get(token).ok_or_else(|| {
        StorageError::Marshal(format!("patch references unknown name token '{token}'"))
    })?;
    AttrPath::parse(raw).map_err(|err| StorageError::Marshal(err.to_string()))
}

fn resolve_value<'a>(patch: &'a Patch, token: &str) -> Result<&'a Value, StorageError> {
    patch.values.get(token).ok_or_else(|| {
        StorageError::Marshal(format!("patch references unknown value token '{token}'"))
    })
}

/// Groups Add operations by the list attribute they extend, preserving
/// element order within each list.
fn grouped_appends(patch: &Patch) -> Result<Vec<(AttrPath, Vec<Value>)>, StorageError> {
    let mut groups: Vec<(AttrPath, Vec<Value>)> = Vec::new();
    for op in &patch.add_ops {
        let path = resolve_path(patch, &op.name)?;
        let value = resolve_value(patch, &op.value)?.clone();
        if !matches!(path.last(), Some(Segment::Index(_))) {
            return Err(StorageError::Marshal(format!(
                "add operation at '{path}' is not index-addressed"
            )));
        }
        let parent = path.parent().ok_or_else(|| {
            StorageError::Marshal(format!("add operation at '{path}' has no parent list"))
        })?;
        match groups.iter_mut().find(|(list, _)| *list == parent) {
            Some((_, items)) => items.push(value),
            None => groups.push((parent, vec![value])),
        }
    }
    Ok(groups)
}

/// Renders a compiled patch as a DynamoDB UpdateExpression.
///
/// Set operations keep their patch value tokens. Add operations are
/// translated into `list_append` on the parent list attribute, one
/// assignment per list, with the appended elements batched into a single
/// `:appN` list value; an indexed write to a position past the end of a
/// list is not a valid DynamoDB append, extending the list is. The source
/// list goes through `if_not_exists` with an empty-list fallback: empty
/// collections are omitted from the stored item, and `list_append` on a
/// missing attribute is a ValidationException.
pub fn render_update_expression(patch: &Patch) -> Result<RenderedUpdate, StorageError> {
    let mut tokens = NameTokens::default();
    let mut assignments = Vec::new();
    let mut values = HashMap::new();

    for op in &patch.set_ops {
        let path = resolve_path(patch, &op.name)?;
        let rendered = tokens.render_path(&path);
        let attr = to_attribute_value(resolve_value(patch, &op.value)?)?;
        assignments.push(format!("{rendered} = {}", op.value));
        values.insert(op.value.clone(), attr);
    }

    let appends = grouped_appends(patch)?;
    if !appends.is_empty() {
        values.insert(EMPTY_LIST_TOKEN.to_string(), AttributeValue::L(Vec::new()));
    }
    for (i, (list, elements)) in appends.into_iter().enumerate() {
        let rendered = tokens.render_path(&list);
        let token = format!(":app{i}");
        let list_value = AttributeValue::L(
            elements
                .iter()
                .map(to_attribute_value)
                .collect::<Result<Vec<_>, _>>()?,
        );
        assignments.push(format!(
            "{rendered} = list_append(if_not_exists({rendered}, {EMPTY_LIST_TOKEN}), {token})"
        ));
        values.insert(token, list_value);
    }

    let mut expression = format!("SET {}", assignments.join(", "));

    if !patch.remove_ops.is_empty() {
        let removes = patch
            .remove_ops
            .iter()
            .map(|op| resolve_path(patch, &op.name).map(|path| tokens.render_path(&path)))
            .collect::<Result<Vec<_>, _>>()?;
        expression.push_str(" REMOVE ");
        expression.push_str(&removes.join(", "));
    }

    Ok(RenderedUpdate {
        expression,
        names: tokens.names,
        values,
    })
}
