//! Record <-> DynamoDB attribute marshalling. A conversion failure anywhere
//! fails the whole operation; nothing is skipped or logged away.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Value};

use crate::models::user::User;
use crate::storage::StorageError;

pub fn to_attribute_value(value: &Value) -> Result<AttributeValue, StorageError> {
    match value {
        Value::Null => Ok(AttributeValue::Null(true)),
        Value::Bool(flag) => Ok(AttributeValue::Bool(*flag)),
        Value::Number(number) => Ok(AttributeValue::N(number.to_string())),
        Value::String(text) => Ok(AttributeValue::S(text.clone())),
        Value::Array(items) => items
            .iter()
            .map(to_attribute_value)
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::L),
        Value::Object(fields) => {
            let mut map = HashMap::with_capacity(fields.len());
            for (key, field) in fields {
                map.insert(key.clone(), to_attribute_value(field)?);
            }
            Ok(AttributeValue::M(map))
        }
    }
}

pub fn from_attribute_value(attr: &AttributeValue) -> Result<Value, StorageError> {
    match attr {
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::Bool(flag) => Ok(Value::Bool(*flag)),
        AttributeValue::N(number) => serde_json::from_str::<serde_json::Number>(number)
            .map(Value::Number)
            .map_err(|err| StorageError::Marshal(format!("invalid number '{number}': {err}"))),
        AttributeValue::S(text) => Ok(Value::String(text.clone())),
        AttributeValue::L(items) => items
            .iter()
            .map(from_attribute_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(map) => {
            let mut fields = Map::new();
            for (key, field) in map {
                fields.insert(key.clone(), from_attribute_value(field)?);
            }
            Ok(Value::Object(fields))
        }
        other => Err(StorageError::Marshal(format!(
            "unsupported attribute value: {other:?}"
        ))),
    }
}

pub fn user_to_item(user: &User) -> Result<HashMap<String, AttributeValue>, StorageError> {
    let value = serde_json::to_value(user).map_err(|err| StorageError::Marshal(err.to_string()))?;
    match to_attribute_value(&value)? {
        AttributeValue::M(map) => Ok(map),
        _ => Err(StorageError::Marshal(
            "record did not marshal to an attribute map".to_string(),
        )),
    }
}

pub fn user_from_item(item: &HashMap<String, AttributeValue>) -> Result<User, StorageError> {
    let mut fields = Map::new();
    for (key, attr) in item {
        fields.insert(key.clone(), from_attribute_value(attr)?);
    }
    serde_json::from_value(Value::Object(fields))
        .map_err(|err| StorageError::Marshal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Skill;
    use serde_json::json;

    #[test]
    fn test_scalars_map_to_native_attribute_types() {
        assert!(matches!(
            to_attribute_value(&json!("text")).unwrap(),
            AttributeValue::S(s) if s == "text"
        ));
        assert!(matches!(
            to_attribute_value(&json!(42)).unwrap(),
            AttributeValue::N(n) if n == "42"
        ));
        assert!(matches!(
            to_attribute_value(&json!(null)).unwrap(),
            AttributeValue::Null(true)
        ));
    }

    #[test]
    fn test_user_round_trips_through_item() {
        let user = User {
            user_id: "user1".to_string(),
            email: "user@domain.com".to_string(),
            given_name: "John".to_string(),
            skills: vec![Skill {
                name: "Go".to_string(),
                years_of_experience: Some(2),
            }],
            ..User::default()
        };
        let item = user_to_item(&user).unwrap();
        assert_eq!(user_from_item(&item).unwrap(), user);
    }

    #[test]
    fn test_binary_attribute_is_rejected_not_skipped() {
        let attr = AttributeValue::Ss(vec!["a".to_string()]);
        assert!(matches!(
            from_attribute_value(&attr),
            Err(StorageError::Marshal(_))
        ));
    }
}
