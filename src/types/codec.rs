// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::{DynamicProperty, FunctionType, RegoType, StaticProperty, TypeError};
use crate::value::Value;

impl RegoType {
    pub fn to_json_value(&self) -> Result<JsonValue, TypeError> {
        let mut map = Map::new();
        match self {
            RegoType::Named {
                name,
                description,
                ty,
            } => {
                map = match ty.to_json_value()? {
                    JsonValue::Object(inner) => inner,
                    _ => return Err(TypeError::Invalid(format!("named type `{name}`"))),
                };
                map.insert("name".to_string(), JsonValue::from(name.as_str()));
                if let Some(d) = description {
                    map.insert("description".to_string(), JsonValue::from(d.as_str()));
                }
                return Ok(JsonValue::Object(map));
            }
            RegoType::Any(of) if !of.is_empty() => {
                map.insert("of".to_string(), encode_list(of)?);
            }
            RegoType::Array {
                static_types,
                dynamic,
            } => {
                if !static_types.is_empty() {
                    map.insert("static".to_string(), encode_list(static_types)?);
                }
                if let Some(d) = dynamic {
                    map.insert("dynamic".to_string(), d.to_json_value()?);
                }
            }
            RegoType::Set { of: Some(of) } => {
                map.insert("of".to_string(), of.to_json_value()?);
            }
            RegoType::Object {
                static_props,
                dynamic,
            } => {
                if !static_props.is_empty() {
                    let mut props = vec![];
                    for p in static_props {
                        let key = serde_json::to_value(&p.key)
                            .map_err(|e| TypeError::Invalid(e.to_string()))?;
                        let mut prop = Map::new();
                        prop.insert("key".to_string(), key);
                        prop.insert("value".to_string(), p.value.to_json_value()?);
                        props.push(JsonValue::Object(prop));
                    }
                    map.insert("static".to_string(), JsonValue::Array(props));
                }
                if let Some(d) = dynamic {
                    let mut prop = Map::new();
                    prop.insert("key".to_string(), d.key.to_json_value()?);
                    prop.insert("value".to_string(), d.value.to_json_value()?);
                    map.insert("dynamic".to_string(), JsonValue::Object(prop));
                }
            }
            RegoType::Function(f) => {
                if !f.args.is_empty() {
                    map.insert("args".to_string(), encode_list(&f.args)?);
                }
                if let Some(r) = &f.result {
                    map.insert("result".to_string(), r.to_json_value()?);
                }
                if let Some(v) = &f.variadic {
                    map.insert("variadic".to_string(), v.to_json_value()?);
                }
            }
            _ => (),
        }
        map.insert("type".to_string(), JsonValue::from(self.type_marker()));
        Ok(JsonValue::Object(map))
    }

    pub fn from_json_value(json: &JsonValue) -> Result<RegoType, TypeError> {
        let map = match json {
            JsonValue::Object(m) => m,
            v => return Err(TypeError::Invalid(format!("expected an object, got `{v}`"))),
        };

        if let Some(name) = map.get("name") {
            let name = match name {
                JsonValue::String(s) => s.clone(),
                _ => return Err(TypeError::Invalid("`name` must be a string".to_string())),
            };
            let description = match map.get("description") {
                Some(JsonValue::String(s)) => Some(s.clone()),
                None | Some(JsonValue::Null) => None,
                _ => {
                    return Err(TypeError::Invalid(
                        "`description` must be a string".to_string(),
                    ))
                }
            };
            let mut rest = map.clone();
            rest.remove("name");
            rest.remove("description");
            let ty = Self::from_json_value(&JsonValue::Object(rest))?;
            return Ok(RegoType::Named {
                name,
                description,
                ty: Box::new(ty),
            });
        }

        let marker = match map.get("type") {
            Some(JsonValue::String(s)) => s.as_str(),
            Some(_) => return Err(TypeError::Invalid("`type` must be a string".to_string())),
            None => return Err(TypeError::MissingTypeMarker),
        };

        Ok(match marker {
            "null" => RegoType::Null,
            "boolean" => RegoType::Boolean,
            "string" => RegoType::String,
            "number" => RegoType::Number,
            "any" => RegoType::Any(decode_list(map.get("of"))?),
            "array" => RegoType::Array {
                static_types: decode_list(map.get("static"))?,
                dynamic: decode_boxed(map.get("dynamic"))?,
            },
            "set" => RegoType::Set {
                of: decode_boxed(map.get("of"))?,
            },
            "object" => {
                let mut static_props = vec![];
                if let Some(props) = map.get("static") {
                    let props = props
                        .as_array()
                        .ok_or_else(|| TypeError::Invalid("`static` must be an array".into()))?;
                    for p in props {
                        let (key, value) = decode_property(p)?;
                        let key = serde_json::from_value::<Value>(key.clone())
                            .map_err(|e| TypeError::Invalid(e.to_string()))?;
                        static_props.push(StaticProperty {
                            key,
                            value: Self::from_json_value(value)?,
                        });
                    }
                }
                let dynamic = match map.get("dynamic") {
                    Some(p) => {
                        let (key, value) = decode_property(p)?;
                        Some(Box::new(DynamicProperty {
                            key: Self::from_json_value(key)?,
                            value: Self::from_json_value(value)?,
                        }))
                    }
                    None => None,
                };
                RegoType::Object {
                    static_props,
                    dynamic,
                }
            }
            "function" => RegoType::Function(FunctionType {
                args: decode_list(map.get("args"))?,
                result: decode_boxed(map.get("result"))?,
                variadic: decode_boxed(map.get("variadic"))?,
            }),
            m => return Err(TypeError::UnknownTypeMarker(m.to_string())),
        })
    }

    pub fn from_json_str(json: &str) -> Result<RegoType, TypeError> {
        let v: JsonValue =
            serde_json::from_str(json).map_err(|e| TypeError::Invalid(e.to_string()))?;
        Self::from_json_value(&v)
    }

    pub fn to_json_str(&self) -> Result<String, TypeError> {
        serde_json::to_string(&self.to_json_value()?).map_err(|e| TypeError::Invalid(e.to_string()))
    }
}

fn encode_list(types: &[RegoType]) -> Result<JsonValue, TypeError> {
    Ok(JsonValue::Array(
        types
            .iter()
            .map(|t| t.to_json_value())
            .collect::<Result<Vec<_>, _>>()?,
    ))
}

fn decode_list(json: Option<&JsonValue>) -> Result<Vec<RegoType>, TypeError> {
    match json {
        None | Some(JsonValue::Null) => Ok(vec![]),
        Some(JsonValue::Array(items)) => items.iter().map(RegoType::from_json_value).collect(),
        Some(v) => Err(TypeError::Invalid(format!("expected a list of types, got `{v}`"))),
    }
}

fn decode_boxed(json: Option<&JsonValue>) -> Result<Option<Box<RegoType>>, TypeError> {
    match json {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => Ok(Some(Box::new(RegoType::from_json_value(v)?))),
    }
}

fn decode_property(json: &JsonValue) -> Result<(&JsonValue, &JsonValue), TypeError> {
    match (json.get("key"), json.get("value")) {
        (Some(k), Some(v)) => Ok((k, v)),
        _ => Err(TypeError::Invalid(format!(
            "object property `{json}` needs `key` and `value`"
        ))),
    }
}

impl Serialize for RegoType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json_value()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RegoType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = JsonValue::deserialize(deserializer)?;
        RegoType::from_json_value(&json).map_err(de::Error::custom)
    }
}
