//! Command schema registry.
//!
//! A static table from operation name to its ordered parameter list. The order
//! is the positional binding order; each parameter carries a default value or
//! is marked required.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde_json::{Map, Value, json};

use crate::core::Command;
use crate::utils::{ClientError, ClientResult};

/// Default of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    Value(Value),
    /// Must be supplied by the caller
    Required,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub default: ParamDefault,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    pub name: &'static str,
    pub params: Vec<ParameterSpec>,
}

fn param(name: &'static str, default: Value) -> ParameterSpec {
    ParameterSpec {
        name,
        default: ParamDefault::Value(default),
    }
}

fn required(name: &'static str) -> ParameterSpec {
    ParameterSpec {
        name,
        default: ParamDefault::Required,
    }
}

fn operation(name: &'static str, params: Vec<ParameterSpec>) -> OperationSpec {
    OperationSpec { name, params }
}

lazy_static! {
    static ref REGISTRY: HashMap<&'static str, OperationSpec> = [
        operation(
            "resize",
            vec![
                param("width", Value::Null),
                param("height", Value::Null),
                param("filter", json!("undefined")),
                param("blur", json!(1)),
            ],
        ),
        operation(
            "crop",
            vec![
                param("left", json!(0)),
                param("top", json!(0)),
                param("right", Value::Null),
                param("bottom", Value::Null),
                param("width", Value::Null),
                param("height", Value::Null),
                param("reset_coords", json!(true)),
            ],
        ),
        operation(
            "transform",
            vec![param("crop", json!("")), param("resize", json!(""))],
        ),
        operation(
            "liquid_rescale",
            vec![
                required("width"),
                required("height"),
                param("delta_x", json!(0)),
                param("rigidity", json!(0)),
            ],
        ),
        operation(
            "rotate",
            vec![
                required("degree"),
                param("background", Value::Null),
                param("reset_coords", json!(true)),
            ],
        ),
        operation("flip", vec![]),
        operation("flop", vec![]),
        operation("transparentize", vec![required("transparency")]),
    ]
    .into_iter()
    .map(|spec| (spec.name, spec))
    .collect();
}

/// Schema of a registered operation.
pub fn lookup(name: &str) -> Option<&'static OperationSpec> {
    REGISTRY.get(name)
}

/// Names of every registered operation, sorted.
pub fn operation_names() -> Vec<&'static str> {
    let mut names: Vec<_> = REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}

impl OperationSpec {
    /// Binds call arguments to this operation's parameters.
    ///
    /// Positional values bind in declared order, but only the first
    /// `positional.len() - 1` of them are used; the last positional value is
    /// never bound. Keywords then override by name. Every parameter must end
    /// up with a value.
    pub fn bind(&self, positional: &[Value], keywords: &[(String, Value)]) -> ClientResult<Command> {
        let usable = positional.len().saturating_sub(1);
        if usable > self.params.len() {
            return Err(ClientError::TooManyArguments {
                operation: self.name.to_string(),
                given: positional.len(),
                max: self.params.len() + 1,
            });
        }

        let mut bound: Vec<Option<Value>> = self
            .params
            .iter()
            .map(|p| match &p.default {
                ParamDefault::Value(value) => Some(value.clone()),
                ParamDefault::Required => None,
            })
            .collect();

        for (slot, value) in bound.iter_mut().zip(&positional[..usable]) {
            *slot = Some(value.clone());
        }

        for (key, value) in keywords {
            let index = self
                .params
                .iter()
                .position(|p| p.name == key.as_str())
                .ok_or_else(|| ClientError::UnknownParameter {
                    operation: self.name.to_string(),
                    parameter: key.clone(),
                })?;
            bound[index] = Some(value.clone());
        }

        let mut args = Map::new();
        for (spec, value) in self.params.iter().zip(bound) {
            let value = value.ok_or_else(|| ClientError::MissingRequiredParameter {
                operation: self.name.to_string(),
                parameter: spec.name.to_string(),
            })?;
            args.insert(spec.name.to_string(), value);
        }

        Ok(Command {
            name: self.name.to_string(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> &'static OperationSpec {
        lookup(name).expect("registered")
    }

    fn keywords(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    /// Keywords for every required parameter of `op`.
    fn required_keywords(op: &OperationSpec) -> Vec<(String, Value)> {
        op.params
            .iter()
            .filter(|p| p.default == ParamDefault::Required)
            .map(|p| (p.name.to_string(), json!(1)))
            .collect()
    }

    #[test]
    fn registry_covers_every_client_operation() {
        assert_eq!(
            operation_names(),
            [
                "crop",
                "flip",
                "flop",
                "liquid_rescale",
                "resize",
                "rotate",
                "transform",
                "transparentize"
            ]
        );
    }

    #[test]
    fn complete_binding_leaves_no_required_marker() {
        for name in operation_names() {
            let op = spec(name);
            let command = op.bind(&[], &required_keywords(op)).expect("bind");
            assert_eq!(command.name, name);
            let names: Vec<_> = command.args.keys().map(String::as_str).collect();
            let declared: Vec<_> = op.params.iter().map(|p| p.name).collect();
            assert_eq!(names, declared, "{name}");
        }
    }

    #[test]
    fn omitting_a_required_parameter_fails() {
        for name in operation_names() {
            let op = spec(name);
            let mut supplied = required_keywords(op);
            if supplied.pop().is_none() {
                continue;
            }
            match op.bind(&[], &supplied) {
                Err(ClientError::MissingRequiredParameter { operation, .. }) => {
                    assert_eq!(operation, name)
                }
                other => panic!("{name}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_keyword_fails() {
        for name in operation_names() {
            let op = spec(name);
            let mut supplied = required_keywords(op);
            supplied.push(("sharpness".to_string(), json!(3)));
            match op.bind(&[], &supplied) {
                Err(ClientError::UnknownParameter { operation, parameter }) => {
                    assert_eq!(operation, name);
                    assert_eq!(parameter, "sharpness");
                }
                other => panic!("{name}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn defaults_fill_unbound_parameters() {
        let command = spec("resize")
            .bind(&[], &keywords(&[("width", json!(200))]))
            .expect("bind");
        assert_eq!(
            Value::Object(command.args),
            json!({"width": 200, "height": null, "filter": "undefined", "blur": 1})
        );
    }

    #[test]
    fn last_positional_value_is_never_bound() {
        // Two positional values: only `width` binds, `height` keeps its default
        let command = spec("resize").bind(&[json!(640), json!(480)], &[]).expect("bind");
        assert_eq!(command.args["width"], json!(640));
        assert_eq!(command.args["height"], Value::Null);

        // A single positional value binds nothing
        let command = spec("resize").bind(&[json!(640)], &[]).expect("bind");
        assert_eq!(command.args["width"], Value::Null);
    }

    #[test]
    fn dropped_positional_can_leave_a_required_parameter_unbound() {
        let err = spec("liquid_rescale")
            .bind(&[json!(640), json!(480)], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingRequiredParameter { ref parameter, .. } if parameter == "height"
        ));

        let command = spec("liquid_rescale")
            .bind(&[json!(640), json!(480), json!(0)], &[])
            .expect("bind");
        assert_eq!(command.args["height"], json!(480));
    }

    #[test]
    fn positional_overflow_is_rejected_past_one_extra_value() {
        // flip has no parameters: one positional value is silently dropped...
        assert!(spec("flip").bind(&[json!(1)], &[]).is_ok());
        // ...two are too many
        match spec("flip").bind(&[json!(1), json!(2)], &[]) {
            Err(ClientError::TooManyArguments { given, max, .. }) => {
                assert_eq!((given, max), (2, 1));
            }
            other => panic!("unexpected {other:?}"),
        }

        let values: Vec<Value> = (0..5).map(|v| json!(v)).collect();
        assert!(spec("transparentize").bind(&values[..2], &[]).is_ok());
        assert!(spec("transparentize").bind(&values[..3], &[]).is_err());
    }

    #[test]
    fn keywords_override_positional_values() {
        let command = spec("rotate")
            .bind(&[json!(45), json!("ignored")], &keywords(&[("background", json!("#fff"))]))
            .expect("bind");
        assert_eq!(command.args["degree"], json!(45));
        assert_eq!(command.args["background"], json!("#fff"));
    }
}
