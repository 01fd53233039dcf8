//! Processing request definitions, on both sides of the wire.
//!
//! The client assembles a [`ProcessingRequest`] out of bound [`Command`]s; the
//! server parses the same payload into a [`ProcessingTask`] whose command
//! arguments stay raw until the normalizer sees them.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::processing::RawArgs;
use crate::utils::{validate_task, ValidationError};

/// One bound pipeline step: operation name plus its arguments in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Map<String, Value>,
}

// On the wire a command is the pair `[name, args]`.
impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.name, &self.args).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (name, args) = <(String, Map<String, Value>)>::deserialize(deserializer)?;
        Ok(Self { name, args })
    }
}

/// Output settings. Unset fields are omitted on the wire, which means
/// "keep the source's format and quality".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_quality: Option<i64>,
}

impl OutputOptions {
    pub fn is_empty(&self) -> bool {
        self.format.is_none() && self.compression_quality.is_none()
    }
}

/// Client-side request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRequest {
    pub source: String,
    pub commands: Vec<Command>,
    pub opts: OutputOptions,
}

impl ProcessingRequest {
    /// Merges a source reference, the accumulated commands and output settings.
    ///
    /// Only the presence of `source` is checked here; the server owns the
    /// schema at execution time.
    pub fn assemble(
        source: Option<&str>,
        commands: &[Command],
        format: Option<&str>,
        compression_quality: Option<i64>,
    ) -> Option<Self> {
        let source = source.map(str::trim).filter(|s| !s.is_empty())?;
        Some(Self {
            source: source.to_string(),
            commands: commands.to_vec(),
            opts: OutputOptions {
                format: format.map(str::to_string),
                compression_quality,
            },
        })
    }
}

/// A command as the server receives it: arguments in whatever shape the caller sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineCommand {
    pub name: String,
    pub args: RawArgs,
}

impl PipelineCommand {
    pub fn new(name: impl Into<String>, args: impl Into<RawArgs>) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
        }
    }
}

/// Server-side view of a processing request, validated and ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingTask {
    pub source: String,
    pub commands: Vec<PipelineCommand>,
    pub opts: OutputOptions,
}

#[derive(Deserialize)]
struct WireRequest {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    commands: Option<WireCommands>,
    #[serde(default)]
    opts: Option<WireOptions>,
    // Accepted at top level too, as older clients sent them there
    #[serde(default)]
    format: Option<String>,
    #[serde(default, deserialize_with = "quality")]
    compression_quality: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireCommands {
    Pairs(Vec<WirePair>),
    Map(Map<String, Value>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePair {
    Full(String, Value),
    Bare((String,)),
}

#[derive(Deserialize, Default)]
struct WireOptions {
    #[serde(default)]
    format: Option<String>,
    #[serde(default, deserialize_with = "quality")]
    compression_quality: Option<i64>,
}

/// Quality arrives as an integer or a numeric string.
fn quality<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| de::Error::custom("compression_quality must be an integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom("compression_quality must be an integer")),
        Some(_) => Err(de::Error::custom("compression_quality must be an integer")),
    }
}

impl ProcessingTask {
    /// Parses and validates a request body.
    ///
    /// An empty body is treated as an empty object, so it fails on the
    /// missing source rather than on syntax.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(body)
                .map_err(|e| ValidationError::Malformed(format!("invalid JSON: {e}")))?
        };
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        if !value.is_object() {
            return Err(ValidationError::Malformed(
                "request body must be a JSON object".to_string(),
            ));
        }
        // Source is checked first so a bare `{}` reports the missing source.
        if value
            .get("source")
            .and_then(Value::as_str)
            .is_none_or(|s| s.trim().is_empty())
        {
            return Err(ValidationError::MissingSource);
        }

        let wire: WireRequest = serde_json::from_value(value)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;

        let commands = match wire.commands {
            None => Vec::new(),
            Some(WireCommands::Pairs(pairs)) => pairs
                .into_iter()
                .map(|pair| match pair {
                    WirePair::Full(name, args) => PipelineCommand::new(name, args),
                    WirePair::Bare((name,)) => PipelineCommand::new(name, Value::Null),
                })
                .collect(),
            Some(WireCommands::Map(map)) => map
                .into_iter()
                .map(|(name, args)| PipelineCommand::new(name, args))
                .collect(),
        };

        let opts = wire.opts.unwrap_or_default();
        let task = Self {
            source: wire.source.unwrap_or_default().trim().to_string(),
            commands,
            opts: OutputOptions {
                format: opts.format.or(wire.format),
                compression_quality: opts.compression_quality.or(wire.compression_quality),
            },
        };

        validate_task(&task)?;
        Ok(task)
    }
}

impl From<ProcessingRequest> for ProcessingTask {
    fn from(request: ProcessingRequest) -> Self {
        Self {
            source: request.source,
            commands: request
                .commands
                .into_iter()
                .map(|command| PipelineCommand::new(command.name, Value::Object(command.args)))
                .collect(),
            opts: request.opts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_options_are_omitted_not_null() {
        let request =
            ProcessingRequest::assemble(Some("http://img/a.jpg"), &[], None, Some(40)).expect("source");
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["opts"], json!({ "compression_quality": 40 }));
        assert_eq!(json["commands"], json!([]));
    }

    #[test]
    fn commands_serialize_as_pairs() {
        let mut args = Map::new();
        args.insert("width".into(), json!(640));
        args.insert("height".into(), json!(480));
        let command = Command {
            name: "resize".into(),
            args,
        };
        assert_eq!(
            serde_json::to_value(&command).expect("serialize"),
            json!(["resize", { "width": 640, "height": 480 }])
        );
    }

    #[test]
    fn assemble_requires_source() {
        assert!(ProcessingRequest::assemble(None, &[], None, None).is_none());
        assert!(ProcessingRequest::assemble(Some("  "), &[], None, None).is_none());
    }

    #[test]
    fn empty_body_reports_missing_source() {
        assert_eq!(
            ProcessingTask::from_json(b"").unwrap_err(),
            ValidationError::MissingSource
        );
        assert_eq!(
            ProcessingTask::from_json(br#"{"commands": []}"#).unwrap_err(),
            ValidationError::MissingSource
        );
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            ProcessingTask::from_json(b"{not json"),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn command_pairs_keep_order_and_raw_shapes() {
        let task = ProcessingTask::from_value(json!({
            "source": "http://img/a.jpg",
            "commands": [["resize", "640x480"], ["crop", [1, 2, 3, 4]], ["flip"]],
            "opts": { "format": "png", "compression_quality": "80" }
        }))
        .expect("task");

        let names: Vec<_> = task.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["resize", "crop", "flip"]);
        assert_eq!(task.commands[0].args, RawArgs::Delimited("640x480".into()));
        assert_eq!(task.commands[2].args, RawArgs::Empty);
        assert_eq!(task.opts.format.as_deref(), Some("png"));
        assert_eq!(task.opts.compression_quality, Some(80));
    }

    #[test]
    fn command_map_form_and_top_level_format_are_accepted() {
        let task = ProcessingTask::from_value(json!({
            "source": "http://img/a.jpg",
            "commands": { "resize": "640x480", "flop": null },
            "format": "jpg"
        }))
        .expect("task");

        let names: Vec<_> = task.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["resize", "flop"]);
        assert_eq!(task.opts.format.as_deref(), Some("jpg"));
    }

    #[test]
    fn client_request_converts_to_task() {
        let mut args = Map::new();
        args.insert("width".into(), json!(10));
        let request = ProcessingRequest::assemble(
            Some("http://img/a.jpg"),
            &[Command {
                name: "resize".into(),
                args,
            }],
            None,
            None,
        )
        .expect("source");

        let task = ProcessingTask::from(request);
        assert!(matches!(task.commands[0].args, RawArgs::Keyed(_)));
        assert!(task.opts.is_empty());
    }
}
