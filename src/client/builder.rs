//! Fluent command binding.

use serde_json::Value;
use tracing::debug;

use super::MutoClient;
use super::schema;
use crate::utils::{ClientError, ClientResult};

/// Collects the arguments of one operation call, then binds and appends it.
///
/// ```no_run
/// # fn main() -> muto::utils::ClientResult<()> {
/// let mut client = muto::client::MutoClient::new("http://localhost:5000/api/v1");
/// client
///     .from_url("https://example.com/cat.jpg")
///     .resize().kwarg("width", 200).bind()?
///     .rotate().kwarg("degree", 90).bind()?;
/// # Ok(())
/// # }
/// ```
#[must_use = "a command is only added by calling bind()"]
pub struct CommandBinder<'c> {
    client: &'c mut MutoClient,
    operation: String,
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
}

impl<'c> CommandBinder<'c> {
    pub(crate) fn new(client: &'c mut MutoClient, operation: impl Into<String>) -> Self {
        Self {
            client,
            operation: operation.into(),
            positional: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Adds a positional value.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a named value. A repeated name keeps the last value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.push((name.into(), value.into()));
        self
    }

    /// Validates the call against the operation's schema and appends the command.
    pub fn bind(self) -> ClientResult<&'c mut MutoClient> {
        let spec = schema::lookup(&self.operation)
            .ok_or_else(|| ClientError::UnknownOperation(self.operation.clone()))?;
        let command = spec.bind(&self.positional, &self.keywords)?;
        debug!("Bound {}({} args)", command.name, command.args.len());
        self.client.push(command);
        Ok(self.client)
    }
}
