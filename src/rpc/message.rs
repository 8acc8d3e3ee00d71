//! JSON-RPC 2.0 request and transport context.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::rpc::error::RpcError;

/// The parameter structure of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsShape {
    None,
    Positional,
    Named,
}

/// Request parameters. The variant is fixed once the request is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Params {
    pub fn shape(&self) -> ParamsShape {
        match self {
            Params::None => ParamsShape::None,
            Params::Positional(_) => ParamsShape::Positional,
            Params::Named(_) => ParamsShape::Named,
        }
    }

    /// Look up a named parameter. Always `None` for positional or absent params.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Params::Named(map) => map.get(name),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

impl From<Vec<Value>> for Params {
    fn from(list: Vec<Value>) -> Self {
        Params::Positional(list)
    }
}

/// A JSON-RPC 2.0 request as seen by the access filters.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: String,
    params: Params,
    id: Option<Value>,
}

/// Wire form, validated before conversion into [`Request`].
#[derive(Deserialize)]
struct Envelope {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Self {
            method: method.into(),
            params,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Parse a single JSON-RPC 2.0 request from a message body.
    ///
    /// Malformed JSON yields a parse error (-32700). Batches, a wrong
    /// `jsonrpc` version and scalar `params` yield an invalid request
    /// error (-32600).
    pub fn from_json(body: &[u8]) -> Result<Self, RpcError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| RpcError::parse_error(e.to_string()))?;

        if value.is_array() {
            return Err(RpcError::invalid_request("Batch requests are not supported"));
        }

        let envelope: Envelope =
            serde_json::from_value(value).map_err(|e| RpcError::invalid_request(e.to_string()))?;

        if envelope.jsonrpc != "2.0" {
            return Err(RpcError::invalid_request("Unsupported JSON-RPC version"));
        }

        let params = match envelope.params {
            None | Some(Value::Null) => Params::None,
            Some(Value::Array(list)) => Params::Positional(list),
            Some(Value::Object(map)) => Params::Named(map),
            Some(_) => {
                return Err(RpcError::invalid_request(
                    "Parameters must be an array or an object",
                ))
            }
        };

        Ok(Self {
            method: envelope.method,
            params,
            id: envelope.id,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_shape(&self) -> ParamsShape {
        self.params.shape()
    }

    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }
}

/// Facts about the connection a request arrived on.
///
/// Filled in by the transport; the filters only read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContext {
    secure: bool,
    client_address: Option<String>,
    principals: Vec<String>,
}

impl MessageContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the transport as encrypted (HTTPS).
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_client_address(mut self, address: impl Into<String>) -> Self {
        self.client_address = Some(address.into());
        self
    }

    /// Add a verified client principal. Duplicates are ignored; order is kept.
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        let principal = principal.into();
        if !self.principals.contains(&principal) {
            self.principals.push(principal);
        }
        self
    }

    pub fn with_principals<I, S>(self, principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        principals
            .into_iter()
            .fold(self, |ctx, principal| ctx.with_principal(principal))
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn client_address(&self) -> Option<&str> {
        self.client_address.as_deref()
    }

    pub fn principals(&self) -> &[String] {
        &self.principals
    }
}
