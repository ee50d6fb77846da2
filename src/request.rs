//! Typed requests for each cart operation
//!
//! The transport hands over an operation name and an optional JSON body.
//! Both are validated here, so the core only ever sees well-formed requests.
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::cart::StateDocument;
use crate::error::CartError;
use crate::types::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetState,
    SetState,
    Update,
    Clean,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetState => "getState",
            Operation::SetState => "setState",
            Operation::Update => "update",
            Operation::Clean => "clean",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "getState" => Ok(Operation::GetState),
            "setState" => Ok(Operation::SetState),
            "update" => Ok(Operation::Update),
            "clean" => Ok(Operation::Clean),
            other => Err(CartError::UnknownOperation(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetStateRequest {
    pub state: StateDocument,
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub item_id: String,
    pub qty: u32,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    GetState,
    SetState(SetStateRequest),
    Update(UpdateRequest),
    Clean,
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::GetState => Operation::GetState,
            Request::SetState(_) => Operation::SetState,
            Request::Update(_) => Operation::Update,
            Request::Clean => Operation::Clean,
        }
    }

    /// Builds a typed request from an operation name and its JSON body.
    pub fn parse(operation: &str, body: Option<&Value>) -> Result<Self, CartError> {
        Self::from_body(operation.parse()?, body)
    }

    /// Builds the typed request for an already resolved operation.
    pub fn from_body(operation: Operation, body: Option<&Value>) -> Result<Self, CartError> {
        let operation_name = operation.name();
        match operation {
            Operation::GetState => Ok(Request::GetState),
            Operation::Clean => Ok(Request::Clean),
            Operation::SetState => {
                let request: SetStateRequest = decode_body(operation_name, body)?;
                Ok(Request::SetState(request))
            }
            Operation::Update => {
                let request: UpdateRequest = decode_body(operation_name, body)?;
                if request.item_id.is_empty() {
                    return Err(CartError::MalformedRequest("itemId must not be empty".into()));
                }
                Ok(Request::Update(request))
            }
        }
    }
}

fn decode_body<T: for<'de> Deserialize<'de>>(
    operation: &str,
    body: Option<&Value>,
) -> Result<T, CartError> {
    let body = body.ok_or_else(|| {
        CartError::MalformedRequest(format!("{operation} requires a request body"))
    })?;

    T::deserialize(body).map_err(|e| CartError::MalformedRequest(format!("{operation}: {e}")))
}
