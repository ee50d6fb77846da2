//! Service layer API for cart operations
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::cart::StateDocument;
use crate::config::CartConfig;
use crate::error::CartError;
use crate::lifecycle::LifecycleController;
use crate::policy::{AccessPolicy, Caller, Decision};
use crate::request::{Operation, Request, SetStateRequest, UpdateRequest};
use crate::store::VersionedStore;
use crate::types::{CartId, Version, Versioned};

pub const STATE_VERSION_HEADER: &str = "x-state-version";
pub const UPDATED_MESSAGE: &str = "Updated!! Success";
pub const CLEANED_MESSAGE: &str = "Cart cleaned.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NoContent,
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    InternalError,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::NoContent => 204,
            Status::BadRequest => 400,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::Conflict => 409,
            Status::InternalError => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            body: None,
            headers: vec![],
        }
    }
    pub fn no_content() -> Self {
        Self::new(Status::NoContent)
    }
    pub fn message(status: Status, message: impl Into<String>) -> Self {
        Self::new(status).with_body(json!({ "message": message.into() }))
    }
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
    pub fn with_header(mut self, name: &str, value: impl ToString) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
    /// The `message` field of the body, if there is one.
    pub fn body_message(&self) -> Option<&str> {
        self.body.as_ref()?.get("message")?.as_str()
    }
}

impl From<CartError> for Response {
    fn from(err: CartError) -> Self {
        let status = match &err {
            CartError::AuthorizationDenied { .. } => Status::Forbidden,
            CartError::VersionConflict { .. } => Status::Conflict,
            CartError::MalformedRequest(_)
            | CartError::UnknownOperation(_)
            | CartError::InconsistentDocument(_)
            | CartError::ArithmeticOverflow(_) => Status::BadRequest,
            CartError::NotFound(_) => Status::NotFound,
            CartError::Storage(_)
            | CartError::Encoding(_)
            | CartError::Decoding(_)
            | CartError::Config(_) => {
                error!(error = %err, "cart operation failed");
                Status::InternalError
            }
        };
        Response::message(status, err.to_string())
    }
}

type Handler = fn(&CartService, &CartId, Request) -> Result<Response, CartError>;

fn handler_for(operation: Operation) -> Handler {
    match operation {
        Operation::GetState => CartService::handle_get_state,
        Operation::SetState => CartService::handle_set_state,
        Operation::Update => CartService::handle_update,
        Operation::Clean => CartService::handle_clean,
    }
}

pub struct CartService {
    store: VersionedStore,
    policy: AccessPolicy,
}

impl CartService {
    pub fn new(instance: Arc<sled::Db>, config: &CartConfig) -> Result<Self, CartError> {
        Ok(Self {
            store: VersionedStore::new(instance)?,
            policy: config.access_policy(),
        })
    }

    /// Open the sled database named in the config
    pub fn open(config: &CartConfig) -> Result<Self, CartError> {
        let db = sled::open(&config.db_path)?;
        Self::new(Arc::new(db), config)
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn flush(&self) -> Result<(), CartError> {
        self.store.flush()
    }

    fn lifecycle(&self) -> LifecycleController<'_> {
        LifecycleController::new(&self.store)
    }

    /// Authorization hook: 204 when the caller may proceed, 403 otherwise.
    pub fn authorize(&self, caller: &Caller, operation: Operation) -> Response {
        match self.policy.decide(caller, operation) {
            Decision::Allow => Response::no_content(),
            Decision::Deny => CartError::AuthorizationDenied {
                operation: operation.name(),
            }
            .into(),
        }
    }

    /// Create the zero document for a new cart
    pub fn initialize(&self, cart_id: &CartId) -> Result<Versioned<StateDocument>, CartError> {
        self.lifecycle().initialize(cart_id)
    }

    /// Read the current document and its version
    pub fn get_state(&self, cart_id: &CartId) -> Result<Versioned<StateDocument>, CartError> {
        self.store.read(cart_id)
    }

    /// Replace the whole document if `version` is still current
    pub fn set_state(
        &self,
        cart_id: &CartId,
        state: StateDocument,
        version: Version,
    ) -> Result<Version, CartError> {
        self.store.conditional_write(cart_id, state, version)
    }

    /// Insert or replace a line item and recompute the cart total
    pub fn update(
        &self,
        cart_id: &CartId,
        item_id: &str,
        qty: u32,
        price: u64,
    ) -> Result<Versioned<StateDocument>, CartError> {
        if item_id.is_empty() {
            return Err(CartError::MalformedRequest("itemId must not be empty".into()));
        }
        self.store
            .mutate(cart_id, |doc| doc.apply_update(item_id, qty, price))
    }

    /// Reset the cart to the zero document
    pub fn clean(&self, cart_id: &CartId) -> Result<Versioned<StateDocument>, CartError> {
        self.lifecycle().clean(cart_id)
    }

    /// Entry point for the transport: resolve and authorize the operation,
    /// validate its body, then run it.
    pub fn handle(
        &self,
        cart_id: &CartId,
        caller: &Caller,
        operation: &str,
        body: Option<&Value>,
    ) -> Response {
        let operation = match operation.parse::<Operation>() {
            Ok(operation) => operation,
            Err(err) => return err.into(),
        };
        if let Some(denied) = self.deny(cart_id, caller, operation) {
            return denied;
        }

        match Request::from_body(operation, body) {
            Ok(request) => self.run(cart_id, request),
            Err(err) => {
                debug!(cart = %cart_id, %operation, error = %err, "rejected request");
                err.into()
            }
        }
    }

    /// Authorize a typed request and run it.
    pub fn dispatch(&self, cart_id: &CartId, caller: &Caller, request: Request) -> Response {
        match self.deny(cart_id, caller, request.operation()) {
            Some(denied) => denied,
            None => self.run(cart_id, request),
        }
    }

    fn deny(&self, cart_id: &CartId, caller: &Caller, operation: Operation) -> Option<Response> {
        match self.policy.decide(caller, operation) {
            Decision::Allow => None,
            Decision::Deny => {
                warn!(cart = %cart_id, %operation, ?caller, "authorization denied");
                Some(
                    CartError::AuthorizationDenied {
                        operation: operation.name(),
                    }
                    .into(),
                )
            }
        }
    }

    // Every error is turned into a response here; none of them is fatal to the cart.
    fn run(&self, cart_id: &CartId, request: Request) -> Response {
        let operation = request.operation();

        self.lifecycle()
            .ensure(cart_id)
            .and_then(|()| handler_for(operation)(self, cart_id, request))
            .unwrap_or_else(Response::from)
    }

    fn handle_get_state(&self, cart_id: &CartId, _: Request) -> Result<Response, CartError> {
        let state = self.get_state(cart_id)?;
        let body = serde_json::to_value(&state.value)
            .map_err(|e| CartError::Encoding(e.to_string()))?;

        Ok(Response::new(Status::Ok)
            .with_body(body)
            .with_header(STATE_VERSION_HEADER, state.version))
    }

    fn handle_set_state(&self, cart_id: &CartId, request: Request) -> Result<Response, CartError> {
        let Request::SetState(SetStateRequest { state, version }) = request else {
            return Err(CartError::MalformedRequest("expected a setState request".into()));
        };

        self.set_state(cart_id, state, version)?;
        Ok(Response::no_content())
    }

    fn handle_update(&self, cart_id: &CartId, request: Request) -> Result<Response, CartError> {
        let Request::Update(UpdateRequest {
            item_id,
            qty,
            price,
        }) = request
        else {
            return Err(CartError::MalformedRequest("expected an update request".into()));
        };

        self.update(cart_id, &item_id, qty, price)?;
        Ok(Response::message(Status::Ok, UPDATED_MESSAGE))
    }

    fn handle_clean(&self, cart_id: &CartId, _: Request) -> Result<Response, CartError> {
        self.clean(cart_id)?;
        Ok(Response::message(Status::Ok, CLEANED_MESSAGE))
    }
}
