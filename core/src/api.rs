//! Descriptors for the `/rest` endpoints of the demo backend.

use crate::endpoint::{Endpoint, EndpointInfo, GetEndpoint, PostEndpoint, PutEndpoint};

pub use crate::types::{
    Ack, AddCreditsBody, Chat, ChatMessage, ChatPrompt, Credits, Multiplier, Role, SignInBody,
    Success, UpdateUserBody, User,
};

/// `POST /rest/signin`
pub struct SignIn;

impl Endpoint for SignIn {
    const PATH: &'static str = "/rest/signin";
    type Params = ();
    type Response = Success;
}

impl PostEndpoint for SignIn {
    type Body = SignInBody;
}

/// `POST /rest/signin/signout`
pub struct SignOut;

impl Endpoint for SignOut {
    const PATH: &'static str = "/rest/signin/signout";
    type Params = ();
    type Response = Ack;
}

impl PostEndpoint for SignOut {
    type Body = ();
}

/// `GET /rest/user`
pub struct GetUser;

impl Endpoint for GetUser {
    const PATH: &'static str = "/rest/user";
    type Params = ();
    type Response = User;
}

impl GetEndpoint for GetUser {}

/// `PUT /rest/user`
pub struct UpdateUser;

impl Endpoint for UpdateUser {
    const PATH: &'static str = "/rest/user";
    type Params = ();
    type Response = Ack;
}

impl PutEndpoint for UpdateUser {
    type Body = UpdateUserBody;
}

/// `GET /rest/credits`
pub struct GetCredits;

impl Endpoint for GetCredits {
    const PATH: &'static str = "/rest/credits";
    type Params = ();
    type Response = Credits;
}

impl GetEndpoint for GetCredits {}

/// `POST /rest/credits`
pub struct AddCredits;

impl Endpoint for AddCredits {
    const PATH: &'static str = "/rest/credits";
    type Params = ();
    type Response = Ack;
}

impl PostEndpoint for AddCredits {
    type Body = AddCreditsBody;
}

/// `GET /rest/chat`
pub struct GetChat;

impl Endpoint for GetChat {
    const PATH: &'static str = "/rest/chat";
    type Params = ();
    type Response = Chat;
}

impl GetEndpoint for GetChat {}

/// `POST /rest/chat`
pub struct PostChat;

impl Endpoint for PostChat {
    const PATH: &'static str = "/rest/chat";
    type Params = ();
    type Response = Ack;
}

impl PostEndpoint for PostChat {
    type Body = ChatPrompt;
}

/// Every descriptor in this module.
pub fn endpoints() -> Vec<EndpointInfo> {
    vec![
        EndpointInfo::post::<SignIn>(),
        EndpointInfo::post::<SignOut>(),
        EndpointInfo::get::<GetUser>(),
        EndpointInfo::put::<UpdateUser>(),
        EndpointInfo::get::<GetCredits>(),
        EndpointInfo::post::<AddCredits>(),
        EndpointInfo::get::<GetChat>(),
        EndpointInfo::post::<PostChat>(),
    ]
}

/// JSON Schemas for the responses that are fetched with validation.
pub mod schemas {
    use serde_json::{json, Value};

    pub fn user() -> Value {
        json!({
            "type": "object",
            "properties": {
                "username": { "type": "string" },
                "firstName": { "type": "string" },
                "lastName": { "type": "string" },
                "credits": { "type": "number" }
            },
            "required": ["username", "firstName", "lastName"]
        })
    }

    pub fn credits() -> Value {
        json!({
            "type": "object",
            "properties": { "credits": { "type": "number" } },
            "required": ["credits"]
        })
    }

    pub fn chat() -> Value {
        json!({
            "type": "object",
            "properties": {
                "messages": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "role": { "type": "string" },
                            "content": { "type": "string" }
                        },
                        "required": ["role", "content"]
                    }
                }
            },
            "required": ["messages"]
        })
    }

    pub fn success() -> Value {
        json!({
            "type": "object",
            "properties": { "success": { "const": true } },
            "required": ["success"]
        })
    }
}

/// Validated fetches for the screens of the demo app.
pub mod queries {
    use serde::de::DeserializeOwned;
    use serde_json::Value;

    use super::{Chat, Credits, GetChat, GetCredits, GetUser, SignIn, SignInBody, Success, User};
    use crate::client::Client;
    use crate::endpoint::GetEndpoint;
    use crate::error::{ensure_error, RequestError, Thrown};
    use crate::transport::{RequestOptions, Transport};
    use crate::validate::Schema;

    fn compile<R: DeserializeOwned>(schema: &Value) -> Result<Schema<R>, RequestError> {
        Schema::new(schema).map_err(|e| ensure_error(Thrown::Error(Box::new(e))))
    }

    async fn fetch<E, T>(client: &Client<T>, schema: Value, options: &RequestOptions) -> Result<E::Response, RequestError>
    where
        E: GetEndpoint<Params = ()>,
        T: Transport,
    {
        let schema = compile::<E::Response>(&schema)?;
        client.get_with::<E, _>(&(), &schema, options).await
    }

    pub async fn user<T: Transport>(client: &Client<T>, options: &RequestOptions) -> Result<User, RequestError> {
        fetch::<GetUser, T>(client, super::schemas::user(), options).await
    }

    pub async fn credits<T: Transport>(client: &Client<T>, options: &RequestOptions) -> Result<Credits, RequestError> {
        fetch::<GetCredits, T>(client, super::schemas::credits(), options).await
    }

    pub async fn chat<T: Transport>(client: &Client<T>, options: &RequestOptions) -> Result<Chat, RequestError> {
        fetch::<GetChat, T>(client, super::schemas::chat(), options).await
    }

    /// Sign in and require the `{"success": true}` reply.
    pub async fn sign_in<T: Transport>(
        client: &Client<T>,
        username: &str,
        password: &str,
        options: &RequestOptions,
    ) -> Result<Success, RequestError> {
        let schema = compile::<Success>(&super::schemas::success())?;
        let body = SignInBody {
            username: username.to_string(),
            password: password.to_string(),
        };
        client.post_with::<SignIn, _>(&(), &body, &schema, options).await
    }
}
