//! Request/response shapes for the `/graphql` endpoint.
//!
//! There is no executor: a query is routed by looking for operation names in its text.

use crate::api::models::users::{Role, UserResponse};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GraphQLRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub variables: Map<String, Value>,
}

/// The operations the endpoint understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphQLOperation {
    CreateUser,
    Users,
    Me,
}

impl GraphQLRequest {
    /// Mutations are matched first so a `createUser` selecting `users` fields is not read as a query
    pub fn operation(&self) -> Option<GraphQLOperation> {
        let text = self.query.as_str();
        if text.contains("createUser") && text.contains("mutation") {
            Some(GraphQLOperation::CreateUser)
        } else if text.contains("users") && text.contains("query") {
            Some(GraphQLOperation::Users)
        } else if text.contains("me") && text.contains("query") {
            Some(GraphQLOperation::Me)
        } else {
            None
        }
    }

    /// A string variable, if present and a string
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GraphQLUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl From<UserResponse> for GraphQLUser {
    fn from(user: UserResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GraphQLError {
    pub message: String,
}

/// `{data}` on success, `{errors: [{message}]}` on failure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GraphQLResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,
}

impl GraphQLResponse {
    pub fn data(field: &str, value: impl Serialize) -> Self {
        let mut data = Map::new();
        data.insert(field.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
        Self {
            data: Some(Value::Object(data)),
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: Some(vec![GraphQLError { message: message.into() }]),
        }
    }
}
