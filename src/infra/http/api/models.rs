use serde::{Deserialize, Serialize};

use crate::application::repos::TodoQueryFilter;
use crate::application::todos::{CreateTodoCommand, UpdateTodoCommand};

use super::error::{ApiError, codes};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PER: i64 = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: String,
}

impl From<CreateTodoRequest> for CreateTodoCommand {
    fn from(request: CreateTodoRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl From<UpdateTodoRequest> for UpdateTodoCommand {
    fn from(request: UpdateTodoRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteTodoResponse {
    pub success: bool,
}

/// Raw list query; values are parsed by [`TodoListQuery::into_filter`] so that bad input
/// produces the API's own error body.
#[derive(Debug, Default, Deserialize)]
pub struct TodoListQuery {
    pub page: Option<String>,
    pub per: Option<String>,
    pub valid: Option<String>,
}

impl TodoListQuery {
    pub fn into_filter(self) -> Result<TodoQueryFilter, ApiError> {
        let page = match present(self.page.as_deref()) {
            Some(raw) => raw.parse::<i64>().map_err(|err| {
                ApiError::bad_request(codes::INVALID_QUERY, format!("invalid page argument {err}"))
            })?,
            None => DEFAULT_PAGE,
        };

        let per = match present(self.per.as_deref()) {
            Some(raw) => raw.parse::<i64>().map_err(|err| {
                ApiError::bad_request(codes::INVALID_QUERY, format!("invalid per argument {err}"))
            })?,
            None => DEFAULT_PER,
        };

        let valid = present(self.valid.as_deref())
            .map(|raw| {
                parse_bool(raw).ok_or_else(|| {
                    ApiError::bad_request(
                        codes::INVALID_QUERY,
                        format!("invalid valid argument `{raw}` is not a boolean"),
                    )
                })
            })
            .transpose()?;

        let filter = TodoQueryFilter { page, per, valid };
        filter.window().map_err(|err| {
            ApiError::bad_request(codes::INVALID_QUERY, format!("invalid page argument {err}"))
        })?;
        Ok(filter)
    }
}

pub fn parse_todo_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|err| {
        ApiError::bad_request(codes::INVALID_ID, format!("invalid todo id `{raw}`: {err}"))
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
