//! List and filter users.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::database::Filter;
use crate::error::Result;
use crate::user::UserRepository;

#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// `key:value` equality filter.
    filter: Option<String>,
    /// Comma-separated fields to return.
    fields: Option<String>,
}

pub async fn handler(
    State(users): State<UserRepository>,
    params: std::result::Result<Query<Params>, QueryRejection>,
) -> Result<Json<Vec<Map<String, Value>>>> {
    let Query(params) = params?;

    // Empty values count as not supplied.
    let filter = match params.filter.as_deref().filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => Filter::parse(raw)?,
        None => None,
    };
    let fields = params
        .fields
        .as_deref()
        .map(|fields| {
            fields
                .split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .filter(|fields| !fields.is_empty());

    let items = users.list(filter.as_ref(), fields.as_deref()).await?;
    Ok(Json(items))
}
