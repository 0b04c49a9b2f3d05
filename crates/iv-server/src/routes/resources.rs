//! Image resource actions: list, show, new, edit, delete.
//!
//! Responses follow the admin record shape
//! `{"id", "params", "createdAt", "updatedAt"}` and go through the action's
//! after pipeline before being returned.

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use iv_core::{Error, RecordId};
use iv_db::models::ImageDocument;
use iv_db::pool::get_conn;
use iv_db::queries;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::error::AppError;
use crate::hooks::Action;
use crate::routes::form::ActionForm;

const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn record_json(doc: &ImageDocument) -> Value {
    json!({
        "id": doc.id.to_string(),
        "params": doc.params,
        "createdAt": doc.created_at,
        "updatedAt": doc.updated_at,
    })
}

fn parse_id(id: &str) -> Result<RecordId, Error> {
    id.parse().map_err(|_| Error::not_found("image", id))
}

fn load(ctx: &AppContext, id: RecordId) -> Result<ImageDocument, Error> {
    let conn = get_conn(&ctx.db)?;
    queries::images::get_image(&conn, id)?.ok_or_else(|| Error::not_found("image", id))
}

fn respond(ctx: &AppContext, action: Action, response: Value) -> Json<Value> {
    Json(ctx.hooks.run(action, response))
}

// ---------------------------------------------------------------------------
// Read actions
// ---------------------------------------------------------------------------

/// GET /{root}/api/resources/Image/actions/list
pub async fn list(
    State(ctx): State<AppContext>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let offset = (page - 1).saturating_mul(per_page);

    let conn = get_conn(&ctx.db)?;
    let docs = queries::images::list_images(&conn, offset, per_page)?;
    let total = queries::images::count_images(&conn)?;

    let response = json!({
        "records": docs.iter().map(record_json).collect::<Vec<_>>(),
        "meta": { "total": total, "page": page, "perPage": per_page },
    });
    Ok(respond(&ctx, Action::List, response))
}

/// GET /{root}/api/resources/Image/records/{id}[/show]
///
/// Also served under the lowercase resource name.
pub async fn show(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doc = load(&ctx, parse_id(&id)?)?;
    Ok(respond(&ctx, Action::Show, json!({ "record": record_json(&doc) })))
}

// ---------------------------------------------------------------------------
// Write actions
// ---------------------------------------------------------------------------

/// POST /{root}/api/resources/Image/actions/new
pub async fn create(
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let form = ActionForm::from_multipart(multipart).await?;
    for file in &form.files {
        ctx.uploads.validate(file)?;
    }

    let doc = {
        let conn = get_conn(&ctx.db)?;
        queries::images::create_image(&conn, form.params.clone())?
    };
    tracing::info!(record_id = %doc.id, files = form.files.len(), "Image record created");

    let doc = if form.files.is_empty() {
        doc
    } else {
        ctx.uploads.attach(doc.id, &form.files).await?
    };

    Ok(respond(
        &ctx,
        Action::New,
        json!({
            "record": record_json(&doc),
            "notice": { "message": "Successfully created a new record", "type": "success" },
        }),
    ))
}

/// POST /{root}/api/resources/Image/records/{id}/edit
pub async fn edit(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let mut doc = load(&ctx, id)?;

    let form = ActionForm::from_multipart(multipart).await?;
    for file in &form.files {
        ctx.uploads.validate(file)?;
    }

    if !form.params.is_empty() {
        let conn = get_conn(&ctx.db)?;
        doc = queries::images::update_params(&conn, id, form.params.clone())?;
    }

    for key in &form.remove_keys {
        ctx.uploads.detach(&doc, key).await?;
        doc = load(&ctx, id)?;
    }

    if !form.files.is_empty() {
        doc = ctx.uploads.attach(id, &form.files).await?;
    }

    tracing::info!(
        record_id = %id,
        added = form.files.len(),
        removed = form.remove_keys.len(),
        "Image record updated"
    );

    Ok(respond(
        &ctx,
        Action::Edit,
        json!({
            "record": record_json(&doc),
            "notice": { "message": "Successfully updated the record", "type": "success" },
        }),
    ))
}

/// POST /{root}/api/resources/Image/records/{id}/delete
///
/// Provider objects are removed first; a provider failure keeps the record.
pub async fn delete(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let doc = load(&ctx, id)?;

    let purged = ctx.uploads.purge(&doc).await?;

    let conn = get_conn(&ctx.db)?;
    if !queries::images::delete_image(&conn, id)? {
        return Err(Error::not_found("image", id).into());
    }
    tracing::info!(record_id = %id, purged, "Image record deleted");

    Ok(respond(
        &ctx,
        Action::Delete,
        json!({
            "record": record_json(&doc),
            "notice": { "message": "Successfully deleted the record", "type": "success" },
        }),
    ))
}
