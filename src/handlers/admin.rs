use crate::{
    AppState,
    auth::AuthDev,
    error::ApiError,
    models::{
        AdminStats, CreateDocPageRequest, Developer, DocPage, PublishSdkRequest, Sdk,
        UpdateDocPageRequest, UpdateSdkRequest,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

fn require_admin(auth: &AuthDev) -> Result<(), ApiError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("admin role required"))
    }
}

/// get_admin_stats
///
/// [Admin Route] Platform-wide counters for the operations dashboard.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Stats", body = AdminStats),
        (status = 403, description = "Not admin")
    )
)]
pub async fn get_admin_stats(
    auth: AuthDev,
    State(state): State<AppState>,
) -> Result<Json<AdminStats>, ApiError> {
    require_admin(&auth)?;
    Ok(Json(state.store.admin_stats()))
}

/// list_developers
///
/// [Admin Route] Every registered developer account.
#[utoipa::path(
    get,
    path = "/admin/developers",
    responses(
        (status = 200, description = "Developers", body = [Developer]),
        (status = 403, description = "Not admin")
    )
)]
pub async fn list_developers(
    auth: AuthDev,
    State(state): State<AppState>,
) -> Result<Json<Vec<Developer>>, ApiError> {
    require_admin(&auth)?;
    let mut developers = state.store.developers.all();
    developers.sort_by_key(|d| d.created_at);
    Ok(Json(developers))
}

/// publish_sdk
///
/// [Admin Route] Adds an entry to the SDK registry. Entries start published;
/// yanking happens through the update endpoint.
#[utoipa::path(
    post,
    path = "/admin/sdks",
    request_body = PublishSdkRequest,
    responses(
        (status = 201, description = "Published", body = Sdk),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not admin")
    )
)]
pub async fn publish_sdk(
    auth: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<PublishSdkRequest>,
) -> Result<(StatusCode, Json<Sdk>), ApiError> {
    require_admin(&auth)?;
    if payload.name.trim().is_empty() || payload.language.trim().is_empty() {
        return Err(ApiError::validation("name and language must not be empty"));
    }
    if payload.version.trim().is_empty() {
        return Err(ApiError::validation("version must not be empty"));
    }
    if !payload.download_url.starts_with("https://") {
        return Err(ApiError::validation("download_url must be https"));
    }

    let id = Uuid::new_v4();
    let sdk = Sdk {
        id,
        name: payload.name.trim().to_string(),
        language: payload.language.trim().to_lowercase(),
        version: payload.version.trim().to_string(),
        download_url: payload.download_url,
        published: true,
        created_at: Utc::now(),
    };
    state.store.sdks.insert(id, sdk.clone());
    Ok((StatusCode::CREATED, Json(sdk)))
}

/// update_sdk
///
/// [Admin Route] Partial update of a registry entry; `published: false`
/// yanks it from the public listing without losing the record.
#[utoipa::path(
    put,
    path = "/admin/sdks/{id}",
    params(("id" = Uuid, Path, description = "SDK ID")),
    request_body = UpdateSdkRequest,
    responses(
        (status = 200, description = "Updated", body = Sdk),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_sdk(
    auth: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSdkRequest>,
) -> Result<Json<Sdk>, ApiError> {
    require_admin(&auth)?;
    if payload
        .version
        .as_deref()
        .is_some_and(|v| v.trim().is_empty())
    {
        return Err(ApiError::validation("version must not be empty"));
    }
    if payload
        .download_url
        .as_deref()
        .is_some_and(|u| !u.starts_with("https://"))
    {
        return Err(ApiError::validation("download_url must be https"));
    }
    let updated = state
        .store
        .sdks
        .update(id, |s| {
            if let Some(version) = payload.version.clone() {
                s.version = version.trim().to_string();
            }
            if let Some(url) = payload.download_url.clone() {
                s.download_url = url;
            }
            if let Some(published) = payload.published {
                s.published = published;
            }
        })
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// create_doc_page
///
/// [Admin Route] Authors a documentation page. Slugs are unique; reusing one
/// is a conflict.
#[utoipa::path(
    post,
    path = "/admin/docs",
    request_body = CreateDocPageRequest,
    responses(
        (status = 201, description = "Created", body = DocPage),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not admin"),
        (status = 409, description = "Slug taken")
    )
)]
pub async fn create_doc_page(
    auth: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<CreateDocPageRequest>,
) -> Result<(StatusCode, Json<DocPage>), ApiError> {
    require_admin(&auth)?;
    let slug = payload.slug.trim().to_lowercase();
    if slug.is_empty() || !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ApiError::validation(
            "slug must be non-empty, alphanumeric and dashes",
        ));
    }
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("title must not be empty"));
    }
    if state.store.doc_by_slug(&slug).is_some() {
        return Err(ApiError::conflict("slug already in use"));
    }

    let id = Uuid::new_v4();
    let page = DocPage {
        id,
        slug,
        title: payload.title.trim().to_string(),
        body: payload.body,
        published: payload.published,
        updated_at: Utc::now(),
    };
    state.store.doc_pages.insert(id, page.clone());
    Ok((StatusCode::CREATED, Json(page)))
}

/// update_doc_page
///
/// [Admin Route] Edits a page addressed by slug; flipping `published`
/// controls public visibility.
#[utoipa::path(
    put,
    path = "/admin/docs/{slug}",
    params(("slug" = String, Path, description = "Page slug")),
    request_body = UpdateDocPageRequest,
    responses(
        (status = 200, description = "Updated", body = DocPage),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_doc_page(
    auth: AuthDev,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateDocPageRequest>,
) -> Result<Json<DocPage>, ApiError> {
    require_admin(&auth)?;
    if payload.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::validation("title must not be empty"));
    }
    let page = state.store.doc_by_slug(&slug).ok_or(ApiError::NotFound)?;
    let updated = state
        .store
        .doc_pages
        .update(page.id, |p| {
            if let Some(title) = payload.title.clone() {
                p.title = title.trim().to_string();
            }
            if let Some(body) = payload.body.clone() {
                p.body = body;
            }
            if let Some(published) = payload.published {
                p.published = published;
            }
            p.updated_at = Utc::now();
        })
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// admin_revoke_key
///
/// [Admin Route] Revokes any key regardless of owner — the override for
/// abuse handling.
#[utoipa::path(
    delete,
    path = "/admin/keys/{id}",
    params(("id" = Uuid, Path, description = "Key ID")),
    responses(
        (status = 204, description = "Revoked"),
        (status = 403, description = "Not admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_revoke_key(
    auth: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&auth)?;
    state
        .store
        .api_keys
        .update(id, |k| k.revoked = true)
        .ok_or(ApiError::NotFound)?;
    Ok(StatusCode::NO_CONTENT)
}
