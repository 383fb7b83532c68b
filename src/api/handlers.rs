//! Request handlers for the public and admin surfaces.
//!
//! Handlers only translate HTTP to catalog calls. Public handlers always use
//! the public projection and active-only filtering; admin handlers use the
//! admin projection.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use super::auth::AdminPrincipal;
use super::error::AppResult;
use super::params::{Audience, ListParams, ReorderRequest, ReorderResponse};
use crate::catalog::{
    AgeGroup, AgeGroupPatch, Category, CategoryPatch, Content, ContentPatch, EntityKind,
    NewAgeGroup, NewCategory, NewContent, NewSetting, Page, Projection, Scope, Setting,
    SettingPatch,
};
use crate::store::Catalog;

type ListQuery = Result<Query<ListParams>, QueryRejection>;
type IdPath = Result<Path<i64>, PathRejection>;

// ============================================================================
// Public
// ============================================================================

pub async fn public_list_contents(
    State(catalog): State<Catalog>,
    query: ListQuery,
) -> AppResult<Json<Page<Content>>> {
    let (filter, pagination) = query?.0.into_query(Audience::Public)?;
    let projection = catalog.public_projection();

    let page = catalog
        .read(move |store| store.list_contents(&filter, pagination, projection))
        .await?;
    Ok(Json(page))
}

pub async fn public_get_content(
    State(catalog): State<Catalog>,
    path: IdPath,
) -> AppResult<Json<Content>> {
    let Path(id) = path?;
    let projection = catalog.public_projection();

    let content = catalog
        .read(move |store| store.get_content(id, projection))
        .await?;
    Ok(Json(content))
}

pub async fn public_list_categories(
    State(catalog): State<Catalog>,
    query: ListQuery,
) -> AppResult<Json<Page<Category>>> {
    let (filter, pagination) = query?.0.into_query(Audience::Public)?;
    let page = catalog
        .read(move |store| store.list_categories(&filter, pagination))
        .await?;
    Ok(Json(page))
}

pub async fn public_list_age_groups(
    State(catalog): State<Catalog>,
    query: ListQuery,
) -> AppResult<Json<Page<AgeGroup>>> {
    let (filter, pagination) = query?.0.into_query(Audience::Public)?;
    let page = catalog
        .read(move |store| store.list_age_groups(&filter, pagination))
        .await?;
    Ok(Json(page))
}

// ============================================================================
// Admin: content
// ============================================================================

pub async fn admin_list_contents(
    State(catalog): State<Catalog>,
    query: ListQuery,
) -> AppResult<Json<Page<Content>>> {
    let (filter, pagination) = query?.0.into_query(Audience::Admin)?;
    let page = catalog
        .read(move |store| store.list_contents(&filter, pagination, Projection::Admin))
        .await?;
    Ok(Json(page))
}

pub async fn admin_get_content(
    State(catalog): State<Catalog>,
    path: IdPath,
) -> AppResult<Json<Content>> {
    let Path(id) = path?;
    let content = catalog
        .read(move |store| store.get_content(id, Projection::Admin))
        .await?;
    Ok(Json(content))
}

pub async fn create_content(
    State(catalog): State<Catalog>,
    body: Result<Json<NewContent>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Content>)> {
    let Json(input) = body?;
    let content = catalog.write(move |store| store.create_content(input)).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

pub async fn update_content(
    State(catalog): State<Catalog>,
    path: IdPath,
    body: Result<Json<ContentPatch>, JsonRejection>,
) -> AppResult<Json<Content>> {
    let Path(id) = path?;
    let Json(patch) = body?;
    let content = catalog
        .write(move |store| store.update_content(id, patch))
        .await?;
    Ok(Json(content))
}

pub async fn delete_content(
    State(catalog): State<Catalog>,
    Extension(admin): Extension<AdminPrincipal>,
    path: IdPath,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    catalog.write(move |store| store.delete_content(id)).await?;
    info!(admin = %admin.0, id, "Admin deleted content");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_contents(
    State(catalog): State<Catalog>,
    Extension(admin): Extension<AdminPrincipal>,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> AppResult<Json<ReorderResponse>> {
    let Json(request) = body?;
    let scope = request.scope(EntityKind::Content)?;
    reorder(catalog, admin, scope, request.ordered_ids).await
}

// ============================================================================
// Admin: categories
// ============================================================================

pub async fn admin_list_categories(
    State(catalog): State<Catalog>,
    query: ListQuery,
) -> AppResult<Json<Page<Category>>> {
    let (filter, pagination) = query?.0.into_query(Audience::Admin)?;
    let page = catalog
        .read(move |store| store.list_categories(&filter, pagination))
        .await?;
    Ok(Json(page))
}

pub async fn admin_get_category(
    State(catalog): State<Catalog>,
    path: IdPath,
) -> AppResult<Json<Category>> {
    let Path(id) = path?;
    let category = catalog.read(move |store| store.get_category(id)).await?;
    Ok(Json(category))
}

pub async fn create_category(
    State(catalog): State<Catalog>,
    body: Result<Json<NewCategory>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let Json(input) = body?;
    let category = catalog
        .write(move |store| store.create_category(input))
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(catalog): State<Catalog>,
    path: IdPath,
    body: Result<Json<CategoryPatch>, JsonRejection>,
) -> AppResult<Json<Category>> {
    let Path(id) = path?;
    let Json(patch) = body?;
    let category = catalog
        .write(move |store| store.update_category(id, patch))
        .await?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(catalog): State<Catalog>,
    Extension(admin): Extension<AdminPrincipal>,
    path: IdPath,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    catalog.write(move |store| store.delete_category(id)).await?;
    info!(admin = %admin.0, id, "Admin deleted category");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_categories(
    State(catalog): State<Catalog>,
    Extension(admin): Extension<AdminPrincipal>,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> AppResult<Json<ReorderResponse>> {
    let Json(request) = body?;
    let scope = request.scope(EntityKind::Category)?;
    reorder(catalog, admin, scope, request.ordered_ids).await
}

// ============================================================================
// Admin: age groups
// ============================================================================

pub async fn admin_list_age_groups(
    State(catalog): State<Catalog>,
    query: ListQuery,
) -> AppResult<Json<Page<AgeGroup>>> {
    let (filter, pagination) = query?.0.into_query(Audience::Admin)?;
    let page = catalog
        .read(move |store| store.list_age_groups(&filter, pagination))
        .await?;
    Ok(Json(page))
}

pub async fn admin_get_age_group(
    State(catalog): State<Catalog>,
    path: IdPath,
) -> AppResult<Json<AgeGroup>> {
    let Path(id) = path?;
    let age_group = catalog.read(move |store| store.get_age_group(id)).await?;
    Ok(Json(age_group))
}

pub async fn create_age_group(
    State(catalog): State<Catalog>,
    body: Result<Json<NewAgeGroup>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AgeGroup>)> {
    let Json(input) = body?;
    let age_group = catalog
        .write(move |store| store.create_age_group(input))
        .await?;
    Ok((StatusCode::CREATED, Json(age_group)))
}

pub async fn update_age_group(
    State(catalog): State<Catalog>,
    path: IdPath,
    body: Result<Json<AgeGroupPatch>, JsonRejection>,
) -> AppResult<Json<AgeGroup>> {
    let Path(id) = path?;
    let Json(patch) = body?;
    let age_group = catalog
        .write(move |store| store.update_age_group(id, patch))
        .await?;
    Ok(Json(age_group))
}

pub async fn delete_age_group(
    State(catalog): State<Catalog>,
    Extension(admin): Extension<AdminPrincipal>,
    path: IdPath,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    catalog.write(move |store| store.delete_age_group(id)).await?;
    info!(admin = %admin.0, id, "Admin deleted age group");
    Ok(StatusCode::NO_CONTENT)
}

/// Age groups sort by age range; this always answers 400
pub async fn reorder_age_groups(
    State(catalog): State<Catalog>,
    Extension(admin): Extension<AdminPrincipal>,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> AppResult<Json<ReorderResponse>> {
    let Json(request) = body?;
    let scope = request.scope(EntityKind::AgeGroup)?;
    reorder(catalog, admin, scope, request.ordered_ids).await
}

// ============================================================================
// Admin: settings
// ============================================================================

pub async fn admin_list_settings(
    State(catalog): State<Catalog>,
    query: ListQuery,
) -> AppResult<Json<Page<Setting>>> {
    let (filter, pagination) = query?.0.into_query(Audience::Admin)?;
    let page = catalog
        .read(move |store| store.list_settings(&filter, pagination))
        .await?;
    Ok(Json(page))
}

pub async fn admin_get_setting(
    State(catalog): State<Catalog>,
    path: IdPath,
) -> AppResult<Json<Setting>> {
    let Path(id) = path?;
    let setting = catalog.read(move |store| store.get_setting(id)).await?;
    Ok(Json(setting))
}

pub async fn create_setting(
    State(catalog): State<Catalog>,
    body: Result<Json<NewSetting>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Setting>)> {
    let Json(input) = body?;
    let setting = catalog
        .write(move |store| store.create_setting(input))
        .await?;
    Ok((StatusCode::CREATED, Json(setting)))
}

pub async fn update_setting(
    State(catalog): State<Catalog>,
    path: IdPath,
    body: Result<Json<SettingPatch>, JsonRejection>,
) -> AppResult<Json<Setting>> {
    let Path(id) = path?;
    let Json(patch) = body?;
    let setting = catalog
        .write(move |store| store.update_setting(id, patch))
        .await?;
    Ok(Json(setting))
}

pub async fn delete_setting(
    State(catalog): State<Catalog>,
    Extension(admin): Extension<AdminPrincipal>,
    path: IdPath,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    catalog.write(move |store| store.delete_setting(id)).await?;
    info!(admin = %admin.0, id, "Admin deleted setting");
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder(
    catalog: Catalog,
    admin: AdminPrincipal,
    scope: Scope,
    ordered_ids: Vec<i64>,
) -> AppResult<Json<ReorderResponse>> {
    let slots = catalog
        .write(move |store| store.reorder(scope, &ordered_ids))
        .await?;
    info!(admin = %admin.0, %scope, count = slots.len(), "Admin reordered scope");

    Ok(Json(ReorderResponse {
        scope: scope.to_string(),
        data: slots,
    }))
}
