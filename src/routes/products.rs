use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    dto::{
        catalog_dto::{CatalogParams, CatalogResponse},
        product_dto::{image_upload, ProductFormFields, ProductResponse},
    },
    error::{Error, Result},
    services::{catalog::CatalogQuery, session::SessionClaims},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products, newest first", body = [ProductResponse]),
    ),
    tag = "products"
)]
#[axum::debug_handler]
pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = state.product_service.list().await?;
    let items: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
#[axum::debug_handler]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let product = state.product_service.get(id).await?;
    Ok(Json(ProductResponse::from(product)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body(content = crate::dto::product_dto::CreateProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid form or image"),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Admin role required"),
        (status = 502, description = "Image host failure"),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
#[axum::debug_handler]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let multipart = multipart.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;
    let draft = read_product_form(multipart)
        .await?
        .into_draft(state.max_image_bytes)?;

    tracing::info!(uid = %claims.sub, name = %draft.name, "Creating product");
    let product = state.product_service.create(draft).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

async fn read_product_form(mut multipart: Multipart) -> Result<ProductFormFields> {
    let mut fields = ProductFormFields::default();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                fields.image = Some(image_upload(
                    file_name.as_deref(),
                    content_type.as_deref(),
                    data,
                ));
            }
            "name" => fields.name = Some(field.text().await?),
            "description" => fields.description = Some(field.text().await?),
            "price" => fields.price = Some(field.text().await?),
            "category" => fields.category = Some(field.text().await?),
            "stock" => fields.stock = Some(field.text().await?),
            other => tracing::debug!(field = %other, "Ignoring unknown product form field"),
        }
    }

    Ok(fields)
}

#[utoipa::path(
    get,
    path = "/api/catalog",
    params(CatalogParams),
    responses(
        (status = 200, description = "Filtered, sorted and paginated catalog", body = CatalogResponse),
        (status = 400, description = "Unknown filter or sort value"),
    ),
    tag = "products"
)]
#[axum::debug_handler]
pub async fn catalog(
    State(state): State<AppState>,
    params: std::result::Result<Query<CatalogParams>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(params) = params.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;
    let query = CatalogQuery::from(params);
    let page = state.product_service.catalog(&query).await?;
    Ok(Json(CatalogResponse::from(page)))
}
