use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::dto::{
    auth_dto::{
        IdTokenPayload, MessageResponse, ProtectedResponse, SessionResponse, SessionUser,
        SignUpPayload,
    },
    catalog_dto::{CatalogResponse, CategorySectionResponse},
    product_dto::{CreateProductForm, ProductResponse},
};
use crate::models::role::Role;
use crate::services::catalog::{CatalogStatus, PriceRange, SortKey};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::health::health,
        super::health::status,
        super::auth::google_sign_in,
        super::auth::email_password_sign_in,
        super::auth::email_password_sign_up,
        super::auth::logout,
        super::auth::protected,
        super::products::list_products,
        super::products::get_product,
        super::products::create_product,
        super::products::catalog,
    ),
    components(schemas(
        IdTokenPayload,
        SignUpPayload,
        SessionResponse,
        SessionUser,
        MessageResponse,
        ProtectedResponse,
        ProductResponse,
        CreateProductForm,
        CatalogResponse,
        CategorySectionResponse,
        CatalogStatus,
        PriceRange,
        SortKey,
        Role,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Sign-in and session endpoints"),
        (name = "products", description = "Catalog and product administration"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
