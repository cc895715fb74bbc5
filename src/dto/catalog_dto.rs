use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::dto::product_dto::ProductResponse;
use crate::services::catalog::{
    CatalogPage, CatalogQuery, CatalogStatus, CategorySection, PriceRange, SortKey,
};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct CatalogParams {
    /// Case-insensitive match against name and description.
    pub search: Option<String>,
    pub price: Option<PriceRange>,
    pub sort: Option<SortKey>,
    /// 1-indexed; out-of-range values are clamped.
    pub page: Option<i64>,
}

impl From<CatalogParams> for CatalogQuery {
    fn from(value: CatalogParams) -> Self {
        Self {
            search: value.search,
            price: value.price.unwrap_or_default(),
            sort: value.sort.unwrap_or_default(),
            page: value.page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategorySectionResponse {
    pub category: String,
    pub items: Vec<ProductResponse>,
}

impl From<CategorySection> for CategorySectionResponse {
    fn from(value: CategorySection) -> Self {
        Self {
            category: value.category,
            items: value.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub items: Vec<ProductResponse>,
    pub sections: Vec<CategorySectionResponse>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub status: CatalogStatus,
    pub message: Option<String>,
}

impl From<CatalogPage> for CatalogResponse {
    fn from(value: CatalogPage) -> Self {
        Self {
            items: value.items.into_iter().map(Into::into).collect(),
            sections: value.sections.into_iter().map(Into::into).collect(),
            page: value.page,
            page_size: value.page_size,
            total_items: value.total_items,
            total_pages: value.total_pages,
            message: value.status.message().map(str::to_string),
            status: value.status,
        }
    }
}
