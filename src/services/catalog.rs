//! Catalog derivation: search, price filter, sort and pagination over the
//! full product collection. Everything here is pure and deterministic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::product::Product;
use crate::utils::text::{compare_names, contains_case_insensitive};

pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum PriceRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "upto50")]
    UpTo50,
    #[serde(rename = "50to100")]
    From50To100,
    #[serde(rename = "100to200")]
    From100To200,
    #[serde(rename = "over200")]
    Over200,
}

impl PriceRange {
    pub fn contains(&self, price: Decimal) -> bool {
        let fifty = Decimal::from(50);
        let hundred = Decimal::from(100);
        let two_hundred = Decimal::from(200);
        match self {
            PriceRange::All => true,
            PriceRange::UpTo50 => price <= fifty,
            PriceRange::From50To100 => price > fifty && price <= hundred,
            PriceRange::From100To200 => price > hundred && price <= two_hundred,
            PriceRange::Over200 => price > two_hundred,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum SortKey {
    #[default]
    #[serde(rename = "relevance")]
    Relevance,
    #[serde(rename = "az")]
    NameAsc,
    #[serde(rename = "za")]
    NameDesc,
    #[serde(rename = "priceLowHigh")]
    PriceAsc,
    #[serde(rename = "priceHighLow")]
    PriceDesc,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub price: PriceRange,
    pub sort: SortKey,
    pub page: Option<i64>,
}

impl CatalogQuery {
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CatalogStatus {
    Ok,
    EmptyCatalog,
    NoMatches,
}

impl CatalogStatus {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            CatalogStatus::Ok => None,
            CatalogStatus::EmptyCatalog => Some("No products available yet."),
            CatalogStatus::NoMatches => Some("No products match the current criteria."),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySection {
    pub category: String,
    pub items: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<Product>,
    pub sections: Vec<CategorySection>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub status: CatalogStatus,
}

/// Search, filter and sort. `products` is expected newest first, which is
/// the order `Relevance` keeps.
pub fn filter_and_sort<'a>(products: &'a [Product], query: &CatalogQuery) -> Vec<&'a Product> {
    let term = query.search_term();
    let mut selected: Vec<&Product> = products
        .iter()
        .filter(|p| match term.as_deref() {
            Some(term) => {
                contains_case_insensitive(&p.name, term)
                    || contains_case_insensitive(&p.description, term)
            }
            None => true,
        })
        .filter(|p| query.price.contains(p.price))
        .collect();

    match query.sort {
        SortKey::Relevance => {}
        SortKey::NameAsc => selected.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::NameDesc => selected.sort_by(|a, b| compare_names(&b.name, &a.name)),
        SortKey::PriceAsc => selected.sort_by(|a, b| a.price.cmp(&b.price)),
        SortKey::PriceDesc => selected.sort_by(|a, b| b.price.cmp(&a.price)),
    }

    selected
}

pub fn total_pages(total_items: usize) -> usize {
    total_items.div_ceil(PAGE_SIZE)
}

/// Clamps a 1-indexed page request into `[1, max(total_pages, 1)]`.
pub fn clamp_page(requested: Option<i64>, total_pages: usize) -> usize {
    let last = total_pages.max(1);
    match requested.unwrap_or(1) {
        n if n < 1 => 1,
        n => usize::try_from(n).map_or(last, |n| n.min(last)),
    }
}

pub fn derive_page(products: &[Product], query: &CatalogQuery) -> CatalogPage {
    let selected = filter_and_sort(products, query);
    let total_items = selected.len();
    let total_pages = total_pages(total_items);
    let page = clamp_page(query.page, total_pages);

    let items: Vec<Product> = selected
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    let status = if products.is_empty() {
        CatalogStatus::EmptyCatalog
    } else if total_items == 0 {
        CatalogStatus::NoMatches
    } else {
        CatalogStatus::Ok
    };

    CatalogPage {
        sections: group_by_category(&items),
        items,
        page,
        page_size: PAGE_SIZE,
        total_items,
        total_pages,
        status,
    }
}

/// Sections in first-appearance order, items keeping their sorted order.
pub fn group_by_category(items: &[Product]) -> Vec<CategorySection> {
    let mut sections: Vec<CategorySection> = Vec::new();
    for product in items {
        match sections.iter_mut().find(|s| s.category == product.category) {
            Some(section) => section.items.push(product.clone()),
            None => sections.push(CategorySection {
                category: product.category.clone(),
                items: vec![product.clone()],
            }),
        }
    }
    sections
}
