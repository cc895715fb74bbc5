use crate::models::product::Product;
use crate::services::catalog::{derive_page, CatalogPage, CatalogQuery, PriceRange, SortKey};

/// Browse controls of the storefront. Any change to what is shown sends
/// the user back to the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseState {
    query: CatalogQuery,
}

impl BrowseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    pub fn page(&self) -> i64 {
        self.query.page.unwrap_or(1)
    }

    pub fn set_search(&mut self, term: &str) {
        self.query.search = Some(term.to_string()).filter(|t| !t.trim().is_empty());
        self.query.page = Some(1);
    }

    pub fn set_price(&mut self, price: PriceRange) {
        self.query.price = price;
        self.query.page = Some(1);
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.query.sort = sort;
        self.query.page = Some(1);
    }

    pub fn go_to_page(&mut self, page: i64) {
        self.query.page = Some(page);
    }

    /// Derives the visible page and keeps the clamped page number.
    pub fn view(&mut self, products: &[Product]) -> CatalogPage {
        let page = derive_page(products, &self.query);
        self.query.page = Some(page.page as i64);
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changing_filters_resets_to_first_page() {
        let mut state = BrowseState::new();

        state.go_to_page(3);
        state.set_search("yoga");
        assert_eq!(state.page(), 1);

        state.go_to_page(2);
        state.set_price(PriceRange::Over200);
        assert_eq!(state.page(), 1);

        state.go_to_page(4);
        state.set_sort(SortKey::NameAsc);
        assert_eq!(state.page(), 1);
        assert_eq!(state.query().sort, SortKey::NameAsc);
    }

    #[test]
    fn view_clamps_requested_page() {
        let mut state = BrowseState::new();
        state.go_to_page(9);
        let page = state.view(&[]);
        assert_eq!(page.page, 1);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn blank_search_clears_term() {
        let mut state = BrowseState::new();
        state.set_search("   ");
        assert_eq!(state.query().search, None);
    }
}
