use domain::{Category, Money, OrderStatus, Product};

/// Default page size for catalog listings.
pub const DEFAULT_LIMIT: u32 = 12;

/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Sort order for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Price ascending.
    PriceLow,
    /// Price descending.
    PriceHigh,
    /// Rating descending.
    Rating,
    /// Creation time descending.
    #[default]
    Newest,
}

impl ProductSort {
    /// Parses a client sort key. Unknown or missing keys fall back to `Newest`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("price-low") => ProductSort::PriceLow,
            Some("price-high") => ProductSort::PriceHigh,
            Some("rating") => ProductSort::Rating,
            _ => ProductSort::Newest,
        }
    }
}

/// Builder for constructing catalog queries.
///
/// Filters by category and free-text search, then sorts and paginates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Filter by category.
    pub category: Option<Category>,

    /// Case-insensitive substring matched against name or description.
    pub search: Option<String>,

    /// Sort order.
    pub sort: ProductSort,

    /// 1-based page number.
    pub page: u32,

    /// Page size.
    pub limit: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            sort: ProductSort::default(),
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ProductQuery {
    /// Creates a new query with default paging.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to a category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Filters by a search term; blank terms are ignored.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }

    /// Sets the sort order.
    pub fn sort(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the page, clamped to at least 1.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Sets the page size, clamped to `1..=MAX_LIMIT`.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Returns true if the product passes the category and search filters.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category
            && product.category != category
        {
            return false;
        }
        if let Some(ref term) = self.search {
            let term = term.to_lowercase();
            return product.name.to_lowercase().contains(&term)
                || product.description.to_lowercase().contains(&term);
        }
        true
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub pages: u64,
    pub total: u64,
}

impl ProductPage {
    /// Assembles a page, deriving the page count from the total.
    pub fn new(products: Vec<Product>, query: &ProductQuery, total: u64) -> Self {
        Self {
            products,
            page: query.page,
            pages: total.div_ceil(u64::from(query.limit)),
            total,
        }
    }
}

/// Number of orders currently in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

/// Back-office order summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStats {
    pub total_orders: u64,
    /// Sum of `total_price` over orders whose payment completed.
    pub total_revenue: Money,
    pub orders_by_status: Vec<StatusCount>,
}
