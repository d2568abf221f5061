/// Everything read from one listing page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Detail links, one per listing item. `None` when the anchor has no href.
    pub links: Vec<Option<String>>,
    pub ratings: Vec<String>,
    pub merchants: Vec<String>,
}

/// Build the search URL for `page` (1-based). Page 1 carries no page parameter.
pub fn listing_url(base_url: &str, search_term: &str, page: usize) -> String {
    let query = search_term.replace(' ', "+");
    let page_param = if page > 1 {
        format!("&page={}", page)
    } else {
        String::new()
    };

    format!(
        "{}?navsource={}&srp_component_id=02.01.00.00&srp_page_id=&srp_page_title=&st=&q={}",
        base_url, page_param, query
    )
}
