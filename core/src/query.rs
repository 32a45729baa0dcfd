//! Query-string composition for list endpoints.
//!
//! Parameters are appended in the fixed order `pageSize`, `pageNo`,
//! `filter`, `order`. The separator is `?` when the URL built so far has no
//! `?` yet and `&` otherwise, so a base URL that already carries a query is
//! extended rather than broken. Values are appended verbatim; free-text
//! values go through [`encode_query_value`] first.

pub const PAGE_SIZE: &str = "pageSize";
pub const PAGE_NO: &str = "pageNo";
pub const FILTER: &str = "filter";
pub const ORDER: &str = "order";

/// Append `pageSize` and `pageNo` when present.
pub fn with_paging(url: &str, page_size: Option<u32>, page_no: Option<u32>) -> String {
    with_paging_filter_and_order(url, page_size, page_no, None, None)
}

/// Append `pageSize`, `pageNo` and `filter` when present.
pub fn with_paging_and_filter(
    url: &str,
    page_size: Option<u32>,
    page_no: Option<u32>,
    filter: Option<&str>,
) -> String {
    with_paging_filter_and_order(url, page_size, page_no, filter, None)
}

/// Append `pageSize`, `pageNo`, `filter` and `order` when present.
pub fn with_paging_filter_and_order(
    url: &str,
    page_size: Option<u32>,
    page_no: Option<u32>,
    filter: Option<&str>,
    order: Option<&str>,
) -> String {
    let mut out = String::from(url);
    if let Some(size) = page_size {
        append_param(&mut out, PAGE_SIZE, &size.to_string());
    }
    if let Some(no) = page_no {
        append_param(&mut out, PAGE_NO, &no.to_string());
    }
    if let Some(filter) = filter {
        append_param(&mut out, FILTER, filter);
    }
    if let Some(order) = order {
        append_param(&mut out, ORDER, order);
    }
    out
}

fn append_param(url: &mut String, key: &str, value: &str) {
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(key);
    url.push('=');
    url.push_str(value);
}

/// Form-encode a free-text value for use in a query string.
///
/// Space becomes `+`; ASCII alphanumerics and `*-._` pass through; every
/// other byte of the UTF-8 encoding is percent-escaped.
pub fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
