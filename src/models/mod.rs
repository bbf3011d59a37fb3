//! Product identity and run reporting types

use std::fmt;

/// Numeric product identifier taken from a storefront product URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductId(String);

impl ProductId {
    /// Extract the first numeric segment following a `products/` token in the
    /// URL path. Returns `None` when no such segment exists, which aborts the
    /// run before any browser session or directory is created.
    ///
    /// Handles both URL shapes the storefront uses:
    /// `https://brand.naver.com/<store>/products/<id>#REVIEW` and
    /// `https://smartstore.naver.com/<store>/products/<id>`.
    pub fn from_url(url: &str) -> Option<Self> {
        for (idx, token) in url.match_indices("products/") {
            let rest = &url[idx + token.len()..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if end > 0 {
                return Some(Self(rest[..end].to_string()));
            }
        }
        None
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final tally of the download phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_brand_url() {
        let id = ProductId::from_url("https://brand.naver.com/makeman/products/3472994718#REVIEW");
        assert_eq!(id, Some(ProductId("3472994718".to_string())));
    }

    #[test]
    fn extracts_id_from_smartstore_url() {
        let id = ProductId::from_url("https://smartstore.naver.com/makeman/products/3472994718");
        assert_eq!(id.unwrap().as_str(), "3472994718");
    }

    #[test]
    fn stops_at_first_non_digit() {
        let id = ProductId::from_url("https://brand.naver.com/x/products/123/extra");
        assert_eq!(id.unwrap().as_str(), "123");
    }

    #[test]
    fn skips_non_numeric_products_segment() {
        let id = ProductId::from_url("https://shop.example.com/products/sale/products/42");
        assert_eq!(id.unwrap().as_str(), "42");
    }

    #[test]
    fn missing_segment_yields_none() {
        assert_eq!(ProductId::from_url("https://brand.naver.com/makeman"), None);
        assert_eq!(ProductId::from_url("https://brand.naver.com/products/"), None);
    }
}
