use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PaginationParams {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self { page, page_size }
    }

    pub fn get_page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn get_offset(&self) -> u32 {
        (self.get_page() - 1) * self.get_limit()
    }

    pub fn get_limit(&self) -> u32 {
        self.page_size.unwrap_or(20).clamp(1, 100)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total as u32).saturating_sub(1) / page_size.max(1)) + 1
        };
        Self {
            items,
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_limit() {
        let params = PaginationParams::new(Some(3), Some(25));
        assert_eq!(params.get_limit(), 25);
        assert_eq!(params.get_offset(), 50);
    }

    #[test]
    fn test_defaults() {
        let params = PaginationParams::new(None, None);
        assert_eq!(params.get_limit(), 20);
        assert_eq!(params.get_offset(), 0);
    }

    #[test]
    fn test_limit_is_clamped() {
        let params = PaginationParams::new(Some(1), Some(1000));
        assert_eq!(params.get_limit(), 100);
    }

    #[test]
    fn test_total_pages() {
        let resp = PaginatedResponse::new(vec![1, 2, 3], 1, 20, 41);
        assert_eq!(resp.total_pages, 3);
        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 1, 20, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
