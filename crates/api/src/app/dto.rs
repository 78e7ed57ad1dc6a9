use serde::{Deserialize, Serialize};

use jktdocs_infra::{PageRequest, SortBy, SortOrder, UserRecord};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `?page=&limit=&search=&sortOrder=&sortBy=` on user and role listings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub sort_by: Option<SortBy>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit, self.sort_order).sorted_by(self.sort_by)
    }

    /// Blank search terms are ignored.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// `?page=&limit=&sortOrder=&sortBy=&userId=` on the document listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_order: Option<SortOrder>,
    pub sort_by: Option<SortBy>,
    pub user_id: Option<String>,
}

impl DocumentListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit, self.sort_order).sorted_by(self.sort_by)
    }
}

/// `?module=&action=`; both optional, an absent module means "nothing declared".
#[derive(Debug, Default, Deserialize)]
pub struct ExplainQuery {
    pub module: Option<String>,
    pub action: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserRecord,
}
