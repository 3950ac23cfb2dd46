//! Offset-cursor pagination over the listing endpoints

use crate::client::IncidentApi;
use crate::errors::Result;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

/// Items requested per page. The cursor always advances by this amount.
pub const PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Services,
    Users,
    Teams,
    BusinessServices,
}

impl ResourceKind {
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Services => "services",
            ResourceKind::Users => "users",
            ResourceKind::Teams => "teams",
            ResourceKind::BusinessServices => "business_services",
        }
    }

    /// Key holding the items in a page envelope
    pub fn collection_key(&self) -> &'static str {
        self.path()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Fetch every page of `kind`, decoding items into `T` in upstream order.
///
/// Stops on the first page whose `more` flag is false. Any error aborts the
/// whole fetch.
pub async fn fetch_all<T, A>(api: &A, kind: ResourceKind) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    A: IncidentApi + ?Sized,
{
    let mut records = Vec::new();
    let mut offset = 0;

    loop {
        let page = api.list_page(kind, offset, PAGE_SIZE).await?;
        debug!("Fetched {} {} at offset {}", page.items.len(), kind, offset);

        for item in page.items {
            records.push(serde_json::from_value(item)?);
        }

        offset += PAGE_SIZE;

        if !page.more {
            break;
        }
    }

    debug!("Fetched {} {} in total", records.len(), kind);
    Ok(records)
}
