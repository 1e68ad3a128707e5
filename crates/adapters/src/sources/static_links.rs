//! Static link entries from configuration

use async_trait::async_trait;
use briefing_domain::{Item, ItemSource, SourceError};

/// A fixed list of items; never fails
pub struct StaticSource {
    items: Vec<Item>,
}

impl StaticSource {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl ItemSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        Ok(self.items.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} links)", self.items.len())
    }
}
