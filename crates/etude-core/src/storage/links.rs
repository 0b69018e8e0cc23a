//! Bookmarked resources.

use std::sync::Arc;

use super::{KvStore, ListStore, LINKS_KEY};
use crate::error::{Result, ValidationError};
use crate::records::Link;

#[derive(Clone)]
pub struct LinkList {
    store: Arc<dyn KvStore>,
}

impl LinkList {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn links(&self) -> Vec<Link> {
        self.store.get_list(LINKS_KEY)
    }

    /// # Errors
    /// Returns an error if the name or url is blank, or the store write fails.
    pub fn add(&self, name: &str, url: &str) -> Result<Link> {
        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() || url.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "link".into(),
                message: "a link needs a name and a url".into(),
            }
            .into());
        }
        let link = Link {
            id: format!("link-{}", uuid::Uuid::new_v4()),
            name: name.to_string(),
            url: url.to_string(),
        };
        let mut all = self.links();
        all.push(link.clone());
        self.store.set_list(LINKS_KEY, &all)?;
        Ok(link)
    }

    /// # Errors
    /// Returns an error if the store write fails.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut all = self.links();
        let before = all.len();
        all.retain(|l| l.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.store.set_list(LINKS_KEY, &all)?;
        Ok(true)
    }
}
