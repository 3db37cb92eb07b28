//! Per-document ID registry.
//!
//! Built once per document and used for every cross-reference lookup, so
//! pages and cards never hold their targets directly.

use std::collections::HashMap;

use crate::{datapoint::DataPointConfig, document::ReportConfig, page::Page};

/// Lookup tables from ID to the owning document's entities.
///
/// When an ID is declared twice the first declaration wins; the duplicate is
/// reported separately by the validator.
#[derive(Debug)]
pub struct DocumentIndex<'a> {
    data_points: HashMap<&'a str, &'a DataPointConfig>,
    pages: HashMap<&'a str, &'a Page>,
}

impl<'a> DocumentIndex<'a> {
    pub fn build(doc: &'a ReportConfig) -> Self {
        let mut data_points = HashMap::with_capacity(doc.data_points.len());
        for dp in &doc.data_points {
            data_points.entry(dp.id.as_str()).or_insert(dp);
        }

        let mut pages = HashMap::with_capacity(doc.pages.len());
        for page in &doc.pages {
            pages.entry(page.id.as_str()).or_insert(page);
        }

        Self { data_points, pages }
    }

    pub fn data_point(&self, id: &str) -> Option<&'a DataPointConfig> {
        self.data_points.get(id).copied()
    }

    pub fn page(&self, id: &str) -> Option<&'a Page> {
        self.pages.get(id).copied()
    }

    pub fn has_data_point(&self, id: &str) -> bool {
        self.data_points.contains_key(id)
    }

    pub fn has_page(&self, id: &str) -> bool {
        self.pages.contains_key(id)
    }
}
