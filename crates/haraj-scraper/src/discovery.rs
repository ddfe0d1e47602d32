use crate::error::Result;
use crate::extractor::compile_selector;
use haraj_core::SiteOrigin;
use haraj_rules::SectionRules;
use scraper::{Html, Selector};

/// Finds section (category) pages linked from the homepage navigation.
pub struct SectionDiscoverer {
    origin: SiteOrigin,
    anchors: Selector,
}

impl SectionDiscoverer {
    pub fn new(rules: &SectionRules, origin: SiteOrigin) -> Result<Self> {
        Ok(Self {
            origin,
            anchors: compile_selector(&rules.anchors)?,
        })
    }

    /// Absolute section URLs in document order. Duplicates are kept.
    pub fn discover_sections(&self, homepage_html: &str) -> Vec<String> {
        let document = Html::parse_document(homepage_html);
        let sections: Vec<String> = document
            .select(&self.anchors)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter_map(|href| self.origin.resolve(href))
            .collect();
        tracing::info!(count = sections.len(), "discovered sections");
        sections
    }
}
