use crate::error::{Result, ScrapeError};
use haraj_core::{sanitize_phone, DetailFieldSet, ListingField, ListingRecord, SiteOrigin};
use haraj_rules::{ExtractionRules, FieldRules, SelectorChain};
use scraper::{ElementRef, Html, Selector};

pub(crate) fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Rendered text of an element with runs of whitespace collapsed.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A selector chain compiled once and evaluated many times.
#[derive(Debug)]
pub struct CompiledChain {
    field: ListingField,
    selectors: Vec<Selector>,
}

impl CompiledChain {
    pub fn compile(field: ListingField, chain: &SelectorChain) -> Result<Self> {
        let selectors = chain
            .candidates()
            .iter()
            .map(|candidate| compile_selector(candidate))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { field, selectors })
    }

    pub fn field(&self) -> ListingField {
        self.field
    }

    /// Text of the first element, in candidate order, with non-empty text.
    pub fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            scope
                .select(selector)
                .map(|element| element_text(&element))
                .find(|text| !text.is_empty())
        })
    }
}

/// Applies one table of selector chains to a scope element.
///
/// The same type serves listing fragments and whole detail pages.
#[derive(Debug)]
pub struct FieldExtractor {
    chains: Vec<CompiledChain>,
}

impl FieldExtractor {
    pub fn compile(rules: &FieldRules) -> Result<Self> {
        let chains = rules
            .iter()
            .map(|(field, chain)| CompiledChain::compile(field, chain))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { chains })
    }

    /// Extract every field; unmatched fields stay at `N/A`.
    pub fn extract(&self, scope: ElementRef<'_>) -> DetailFieldSet {
        let mut fields = DetailFieldSet::new();
        for chain in &self.chains {
            if let Some(text) = chain.first_text(scope) {
                fields.set(chain.field(), text);
            }
        }
        fields
    }
}

pub struct ListingExtractor {
    origin: SiteOrigin,
    fragment: Selector,
    listing: FieldExtractor,
    detail: FieldExtractor,
    placeholder: String,
}

impl ListingExtractor {
    pub fn new(rules: &ExtractionRules, origin: SiteOrigin) -> Result<Self> {
        Ok(Self {
            origin,
            fragment: compile_selector(&rules.listing.fragment)?,
            listing: FieldExtractor::compile(&rules.fields.listing)?,
            detail: FieldExtractor::compile(&rules.fields.detail)?,
            placeholder: rules.reveal.placeholder.clone(),
        })
    }

    pub fn origin(&self) -> &SiteOrigin {
        &self.origin
    }

    /// Label the site shows instead of a phone number.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Records for every listing fragment, in document order.
    pub fn extract_listings(&self, html: &str) -> Vec<ListingRecord> {
        let document = Html::parse_document(html);
        let records = document
            .select(&self.fragment)
            .map(|fragment| self.extract_fields(fragment))
            .collect();
        records
    }

    /// First-pass record for one fragment: title, URL and listing-page fields.
    ///
    /// Field chains run against the parent of the enclosing anchor. A
    /// fragment with no enclosing anchor keeps `N/A` for the URL and every
    /// field.
    pub fn extract_fields(&self, fragment: ElementRef<'_>) -> ListingRecord {
        let mut record = ListingRecord::default();
        record.set(ListingField::Title, element_text(&fragment));

        let Some(anchor) = enclosing_anchor(fragment) else {
            return record;
        };

        if let Some(url) = anchor
            .value()
            .attr("href")
            .and_then(|href| self.origin.resolve(href))
        {
            record.set(ListingField::Url, url);
        }

        if let Some(container) = anchor.parent().and_then(ElementRef::wrap) {
            self.listing
                .extract(container)
                .apply_to(&mut record, &self.placeholder);
        }

        record
    }

    /// Fields of a standalone detail page.
    pub fn detail_fields(&self, html: &str) -> DetailFieldSet {
        let document = Html::parse_document(html);
        let fields = self.detail.extract(document.root_element());
        fields
    }

    pub fn sanitize_phone(&self, raw: &str) -> String {
        sanitize_phone(raw, &self.placeholder)
    }
}

/// The fragment itself when it is an anchor, otherwise its nearest `a` ancestor.
fn enclosing_anchor(fragment: ElementRef<'_>) -> Option<ElementRef<'_>> {
    std::iter::once(fragment)
        .chain(fragment.ancestors().filter_map(ElementRef::wrap))
        .find(|element| element.value().name().eq_ignore_ascii_case("a"))
}
