//! Extraction rule types.
//!
//! Everything coupled to the marketplace markup lives here as data: fragment
//! selectors, per-field selector chains for listing and detail pages, the
//! section-navigation selector and the locators driving the login/reveal
//! sequence.

use crate::error::{Result, RulesError};
use haraj_browser::Locator;
use haraj_core::{ListingField, SiteOrigin};
use scraper::Selector;
use serde::{Deserialize, Serialize};

/// Complete rules document for one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRules {
    /// Site identity
    pub site: SiteRules,

    /// Listing page structure
    pub listing: ListingRules,

    /// Field selector chains
    pub fields: FieldTables,

    /// Homepage section navigation
    pub sections: SectionRules,

    /// Login and contact-reveal interaction
    pub reveal: RevealRules,
}

impl ExtractionRules {
    /// Site identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.site.id
    }

    /// Validate the rules for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        let site_id = self.site.id.as_str();
        let invalid = |reason: String| RulesError::ValidationError {
            site_id: site_id.to_string(),
            reason,
        };

        if site_id.trim().is_empty() {
            return Err(invalid("site id cannot be empty".to_string()));
        }

        SiteOrigin::new(&self.site.base_url).map_err(|e| invalid(e.to_string()))?;

        check_css(site_id, "listing.fragment", &self.listing.fragment)?;
        check_css(site_id, "listing.ready", &self.listing.ready)?;
        if let Some(load_more) = &self.listing.load_more {
            check_css(site_id, "listing.load_more", load_more)?;
        }
        check_css(site_id, "sections.anchors", &self.sections.anchors)?;

        self.fields.listing.validate(site_id, "fields.listing")?;
        self.fields.detail.validate(site_id, "fields.detail")?;

        self.reveal.validate(site_id)?;

        Ok(())
    }
}

fn check_css(site_id: &str, path: &str, selector: &str) -> Result<()> {
    if selector.trim().is_empty() {
        return Err(RulesError::ValidationError {
            site_id: site_id.to_string(),
            reason: format!("{path} cannot be empty"),
        });
    }
    Selector::parse(selector).map_err(|e| RulesError::ValidationError {
        site_id: site_id.to_string(),
        reason: format!("{path}: invalid CSS selector '{selector}': {e}"),
    })?;
    Ok(())
}

fn check_locator(site_id: &str, path: &str, locator: &Locator) -> Result<()> {
    match locator {
        Locator::Css(selector) => check_css(site_id, path, selector),
        Locator::XPath(expression) if expression.trim().is_empty() => {
            Err(RulesError::ValidationError {
                site_id: site_id.to_string(),
                reason: format!("{path} cannot be empty"),
            })
        }
        Locator::XPath(_) => Ok(()),
    }
}

/// Site identity and origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRules {
    /// Short identifier (e.g., "haraj")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Origin used to absolutize links
    pub base_url: String,
}

/// Listing page structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRules {
    /// Selector matching one node per listing (heading inside an anchor)
    pub fragment: String,

    /// Element the renderer waits for before paginating
    pub ready: String,

    /// Optional "load more" control clicked during pagination
    #[serde(default)]
    pub load_more: Option<String>,
}

/// Selector chains for listing pages and detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldTables {
    /// Chains evaluated inside a listing fragment's container
    pub listing: FieldRules,

    /// Chains evaluated against a whole detail page
    pub detail: FieldRules,
}

/// One ordered selector chain per extractable field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRules {
    /// Displayed price
    pub price: SelectorChain,

    /// City or area
    pub location: SelectorChain,

    /// Contact phone (often the reveal placeholder)
    pub phone: SelectorChain,

    /// Ad body
    pub description: SelectorChain,

    /// Poster display name
    pub author_name: SelectorChain,
}

impl FieldRules {
    /// Chain for a field, `None` for fields not extracted by selector.
    #[must_use]
    pub fn chain(&self, field: ListingField) -> Option<&SelectorChain> {
        match field {
            ListingField::Price => Some(&self.price),
            ListingField::Location => Some(&self.location),
            ListingField::Phone => Some(&self.phone),
            ListingField::Description => Some(&self.description),
            ListingField::AuthorName => Some(&self.author_name),
            ListingField::Title | ListingField::Url => None,
        }
    }

    /// All chains paired with their field, in field order.
    pub fn iter(&self) -> impl Iterator<Item = (ListingField, &SelectorChain)> {
        ListingField::DETAIL
            .into_iter()
            .filter_map(|field| self.chain(field).map(|chain| (field, chain)))
    }

    fn validate(&self, site_id: &str, table: &str) -> Result<()> {
        for (field, chain) in self.iter() {
            let path = format!("{table}.{field}");
            if chain.is_empty() {
                return Err(RulesError::ValidationError {
                    site_id: site_id.to_string(),
                    reason: format!("{path} has no selectors"),
                });
            }
            for selector in chain.candidates() {
                check_css(site_id, &path, selector)?;
            }
        }
        Ok(())
    }
}

/// Ordered CSS selector candidates for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorChain(Vec<String>);

impl SelectorChain {
    /// Create a chain from candidates in priority order.
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(candidates.into_iter().map(Into::into).collect())
    }

    /// Candidates in priority order.
    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.0
    }

    /// Whether the chain has no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Homepage section navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRules {
    /// Selector for anchors inside the section-navigation container
    pub anchors: String,
}

/// Locators for the login and contact-reveal interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealRules {
    /// Label shown instead of a phone number before reveal
    pub placeholder: String,

    /// Control opening the login modal
    pub login_button: Locator,

    /// Login modal body
    pub login_modal: Locator,

    /// Username input
    pub username: Locator,

    /// Button advancing from username to password
    pub next_button: Locator,

    /// Password input
    pub password: Locator,

    /// Login submit button
    pub submit: Locator,

    /// Modal container that disappears once logged in
    pub modal_container: Locator,

    /// "Reveal contact" button on a detail page
    pub contact_button: Locator,

    /// Node holding the revealed phone number
    pub revealed_phone: Locator,

    /// Link whose `tel:` href carries the number when the node text is empty
    #[serde(default)]
    pub phone_link: Option<Locator>,
}

impl RevealRules {
    fn validate(&self, site_id: &str) -> Result<()> {
        if self.placeholder.trim().is_empty() {
            return Err(RulesError::ValidationError {
                site_id: site_id.to_string(),
                reason: "reveal.placeholder cannot be empty".to_string(),
            });
        }

        let locators = [
            ("reveal.login_button", &self.login_button),
            ("reveal.login_modal", &self.login_modal),
            ("reveal.username", &self.username),
            ("reveal.next_button", &self.next_button),
            ("reveal.password", &self.password),
            ("reveal.submit", &self.submit),
            ("reveal.modal_container", &self.modal_container),
            ("reveal.contact_button", &self.contact_button),
            ("reveal.revealed_phone", &self.revealed_phone),
        ];
        for (path, locator) in locators {
            check_locator(site_id, path, locator)?;
        }
        if let Some(link) = &self.phone_link {
            check_locator(site_id, "reveal.phone_link", link)?;
        }
        Ok(())
    }
}
