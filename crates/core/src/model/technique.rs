use serde::{Deserialize, Serialize};

use crate::model::ids::TechniqueName;

/// Marker value used by the catalog for adults-only duplicate rows.
const ADULTS_ONLY_MARKER: &str = "true";

/// Audience a practice list is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    Kids,
    Adults,
}

/// A single curriculum technique.
///
/// Field names on the wire follow the published catalog JSON
/// (`Belt`, `beltNumber`, `Number`, `Name`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    #[serde(rename = "Name")]
    name: TechniqueName,
    #[serde(rename = "Number")]
    number: u32,
    #[serde(rename = "Belt")]
    belt: String,
    #[serde(rename = "beltNumber")]
    belt_number: u32,
    #[serde(rename = "Attack", default)]
    attack: String,
    #[serde(rename = "Block", default)]
    block: String,
    #[serde(rename = "Strike", default)]
    strike: String,
    #[serde(rename = "Complete", default)]
    complete: bool,
    #[serde(rename = "Link", default)]
    link: String,
    #[serde(rename = "Kids", default)]
    kids: bool,
    #[serde(rename = "Adults", default)]
    adults: Option<String>,
}

/// Searchable facet of a technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Belt,
    Attack,
    Block,
    Strike,
}

impl Facet {
    pub const ALL: [Facet; 4] = [Facet::Belt, Facet::Attack, Facet::Block, Facet::Strike];
}

impl Technique {
    /// Build a technique with empty facets; chain the `with_*` setters to fill them.
    #[must_use]
    pub fn new(name: TechniqueName, number: u32, belt: impl Into<String>, belt_number: u32) -> Self {
        Self {
            name,
            number,
            belt: belt.into(),
            belt_number,
            attack: String::new(),
            block: String::new(),
            strike: String::new(),
            complete: false,
            link: String::new(),
            kids: false,
            adults: None,
        }
    }

    #[must_use]
    pub fn with_facets(
        mut self,
        attack: impl Into<String>,
        block: impl Into<String>,
        strike: impl Into<String>,
    ) -> Self {
        self.attack = attack.into();
        self.block = block.into();
        self.strike = strike.into();
        self
    }

    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    #[must_use]
    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    #[must_use]
    pub fn with_kids(mut self, kids: bool) -> Self {
        self.kids = kids;
        self
    }

    #[must_use]
    pub fn with_adults(mut self, adults: Option<String>) -> Self {
        self.adults = adults;
        self
    }

    #[must_use]
    pub fn name(&self) -> &TechniqueName {
        &self.name
    }

    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub fn belt(&self) -> &str {
        &self.belt
    }

    #[must_use]
    pub fn belt_number(&self) -> u32 {
        self.belt_number
    }

    #[must_use]
    pub fn attack(&self) -> &str {
        &self.attack
    }

    #[must_use]
    pub fn block(&self) -> &str {
        &self.block
    }

    #[must_use]
    pub fn strike(&self) -> &str {
        &self.strike
    }

    #[must_use]
    pub fn complete(&self) -> bool {
        self.complete
    }

    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    #[must_use]
    pub fn kids(&self) -> bool {
        self.kids
    }

    #[must_use]
    pub fn adults(&self) -> Option<&str> {
        self.adults.as_deref()
    }

    /// Adults-only duplicates of a kids technique are hidden from search and
    /// excluded from adult random practice.
    #[must_use]
    pub fn is_adults_duplicate(&self) -> bool {
        self.adults.as_deref() == Some(ADULTS_ONLY_MARKER)
    }

    /// Whether this row belongs in a practice list for `audience`.
    #[must_use]
    pub fn suits(&self, audience: Audience) -> bool {
        match audience {
            Audience::Kids => self.kids,
            Audience::Adults => !self.is_adults_duplicate(),
        }
    }

    #[must_use]
    pub fn facet(&self, facet: Facet) -> &str {
        match facet {
            Facet::Belt => &self.belt,
            Facet::Attack => &self.attack,
            Facet::Block => &self.block,
            Facet::Strike => &self.strike,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"Belt":"Yellow","beltNumber":2,"Number":1,"Name":"Delayed Sword",
         "Attack":"Right punch","Block":"Inward","Strike":"Chop","Complete":true,
         "Link":"https://example.invalid/v/1","Kids":true,"Adults":null},
        {"Belt":"Yellow","beltNumber":2,"Number":1,"Name":"Delayed Sword (adult)",
         "Attack":"Right punch","Block":"Inward","Strike":"Chop","Complete":false,
         "Link":"","Kids":false,"Adults":"true"}
    ]"#;

    #[test]
    fn parses_catalog_json() {
        let parsed: Vec<Technique> = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name().as_str(), "Delayed Sword");
        assert_eq!(parsed[0].belt(), "Yellow");
        assert_eq!(parsed[0].belt_number(), 2);
        assert!(parsed[0].kids());
        assert!(!parsed[0].is_adults_duplicate());
        assert!(parsed[1].is_adults_duplicate());
    }

    #[test]
    fn audience_filter_matches_catalog_flags() {
        let parsed: Vec<Technique> = serde_json::from_str(SAMPLE).unwrap();
        assert!(parsed[0].suits(Audience::Kids));
        assert!(parsed[0].suits(Audience::Adults));
        assert!(!parsed[1].suits(Audience::Kids));
        assert!(!parsed[1].suits(Audience::Adults));
    }

    #[test]
    fn facet_accessor_reads_matching_field() {
        let t = Technique::new(TechniqueName::new("Five Swords").unwrap(), 3, "Orange", 3)
            .with_facets("Punch", "Outward", "Hammer");
        assert_eq!(t.facet(Facet::Belt), "Orange");
        assert_eq!(t.facet(Facet::Attack), "Punch");
        assert_eq!(t.facet(Facet::Block), "Outward");
        assert_eq!(t.facet(Facet::Strike), "Hammer");
    }
}
