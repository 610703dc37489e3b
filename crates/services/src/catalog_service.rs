use std::env;
use std::path::Path;
use std::sync::Arc;

use dojo_core::model::{Facet, Technique};
use reqwest::Client;
use storage::repository::TechniqueRepository;

use crate::error::CatalogError;

/// Published technique catalog.
pub const DEFAULT_CATALOG_URL: &str = "https://karateapp.monster0506.dev/data/techniques.json";

/// Facet filters for search. An empty list for a facet matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub belt: Vec<String>,
    pub attack: Vec<String>,
    pub block: Vec<String>,
    pub strike: Vec<String>,
}

impl SearchFilters {
    #[must_use]
    pub fn values(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Belt => &self.belt,
            Facet::Attack => &self.attack,
            Facet::Block => &self.block,
            Facet::Strike => &self.strike,
        }
    }

    pub fn values_mut(&mut self, facet: Facet) -> &mut Vec<String> {
        match facet {
            Facet::Belt => &mut self.belt,
            Facet::Attack => &mut self.attack,
            Facet::Block => &mut self.block,
            Facet::Strike => &mut self.strike,
        }
    }

    /// Add `value` if absent, remove it if present.
    pub fn toggle(&mut self, facet: Facet, value: impl Into<String>) {
        let value = value.into();
        let values = self.values_mut(facet);
        if let Some(idx) = values.iter().position(|v| *v == value) {
            values.remove(idx);
        } else {
            values.push(value);
        }
    }

    #[must_use]
    pub fn matches(&self, technique: &Technique) -> bool {
        Facet::ALL.into_iter().all(|facet| {
            let wanted = self.values(facet);
            wanted.is_empty() || wanted.iter().any(|v| v == technique.facet(facet))
        })
    }
}

/// Case-insensitive name search with facet filters, sorted by name ignoring case.
///
/// Adults-only duplicate rows never appear in results.
#[must_use]
pub fn search(catalog: &[Technique], query: &str, filters: &SearchFilters) -> Vec<Technique> {
    let needle = query.trim().to_lowercase();
    let mut hits: Vec<Technique> = catalog
        .iter()
        .filter(|t| !t.is_adults_duplicate())
        .filter(|t| t.name().as_str().to_lowercase().contains(&needle))
        .filter(|t| filters.matches(t))
        .cloned()
        .collect();
    hits.sort_by_cached_key(|t| t.name().as_str().to_lowercase());
    hits
}

/// Distinct values of `facet`, sorted.
#[must_use]
pub fn facet_values(catalog: &[Technique], facet: Facet) -> Vec<String> {
    let mut values: Vec<String> = catalog.iter().map(|t| t.facet(facet).to_owned()).collect();
    values.sort();
    values.dedup();
    values
}

/// Parse catalog JSON (an array of technique objects).
///
/// # Errors
///
/// Returns `CatalogError::Json` if the document is malformed.
pub fn parse_catalog(raw: &str) -> Result<Vec<Technique>, CatalogError> {
    Ok(serde_json::from_str(raw)?)
}

/// Imports and queries the technique catalog.
#[derive(Clone)]
pub struct CatalogService {
    techniques: Arc<dyn TechniqueRepository>,
    client: Client,
    url: String,
}

impl CatalogService {
    #[must_use]
    pub fn new(techniques: Arc<dyn TechniqueRepository>, url: impl Into<String>) -> Self {
        Self {
            techniques,
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Download URL from `DOJO_CATALOG_URL`, falling back to the published one.
    #[must_use]
    pub fn from_env(techniques: Arc<dyn TechniqueRepository>) -> Self {
        let url = env::var("DOJO_CATALOG_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.into());
        Self::new(techniques, url)
    }

    /// Same repository, different download URL.
    #[must_use]
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        Self {
            techniques: Arc::clone(&self.techniques),
            client: self.client.clone(),
            url: url.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on repository failures.
    pub async fn list(&self) -> Result<Vec<Technique>, CatalogError> {
        Ok(self.techniques.list_techniques().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on repository failures.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<Technique>, CatalogError> {
        let catalog = self.list().await?;
        Ok(search(&catalog, query, filters))
    }

    /// Replace the stored catalog. Returns the number of techniques stored.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage`, with `StorageError::Conflict` for
    /// duplicate names.
    pub async fn replace(&self, catalog: &[Technique]) -> Result<usize, CatalogError> {
        self.techniques.replace_catalog(catalog).await?;
        log::info!("stored catalog with {} techniques", catalog.len());
        Ok(catalog.len())
    }

    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed, or storing fails.
    pub async fn import_file(&self, path: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let catalog = parse_catalog(&raw)?;
        self.replace(&catalog).await
    }

    /// Fetch the catalog from the configured URL and store it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when the request fails, the response is not a
    /// valid catalog, or storing fails.
    pub async fn download(&self) -> Result<usize, CatalogError> {
        log::debug!("downloading catalog from {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus(response.status()));
        }
        let catalog: Vec<Technique> = response.json().await?;
        self.replace(&catalog).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dojo_core::model::TechniqueName;
    use storage::repository::InMemoryRepository;

    const SAMPLE: &str = r#"[
        {"Belt":"Yellow","beltNumber":2,"Number":3,"Name":"bear hug","Attack":"Hug","Block":"Elbow","Strike":"Heel","Complete":false,"Link":"","Kids":true},
        {"Belt":"White","beltNumber":1,"Number":1,"Name":"Wrist Grab","Attack":"Grab","Block":"Inward","Strike":"Palm","Complete":true,"Link":"https://example.com","Kids":true},
        {"Belt":"White","beltNumber":1,"Number":2,"Name":"Wrist Grab (Adult)","Attack":"Grab","Block":"Inward","Strike":"Palm","Complete":true,"Link":"","Kids":false,"Adults":"true"}
    ]"#;

    fn names(list: &[Technique]) -> Vec<&str> {
        list.iter().map(|t| t.name().as_str()).collect()
    }

    #[test]
    fn search_hides_adult_duplicates_and_sorts_by_name() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        let hits = search(&catalog, "", &SearchFilters::default());
        assert_eq!(names(&hits), vec!["bear hug", "Wrist Grab"]);

        let hits = search(&catalog, "WRIST", &SearchFilters::default());
        assert_eq!(names(&hits), vec!["Wrist Grab"]);
    }

    #[test]
    fn facet_filters_combine_across_facets() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        let mut filters = SearchFilters::default();
        filters.toggle(Facet::Belt, "White");
        filters.toggle(Facet::Belt, "Yellow");
        filters.toggle(Facet::Attack, "Hug");
        assert_eq!(names(&search(&catalog, "", &filters)), vec!["bear hug"]);

        filters.toggle(Facet::Attack, "Hug");
        assert_eq!(search(&catalog, "", &filters).len(), 2);
        assert_eq!(facet_values(&catalog, Facet::Belt), vec!["White", "Yellow"]);
    }

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(matches!(
            parse_catalog(r#"[{"Name":""}]"#),
            Err(CatalogError::Json(_))
        ));
    }

    #[tokio::test]
    async fn import_file_replaces_stored_catalog() {
        let path = std::env::temp_dir().join(format!("dojo-catalog-{}.json", std::process::id()));
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let repo = Arc::new(InMemoryRepository::new());
        let svc = CatalogService::new(repo.clone(), DEFAULT_CATALOG_URL);
        assert_eq!(svc.import_file(&path).await.unwrap(), 3);
        let _ = tokio::fs::remove_file(&path).await;

        let stored = svc.list().await.unwrap();
        assert_eq!(stored[0].name(), &TechniqueName::new("bear hug").unwrap());
        let hits = svc.search("grab", &SearchFilters::default()).await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
