//! Fetching and HTML extraction against the legislation portal.

use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::types::PipelineError;

/// Canonical portal root.
pub const BASE_URL: &str = "https://www.legislation.gov.uk";

/// Listing page size requested from the portal search endpoint.
const PAGE_SIZE: u32 = 100;

/// Pause between listing pages so the crawl stays polite.
const LISTING_DELAY: Duration = Duration::from_secs(1);

/// One row of the portal's search results.
#[derive(Debug, Clone)]
pub struct ListingEntry {
    pub title: String,
    pub url: Url,
    pub date: String,
    pub doc_type: String,
}

/// Raw text and heading metadata extracted from a single document page.
#[derive(Debug, Clone)]
pub struct DocumentText {
    pub text: String,
    pub title: String,
    pub year: String,
    pub number: String,
}

/// Walks the portal's paginated search listing and extracts document text.
#[derive(Debug, Clone)]
pub struct LegislationFetcher {
    client: Client,
    base_url: Url,
    category: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl LegislationFetcher {
    pub fn new(
        client: Client,
        base_url: Url,
        category: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            client,
            base_url,
            category: category.into(),
            start_date,
            end_date,
        }
    }

    /// Fetcher pointed at the live portal.
    pub fn for_portal(
        client: Client,
        category: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, PipelineError> {
        let base_url = Url::parse(BASE_URL)
            .map_err(|err| PipelineError::Config(format!("portal base url: {err}")))?;
        Ok(Self::new(client, base_url, category, start_date, end_date))
    }

    /// Collects every listing entry matching the configured filter.
    ///
    /// Pages are fetched in order until the first empty page. A page-level
    /// failure logs a warning and ends the listing with whatever was
    /// collected so far, so one bad page never aborts the run.
    pub async fn fetch_listing(&self) -> Vec<ListingEntry> {
        let mut entries = Vec::new();
        let mut page = 1u32;

        loop {
            match self.fetch_listing_page(page).await {
                Ok(page_entries) if page_entries.is_empty() => break,
                Ok(page_entries) => {
                    entries.extend(page_entries);
                    page += 1;
                    tokio::time::sleep(LISTING_DELAY).await;
                }
                Err(err) => {
                    warn!(page, error = %err, "listing page fetch failed, stopping pagination");
                    break;
                }
            }
        }

        entries
    }

    async fn fetch_listing_page(&self, page: u32) -> Result<Vec<ListingEntry>, PipelineError> {
        let search_url = self
            .base_url
            .join("/search")
            .map_err(|err| PipelineError::Config(format!("search url: {err}")))?;

        let params = [
            ("text", self.category.clone()),
            ("date.from", self.start_date.format("%Y-%m-%d").to_string()),
            ("date.to", self.end_date.format("%Y-%m-%d").to_string()),
            ("type", "legislation".to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        let response = self
            .client
            .get(search_url.clone())
            .query(&params)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| PipelineError::Fetch {
                url: search_url.to_string(),
                message: err.to_string(),
            })?;

        let body = response.text().await.map_err(|err| PipelineError::Fetch {
            url: search_url.to_string(),
            message: err.to_string(),
        })?;

        parse_listing(&self.base_url, &body)
    }

    /// Fetches one document and extracts its text and heading metadata.
    pub async fn fetch_document(&self, url: &Url) -> Result<DocumentText, PipelineError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| PipelineError::Fetch {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        let body = response.text().await.map_err(|err| PipelineError::Fetch {
            url: url.to_string(),
            message: err.to_string(),
        })?;

        parse_document(&body)
    }
}

fn selector(css: &str) -> Result<Selector, PipelineError> {
    Selector::parse(css)
        .map_err(|err| PipelineError::InvalidDocument(format!("selector '{css}': {err}")))
}

fn parse_listing(base_url: &Url, body: &str) -> Result<Vec<ListingEntry>, PipelineError> {
    let document = Html::parse_document(body);
    let result_sel = selector(".search-results .result")?;
    let title_sel = selector(".title")?;
    let link_sel = selector("a")?;
    let date_sel = selector(".date")?;
    let type_sel = selector(".type")?;

    let mut entries = Vec::new();
    for item in document.select(&result_sel) {
        let Some(title) = item.select(&title_sel).next() else {
            continue;
        };
        let Some(href) = item
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let Ok(url) = base_url.join(href) else {
            warn!(href, "skipping listing entry with unparseable href");
            continue;
        };

        entries.push(ListingEntry {
            title: element_text(title),
            url,
            date: item.select(&date_sel).next().map(element_text).unwrap_or_default(),
            doc_type: item.select(&type_sel).next().map(element_text).unwrap_or_default(),
        });
    }

    Ok(entries)
}

fn parse_document(body: &str) -> Result<DocumentText, PipelineError> {
    let document = Html::parse_document(body);
    let unwanted_sel = selector("img, .watermark, .annotation, .note, header, footer, nav")?;
    let content_sel = selector(".Legislation")?;
    let body_sel = selector("body")?;
    let h1_sel = selector("h1")?;
    let year_sel = selector(".year")?;
    let number_sel = selector(".number")?;

    let unwanted: HashSet<_> = document.select(&unwanted_sel).map(|el| el.id()).collect();

    let content = document
        .select(&content_sel)
        .next()
        .or_else(|| document.select(&body_sel).next());

    // Newline-separated text of every descendant text node, skipping nodes
    // whose ancestry passes through an excluded element.
    let text = match content {
        Some(root) => {
            let mut parts = Vec::new();
            for node in root.descendants() {
                if let Some(text) = node.value().as_text() {
                    if node.ancestors().any(|a| unwanted.contains(&a.id())) {
                        continue;
                    }
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        parts.push(trimmed.to_string());
                    }
                }
            }
            parts.join("\n")
        }
        None => String::new(),
    };

    let pick = |sel: &Selector| {
        document
            .select(sel)
            .next()
            .map(element_text)
            .unwrap_or_default()
    };

    Ok(DocumentText {
        text,
        title: pick(&h1_sel),
        year: pick(&year_sel),
        number: pick(&number_sel),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_parse_extracts_entries() {
        let base = Url::parse("https://www.legislation.gov.uk").unwrap();
        let body = r#"
            <div class="search-results">
                <div class="result">
                    <span class="title">The Town Planning Order 2024</span>
                    <a href="/uksi/2024/900/contents/made">contents</a>
                    <span class="date">2024-08-12</span>
                    <span class="type">UK Statutory Instruments</span>
                </div>
                <div class="result">
                    <span class="title">Untyped Entry</span>
                    <a href="/uksi/2024/901">contents</a>
                </div>
            </div>"#;

        let entries = parse_listing(&base, body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "The Town Planning Order 2024");
        assert_eq!(
            entries[0].url.as_str(),
            "https://www.legislation.gov.uk/uksi/2024/900/contents/made"
        );
        assert_eq!(entries[0].date, "2024-08-12");
        assert_eq!(entries[0].doc_type, "UK Statutory Instruments");
        assert_eq!(entries[1].date, "");
    }

    #[test]
    fn listing_parse_skips_results_without_title() {
        let base = Url::parse("https://www.legislation.gov.uk").unwrap();
        let body = r#"<div class="search-results"><div class="result"><a href="/x">x</a></div></div>"#;
        assert!(parse_listing(&base, body).unwrap().is_empty());
    }

    #[test]
    fn document_parse_prefers_legislation_container() {
        let body = r#"
            <html><body>
                <nav>Skip to content</nav>
                <h1>The Town Planning Order 2024</h1>
                <span class="year">2024</span>
                <span class="number">900</span>
                <div class="Legislation">
                    <p>Section 1.</p>
                    <div class="annotation">Editorial note to drop.</div>
                    <p>Section 2.</p>
                </div>
            </body></html>"#;

        let doc = parse_document(body).unwrap();
        assert_eq!(doc.title, "The Town Planning Order 2024");
        assert_eq!(doc.year, "2024");
        assert_eq!(doc.number, "900");
        assert_eq!(doc.text, "Section 1.\nSection 2.");
    }

    #[test]
    fn document_parse_falls_back_to_body_without_boilerplate() {
        let body = r#"
            <html><body>
                <header>Site header</header>
                <p>Plain content.</p>
                <footer>Site footer</footer>
            </body></html>"#;

        let doc = parse_document(body).unwrap();
        assert_eq!(doc.text, "Plain content.");
        assert_eq!(doc.title, "");
    }
}
