use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use haraj_core::SiteOrigin;
use haraj_rules::RulesLoader;
use haraj_scraper::{
    DetailFetcher, ListingAssembler, ListingExtractor, Renderer, RetryPolicy, ScrapeError,
    ScrapeOrchestrator, SectionDiscoverer,
};
use haraj_server::{create_router, AppState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const CARS: &str = "https://haraj.com.sa/tags/cars";
const FURNITURE: &str = "https://haraj.com.sa/tags/furniture";
const EMPTY: &str = "https://haraj.com.sa/tags/empty";
const HOME: &str = "https://haraj.com.sa";

struct CannedRenderer {
    pages: HashMap<String, String>,
}

#[async_trait]
impl Renderer for CannedRenderer {
    async fn render(&self, url: &str, _cancel: &CancellationToken) -> haraj_scraper::Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::RenderTimeout {
                url: url.to_string(),
                waited: Duration::from_secs(20),
            })
    }
}

struct OfflineFetcher;

#[async_trait]
impl DetailFetcher for OfflineFetcher {
    async fn fetch(&self, url: &str) -> haraj_scraper::Result<String> {
        Err(ScrapeError::HttpFailure {
            url: url.to_string(),
            reason: "offline".to_string(),
        })
    }
}

fn card(href: &str, title: &str) -> String {
    format!(
        r#"<div><a href="{href}"><h3>{title}</h3></a>
           <div class="mb-8 flex w-full justify-end px-2"><strong>100 SAR</strong></div>
           <span class="city">Riyadh</span>
           <button data-testid="post-contact">0551234567</button>
           <article data-testid="post-article">Body, with comma</article>
           <a data-testid="post-author">Seller</a></div>"#
    )
}

fn app() -> Router {
    let homepage = r#"
        <div class="custom-scroll flex max-w-full flex-nowrap overflow-x-auto items-center">
          <a href="/tags/cars">Cars</a><a href="/tags/furniture">Furniture</a>
        </div>"#;
    let pages = HashMap::from([
        (HOME.to_string(), homepage.to_string()),
        (CARS.to_string(), card("/1/camry", "Camry") + &card("/2/yaris", "Yaris")),
        (FURNITURE.to_string(), card("/3/sofa", "Sofa")),
        (EMPTY.to_string(), "<p>nothing</p>".to_string()),
    ]);

    let rules = RulesLoader::builtin().expect("builtin rules");
    let origin = SiteOrigin::new(HOME).expect("origin");
    let extractor = Arc::new(ListingExtractor::new(&rules, origin.clone()).expect("extractor"));
    let assembler = ListingAssembler::new(
        extractor,
        Arc::new(OfflineFetcher),
        RetryPolicy {
            max_attempts: 1,
            delay: Duration::ZERO,
        },
    );
    let discoverer = SectionDiscoverer::new(&rules.sections, origin).expect("discoverer");
    let orchestrator = ScrapeOrchestrator::new(
        Arc::new(CannedRenderer { pages }),
        Arc::new(assembler),
        discoverer,
    );

    create_router(AppState::new(orchestrator))
}

async fn get(uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = get(uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, json) = get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_scrape_data_returns_publications() {
    let (status, json) = get_json(&format!("/api/scraper/scrape-data?url={CARS}")).await;

    assert_eq!(status, StatusCode::OK);
    let publications = json["publications"].as_array().unwrap();
    assert_eq!(publications.len(), 2);
    assert_eq!(publications[0]["title"], "Camry");
    assert_eq!(publications[0]["url"], "https://haraj.com.sa/1/camry");
    assert_eq!(publications[0]["authorName"], "Seller");
    assert_eq!(json["pages"][0]["status"], "complete");
}

#[tokio::test]
async fn test_missing_or_blank_parameter_is_bad_request() {
    for uri in [
        "/api/scraper/scrape-data",
        "/api/scraper/scrape-data?url=%20",
        "/api/scraper/export-csv",
        "/api/scraper/export-excel?url=",
        "/api/scraper/scrape-multi?urls=,%20,",
        "/api/scraper/export-csv-multi",
        "/api/scraper/export-excel-multi",
        "/api/scraper/scrape-all",
        "/api/scraper/export-csv-all?homepageUrl=",
        "/api/scraper/export-excel-all",
    ] {
        let (status, json) = get_json(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_no_listings_is_not_found_with_page_outcomes() {
    let (status, json) =
        get_json(&format!("/api/scraper/scrape-multi?urls={EMPTY},https://haraj.com.sa/tags/broken")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "no data found");
    assert_eq!(json["pages"][0]["status"], "empty");
    assert_eq!(json["pages"][1]["status"], "failed");
}

#[tokio::test]
async fn test_scrape_multi_splits_and_trims() {
    let (status, json) =
        get_json(&format!("/api/scraper/scrape-multi?urls=%20{CARS}%20,,{FURNITURE}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["publications"].as_array().unwrap().len(), 3);
    assert_eq!(json["publications"][2]["title"], "Sofa");
}

#[tokio::test]
async fn test_scrape_all_walks_sections() {
    let (status, json) = get_json(&format!("/api/scraper/scrape-all?homepageUrl={HOME}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pages"].as_array().unwrap().len(), 2);
    assert_eq!(json["publications"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_scrape_all_homepage_failure_is_not_found() {
    let (status, json) = get_json(
        "/api/scraper/scrape-all?homepageUrl=https://haraj.com.sa/missing-home",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["discoveryError"].is_string());
}

#[tokio::test]
async fn test_export_csv_is_attachment() {
    let (status, headers, body) = get(&format!("/api/scraper/export-csv?url={CARS}")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("publications.csv"));

    let text = String::from_utf8(body).unwrap();
    let text = text.strip_prefix('\u{feff}').expect("byte order mark");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Title,Price,URL,Location,Phone,Description,Name");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("Camry,100 SAR,https://haraj.com.sa/1/camry,Riyadh,0551234567,"));
    assert!(lines[1].contains("\"Body, with comma\""));
}

#[tokio::test]
async fn test_export_csv_all_without_listings_is_not_found() {
    let (status, _, _) = get("/api/scraper/export-csv-all?homepageUrl=https://haraj.com.sa/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_excel_is_workbook_attachment() {
    let (status, headers, body) = get(&format!("/api/scraper/export-excel?url={CARS}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE].to_str().unwrap(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("publications.xlsx"));
    assert!(body.starts_with(b"PK\x03\x04"));
}

#[tokio::test]
async fn test_export_excel_multi_and_all() {
    let (status, _, body) =
        get(&format!("/api/scraper/export-excel-multi?urls={CARS},{FURNITURE}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with(b"PK"));

    let (status, _, _) = get(&format!("/api/scraper/export-excel-all?homepageUrl={HOME}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) =
        get("/api/scraper/export-excel-all?homepageUrl=https://haraj.com.sa/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
