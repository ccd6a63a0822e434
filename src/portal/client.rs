// src/portal/client.rs
use crate::utils::error::PortalError;
use reqwest::header;
use std::time::Duration;

const PORTAL_USER_AGENT: &str = "ics-extractor research pipeline (contact: maintainer)";
// The portal needs a moment between navigations; the original pipeline used
// a fixed one second settle delay per page.
const PAGE_SETTLE_DELAY_MS: u64 = 1000;

/// Creates a reqwest client configured for portal interaction.
pub fn build_portal_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(PORTAL_USER_AGENT)
        .build()
}

/// URL of a case study page on the results portal.
pub fn case_study_url(base_url: &str, case_study: &str) -> String {
    if base_url.ends_with('/') {
        format!("{}{}", base_url, case_study)
    } else {
        format!("{}/{}", base_url, case_study)
    }
}

/// Resolves a (possibly relative) PDF href against the portal base URL.
pub fn resolve_pdf_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    // Site-relative hrefs resolve against the portal origin
    let origin = base_url
        .find("://")
        .and_then(|scheme_end| {
            base_url[scheme_end + 3..]
                .find('/')
                .map(|path_start| &base_url[..scheme_end + 3 + path_start])
        })
        .unwrap_or(base_url);
    format!("{}/{}", origin.trim_end_matches('/'), href.trim_start_matches('/'))
}

/// Fetches a case study page as HTML, with the settle delay applied first.
pub async fn fetch_case_study_page(
    client: &reqwest::Client,
    base_url: &str,
    case_study: &str,
) -> Result<String, PortalError> {
    let url = case_study_url(base_url, case_study);
    tracing::info!("Fetching case study page: {}", url);

    tokio::time::sleep(Duration::from_millis(PAGE_SETTLE_DELAY_MS)).await;

    let response = client
        .get(&url)
        .header(header::ACCEPT, "text/html,*/*")
        .send()
        .await?; // Propagates reqwest::Error as PortalError::Network

    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        if status == reqwest::StatusCode::FORBIDDEN {
            tracing::warn!("Received 403 Forbidden - check User-Agent and request pacing.");
            return Err(PortalError::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PortalError::PageNotFound(case_study.to_string()));
        }
        return Err(PortalError::Http(status));
    }

    let body = response.text().await?;
    tracing::debug!("Downloaded {} bytes from {}", body.len(), url);

    Ok(body)
}

/// Downloads the case study PDF bytes.
pub async fn download_pdf(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, PortalError> {
    tracing::info!("Downloading case study PDF: {}", url);

    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PortalError::PageNotFound(url.to_string()));
        }
        return Err(PortalError::Http(status));
    }

    let bytes = response.bytes().await?;
    tracing::debug!("Downloaded {} PDF bytes from {}", bytes.len(), url);

    Ok(bytes.to_vec())
}
