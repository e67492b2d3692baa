use crate::error::ParameterError;

/// CSV export URL for one tab of a Google sheet. The sheet must be shared
/// as readable-by-link for the export to succeed without credentials.
pub fn export_url(sheet_id: &str, gid: u64) -> String {
    format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
        sheet_id, gid
    )
}

#[tracing::instrument]
pub fn fetch_csv(url: &str) -> Result<String, ParameterError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ParameterError::Source(format!(
            "unsupported url scheme: {}",
            url
        )));
    }

    let response = reqwest::blocking::get(url)
        .map_err(|e| ParameterError::Source(format!("{}: {}", url, e)))?;
    let status = response.status();

    if status.is_client_error() {
        return Err(ParameterError::Source(format!(
            "{} rejected the request: {}",
            url, status
        )));
    }

    if !status.is_success() {
        return Err(ParameterError::Source(format!(
            "{} returned {}",
            url, status
        )));
    }

    response
        .text()
        .map_err(|e| ParameterError::Source(format!("{}: {}", url, e)))
}

#[test]
fn export_url_targets_the_csv_endpoint() {
    assert_eq!(
        export_url("1AbC", 1843234789),
        "https://docs.google.com/spreadsheets/d/1AbC/export?format=csv&gid=1843234789"
    );
}

#[test]
fn non_http_sources_are_rejected() {
    assert!(matches!(
        fetch_csv("ftp://example.com/rates.csv"),
        Err(ParameterError::Source(_))
    ));
}
