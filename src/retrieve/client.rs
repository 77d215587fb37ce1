use crate::retrieve::error::RetrieveError;
use crate::retrieve::index::{is_selected, parse_index, select_ranges, ByteRange};
use crate::retrieve::request::{FieldKey, RetrieveRequest};
use crate::retrieve::source::{DataSource, Model, Resolution};
use async_trait::async_trait;
use bon::Builder;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::header::RANGE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// Something that can turn a [`RetrieveRequest`] into a gridded file on disk.
///
/// [`ArchiveClient`] is the implementation talking to the real archive. Tests and offline
/// tooling can provide their own.
#[async_trait]
pub trait Archive: Send + Sync {
    /// Downloads every field matching `request` into `target`, replacing its contents.
    async fn fetch(
        &self,
        request: &RetrieveRequest,
        target: &Path,
    ) -> Result<RetrieveSummary, RetrieveError>;
}

/// What a successful [`Archive::fetch`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveSummary {
    pub target: PathBuf,
    /// Forecast files the fields were taken from, in download order.
    pub urls: Vec<String>,
    /// Number of GRIB messages written.
    pub fields: usize,
    pub size_bytes: u64,
}

/// Selects the archive mirror and model a client downloads from.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ClientOptions {
    #[builder(default)]
    pub source: DataSource,
    #[builder(default)]
    pub model: Model,
    #[builder(default)]
    pub resolution: Resolution,
    /// Visit forecast files in the order the request lists them instead of sorted order.
    #[builder(default)]
    pub preserve_request_order: bool,
    /// Pick the stream from model and cycle when the request doesn't name one.
    #[builder(default = true)]
    pub infer_stream_keyword: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions::builder().build()
    }
}

/// Client for the ECMWF open-data archive.
pub struct ArchiveClient {
    options: ClientOptions,
    download_client: Client,
}

impl ArchiveClient {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            download_client: Client::new(),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// URL of a forecast file without its extension.
    ///
    /// Layout: `{base}/{yyyymmdd}/{HH}z/{model}/{resol}/{stream}/{yyyymmdd}{HH}0000-{step}h-{stream}-{type}`
    pub(crate) fn file_url_stem(&self, key: &FieldKey, request: &RetrieveRequest) -> String {
        let date = key.date.format("%Y%m%d");
        let stream = request.stream.as_deref().unwrap_or_else(|| {
            self.options
                .model
                .default_stream(key.time, self.options.infer_stream_keyword)
        });
        format!(
            "{base}/{date}/{hour:02}z/{model}/{resol}/{stream}/{date}{hour:02}0000-{step}h-{stream}-{kind}",
            base = self.options.source.base_url(),
            hour = key.time,
            model = self.options.model.path_segment(),
            resol = self.options.resolution.path_segment(),
            step = key.step,
            kind = request.product_type,
        )
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response, RetrieveError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RetrieveError::NetworkRequest(url.to_string(), e))?;

        match response.error_for_status() {
            Ok(resp) => Ok(resp),
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                Err(if let Some(status) = e.status() {
                    RetrieveError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    RetrieveError::NetworkRequest(url.to_string(), e)
                })
            }
        }
    }

    async fn download_index(&self, url: &str) -> Result<String, RetrieveError> {
        debug!("Downloading index {}", url);
        let response = self.send(self.download_client.get(url), url).await?;
        response
            .text()
            .await
            .map_err(|e| RetrieveError::NetworkRequest(url.to_string(), e))
    }

    /// Streams one byte range of `url` to the end of `file`, returning the bytes written.
    async fn download_range(
        &self,
        url: &str,
        range: ByteRange,
        file: &mut fs::File,
    ) -> Result<u64, RetrieveError> {
        let builder = self
            .download_client
            .get(url)
            .header(RANGE, range.header_value());
        let response = self.send(builder, url).await?;
        if response.status() != StatusCode::PARTIAL_CONTENT {
            warn!(
                "{} ignored range {}, status {}",
                url,
                range.header_value(),
                response.status()
            );
            return Err(RetrieveError::RangeIgnored {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let written = tokio::io::copy(&mut reader, file)
            .await
            .map_err(|e| RetrieveError::DownloadIo(url.to_string(), e))?;

        if written != range.length {
            return Err(RetrieveError::LengthMismatch {
                url: url.to_string(),
                range: range.header_value(),
                expected: range.length,
                received: written,
            });
        }
        Ok(written)
    }
}

impl Default for ArchiveClient {
    fn default() -> Self {
        ArchiveClient::new(ClientOptions::default())
    }
}

#[async_trait]
impl Archive for ArchiveClient {
    async fn fetch(
        &self,
        request: &RetrieveRequest,
        target: &Path,
    ) -> Result<RetrieveSummary, RetrieveError> {
        request.validate(self.options.model)?;
        let keys = request.field_keys(self.options.preserve_request_order);
        info!(
            "Retrieving {:?} from {} forecast files ({} {} {}) into {}",
            request.params,
            keys.len(),
            self.options.source,
            self.options.model,
            self.options.resolution,
            target.display()
        );

        // Ranges are appended below, so start from an empty file.
        let mut file = fs::File::create(target)
            .await
            .map_err(|e| RetrieveError::TargetWrite(target.to_path_buf(), e))?;

        let mut summary = RetrieveSummary {
            target: target.to_path_buf(),
            urls: Vec::with_capacity(keys.len()),
            fields: 0,
            size_bytes: 0,
        };

        for key in keys {
            let stem = self.file_url_stem(&key, request);
            let index_url = format!("{stem}.index");
            let data_url = format!("{stem}.grib2");

            let index = self.download_index(&index_url).await?;
            let entries = parse_index(&index, &index_url)?;
            let matching = entries
                .iter()
                .filter(|e| is_selected(e, &request.params, &request.product_type))
                .count();
            let ranges = select_ranges(&entries, &request.params, &request.product_type);
            if ranges.is_empty() {
                return Err(RetrieveError::NoMatchingFields {
                    url: index_url,
                    params: request.params.clone(),
                });
            }

            for range in ranges {
                summary.size_bytes += self.download_range(&data_url, range, &mut file).await?;
            }
            summary.fields += matching;
            summary.urls.push(data_url);
        }

        file.flush()
            .await
            .map_err(|e| RetrieveError::TargetWrite(target.to_path_buf(), e))?;

        info!(
            "Retrieved {} fields ({} bytes) into {}",
            summary.fields,
            summary.size_bytes,
            target.display()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STEM: &str = "/20250601/00z/aifs-single/0p25/oper/20250601000000-0h-oper-fc";

    fn index_line(param: &str, offset: usize, length: usize) -> String {
        format!(
            r#"{{"date": "20250601", "time": "0000", "type": "fc", "stream": "oper", "step": "0", "levtype": "sfc", "param": "{param}", "_offset": {offset}, "_length": {length}}}"#
        )
    }

    fn client(base: String) -> ArchiveClient {
        ArchiveClient::new(
            ClientOptions::builder()
                .source(DataSource::Custom(base))
                .model(Model::AifsSingle)
                .build(),
        )
    }

    fn request(params: &[&str]) -> RetrieveRequest {
        RetrieveRequest::builder()
            .dates(vec![NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()])
            .times(vec![0])
            .steps(vec![0])
            .params(params.iter().map(|p| p.to_string()).collect())
            .build()
    }

    async fn mount_index(server: &MockServer, lines: &[String]) {
        Mock::given(method("GET"))
            .and(path(format!("{STEM}.index")))
            .respond_with(ResponseTemplate::new(200).set_body_string(lines.join("\n")))
            .mount(server)
            .await;
    }

    /// Answers a `Range` request for `data[start..end]` with 206.
    async fn mount_range(server: &MockServer, data: &[u8], start: usize, end: usize) {
        Mock::given(method("GET"))
            .and(path(format!("{STEM}.grib2")))
            .and(header("range", format!("bytes={}-{}", start, end - 1).as_str()))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(data[start..end].to_vec()))
            .mount(server)
            .await;
    }

    #[test]
    fn test_file_url_stem() {
        let client = ArchiveClient::new(
            ClientOptions::builder()
                .source(DataSource::Aws)
                .model(Model::Ifs)
                .build(),
        );
        let mut req = request(&["2t"]);
        let key = FieldKey {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            time: 6,
            step: 144,
        };
        assert_eq!(
            client.file_url_stem(&key, &req),
            "https://ecmwf-forecasts.s3.eu-central-1.amazonaws.com/20250601/06z/ifs/0p25/scda/20250601060000-144h-scda-fc"
        );

        req.stream = Some("oper".to_string());
        assert!(client
            .file_url_stem(&key, &req)
            .ends_with("/06z/ifs/0p25/oper/20250601060000-144h-oper-fc"));
    }

    #[tokio::test]
    async fn test_fetch_downloads_matching_ranges() -> Result<(), RetrieveError> {
        let server = MockServer::start().await;
        let data: Vec<u8> = (0..=255u8).cycle().take(300).collect();
        mount_index(
            &server,
            &[
                index_line("10u", 0, 100),
                index_line("2t", 100, 50),
                index_line("msl", 150, 150),
            ],
        )
        .await;
        mount_range(&server, &data, 100, 150).await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.grib2");
        let summary = client(server.uri()).fetch(&request(&["2t"]), &target).await?;

        assert_eq!(summary.fields, 1);
        assert_eq!(summary.size_bytes, 50);
        assert_eq!(summary.urls, vec![format!("{}{STEM}.grib2", server.uri())]);
        assert_eq!(std::fs::read(&target).unwrap(), data[100..150].to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_merges_adjacent_ranges() -> Result<(), RetrieveError> {
        let server = MockServer::start().await;
        let data: Vec<u8> = (0..200u8).collect();
        mount_index(
            &server,
            &[
                index_line("2t", 20, 30),
                index_line("2d", 50, 10),
                index_line("msl", 60, 40),
            ],
        )
        .await;
        mount_range(&server, &data, 20, 60).await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.grib2");
        let summary = client(server.uri())
            .fetch(&request(&["2t", "2d"]), &target)
            .await?;

        assert_eq!(summary.fields, 2);
        assert_eq!(std::fs::read(&target).unwrap(), data[20..60].to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_overwrites_target() -> Result<(), RetrieveError> {
        let server = MockServer::start().await;
        let data: Vec<u8> = (0..200u8).collect();
        mount_index(&server, &[index_line("2t", 20, 30), index_line("2d", 60, 10)]).await;
        mount_range(&server, &data, 20, 50).await;
        let client = client(server.uri());

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.grib2");
        std::fs::write(&target, vec![0xAA; 500]).unwrap();

        client.fetch(&request(&["2t"]), &target).await?;
        let first = std::fs::read(&target).unwrap();
        client.fetch(&request(&["2t"]), &target).await?;
        let second = std::fs::read(&target).unwrap();

        assert_eq!(first, data[20..50].to_vec());
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_rejects_full_body_for_range_request() {
        let server = MockServer::start().await;
        let data: Vec<u8> = (0..200u8).collect();
        mount_index(&server, &[index_line("2t", 20, 30)]).await;
        Mock::given(method("GET"))
            .and(path(format!("{STEM}.grib2")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(data))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let result = client(server.uri())
            .fetch(&request(&["2t"]), &dir.path().join("out.grib2"))
            .await;
        match result {
            Err(RetrieveError::RangeIgnored { status, .. }) => {
                assert_eq!(status, StatusCode::OK)
            }
            other => panic!("expected RangeIgnored, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_short_range_body() {
        let server = MockServer::start().await;
        let data: Vec<u8> = (0..200u8).collect();
        mount_index(&server, &[index_line("2t", 20, 30)]).await;
        Mock::given(method("GET"))
            .and(path(format!("{STEM}.grib2")))
            .and(header("range", "bytes=20-49"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(data[20..40].to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let result = client(server.uri())
            .fetch(&request(&["2t"]), &dir.path().join("out.grib2"))
            .await;
        match result {
            Err(RetrieveError::LengthMismatch {
                expected, received, ..
            }) => {
                assert_eq!(expected, 30);
                assert_eq!(received, 20);
            }
            other => panic!("expected LengthMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_missing_param_and_missing_run() {
        let server = MockServer::start().await;
        mount_index(&server, &[index_line("2t", 0, 10)]).await;
        let client = client(server.uri());
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.grib2");

        let missing_param = client.fetch(&request(&["tp"]), &target).await;
        assert!(matches!(
            missing_param,
            Err(RetrieveError::NoMatchingFields { .. })
        ));

        // Unmatched paths get a 404 from the mock server.
        let mut other_day = request(&["2t"]);
        other_day.dates = vec![NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()];
        let missing_run = client.fetch(&other_day, &target).await;
        match missing_run {
            Err(RetrieveError::HttpStatus { status, .. }) => {
                assert_eq!(status, StatusCode::NOT_FOUND)
            }
            other => panic!("expected 404, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_request_before_network() {
        let server = MockServer::start().await;
        let client = client(server.uri());
        let mut req = request(&["2t"]);
        req.steps = vec![7];
        let dir = tempfile::tempdir().unwrap();
        let result = client.fetch(&req, &dir.path().join("x.grib2")).await;
        assert!(matches!(result, Err(RetrieveError::InvalidRequest(_))));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    #[ignore = "downloads from the public archive"]
    async fn test_fetch_aifs_from_aws() -> Result<(), RetrieveError> {
        let client = ArchiveClient::default();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("aifs.grib2");
        let summary = client.fetch(&request(&["2t"]), &target).await?;
        assert_eq!(summary.fields, 1);
        assert!(summary.size_bytes > 0);
        Ok(())
    }
}
