// Zillow web service client
use crate::request::{
    ChartRequest, CompsRequest, SearchRequest, ZestimateRequest, ZillowRequest, ZWS_ID_PARAM,
};
use crate::xml_response::{
    ChartResult, CompsResult, SearchResults, ZestimateResult, ZillowResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use quick_xml::DeError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "http://www.zillow.com/webservice/";

const USER_AGENT: &str = concat!("zillow-client/", env!("CARGO_PKG_VERSION"));

// Errors returned by an operation
#[derive(Error, Debug)]
pub enum ZillowError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("XML decode error: {0}")]
    Decode(#[from] DeError),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub zws_id: String,
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(zws_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            zws_id: zws_id.into(),
            timeout: None,
            user_agent: USER_AGENT.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The supported Zillow operations.
///
/// A successful result may still carry an application error in its
/// `message` block; only transport and decode failures are `Err`.
#[async_trait]
pub trait Zillow: Send + Sync {
    // Home valuation
    async fn get_zestimate(&self, request: ZestimateRequest)
        -> Result<ZestimateResult, ZillowError>;

    async fn get_search_results(&self, request: SearchRequest)
        -> Result<SearchResults, ZillowError>;

    async fn get_chart(&self, request: ChartRequest) -> Result<ChartResult, ZillowError>;

    async fn get_comps(&self, request: CompsRequest) -> Result<CompsResult, ZillowError>;
}

pub struct ZillowClient {
    http: reqwest::Client,
    base_url: String,
    zws_id: String,
}

// The API key stays out of debug output
impl fmt::Debug for ZillowClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZillowClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ZillowClient {
    /// Creates a client for the default service URL.
    pub fn new(zws_id: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_config(ClientConfig::new(zws_id))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url: config.base_url,
            zws_id: config.zws_id,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // `<base-url>/<path>.htm`, tolerating a trailing slash on the base
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}.htm", self.base_url.trim_end_matches('/'), path)
    }

    /// Full query for `request`, API key first.
    pub fn query<R: ZillowRequest>(&self, request: &R) -> Vec<(&'static str, String)> {
        let mut query = vec![(ZWS_ID_PARAM, self.zws_id.clone())];
        query.extend(request.params());
        query
    }

    /// Sends `request` and decodes the body into its result type.
    pub async fn get<R: ZillowRequest>(&self, request: &R) -> Result<R::Output, ZillowError> {
        let url = self.endpoint(R::PATH);
        debug!(path = R::PATH, "Sending request");

        let response = self
            .http
            .get(&url)
            .query(&self.query(request))
            .send()
            .await
            .map_err(|e| {
                warn!(path = R::PATH, error = %e, "Request failed");
                e
            })?;

        let status = response.status();
        let body = response.error_for_status()?.bytes().await?;
        debug!(path = R::PATH, %status, bytes = body.len(), "Received response");

        from_xml(&body).map_err(|e| {
            warn!(path = R::PATH, error = %e, "Failed to decode response");
            e
        })
    }
}

#[async_trait]
impl Zillow for ZillowClient {
    async fn get_zestimate(
        &self,
        request: ZestimateRequest,
    ) -> Result<ZestimateResult, ZillowError> {
        self.get(&request).await
    }

    async fn get_search_results(
        &self,
        request: SearchRequest,
    ) -> Result<SearchResults, ZillowError> {
        self.get(&request).await
    }

    async fn get_chart(&self, request: ChartRequest) -> Result<ChartResult, ZillowError> {
        self.get(&request).await
    }

    async fn get_comps(&self, request: CompsRequest) -> Result<CompsResult, ZillowError> {
        self.get(&request).await
    }
}

/// Decodes a response body. Invalid UTF-8, malformed XML, a document
/// element other than `T::ROOT` and values that do not fit the target type
/// are all decode errors.
pub fn from_xml<T: ZillowResult>(body: &Bytes) -> Result<T, ZillowError> {
    check_root(body, T::ROOT)?;
    Ok(quick_xml::de::from_reader(body.as_ref())?)
}

// Compares the local name of the document element, so `Comps:comps`
// matches `comps`. An empty document is left to the deserializer.
fn check_root(body: &[u8], expected: &str) -> Result<(), DeError> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();

    let found = loop {
        let name = match reader.read_event_into(&mut buf).map_err(DeError::InvalidXml)? {
            Event::Start(e) | Event::Empty(e) => Some(e.local_name().as_ref().to_vec()),
            Event::Eof => return Ok(()),
            _ => None,
        };
        match name {
            Some(name) => break name,
            None => buf.clear(),
        }
    };

    if found == expected.as_bytes() {
        Ok(())
    } else {
        Err(DeError::Custom(format!(
            "expected element <{}> but found <{}>",
            expected,
            String::from_utf8_lossy(&found)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_response::{
        SAMPLE_CHART_XML, SAMPLE_COMPS_XML, SAMPLE_ERROR_XML, SAMPLE_SEARCH_XML,
        SAMPLE_ZESTIMATE_XML,
    };
    use mockito::{Matcher, Server};
    use test_case::test_case;

    fn client_for(server: &Server) -> ZillowClient {
        let config = ClientConfig::new("X1-test-key").with_base_url(server.url());
        ZillowClient::with_config(config).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> Matcher {
        Matcher::AllOf(
            pairs
                .iter()
                .map(|(k, v)| Matcher::UrlEncoded(k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_new_uses_default_base_url() {
        let client = ZillowClient::new("X1-test-key").unwrap();

        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(
            client.endpoint("GetZestimate"),
            "http://www.zillow.com/webservice/GetZestimate.htm"
        );
    }

    #[test]
    fn test_query_puts_api_key_first() {
        let client = ZillowClient::new("X1-test-key").unwrap();
        let query = client.query(&ZestimateRequest::new("48749425"));

        assert_eq!(
            query,
            vec![
                ("zws-Id", "X1-test-key".to_string()),
                ("zpid", "48749425".to_string()),
                ("rentzestimate", "false".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_zestimate() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/GetZestimate.htm")
            .match_query(params(&[
                ("zws-Id", "X1-test-key"),
                ("zpid", "48749425"),
                ("rentzestimate", "false"),
            ]))
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(SAMPLE_ZESTIMATE_XML)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client
            .get_zestimate(ZestimateRequest::new("48749425"))
            .await
            .unwrap();

        mock.assert_async().await;
        let zestimate = result.zestimate();
        assert_eq!(zestimate.amount.value, 258000);
        assert_eq!(zestimate.amount.currency, "USD");
        assert_eq!(zestimate.low().value, 231000);
        assert_eq!(zestimate.high().value, 278000);
    }

    #[tokio::test]
    async fn test_get_search_results() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/GetSearchResults.htm")
            .match_query(params(&[
                ("zws-Id", "X1-test-key"),
                ("address", "2114 Bigelow Ave"),
                ("citystatezip", "Seattle, WA"),
                ("rentzestimate", "true"),
            ]))
            .with_body(SAMPLE_SEARCH_XML)
            .create_async()
            .await;

        let client = client_for(&server);
        let request = SearchRequest::new("2114 Bigelow Ave", "Seattle, WA").with_rent_zestimate(true);
        let result = client.get_search_results(request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.results().len(), 2);
        assert_eq!(result.results()[0].zpid, "48749425");
    }

    #[tokio::test]
    async fn test_get_chart() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/GetChart.htm")
            .match_query(params(&[
                ("zws-Id", "X1-test-key"),
                ("zpid", "48749425"),
                ("unit-type", "percent"),
                ("width", "300"),
                ("height", "150"),
                ("chartDuration", "5years"),
            ]))
            .with_body(SAMPLE_CHART_XML)
            .create_async()
            .await;

        let client = client_for(&server);
        let request = ChartRequest {
            zpid: "48749425".to_string(),
            unit_type: "percent".to_string(),
            width: 300,
            height: 150,
            duration: "5years".to_string(),
        };
        let result = client.get_chart(request).await.unwrap();

        mock.assert_async().await;
        assert!(result.url().contains("chartDuration=5years"));
    }

    #[tokio::test]
    async fn test_get_comps() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/GetComps.htm")
            .match_query(params(&[
                ("zws-Id", "X1-test-key"),
                ("zpid", "48749425"),
                ("count", "5"),
                ("rentzestimate", "false"),
            ]))
            .with_body(SAMPLE_COMPS_XML)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client
            .get_comps(CompsRequest::new("48749425", 5))
            .await
            .unwrap();

        mock.assert_async().await;
        let comps = result.comparables();
        assert_eq!(comps.len(), 5);
        assert_eq!(comps[0].zpid, "48749427");
        assert_eq!(comps[0].score, 5.0);
        assert_eq!(comps[4].zpid, "48689978");
        assert_eq!(comps[4].score, 2.25);
    }

    #[tokio::test]
    async fn test_embedded_error_is_not_an_err() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/GetZestimate.htm")
            .match_query(Matcher::Any)
            .with_body(SAMPLE_ERROR_XML)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client
            .get_zestimate(ZestimateRequest::new("0"))
            .await
            .unwrap();

        assert_eq!(result.message.code, 2);
        assert!(!result.message.is_success());
    }

    #[test_case("" ; "empty body")]
    #[test_case("<zestimate><response><zestimate>" ; "truncated document")]
    #[test_case("<zestimate><message></zestimate>" ; "mismatched end tag")]
    #[test_case(r#"<zestimate><response><zestimate><amount currency="USD">lots</amount></zestimate></response></zestimate>"# ; "non numeric amount")]
    #[test_case(SAMPLE_COMPS_XML ; "wrong root")]
    #[test_case("<html><body>oops</body></html>" ; "html page")]
    #[test_case("<!DOCTYPE html>\n<html><head><title>Error</title></head></html>" ; "html page with doctype")]
    fn test_malformed_body_is_decode_error(body: &str) {
        let result: Result<ZestimateResult, _> = from_xml(&Bytes::from(body.to_string()));

        assert!(matches!(result, Err(ZillowError::Decode(_))));
    }

    #[test]
    fn test_root_check_accepts_prefixed_root() {
        let body = Bytes::from_static(SAMPLE_COMPS_XML.as_bytes());
        let result: CompsResult = from_xml(&body).unwrap();

        assert_eq!(result.comparables().len(), 5);
    }

    #[test]
    fn test_root_mismatch_names_both_elements() {
        let body = Bytes::from_static(SAMPLE_CHART_XML.as_bytes());
        let err = from_xml::<SearchResults>(&body).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("<searchresults>"));
        assert!(message.contains("<chart>"));
    }

    #[tokio::test]
    async fn test_response_for_other_operation_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/GetZestimate.htm")
            .match_query(Matcher::Any)
            .with_body(SAMPLE_COMPS_XML)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.get_zestimate(ZestimateRequest::new("48749425")).await;

        assert!(matches!(result, Err(ZillowError::Decode(_))));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = ZillowClient::new("X1-secret-key").unwrap();
        let output = format!("{:?}", client);

        assert!(output.contains("ZillowClient"));
        assert!(output.contains(DEFAULT_BASE_URL));
        assert!(!output.contains("X1-secret-key"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/GetComps.htm")
            .match_query(Matcher::Any)
            .with_body("<comps><response><properties>")
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.get_comps(CompsRequest::new("48749425", 5)).await;

        assert!(matches!(result, Err(ZillowError::Decode(_))));
    }

    #[tokio::test]
    async fn test_server_error_status_is_transport_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/GetChart.htm")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.get_chart(ChartRequest::default()).await;

        assert!(matches!(result, Err(ZillowError::Transport(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 1 is reserved and nothing listens on it
        let config = ClientConfig::new("X1-test-key").with_base_url("http://127.0.0.1:1");
        let client = ZillowClient::with_config(config).unwrap();

        let result = client.get_zestimate(ZestimateRequest::new("48749425")).await;

        match result {
            Err(ZillowError::Transport(e)) => assert!(e.is_connect()),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_client() {
        let mut server = Server::new_async().await;
        let zestimate_mock = server
            .mock("GET", "/GetZestimate.htm")
            .match_query(Matcher::Any)
            .with_body(SAMPLE_ZESTIMATE_XML)
            .expect(2)
            .create_async()
            .await;
        let _comps_mock = server
            .mock("GET", "/GetComps.htm")
            .match_query(Matcher::Any)
            .with_body(SAMPLE_COMPS_XML)
            .create_async()
            .await;

        let client = client_for(&server);
        let (a, b, c) = tokio::join!(
            client.get_zestimate(ZestimateRequest::new("48749425")),
            client.get_zestimate(ZestimateRequest::new("48749425")),
            client.get_comps(CompsRequest::new("48749425", 5)),
        );

        zestimate_mock.assert_async().await;
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(c.unwrap().comparables().len(), 5);
    }
}
