use crate::request::{ChartRequest, CompsRequest, SearchRequest, ZestimateRequest};
use chrono::NaiveDate;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

// Format of the `last-updated` element
const LAST_UPDATED_FORMAT: &str = "%m/%d/%Y";

/// A top-level response document.
///
/// `ROOT` is the local name of the document element; a body whose root
/// differs belongs to another operation and must not be decoded.
pub trait ZillowResult: DeserializeOwned {
    const ROOT: &'static str;
}

// Empty numeric elements such as `<latitude/>` read as zero
fn empty_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    text.parse().map_err(D::Error::custom)
}

/// Status block embedded in every response.
///
/// The service reports application errors here with an HTTP 200, so a
/// non-zero `code` does not make the call fail. Callers inspect it.
#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct Message {
    pub text: String,
    pub code: i32,
    #[serde(rename = "limit-warning")]
    pub limit_warning: bool,
}

impl Message {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub zipcode: String,
    pub city: String,
    pub state: String,
    #[serde(deserialize_with = "empty_as_zero")]
    pub latitude: f64,
    #[serde(deserialize_with = "empty_as_zero")]
    pub longitude: f64,
}

/// Monetary amount with its currency attribute.
#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct Value {
    #[serde(rename = "@currency")]
    pub currency: String,
    #[serde(rename = "$value")]
    pub value: i64,
}

/// Change in value over `duration` days.
#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct ValueChange {
    #[serde(rename = "@duration")]
    pub duration: i32,
    #[serde(rename = "@currency")]
    pub currency: String,
    #[serde(rename = "$value")]
    pub value: i64,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct ValuationRange {
    pub low: Value,
    pub high: Value,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Zestimate {
    pub amount: Value,
    #[serde(rename = "last-updated")]
    pub last_updated: String,
    pub value_change: ValueChange,
    pub valuation_range: ValuationRange,
    pub percentile: String,
}

impl Zestimate {
    pub fn low(&self) -> &Value {
        &self.valuation_range.low
    }

    pub fn high(&self) -> &Value {
        &self.valuation_range.high
    }

    /// Parses `last-updated`, returning `None` when it is absent or not a
    /// `MM/DD/YYYY` date.
    pub fn last_updated_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.last_updated.trim(), LAST_UPDATED_FORMAT).ok()
    }
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct Links {
    #[serde(rename = "homedetails")]
    pub home_details: String,
    #[serde(rename = "graphsanddata")]
    pub graphs_and_data: String,
    #[serde(rename = "mapthishome")]
    pub map_this_home: String,
    #[serde(rename = "myzestimator")]
    pub my_zestimator: String,
    pub comparables: String,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegionLinks {
    pub overview: String,
    pub for_sale_by_owner: String,
    pub for_sale: String,
}

/// A neighborhood, city, county or state with its Zillow Home Value Index.
#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Region {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub region_type: String,
    #[serde(rename = "@name")]
    pub name: String,
    // Formatted by the service, e.g. "525,397"
    pub zindex_value: String,
    #[serde(deserialize_with = "empty_as_zero")]
    pub zindex_one_year_change: f64,
    pub links: RegionLinks,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct LocalRealEstate {
    #[serde(rename = "region")]
    pub regions: Vec<Region>,
}

/// Identifiers of the regions a property belongs to.
#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegionIds {
    pub zipcode_id: String,
    pub city_id: String,
    pub county_id: String,
    pub state_id: String,
}

// GetZestimate

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
#[serde(rename = "zestimate")]
pub struct ZestimateResult {
    pub request: ZestimateRequest,
    pub message: Message,
    pub response: ZestimateResponse,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZestimateResponse {
    pub zpid: String,
    pub links: Links,
    pub address: Address,
    pub zestimate: Zestimate,
    pub local_real_estate: LocalRealEstate,
    pub regions: RegionIds,
}

impl ZillowResult for ZestimateResult {
    const ROOT: &'static str = "zestimate";
}

impl ZestimateResult {
    pub fn zestimate(&self) -> &Zestimate {
        &self.response.zestimate
    }

    pub fn address(&self) -> &Address {
        &self.response.address
    }

    pub fn local_real_estate(&self) -> &[Region] {
        &self.response.local_real_estate.regions
    }
}

// GetSearchResults

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
#[serde(rename = "searchresults")]
pub struct SearchResults {
    pub request: SearchRequest,
    pub message: Message,
    pub response: SearchResponse,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct SearchResponse {
    pub results: SearchResultList,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct SearchResultList {
    #[serde(rename = "result")]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchResult {
    pub zpid: String,
    pub links: Links,
    pub address: Address,
    pub zestimate: Zestimate,
    pub local_real_estate: LocalRealEstate,
}

impl ZillowResult for SearchResults {
    const ROOT: &'static str = "searchresults";
}

impl SearchResults {
    pub fn results(&self) -> &[SearchResult] {
        &self.response.results.results
    }
}

// GetChart

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
#[serde(rename = "chart")]
pub struct ChartResult {
    pub request: ChartRequest,
    pub message: Message,
    pub response: ChartResponse,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct ChartResponse {
    pub url: String,
}

impl ZillowResult for ChartResult {
    const ROOT: &'static str = "chart";
}

impl ChartResult {
    pub fn url(&self) -> &str {
        &self.response.url
    }
}

// GetComps

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
#[serde(rename = "comps")]
pub struct CompsResult {
    pub request: CompsRequest,
    pub message: Message,
    pub response: CompsResponse,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct CompsResponse {
    pub properties: CompsProperties,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct CompsProperties {
    pub principal: Principal,
    pub comparables: Comparables,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct Principal {
    pub zpid: String,
    pub links: Links,
    pub address: Address,
    pub zestimate: Zestimate,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct Comparables {
    #[serde(rename = "comp")]
    pub comps: Vec<Comp>,
}

/// A comparable property, ranked by `score` (higher is more similar).
#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct Comp {
    #[serde(rename = "@score")]
    pub score: f64,
    pub zpid: String,
    pub links: Links,
    pub address: Address,
    pub zestimate: Zestimate,
}

impl ZillowResult for CompsResult {
    const ROOT: &'static str = "comps";
}

impl CompsResult {
    pub fn principal(&self) -> &Principal {
        &self.response.properties.principal
    }

    pub fn comparables(&self) -> &[Comp] {
        &self.response.properties.comparables.comps
    }
}

// Sample responses shipped with the crate
pub const SAMPLE_ZESTIMATE_XML: &str = include_str!("../samples/zestimate_response.xml");
pub const SAMPLE_SEARCH_XML: &str = include_str!("../samples/search_response.xml");
pub const SAMPLE_CHART_XML: &str = include_str!("../samples/chart_response.xml");
pub const SAMPLE_COMPS_XML: &str = include_str!("../samples/comps_response.xml");
pub const SAMPLE_ERROR_XML: &str = include_str!("../samples/error_response.xml");
