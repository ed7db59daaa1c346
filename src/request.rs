// Request types for the supported Zillow operations
use crate::xml_response::{ChartResult, CompsResult, SearchResults, ZestimateResult, ZillowResult};
use serde::{Deserialize, Serialize};

// Query parameter names used by the web service
pub const ZWS_ID_PARAM: &str = "zws-Id";
pub const ZPID_PARAM: &str = "zpid";
pub const RENT_ZESTIMATE_PARAM: &str = "rentzestimate";
pub const ADDRESS_PARAM: &str = "address";
pub const CITY_STATE_ZIP_PARAM: &str = "citystatezip";
pub const UNIT_TYPE_PARAM: &str = "unit-type";
pub const WIDTH_PARAM: &str = "width";
pub const HEIGHT_PARAM: &str = "height";
pub const CHART_DURATION_PARAM: &str = "chartDuration";
pub const COUNT_PARAM: &str = "count";

/// A typed request for one web service operation.
///
/// Implementors know the service path they are sent to, the query
/// parameters they carry and the result type the response decodes into.
/// The API key is added by the client and is not part of `params`.
pub trait ZillowRequest {
    /// Service path without the `.htm` suffix, e.g. `GetZestimate`.
    const PATH: &'static str;

    type Output: ZillowResult;

    fn params(&self) -> Vec<(&'static str, String)>;
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ZestimateRequest {
    pub zpid: String,
    #[serde(rename = "rentzestimate")]
    pub rent_zestimate: bool,
}

impl ZestimateRequest {
    pub fn new(zpid: impl Into<String>) -> Self {
        Self {
            zpid: zpid.into(),
            rent_zestimate: false,
        }
    }

    pub fn with_rent_zestimate(mut self, rent_zestimate: bool) -> Self {
        self.rent_zestimate = rent_zestimate;
        self
    }
}

impl ZillowRequest for ZestimateRequest {
    const PATH: &'static str = "GetZestimate";
    type Output = ZestimateResult;

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            (ZPID_PARAM, self.zpid.clone()),
            (RENT_ZESTIMATE_PARAM, self.rent_zestimate.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchRequest {
    pub address: String,
    #[serde(rename = "citystatezip")]
    pub city_state_zip: String,
    #[serde(rename = "rentzestimate")]
    pub rent_zestimate: bool,
}

impl SearchRequest {
    pub fn new(address: impl Into<String>, city_state_zip: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            city_state_zip: city_state_zip.into(),
            rent_zestimate: false,
        }
    }

    pub fn with_rent_zestimate(mut self, rent_zestimate: bool) -> Self {
        self.rent_zestimate = rent_zestimate;
        self
    }
}

impl ZillowRequest for SearchRequest {
    const PATH: &'static str = "GetSearchResults";
    type Output = SearchResults;

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            (ADDRESS_PARAM, self.address.clone()),
            (CITY_STATE_ZIP_PARAM, self.city_state_zip.clone()),
            (RENT_ZESTIMATE_PARAM, self.rent_zestimate.to_string()),
        ]
    }
}

/// Chart request. `unit_type` is `dollar` or `percent`; `duration` is one
/// of the service's duration codes such as `1year`, `5years` or `10years`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartRequest {
    pub zpid: String,
    #[serde(rename = "unit-type")]
    pub unit_type: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "chartDuration")]
    pub duration: String,
}

impl ZillowRequest for ChartRequest {
    const PATH: &'static str = "GetChart";
    type Output = ChartResult;

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            (ZPID_PARAM, self.zpid.clone()),
            (UNIT_TYPE_PARAM, self.unit_type.clone()),
            (WIDTH_PARAM, self.width.to_string()),
            (HEIGHT_PARAM, self.height.to_string()),
            (CHART_DURATION_PARAM, self.duration.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CompsRequest {
    pub zpid: String,
    pub count: u32,
    #[serde(rename = "rentzestimate")]
    pub rent_zestimate: bool,
}

impl CompsRequest {
    pub fn new(zpid: impl Into<String>, count: u32) -> Self {
        Self {
            zpid: zpid.into(),
            count,
            rent_zestimate: false,
        }
    }

    pub fn with_rent_zestimate(mut self, rent_zestimate: bool) -> Self {
        self.rent_zestimate = rent_zestimate;
        self
    }
}

impl ZillowRequest for CompsRequest {
    const PATH: &'static str = "GetComps";
    type Output = CompsResult;

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            (ZPID_PARAM, self.zpid.clone()),
            (COUNT_PARAM, self.count.to_string()),
            (RENT_ZESTIMATE_PARAM, self.rent_zestimate.to_string()),
        ]
    }
}
