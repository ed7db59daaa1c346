// Typed client for the Zillow web service API

pub mod client;
pub mod request;
pub mod xml_response;

// Re-export key types for convenience
pub use client::{
    from_xml, ClientConfig, ClientError, Zillow, ZillowClient, ZillowError, DEFAULT_BASE_URL,
};
pub use request::{ChartRequest, CompsRequest, SearchRequest, ZestimateRequest, ZillowRequest};
pub use xml_response::{
    Address, ChartResult, Comp, CompsResult, Links, Message, Principal, Region, SearchResult,
    SearchResults, Value, ValueChange, Zestimate, ZestimateResult, ZillowResult,
};
