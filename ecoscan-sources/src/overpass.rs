//! Green spaces and sustainability infrastructure from OpenStreetMap via
//! the Overpass API.

use crate::{
    coordinate::GeoQuery,
    error::{Result, SourceError},
    records::{GreenSpace, GreenSpaceKind, InfrastructureKind, InfrastructureSite},
};
use serde::Deserialize;
use std::collections::HashMap;

#[cfg(feature = "api")]
use crate::{http::HttpClient, source::Source};
#[cfg(feature = "api")]
use async_trait::async_trait;

pub const OVERPASS_PRIMARY_URL: &str = "https://overpass-api.de/api/interpreter";
pub const OVERPASS_MIRROR_URL: &str = "https://overpass.kumi.systems/api/interpreter";

/// Upper bound on features returned per query.
const MAX_ELEMENTS: usize = 100;
const QUERY_TIMEOUT_SECS: u32 = 25;

#[derive(Debug, Clone, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl OverpassElement {
    /// Nodes carry their own position; ways and relations carry a center.
    fn position(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => Some((lat, lon)),
            (_, _, Some(c)) => Some((c.lat, c.lon)),
            _ => None,
        }
    }

    fn osm_id(&self) -> String {
        format!("{}/{}", self.element_type, self.id)
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

fn around(query: &GeoQuery) -> String {
    format!(
        "(around:{:.0},{:.5},{:.5})",
        query.radius_meters, query.center.lat, query.center.lng
    )
}

/// Overpass QL for parks, gardens, reserves, playgrounds and woods.
pub fn green_space_query(query: &GeoQuery) -> String {
    let around = around(query);
    format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}];(\
nwr[\"leisure\"~\"^(park|garden|nature_reserve|playground)$\"]{around};\
nwr[\"landuse\"=\"forest\"]{around};\
nwr[\"natural\"=\"wood\"]{around};\
);out center {MAX_ELEMENTS};"
    )
}

/// Overpass QL for chargers, bike share, bus stops, recycling and water.
pub fn infrastructure_query(query: &GeoQuery) -> String {
    let around = around(query);
    format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}];(\
nwr[\"amenity\"~\"^(charging_station|bicycle_rental|recycling|drinking_water)$\"]{around};\
node[\"highway\"=\"bus_stop\"]{around};\
);out center {MAX_ELEMENTS};"
    )
}

fn green_space_kind(element: &OverpassElement) -> Option<GreenSpaceKind> {
    match (element.tag("leisure"), element.tag("landuse"), element.tag("natural")) {
        (Some("park"), _, _) => Some(GreenSpaceKind::Park),
        (Some("garden"), _, _) => Some(GreenSpaceKind::Garden),
        (Some("nature_reserve"), _, _) => Some(GreenSpaceKind::NatureReserve),
        (Some("playground"), _, _) => Some(GreenSpaceKind::Playground),
        (_, Some("forest"), _) | (_, _, Some("wood")) => Some(GreenSpaceKind::Forest),
        _ => None,
    }
}

fn infrastructure_kind(element: &OverpassElement) -> Option<InfrastructureKind> {
    match (element.tag("amenity"), element.tag("highway")) {
        (Some("charging_station"), _) => Some(InfrastructureKind::EvCharging),
        (Some("bicycle_rental"), _) => Some(InfrastructureKind::BikeShare),
        (Some("recycling"), _) => Some(InfrastructureKind::Recycling),
        (Some("drinking_water"), _) => Some(InfrastructureKind::DrinkingWater),
        (_, Some("bus_stop")) => Some(InfrastructureKind::TransitStop),
        _ => None,
    }
}

fn parse_elements(body: &str, query: &GeoQuery) -> Result<Vec<OverpassElement>> {
    let response: OverpassResponse = serde_json::from_str(body)?;
    if response.elements.is_empty() {
        return Err(SourceError::NoData {
            lat: query.center.lat,
            lng: query.center.lng,
        });
    }
    Ok(response.elements)
}

/// Parse an Overpass JSON body into green spaces. Unnamed features are
/// named after their kind.
pub fn parse_green_spaces(body: &str, query: &GeoQuery) -> Result<Vec<GreenSpace>> {
    let spaces: Vec<GreenSpace> = parse_elements(body, query)?
        .into_iter()
        .filter_map(|element| {
            let kind = green_space_kind(&element)?;
            let (lat, lng) = element.position()?;
            Some(GreenSpace {
                id: element.osm_id(),
                name: element
                    .tag("name")
                    .map(str::to_string)
                    .unwrap_or_else(|| kind.label().to_string()),
                kind,
                lat,
                lng,
            })
        })
        .collect();
    if spaces.is_empty() {
        return Err(SourceError::InvalidFormat(
            "no recognizable green spaces in response".to_string(),
        ));
    }
    Ok(spaces)
}

/// Parse an Overpass JSON body into infrastructure sites.
pub fn parse_infrastructure(body: &str, query: &GeoQuery) -> Result<Vec<InfrastructureSite>> {
    let sites: Vec<InfrastructureSite> = parse_elements(body, query)?
        .into_iter()
        .filter_map(|element| {
            let kind = infrastructure_kind(&element)?;
            let (lat, lng) = element.position()?;
            let name = element
                .tag("name")
                .or_else(|| element.tag("operator"))
                .map(str::to_string)
                .unwrap_or_else(|| kind.label().to_string());
            Some(InfrastructureSite {
                id: element.osm_id(),
                name,
                kind,
                lat,
                lng,
            })
        })
        .collect();
    if sites.is_empty() {
        return Err(SourceError::InvalidFormat(
            "no recognizable infrastructure in response".to_string(),
        ));
    }
    Ok(sites)
}

/// Green spaces from one Overpass endpoint.
#[cfg(feature = "api")]
pub struct OverpassGreenSpaceSource {
    client: HttpClient,
    endpoint: String,
    name: &'static str,
}

#[cfg(feature = "api")]
impl OverpassGreenSpaceSource {
    pub fn new(client: HttpClient, endpoint: impl Into<String>, name: &'static str) -> Self {
        OverpassGreenSpaceSource {
            client,
            endpoint: endpoint.into(),
            name,
        }
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl Source<Vec<GreenSpace>> for OverpassGreenSpaceSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, query: &GeoQuery) -> Result<Vec<GreenSpace>> {
        let ql = green_space_query(query);
        let body = self
            .client
            .post_form(self.name, &self.endpoint, &[("data", ql.as_str())])
            .await?;
        parse_green_spaces(&body, query)
    }
}

/// Infrastructure sites from one Overpass endpoint.
#[cfg(feature = "api")]
pub struct OverpassInfrastructureSource {
    client: HttpClient,
    endpoint: String,
    name: &'static str,
}

#[cfg(feature = "api")]
impl OverpassInfrastructureSource {
    pub fn new(client: HttpClient, endpoint: impl Into<String>, name: &'static str) -> Self {
        OverpassInfrastructureSource {
            client,
            endpoint: endpoint.into(),
            name,
        }
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl Source<Vec<InfrastructureSite>> for OverpassInfrastructureSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, query: &GeoQuery) -> Result<Vec<InfrastructureSite>> {
        let ql = infrastructure_query(query);
        let body = self
            .client
            .post_form(self.name, &self.endpoint, &[("data", ql.as_str())])
            .await?;
        parse_infrastructure(&body, query)
    }
}
