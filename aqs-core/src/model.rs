use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AqsError;
use crate::query::{QueryTemplate, split_county_fips};

/// Geographic selector for monitor and daily-summary queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Area {
    /// A 5-digit county FIPS code; split into state + county on use.
    CountyFips(String),
    /// An already-split state and county pair.
    StateCounty { state: String, county: String },
    /// A latitude/longitude bounding box.
    BoundingBox {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },
}

impl Area {
    pub(crate) fn overlay(&self, template: QueryTemplate) -> Result<QueryTemplate, AqsError> {
        match self {
            Area::CountyFips(fips) => {
                let (state, county) = split_county_fips(fips)?;
                Ok(template.set("state", state).set("county", county))
            }
            Area::StateCounty { state, county } => {
                Ok(template.set("state", state.clone()).set("county", county.clone()))
            }
            Area::BoundingBox {
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            } => Ok(template
                .set("minlat", min_lat.to_string())
                .set("maxlat", max_lat.to_string())
                .set("minlon", min_lon.to_string())
                .set("maxlon", max_lon.to_string())),
        }
    }
}

/// Per-call parameters for a daily-summary or monitors request.
///
/// The date window must lie within one calendar year (an upstream API rule);
/// [`DailyQuery::for_year`] derives such a window from a year plus MMDD
/// bounds, [`DailyQuery::new`] takes the raw dates as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyQuery {
    /// Comma-separated AQS parameter codes (the service caps one request at five).
    pub param_codes: String,
    /// Window start, YYYYMMDD.
    pub begin_date: String,
    /// Window end, YYYYMMDD.
    pub end_date: String,
    /// Geographic selector; box endpoints take theirs from here too.
    pub area: Option<Area>,
}

impl DailyQuery {
    pub fn new(
        param_codes: impl Into<String>,
        begin_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            param_codes: param_codes.into(),
            begin_date: begin_date.into(),
            end_date: end_date.into(),
            area: None,
        }
    }

    /// Builds the query for one calendar year from MMDD window bounds,
    /// e.g. `for_year("81102", 1985, "0501", "1031")`.
    pub fn for_year(
        param_codes: impl Into<String>,
        year: i32,
        begin_mmdd: &str,
        end_mmdd: &str,
    ) -> Result<Self, AqsError> {
        let begin_date = parse_yyyymmdd(format!("{year}{begin_mmdd}"))?;
        let end_date = parse_yyyymmdd(format!("{year}{end_mmdd}"))?;
        Ok(Self::new(param_codes, begin_date, end_date))
    }

    pub fn with_area(mut self, area: Area) -> Self {
        self.area = Some(area);
        self
    }

    pub(crate) fn overlay(&self, template: QueryTemplate) -> Result<QueryTemplate, AqsError> {
        let template = template
            .set("param", self.param_codes.clone())
            .set("bdate", self.begin_date.clone())
            .set("edate", self.end_date.clone());
        match &self.area {
            Some(area) => area.overlay(template),
            None => Ok(template),
        }
    }
}

fn parse_yyyymmdd(date: String) -> Result<String, AqsError> {
    match NaiveDate::parse_from_str(&date, "%Y%m%d") {
        Ok(_) => Ok(date),
        Err(_) => Err(AqsError::InvalidDate(date)),
    }
}

/// One record of the daily-summary `Data` block.
///
/// Records are sparse: any field, `aqi` included, may be null or missing, so
/// everything is optional. Fields the caller does not consume are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyRecord {
    pub sample_duration: Option<String>,
    pub observation_count: Option<u32>,
    pub arithmetic_mean: Option<f64>,
    pub aqi: Option<f64>,
}

/// The `status` field of the first `Header` entry, if present.
///
/// The service reports API-level failures inside an otherwise well-formed
/// body; the client deliberately does not turn those into errors, so this is
/// where callers look before consuming `Data`.
pub fn header_status(body: &Value) -> Option<&str> {
    body.get("Header")?.get(0)?.get("status")?.as_str()
}

/// True when the response header reports `"Success"`.
pub fn is_success(body: &Value) -> bool {
    header_status(body) == Some("Success")
}

/// Decodes the `Data` block into daily records. A body without a `Data` block
/// (e.g. an API-level failure) yields an empty list.
pub fn daily_records(body: &Value) -> Result<Vec<DailyRecord>, AqsError> {
    match body.get("Data") {
        Some(data) => serde_json::from_value(data.clone()).map_err(AqsError::Payload),
        None => Ok(Vec::new()),
    }
}
