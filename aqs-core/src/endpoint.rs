use crate::error::AqsError;
use crate::query::QueryTemplate;

/// Fixed base URL for the EPA Air Quality System API.
pub const API_BASE: &str = "https://aqs.epa.gov/data/api";

/// One of the AQS endpoint path templates.
///
/// Each variant carries a path+query template whose `{name}` placeholders are
/// filled from a [`QueryTemplate`] by [`Endpoint::render`]. Fields present in
/// the template mapping but absent from the selected endpoint's template are
/// simply ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SignUp,
    ListClasses,
    ListParametersByClass,
    ListSitesByCounty,
    MonitorsByCounty,
    MonitorsByBox,
    DailyByCounty,
    DailyByBox,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::SignUp => "signup",
            Endpoint::ListClasses => "list-classes",
            Endpoint::ListParametersByClass => "list-parameters-by-class",
            Endpoint::ListSitesByCounty => "list-sites-by-county",
            Endpoint::MonitorsByCounty => "monitors-by-county",
            Endpoint::MonitorsByBox => "monitors-by-box",
            Endpoint::DailyByCounty => "daily-data-by-county",
            Endpoint::DailyByBox => "daily-data-by-box",
        }
    }

    /// The path+query template appended to [`API_BASE`].
    pub fn template(&self) -> &'static str {
        match self {
            Endpoint::SignUp => "/signup?email={email}",
            Endpoint::ListClasses => "/list/classes?email={email}&key={key}",
            Endpoint::ListParametersByClass => {
                "/list/parametersByClass?email={email}&key={key}&pc={pclass}"
            }
            Endpoint::ListSitesByCounty => {
                "/list/sitesByCounty?email={email}&key={key}&state={state}&county={county}"
            }
            Endpoint::MonitorsByCounty => {
                "/monitors/byCounty?email={email}&key={key}&param={param}\
                 &bdate={bdate}&edate={edate}&state={state}&county={county}"
            }
            Endpoint::MonitorsByBox => {
                "/monitors/byBox?email={email}&key={key}&param={param}\
                 &bdate={bdate}&edate={edate}\
                 &minlat={minlat}&maxlat={maxlat}&minlon={minlon}&maxlon={maxlon}"
            }
            Endpoint::DailyByCounty => {
                "/dailyData/byCounty?email={email}&key={key}&param={param}\
                 &bdate={bdate}&edate={edate}&state={state}&county={county}"
            }
            Endpoint::DailyByBox => {
                "/dailyData/byBox?email={email}&key={key}&param={param}\
                 &bdate={bdate}&edate={edate}\
                 &minlat={minlat}&maxlat={maxlat}&minlon={minlon}&maxlon={maxlon}"
            }
        }
    }

    /// Substitutes every `{name}` placeholder in this endpoint's template from
    /// `params` and appends the result to [`API_BASE`].
    ///
    /// A placeholder with no non-empty value is reported as a missing field,
    /// before any request is made, rather than producing a malformed URL.
    pub fn render(&self, params: &QueryTemplate) -> Result<String, AqsError> {
        let template = self.template();
        let mut url = String::with_capacity(API_BASE.len() + template.len());
        url.push_str(API_BASE);

        let mut rest = template;
        while let Some(open) = rest.find('{') {
            let close = rest[open..]
                .find('}')
                .map(|i| open + i)
                .ok_or_else(|| AqsError::MissingField(rest[open + 1..].to_string()))?;
            url.push_str(&rest[..open]);
            let name = &rest[open + 1..close];
            url.push_str(params.require(name)?);
            rest = &rest[close + 1..];
        }
        url.push_str(rest);

        Ok(url)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
