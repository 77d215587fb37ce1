//! The record describing which forecast fields to download.

use crate::retrieve::error::RetrieveError;
use crate::retrieve::source::Model;
use bon::Builder;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// The forecast cycles published each day, in UTC hours.
pub const FORECAST_CYCLES: [u32; 4] = [0, 6, 12, 18];

/// A request for gridded forecast fields.
///
/// Every combination of `dates` × `times` × `steps` names one forecast file in the archive,
/// from which the fields listed in `params` are extracted.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use forecast_point::RetrieveRequest;
///
/// let request = RetrieveRequest::builder()
///     .dates(vec![NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()])
///     .steps(vec![0])
///     .params(vec!["2t".to_string()])
///     .build();
///
/// assert_eq!(request.times, vec![0, 6, 12, 18]);
/// assert_eq!(request.product_type, "fc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct RetrieveRequest {
    /// Run dates of the forecasts.
    pub dates: Vec<NaiveDate>,
    /// Forecast cycles (issue hours, UTC). Defaults to all four daily cycles.
    #[builder(default = FORECAST_CYCLES.to_vec())]
    pub times: Vec<u32>,
    /// Product type, `fc` for a deterministic forecast.
    #[builder(into, default = String::from("fc"))]
    pub product_type: String,
    /// Forecast steps in hours since the cycle's issue time.
    pub steps: Vec<u32>,
    /// Short parameter names, e.g. `2t`.
    pub params: Vec<String>,
    /// Data stream. Inferred from model and cycle when absent.
    #[builder(into)]
    pub stream: Option<String>,
}

/// Identifies a single forecast file: one run, one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FieldKey {
    pub date: NaiveDate,
    pub time: u32,
    pub step: u32,
}

impl RetrieveRequest {
    /// Checks the request against what `model` publishes.
    pub(crate) fn validate(&self, model: Model) -> Result<(), RetrieveError> {
        if self.dates.is_empty() {
            return Err(RetrieveError::InvalidRequest("no dates requested".into()));
        }
        if self.times.is_empty() {
            return Err(RetrieveError::InvalidRequest("no times requested".into()));
        }
        if self.steps.is_empty() {
            return Err(RetrieveError::InvalidRequest("no steps requested".into()));
        }
        if self.params.is_empty() {
            return Err(RetrieveError::InvalidRequest("no params requested".into()));
        }
        if let Some(time) = self.times.iter().find(|t| !FORECAST_CYCLES.contains(t)) {
            return Err(RetrieveError::InvalidRequest(format!(
                "time {time} is not a forecast cycle, expected one of {FORECAST_CYCLES:?}"
            )));
        }
        if let Some(step) = self.steps.iter().find(|s| !model.publishes_step(**s)) {
            return Err(RetrieveError::InvalidRequest(format!(
                "step {step} is not published for model {model}"
            )));
        }
        Ok(())
    }

    /// Expands the request into the forecast files it touches.
    ///
    /// With `preserve_order` the files follow the order the request lists them in, duplicates
    /// included. Otherwise they are deduplicated and sorted by date, time and step.
    pub(crate) fn field_keys(&self, preserve_order: bool) -> Vec<FieldKey> {
        let keys = self.dates.iter().flat_map(|&date| {
            self.times.iter().flat_map(move |&time| {
                self.steps
                    .iter()
                    .map(move |&step| FieldKey { date, time, step })
            })
        });

        if preserve_order {
            keys.collect()
        } else {
            keys.collect::<BTreeSet<_>>().into_iter().collect()
        }
    }
}
