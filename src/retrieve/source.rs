//! Defines where forecast files are published and how a model lays them out.

use std::fmt;

/// A mirror of the ECMWF open-data archive.
///
/// Every mirror serves the same directory layout, only the base URL differs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DataSource {
    /// ECMWF's own data portal. Rate limited, prefer a cloud mirror for bulk downloads.
    Ecmwf,
    /// Amazon S3 mirror (`eu-central-1`).
    #[default]
    Aws,
    /// Microsoft Azure mirror.
    Azure,
    /// Google Cloud Storage mirror.
    Google,
    /// Any server replicating the archive layout, given by its base URL.
    Custom(String),
}

impl DataSource {
    pub(crate) fn base_url(&self) -> &str {
        match self {
            DataSource::Ecmwf => "https://data.ecmwf.int/forecasts",
            DataSource::Aws => "https://ecmwf-forecasts.s3.eu-central-1.amazonaws.com",
            DataSource::Azure => "https://ai4edataeuwest.blob.core.windows.net/ecmwf",
            DataSource::Google => "https://storage.googleapis.com/ecmwf-open-data",
            DataSource::Custom(url) => url.trim_end_matches('/'),
        }
    }

    fn name(&self) -> &str {
        match self {
            DataSource::Ecmwf => "ecmwf",
            DataSource::Aws => "aws",
            DataSource::Azure => "azure",
            DataSource::Google => "google",
            DataSource::Custom(url) => url,
        }
    }
}

/// Allows formatting a `DataSource` using its short name, or its URL for custom mirrors.
///
/// # Examples
///
/// ```
/// use forecast_point::DataSource;
///
/// assert_eq!(DataSource::Aws.to_string(), "aws");
/// ```
impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The forecasting system whose output is downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Model {
    /// The physics based Integrated Forecasting System.
    Ifs,
    /// The single (deterministic) run of the Artificial Intelligence Forecasting System.
    #[default]
    AifsSingle,
}

impl Model {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Model::Ifs => "ifs",
            Model::AifsSingle => "aifs-single",
        }
    }

    /// Longest published forecast step, in hours.
    pub fn horizon_hours(&self) -> u32 {
        360
    }

    /// Whether the archive publishes a field `step` hours into the forecast.
    ///
    /// The IFS publishes 3-hourly steps up to 144 h and 6-hourly steps after that, the AIFS
    /// publishes 6-hourly steps throughout.
    pub fn publishes_step(&self, step: u32) -> bool {
        if step > self.horizon_hours() {
            return false;
        }
        match self {
            Model::Ifs if step <= 144 => step % 3 == 0,
            Model::Ifs | Model::AifsSingle => step % 6 == 0,
        }
    }

    /// Every step the model publishes, from 0 up to and including the horizon.
    ///
    /// ```
    /// use forecast_point::Model;
    ///
    /// let steps = Model::AifsSingle.all_steps();
    /// assert_eq!(steps.len(), 61);
    /// assert_eq!(steps.last(), Some(&360));
    /// ```
    pub fn all_steps(&self) -> Vec<u32> {
        (0..=self.horizon_hours())
            .filter(|step| self.publishes_step(*step))
            .collect()
    }

    /// Stream used for a forecast cycle when the request does not name one.
    ///
    /// The IFS publishes its 06 and 18 UTC runs in the short cut-off stream `scda`.
    pub(crate) fn default_stream(&self, time: u32, infer: bool) -> &'static str {
        match (self, infer, time) {
            (Model::Ifs, true, 6 | 18) => "scda",
            _ => "oper",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// Horizontal grid spacing of the published fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    /// 0.25 degrees.
    #[default]
    P0p25,
}

impl Resolution {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Resolution::P0p25 => "0p25",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_source_trims_slash() {
        let source = DataSource::Custom("http://127.0.0.1:8080/".to_string());
        assert_eq!(source.base_url(), "http://127.0.0.1:8080");
        assert_eq!(DataSource::Google.to_string(), "google");
    }

    #[test]
    fn test_stream_inference() {
        assert_eq!(Model::Ifs.default_stream(0, true), "oper");
        assert_eq!(Model::Ifs.default_stream(6, true), "scda");
        assert_eq!(Model::Ifs.default_stream(18, true), "scda");
        assert_eq!(Model::Ifs.default_stream(18, false), "oper");
        assert_eq!(Model::AifsSingle.default_stream(6, true), "oper");
    }

    #[test]
    fn test_published_steps() {
        let steps = Model::Ifs.all_steps();
        assert_eq!(steps[1], 3);
        assert_eq!(steps.len(), 85);
        assert!(Model::Ifs.publishes_step(141));
        assert!(!Model::Ifs.publishes_step(147));
        assert!(!Model::AifsSingle.publishes_step(3));
        assert!(!Model::AifsSingle.publishes_step(366));
    }
}
