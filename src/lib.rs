mod config;
mod dates;
mod error;
mod frame;
mod grid;
mod pipeline;
mod retrieve;
mod utils;

pub use config::*;
pub use dates::date_range;
pub use error::PipelineError;
pub use frame::*;
pub use pipeline::{ForecastPipeline, RunReport};

pub use retrieve::client::{Archive, ArchiveClient, ClientOptions, RetrieveSummary};
pub use retrieve::error::RetrieveError;
pub use retrieve::request::{RetrieveRequest, FORECAST_CYCLES};
pub use retrieve::source::{DataSource, Model, Resolution};

pub use grid::decoder::{GribDecoder, GridDecoder, PointRecord, PointSeries};
pub use grid::error::GridError;
pub use grid::locate::{GridLocator, GridPoint};
pub use grid::parameter::{Parameter, PARAMETERS};
