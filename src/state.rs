use crate::models::AppData;
use crate::stats::CorrelationPolicy;
use crate::summary::SummaryProvider;
use crate::weather::WeatherProvider;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub weather: Arc<dyn WeatherProvider>,
    /// `None` when no generative-text API key is configured.
    pub summarizer: Option<Arc<dyn SummaryProvider>>,
    pub correlation: CorrelationPolicy,
}

impl AppState {
    pub fn new(
        data_path: PathBuf,
        data: AppData,
        weather: Arc<dyn WeatherProvider>,
        summarizer: Option<Arc<dyn SummaryProvider>>,
    ) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            weather,
            summarizer,
            correlation: CorrelationPolicy::default(),
        }
    }

    pub fn with_correlation(mut self, correlation: CorrelationPolicy) -> Self {
        self.correlation = correlation;
        self
    }
}
