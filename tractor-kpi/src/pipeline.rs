use log::{debug, info};

use crate::aggregate::AggregateViews;
use crate::classify::ClassifiedEvents;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::event::{EventReader, LogEvent};
use crate::flatten::flatten_tricks;
use crate::merge::{KpiReport, merge_views};
use crate::quality::DataQuality;
use crate::source::{LogSource, LogStream};

/// Everything one run produced: the merged report and the views behind it.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub views: AggregateViews,
    pub report: KpiReport,
}

/// Reader → classifier → flattener → aggregator → merger, run synchronously.
#[derive(Debug, Clone)]
pub struct KpiPipeline {
    config: AnalysisConfig,
}

impl KpiPipeline {
    /// # Errors
    ///
    /// Returns `AnalysisError::Config` if the configuration is invalid.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze every stream the source opens.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Source` if the source fails to open and
    /// `AnalysisError::NoData` if no line parsed as an event.
    pub fn run<S: LogSource>(&self, source: &S) -> Result<KpiReport, AnalysisError> {
        Ok(self.run_detailed(source)?.report)
    }

    /// Like [`KpiPipeline::run`], keeping the intermediate views.
    ///
    /// # Errors
    ///
    /// Same as [`KpiPipeline::run`].
    pub fn run_detailed<S: LogSource>(&self, source: &S) -> Result<Analysis, AnalysisError> {
        let streams = source.open_streams().map_err(AnalysisError::source_error)?;
        self.analyze_streams(streams)
    }

    /// Analyze already opened streams in the given order.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::NoData` if no line parsed as an event.
    pub fn analyze_streams<I>(&self, streams: I) -> Result<Analysis, AnalysisError>
    where
        I: IntoIterator<Item = LogStream>,
    {
        let mut quality = DataQuality::with_warn_limit(self.config.warn_limit);
        let mut events: Vec<LogEvent> = Vec::new();
        for stream in streams {
            let before = events.len();
            events.extend(EventReader::new(stream.name.clone(), stream.reader, &mut quality));
            debug!("{}: {} events", stream.name, events.len() - before);
        }
        if quality.events_parsed == 0 {
            return Err(AnalysisError::NoData {
                lines_read: quality.lines_read,
            });
        }
        info!(
            "read {} events from {} lines ({} malformed)",
            quality.events_parsed, quality.lines_read, quality.malformed_lines
        );

        let classified = ClassifiedEvents::classify(events, &mut quality);
        let observations = flatten_tricks(&classified.tricks, &mut quality);
        debug!("flattened {} tricks into {} observations", classified.tricks.len(), observations.len());
        let views = AggregateViews::compute(&classified, &observations, &self.config, &mut quality);
        let report = merge_views(&views, quality);
        info!("merged {} build versions", report.rows.len());
        Ok(Analysis { views, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::source::MemorySource;

    #[test]
    fn rejects_invalid_config() {
        let config = AnalysisConfig {
            seats_per_trick: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            KpiPipeline::new(config),
            Err(AnalysisError::Config(ConfigError::RangeViolation { .. }))
        ));
    }

    #[test]
    fn no_events_is_no_data() {
        let pipeline = KpiPipeline::new(AnalysisConfig::default()).expect("valid config");
        let source = MemorySource::new().with_stream("junk.log", "\nnot json\n{\"event\":\"x\"}\n");
        match pipeline.run(&source) {
            Err(AnalysisError::NoData { lines_read }) => assert_eq!(lines_read, 3),
            other => panic!("expected NoData, got {other:?}"),
        }
    }

    #[test]
    fn events_without_game_over_give_empty_report() {
        let pipeline = KpiPipeline::new(AnalysisConfig::default()).expect("valid config");
        let source = MemorySource::new().with_stream(
            "a.log",
            r#"{"timestamp":"t","event":"kitty_pickup","appVersion":"1.0","gameId":"g1","data":{"kittyPoints":10}}"#,
        );
        let analysis = pipeline.run_detailed(&source).expect("report");
        assert!(analysis.report.is_empty());
        assert_eq!(analysis.views.kitty_efficiency.len(), 1);
        assert_eq!(analysis.report.quality.events_parsed, 1);
    }
}
