// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::{
    appender::RotationPolicy,
    error::{Error, Result},
    LogFormat, LogOutputDest,
};
use std::collections::BTreeMap;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_core::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::Targets,
    fmt::{
        self as tracing_fmt,
        format::Writer,
        time::{FormatTime, SystemTime},
        FmtContext, FormatEvent, FormatFields,
    },
    layer::Filter,
    registry::LookupSpan,
    reload::{self, Handle},
    Layer, Registry,
};

/// Env variable holding the CSV of logging targets.
pub const TOKEN_LOG_ENV: &str = "TOKEN_LOG";

// Everything is logged by default
const ALL_TOKEN_LOGS: &str = "all";
// Trace at the orchestrators, debug at the chain adapter
const VERBOSE_TOKEN_LOGS: &str = "v";

/// Handle that implements functions to change the log level on the fly.
pub struct ReloadHandle(pub(crate) Handle<Box<dyn Filter<Registry> + Send + Sync>, Registry>);

impl ReloadHandle {
    /// Modify the log level to the provided CSV value
    /// Example input: `alloy_transport=DEBUG,tokio=INFO,all,token_orchestrator=WARN`
    ///
    /// Keywords take less precedence than targets that are manually specified in the CSV.
    pub fn modify_log_level(&self, logging_value: &str) -> Result<()> {
        let targets: Vec<(String, Level)> = get_logging_targets(logging_value)?;
        self.0.modify(|old_filter| {
            let new_filter: Box<dyn Filter<Registry> + Send + Sync> =
                Box::new(Targets::new().with_targets(targets));
            *old_filter = new_filter;
        })?;

        Ok(())
    }
}

#[derive(Default)]
/// Tracing log formatter setup for easier span viewing
pub(crate) struct LogFormatter;

impl<S, N> FormatEvent<S, N> for LogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = *event.metadata().level();
        let module = event.metadata().module_path().unwrap_or("<unknown module>");
        let time = SystemTime;

        write!(writer, "[")?;
        time.format_time(&mut writer)?;
        write!(writer, " {level} {module}")?;
        ctx.visit_spans(|span| write!(writer, "/{}", span.name()))?;
        write!(writer, "] ")?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// The different Subscribers composed into a list of layers
#[derive(Default)]
pub(crate) struct TracingLayers {
    pub(crate) layers: Vec<Box<dyn Layer<Registry> + Send + Sync>>,
    pub(crate) log_appender_guard: Option<WorkerGuard>,
}

impl TracingLayers {
    pub(crate) fn fmt_layer(
        &mut self,
        default_logging_targets: Vec<(String, Level)>,
        output_dest: &LogOutputDest,
        format: LogFormat,
        max_uncompressed_log_files: Option<usize>,
        max_compressed_log_files: Option<usize>,
        print_updates_to_stdout: bool,
    ) -> Result<ReloadHandle> {
        let layer = match output_dest {
            LogOutputDest::Stdout => {
                if print_updates_to_stdout {
                    println!("Logging to stdout");
                }
                tracing_fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .event_format(LogFormatter)
                    .boxed()
            }
            LogOutputDest::Stderr => tracing_fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .event_format(LogFormatter)
                .with_writer(std::io::stderr)
                .boxed(),
            LogOutputDest::Path(path) => {
                std::fs::create_dir_all(path)?;
                if print_updates_to_stdout {
                    println!("Logging to directory: {path:?}");
                }

                let (file_rotation, worker_guard) =
                    RotationPolicy::new(max_uncompressed_log_files, max_compressed_log_files)
                        .writer(path);
                self.log_appender_guard = Some(worker_guard);

                match format {
                    LogFormat::Json => tracing_fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_writer(file_rotation)
                        .boxed(),
                    LogFormat::Default => tracing_fmt::layer()
                        .with_ansi(false)
                        .with_writer(file_rotation)
                        .event_format(LogFormatter)
                        .boxed(),
                }
            }
        };
        let targets = match std::env::var(TOKEN_LOG_ENV) {
            Ok(token_log_val) => {
                if print_updates_to_stdout {
                    println!("Using {TOKEN_LOG_ENV}={token_log_val}");
                }
                get_logging_targets(&token_log_val)?
            }
            Err(_) => default_logging_targets,
        };

        let target_filters: Box<dyn Filter<Registry> + Send + Sync> =
            Box::new(Targets::new().with_targets(targets));

        let (filter, reload_handle) = reload::Layer::new(target_filters);

        let layer = layer.with_filter(filter);
        self.layers.push(Box::new(layer));

        Ok(ReloadHandle(reload_handle))
    }
}

/// Parses the logging targets from the env variable (TOKEN_LOG). The crates should be given as a CSV, for e.g.,
/// `export TOKEN_LOG = alloy_transport=DEBUG, tokio=INFO, all, token_orchestrator=WARN`
/// Keywords take less precedence than targets that are manually specified in the CSV.
pub(crate) fn get_logging_targets(logging_env_value: &str) -> Result<Vec<(String, Level)>> {
    let mut targets = BTreeMap::new();
    let mut contains_keyword_all = false;
    let mut contains_keyword_verbose = false;

    for crate_log_level in logging_env_value.split(',').map(str::trim) {
        if crate_log_level.is_empty() {
            continue;
        }
        if crate_log_level == ALL_TOKEN_LOGS {
            contains_keyword_all = true;
            continue;
        } else if crate_log_level == VERBOSE_TOKEN_LOGS {
            contains_keyword_verbose = true;
            continue;
        }

        let mut split = crate_log_level.split('=');
        let crate_name = split.next().ok_or_else(|| {
            Error::LoggingConfiguration("Could not obtain crate name in logging string".to_string())
        })?;
        let log_level = split.next().unwrap_or("trace");
        targets.insert(crate_name.to_string(), get_log_level_from_str(log_level)?);
    }

    let mut to_be_overriden_targets = if contains_keyword_all || contains_keyword_verbose {
        let mut t = BTreeMap::from_iter(vec![
            ("token_orchestrator".to_string(), Level::TRACE),
            ("token_logging".to_string(), Level::TRACE),
        ]);

        // The alloy transport is noisy, keep it lower unless everything was asked for.
        if contains_keyword_all {
            t.insert("alloy_transport_http".to_string(), Level::TRACE);
        } else {
            t.insert("alloy_transport_http".to_string(), Level::DEBUG);
        }
        t
    } else {
        Default::default()
    };
    to_be_overriden_targets.extend(targets);
    Ok(to_be_overriden_targets.into_iter().collect())
}

fn get_log_level_from_str(log_level: &str) -> Result<Level> {
    match log_level.to_lowercase().as_str() {
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::LoggingConfiguration(format!(
            "Log level {log_level} is not supported"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_all_enables_every_token_crate() -> Result<()> {
        let targets = get_logging_targets("all")?;

        assert!(targets.contains(&("token_orchestrator".to_string(), Level::TRACE)));
        assert!(targets.contains(&("token_logging".to_string(), Level::TRACE)));
        assert!(targets.contains(&("alloy_transport_http".to_string(), Level::TRACE)));
        Ok(())
    }

    #[test]
    fn explicit_targets_override_keywords() -> Result<()> {
        let targets = get_logging_targets("v, token_orchestrator=WARN, tokio=info")?;

        assert!(targets.contains(&("token_orchestrator".to_string(), Level::WARN)));
        assert!(targets.contains(&("alloy_transport_http".to_string(), Level::DEBUG)));
        assert!(targets.contains(&("tokio".to_string(), Level::INFO)));
        Ok(())
    }

    #[test]
    fn missing_level_defaults_to_trace() -> Result<()> {
        let targets = get_logging_targets("my_crate")?;

        assert_eq!(targets, vec![("my_crate".to_string(), Level::TRACE)]);
        Ok(())
    }

    #[test]
    fn unknown_level_is_rejected() {
        let result = get_logging_targets("token_orchestrator=loud");

        assert!(matches!(result, Err(Error::LoggingConfiguration(_))));
    }

    #[test]
    fn directory_output_writes_events_to_the_log_file() -> color_eyre::Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let dir = tempfile::tempdir()?;
        let log_dir = dir.path().join("logs");
        let mut layers = TracingLayers::default();
        let _reload_handle = layers.fmt_layer(
            vec![("token_logging".to_string(), Level::TRACE)],
            &LogOutputDest::Path(log_dir.clone()),
            LogFormat::Default,
            Some(2),
            Some(3),
            false,
        )?;
        let worker_guard = layers.log_appender_guard.take();

        let default_guard = tracing_subscriber::registry()
            .with(layers.layers)
            .set_default();
        tracing::info!("balance cached for owner");
        drop(default_guard);
        drop(worker_guard);

        let contents = std::fs::read_to_string(log_dir.join(crate::appender::LOG_FILE_NAME))?;
        assert!(contents.contains("balance cached for owner"));
        assert!(contents.contains("INFO token_logging::layers::tests"));
        Ok(())
    }
}
