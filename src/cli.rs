use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use console::Term;
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::auth::Token;
use crate::client::ApiClient;
use crate::config::{user_config_path, Config, OutputFormat};
use crate::output::{
    export_csv, export_json, failure, print_dashboard, render_dashboard, success, task_spinner,
    FetchProgress, Report,
};
use crate::present::{GridLayout, PaddingPolicy};
use crate::reconcile::JobCard;
use crate::state::{fetch_snapshot, DashboardState};

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(author, version, about = "Status dashboard for scheduled dbt jobs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to load instead of the default search locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the jobs backend
    #[arg(short, long, global = true, env = "JOBBOARD_URL")]
    url: Option<String>,

    /// Bearer token sent to the backend
    #[arg(short, long, global = true, env = "JOBBOARD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Write output to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch jobs and runs and show the job cards
    Show {
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Redraw every N seconds until interrupted
        #[arg(short, long, value_name = "SECS")]
        watch: Option<u64>,

        #[arg(long, value_enum)]
        padding: Option<PaddingPolicy>,

        /// Cards per grid row
        #[arg(long)]
        columns: Option<usize>,
    },
    /// Ask the backend to reload data from dbt Cloud
    Refresh {
        /// Reload projects, environments and jobs as well as runs
        #[arg(short, long, default_value_t = false)]
        all: bool,

        /// Show the dashboard once the refresh completed
        #[arg(short, long, default_value_t = false)]
        show: bool,
    },
    /// Write a default config file
    Init {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
}

/// Resolved display settings after merging config file and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DisplaySettings {
    format: OutputFormat,
    layout: GridLayout,
    pretty: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        Config::load(self.config.as_deref())
    }

    fn api_client(&self, config: &Config) -> Result<ApiClient> {
        let url = self.url.as_deref().unwrap_or(&config.api.base_url);
        let token = self
            .token
            .as_deref()
            .or(config.api.token.as_deref())
            .map(Token::from);

        ApiClient::new(url, token).with_context(|| format!("Cannot use backend URL {url}"))
    }

    fn display_settings(
        &self,
        config: &Config,
        format: Option<OutputFormat>,
        padding: Option<PaddingPolicy>,
        columns: Option<usize>,
    ) -> Result<DisplaySettings> {
        let columns = columns.unwrap_or(config.display.columns);
        if columns == 0 {
            anyhow::bail!("--columns must be at least 1");
        }

        Ok(DisplaySettings {
            format: format.unwrap_or(config.display.format),
            layout: GridLayout {
                columns,
                padding: padding.unwrap_or(config.display.padding),
            },
            pretty: self.pretty || config.display.pretty,
        })
    }

    fn writer(&self) -> Result<Box<dyn Write>> {
        match &self.output {
            Some(path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                Ok(Box::new(file))
            }
            None => Ok(Box::new(std::io::stdout().lock())),
        }
    }

    fn emit(
        &self,
        client: &ApiClient,
        cards: &[JobCard],
        settings: &DisplaySettings,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let report = Report {
            backend: client.base_url().as_str(),
            generated_at: now,
            cards,
            layout: settings.layout,
        };

        match settings.format {
            OutputFormat::Summary if self.output.is_none() => print_dashboard(&report),
            OutputFormat::Summary => {
                console::set_colors_enabled(false);
                let mut writer = self.writer()?;
                writeln!(writer, "{}", render_dashboard(&report))?;
            }
            OutputFormat::Json => export_json(cards, now, settings.pretty, &mut self.writer()?)?,
            OutputFormat::Csv => export_csv(cards, now, &mut self.writer()?)?,
        }

        if let Some(path) = &self.output {
            info!("Dashboard written to: {}", path.display());
        }
        Ok(())
    }

    async fn execute_show(&self, client: &ApiClient, settings: &DisplaySettings) -> Result<()> {
        let mut state = DashboardState::new();
        let ticket = state.begin_refresh();

        let progress = FetchProgress::start(client.base_url().as_str());
        state.apply(fetch_snapshot(client, ticket).await);
        progress.finish(
            state.jobs().ready().map(Vec::len),
            state.runs().ready().map(Vec::len),
        );

        let Some(cards) = state.cards() else {
            let failures: Vec<String> = state
                .errors()
                .into_iter()
                .map(|(name, message)| format!("{name}: {message}"))
                .collect();
            anyhow::bail!("Failed to load dashboard data ({})", failures.join("; "));
        };

        self.emit(client, &cards, settings, Utc::now())
    }

    fn redraw(
        &self,
        term: &Term,
        client: &ApiClient,
        state: &DashboardState,
        settings: &DisplaySettings,
    ) -> Result<()> {
        if settings.format == OutputFormat::Summary && self.output.is_none() {
            term.clear_screen()?;
        }

        for (name, message) in state.errors() {
            eprintln!("{} {message}", failure(format!("Failed to fetch {name}:")));
        }

        if let Some(cards) = state.cards() {
            self.emit(client, &cards, settings, Utc::now())?;
        }
        Ok(())
    }

    /// Refreshes on a fixed interval until Ctrl-C.
    ///
    /// Each tick starts a fetch unless the previous one is still running, so
    /// a slow backend delays refreshes instead of piling up requests.
    async fn execute_watch(
        &self,
        client: ApiClient,
        settings: &DisplaySettings,
        interval_secs: u64,
    ) -> Result<()> {
        let client = Arc::new(client);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        let mut state = DashboardState::new();
        let term = Term::stdout();
        let mut in_flight = false;

        info!(
            "Watching {} every {}s",
            client.base_url(),
            interval_secs.max(1)
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if in_flight {
                        debug!("Previous refresh still running, skipping tick");
                        continue;
                    }
                    in_flight = true;
                    let ticket = state.begin_refresh();
                    let client = Arc::clone(&client);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let snapshot = fetch_snapshot(&client, ticket).await;
                        // The receiver is gone once watching stopped.
                        let _ = tx.send(snapshot);
                    });
                }
                Some(snapshot) = rx.recv() => {
                    in_flight = false;
                    if state.apply(snapshot) {
                        self.redraw(&term, &client, &state, settings)?;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Stopping watch");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn execute_refresh(&self, all: bool, show: bool) -> Result<()> {
        let config = self.load_config()?;
        let client = self.api_client(&config)?;

        let spinner = task_spinner(if all {
            "Requesting full data refresh"
        } else {
            "Requesting run refresh"
        });
        let result = if all {
            client.refresh_all().await
        } else {
            client.refresh_runs().await
        };
        spinner.finish_and_clear();

        let status = result.context("Backend refresh failed")?;
        eprintln!("{} {}", success("Backend refresh:"), status.status);

        if show {
            let settings = self.display_settings(&config, None, None, None)?;
            self.execute_show(&client, &settings).await?;
        }
        Ok(())
    }

    fn execute_init(&self, path: Option<&Path>, force: bool) -> Result<()> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => user_config_path().context("No user config directory found")?,
        };

        if path.exists() && !force {
            anyhow::bail!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }

        Config::default().save(&path)?;
        eprintln!("{} {}", success("Config written to:"), path.display());
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Show {
                format,
                watch,
                padding,
                columns,
            } => {
                let config = self.load_config()?;
                let settings = self.display_settings(&config, *format, *padding, *columns)?;
                let client = self.api_client(&config)?;

                match watch {
                    Some(interval) => self.execute_watch(client, &settings, *interval).await,
                    None => self.execute_show(&client, &settings).await,
                }
            }
            Commands::Refresh { all, show } => self.execute_refresh(*all, *show).await,
            Commands::Init { path, force } => self.execute_init(path.as_deref(), *force),
        }
    }
}
