//! Main application orchestration and execution

use crate::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, PrivacyConfiguration},
    dns::HostResolver,
    error::{AppError, Result},
    executor::{BatchOrchestrator, BatchSettings},
    hosts::{discover_hosts, Discovery},
    logging::{BatchLogger, LoggerFactory},
    models::Config,
    output::{rank, render_report, save_report, BatchProgress, Ranking, RenderConfig},
    probe::{Prober, TcpProber},
    providers::{download_provider_configs, DownloadOutcome, VpnProvider},
};
use std::path::PathBuf;
use std::sync::Arc;

/// Coordinates discovery, probing, ranking and reporting for one run
pub struct App {
    config: Config,
    render: RenderConfig,
    prober: Option<Arc<dyn Prober>>,
    show_progress: bool,
}

impl App {
    /// Load configuration from CLI arguments, `.env` and the environment
    pub fn new(cli: Cli) -> Result<Self> {
        let config = load_config(cli.clone())?;
        let render = RenderConfig::detect(&cli, &config);
        Ok(Self::with_config(config, render))
    }

    /// Build from an already loaded configuration
    pub fn with_config(config: Config, render: RenderConfig) -> Self {
        Self {
            config,
            render,
            prober: None,
            show_progress: true,
        }
    }

    /// Probe with `prober` instead of TCP connects
    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Suppress the progress bar
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Provider selected by the configuration
    pub fn provider(&self) -> Result<VpnProvider> {
        self.config.provider.parse()
    }

    /// Configured directory, or the provider's default
    pub fn host_directory(&self, provider: VpnProvider) -> PathBuf {
        self.config
            .config_directory
            .clone()
            .unwrap_or_else(|| provider.default_directory())
    }

    /// Run the application and return the ranking that was reported
    pub async fn run(self) -> Result<Ranking> {
        let config = &self.config;
        let formatter = self.render.formatter();

        let warnings = validate_config(config)?;
        for warning in &warnings {
            eprintln!("{}", warning.format(self.render.use_color));
        }

        if config.debug {
            println!("{} v{}", crate::PKG_NAME, crate::VERSION);
            println!("{}\n", display_config_summary(config));
        }

        let factory = LoggerFactory::new(config.clone());
        let batch_logger = factory.create_batch_logger().await;

        let provider = self.provider()?;
        let directory = self.host_directory(provider);
        if config.auto_download {
            self.refresh_directory(&directory, &batch_logger).await;
        }
        let discovery = discover_hosts(&directory, &provider.naming_rule()?)?;
        self.report_discovery(&discovery, &directory);

        if discovery.targets.is_empty() {
            return Err(AppError::discovery(format!(
                "No valid .ovpn files found in {}",
                directory.display()
            )));
        }

        let privacy = PrivacyConfiguration::from_config(config);
        let total = discovery.targets.len();
        println!(
            "Testing {} {} servers with {} pings each (timeout {}s, {} workers)",
            total,
            provider.display_name(),
            config.ping_count,
            config.timeout_seconds,
            config.workers
        );
        if privacy.enabled {
            println!("Privacy weighting enabled ({:.0}% of score)", privacy.weight * 100.0);
        }

        let prober = match &self.prober {
            Some(prober) => prober.clone(),
            None => {
                let resolver = HostResolver::system_with_timeout(config.timeout());
                Arc::new(TcpProber::new(resolver, config.probe_port))
            }
        };
        let orchestrator = BatchOrchestrator::new(prober, BatchSettings::from(config), privacy)
            .with_logger(batch_logger.clone());

        let progress = if self.show_progress {
            BatchProgress::new(total, self.render.use_color)
        } else {
            BatchProgress::hidden(total)
        };
        let results = orchestrator.run_batch(discovery.targets, progress.callback()).await;
        progress.clear();
        let results = results?;

        let ranking = rank(results);
        println!("{}", render_report(&ranking, self.render)?);

        match save_report(&ranking, &config.log_file) {
            Ok(()) => println!(
                "\n{}",
                formatter.format_success(&format!("Results saved to {}", config.log_file.display()))
            ),
            Err(e) => {
                batch_logger.log_error(&e, "Could not save results").await;
                eprintln!(
                    "{}",
                    formatter.format_warning(&format!(
                        "Could not save results to {}: {}",
                        config.log_file.display(),
                        e
                    ))
                );
            }
        }

        Ok(ranking)
    }

    /// Replace the host directory with the provider's latest files.
    ///
    /// Failures are reported as warnings; probing carries on with whatever
    /// is already on disk.
    async fn refresh_directory(&self, directory: &std::path::Path, logger: &BatchLogger) {
        let config = &self.config;
        let formatter = self.render.formatter();
        let Some(base_url) = config.download_url.as_deref() else {
            if config.verbose {
                println!("No download URL configured, using files in {}", directory.display());
            }
            return;
        };

        println!("Downloading {} configs from {}", config.provider, base_url);
        match download_provider_configs(&config.provider, base_url, directory, self.show_progress).await {
            Ok(DownloadOutcome::Downloaded(summary)) => println!(
                "{}\n",
                formatter.format_success(&format!(
                    "Extracted {} files from {} into {}",
                    summary.files_extracted,
                    summary.version,
                    summary.directory.display()
                ))
            ),
            Ok(DownloadOutcome::Unsupported(provider)) => eprintln!(
                "{}",
                formatter.format_warning(&format!("Automatic download is not supported for {}", provider))
            ),
            Err(e) => {
                logger.log_error(&e, "Config download failed").await;
                eprintln!(
                    "{}",
                    formatter.format_warning(&format!(
                        "Failed to download configs: {}. Continuing with existing configs.",
                        e
                    ))
                );
            }
        }
    }

    fn report_discovery(&self, discovery: &Discovery, directory: &std::path::Path) {
        let formatter = self.render.formatter();
        println!(
            "Found {} .ovpn files in {}",
            discovery.files_found,
            directory.display()
        );
        for skipped in &discovery.skipped {
            eprintln!(
                "{}",
                formatter.format_warning(&format!("{} skipped: {}", skipped.file_name, skipped.reason))
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_directory_falls_back_to_provider_default() {
        let app = App::with_config(Config::default(), RenderConfig::plain());
        let provider = app.provider().unwrap();
        assert_eq!(app.host_directory(provider), PathBuf::from("IPVanish"));

        let config = Config {
            config_directory: Some(PathBuf::from("/srv/ovpn")),
            ..Config::default()
        };
        let app = App::with_config(config, RenderConfig::plain());
        assert_eq!(app.host_directory(VpnProvider::IpVanish), PathBuf::from("/srv/ovpn"));
    }

    #[test]
    fn test_unknown_provider() {
        let config = Config { provider: "nordvpn".to_string(), ..Config::default() };
        let app = App::with_config(config, RenderConfig::plain());
        assert!(matches!(app.provider(), Err(AppError::UnsupportedProvider(_))));
    }

    #[tokio::test]
    async fn test_missing_directory_fails_before_probing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            config_directory: Some(dir.path().join("absent")),
            log_file: dir.path().join("results.log"),
            ..Config::default()
        };

        let result = App::with_config(config, RenderConfig::plain()).quiet().run().await;
        assert!(matches!(result, Err(AppError::Discovery(_))));
    }

    #[tokio::test]
    async fn test_empty_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            config_directory: Some(dir.path().to_path_buf()),
            log_file: dir.path().join("results.log"),
            ..Config::default()
        };

        let error = App::with_config(config, RenderConfig::plain())
            .quiet()
            .run()
            .await
            .unwrap_err();
        assert!(error.to_string().contains("No valid .ovpn files"));
        assert_eq!(error.exit_code(), 3);
    }

    struct FixedProber;

    #[async_trait::async_trait]
    impl Prober for FixedProber {
        async fn resolve(&self, _hostname: &str) -> std::result::Result<(), crate::probe::ProbeError> {
            Ok(())
        }

        async fn probe(&self, _hostname: &str, _timeout: std::time::Duration) -> crate::probe::RawProbe {
            crate::probe::RawProbe::Measured(20.0)
        }
    }

    fn config_archive() -> Vec<u8> {
        use std::io::Write;

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, host) in [("ipvanish-CH-Zurich-zrh-c18.ovpn", "zrh-c18"), ("ipvanish-US-Dallas-dal-a01.ovpn", "dal-a01")] {
            writer.start_file(name, options).unwrap();
            writeln!(writer, "client\nremote {}.ipvanish.example 443", host).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_run_downloads_before_discovery() {
        use wiremock::{matchers::path, Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(path("/openvpn/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<table><tr><td><a href="v3.1.0/">v3.1.0/</a></td></tr></table>"#),
            )
            .mount(&server)
            .await;
        Mock::given(path("/openvpn/v3.1.0/configs.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(config_archive()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            config_directory: Some(dir.path().join("IPVanish")),
            download_url: Some(format!("{}/openvpn/", server.uri())),
            log_file: dir.path().join("results.log"),
            ping_count: 2,
            ..Config::default()
        };

        let ranking = App::with_config(config, RenderConfig::plain())
            .with_prober(Arc::new(FixedProber))
            .quiet()
            .run()
            .await
            .unwrap();

        assert_eq!(ranking.ordered.len(), 2);
        assert!(dir.path().join("IPVanish/ipvanish-US-Dallas-dal-a01.ovpn").exists());
    }

    #[tokio::test]
    async fn test_failed_download_keeps_existing_files() {
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let directory = dir.path().join("IPVanish");
        std::fs::create_dir_all(&directory).unwrap();
        std::fs::write(
            directory.join("ipvanish-NL-Amsterdam-ams-a01.ovpn"),
            "remote ams-a01.ipvanish.example 443\n",
        )
        .unwrap();

        let config = Config {
            config_directory: Some(directory),
            download_url: Some(server.uri()),
            log_file: dir.path().join("results.log"),
            ..Config::default()
        };

        let ranking = App::with_config(config, RenderConfig::plain())
            .with_prober(Arc::new(FixedProber))
            .quiet()
            .run()
            .await
            .unwrap();

        assert_eq!(ranking.ordered.len(), 1);
        assert_eq!(ranking.ordered[0].id(), "ipvanish-NL-Amsterdam-ams-a01.ovpn");
    }
}
