use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use stepdriver::config::{Capability, HarnessConfig, Timing, DEFAULT_BASE_URL};
use stepdriver::driver::Driver;
use stepdriver::locators::LocatorRepository;
use stepdriver::mail::{default_token_path, GmailMailbox, MailRetriever};
use stepdriver::runner::{load_features, FeatureRunner, TagFilter};
use stepdriver::session::launcher::LaunchOptions;
use stepdriver::session::{CdpSession, RemoteSession};
use stepdriver::steps::{StepLibrary, StepWorld};

/// stepdriver: run Gherkin scenarios against Chrome using per-page locator files
#[derive(Parser)]
#[command(name = "stepdriver", version, about)]
struct Cli {
    /// A .feature file or a directory of them
    #[arg(default_value = "features")]
    features: PathBuf,

    /// Root directory of the page locator documents
    #[arg(long, env = "LOCATOR_PATH", default_value = "locators")]
    locators: PathBuf,

    /// Product sub-directory under the locator root
    #[arg(long, env = "PRODUCT")]
    product: Option<String>,

    /// Prefix for every page URL
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Browser/device capability, e.g. chrome or android_chrome
    #[arg(long, env = "CAPABILITY", default_value = "chrome")]
    capability: String,

    /// Tag expression selecting scenarios, e.g. "@smoke and not @slow" (@All runs everything)
    #[arg(long, env = "TAG")]
    tag: Option<String>,

    /// Run Chrome with a visible window (default: headless)
    #[arg(long)]
    headed: bool,

    /// Chrome binary to launch (default: searched for)
    #[arg(long, env = "CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// DevTools websocket of an already running browser
    #[arg(long, env = "CDP_ENDPOINT")]
    cdp_endpoint: Option<String>,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Gmail OAuth client secret; mail steps are unavailable without it
    #[arg(long, env = "GMAIL_CREDENTIALS")]
    gmail_credentials: Option<PathBuf>,

    /// Stored Gmail token (default: ~/.credentials/gmail-nodejs-quickstart.json)
    #[arg(long, env = "GMAIL_TOKEN")]
    gmail_token: Option<PathBuf>,

    /// Default element wait in milliseconds
    #[arg(long, env = "WAIT_TIMEOUT_MS", default_value_t = 60_000)]
    wait_timeout_ms: u64,

    /// Interval between element polls in milliseconds
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 500)]
    poll_interval_ms: u64,
}

impl Cli {
    fn harness_config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::new(&self.locators);
        config.base_url = self.base_url.clone();
        config.product = self.product.clone();
        config.capability = Capability::new(&self.capability);
        config.timing = Timing::default()
            .with_wait_timeout(Duration::from_millis(self.wait_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms));
        config
    }

    fn mail(&self, timing: &Timing) -> anyhow::Result<Option<MailRetriever>> {
        let Some(secret) = &self.gmail_credentials else {
            return Ok(None);
        };
        let token = self
            .gmail_token
            .clone()
            .or_else(default_token_path)
            .context("No Gmail token path given and no home directory")?;
        let mailbox = GmailMailbox::from_files(secret, &token)
            .with_context(|| format!("Failed to set up Gmail from {}", secret.display()))?;
        Ok(Some(MailRetriever::new(Arc::new(mailbox), timing)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr; stdout is left for the summary line
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    let config = cli.harness_config();

    let features = load_features(&cli.features)?;
    let filter = TagFilter::new(cli.tag.as_deref())?;
    let selected = filter.count(&features);
    if selected == 0 {
        anyhow::bail!(
            "No scenarios in {} match tags {}",
            cli.features.display(),
            filter
        );
    }
    let mail = cli.mail(&config.timing)?;
    let library = StepLibrary::new().context("Invalid step phrase table")?;

    let session = match &cli.cdp_endpoint {
        Some(endpoint) => CdpSession::connect(endpoint).await?,
        None => {
            let options = LaunchOptions {
                headless: !cli.headed,
                chrome_path: cli.chrome_path.clone(),
                ..LaunchOptions::default()
            };
            CdpSession::launch(&options).await?
        }
    };
    let session = Arc::new(session);

    tracing::info!(
        "Running {} scenario(s) from {} (capability: {}, locators: {})",
        selected,
        cli.features.display(),
        config.capability.name(),
        config.locator_dir().display()
    );

    let driver = Driver::new(
        Arc::clone(&session) as Arc<dyn RemoteSession>,
        config.capability.clone(),
        config.timing,
    );
    let locators = Arc::new(LocatorRepository::from_dir(config.locator_dir()));
    let mut world = StepWorld::new(driver, locators, config);
    if let Some(mail) = mail {
        world = world.with_mail(mail);
    }

    let runner = FeatureRunner::new(world, library, filter);

    // Run to completion OR stop on a termination signal
    let summary = tokio::select! {
        summary = runner.run(&features) => Some(summary),
        _ = tokio::signal::ctrl_c() => None,
    };
    drop(runner);

    let Some(summary) = summary else {
        tracing::info!("Received interrupt signal, shutting down");
        close(session).await;
        std::process::exit(130);
    };

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    // Always close Chrome before exiting
    close(session).await;

    println!(
        "{} scenario(s): {} passed, {} failed",
        summary.scenarios.len(),
        summary.passed,
        summary.failed
    );
    if !summary.success() {
        std::process::exit(1);
    }
    Ok(())
}

async fn close(session: Arc<CdpSession>) {
    match Arc::try_unwrap(session) {
        Ok(session) => {
            if let Err(e) = session.close().await {
                tracing::warn!("{:#}", e);
            }
        }
        Err(_) => tracing::warn!("Browser session still in use; leaving it to exit with the process"),
    }
}
