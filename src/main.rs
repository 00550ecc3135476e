use dost_bot::assistant::calendar::CalendarClient;
use dost_bot::assistant::recipes::RecipeClient;
use dost_bot::bot::{messaging, proactive, routes, AppState, DedupCache};
use dost_bot::config::{get_dedup_cache_max_size, get_dedup_cache_ttl, Settings};
use dost_bot::scheduler::Scheduler;
use dost_bot::{llm, storage, twilio};
use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
struct RedactionPatterns {
    twilio_token: Regex,
    api_key_query: Regex,
    r2_1: Regex,
    r2_2: Regex,
    google_secret: Regex,
    google_refresh: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            twilio_token: Regex::new(r"TWILIO_AUTH_TOKEN=[^\s&]+")?,
            // Gemini puts the API key in the URL query string
            api_key_query: Regex::new(r"key=[A-Za-z0-9_-]{25,}")?,
            r2_1: Regex::new(r"R2_ACCESS_KEY_ID=[^\s&]+")?,
            r2_2: Regex::new(r"R2_SECRET_ACCESS_KEY=[^\s&]+")?,
            google_secret: Regex::new(r"GOOGLE_CLIENT_SECRET=[^\s&]+")?,
            google_refresh: Regex::new(r"GOOGLE_REFRESH_TOKEN=[^\s&]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .twilio_token
            .replace_all(&output, "TWILIO_AUTH_TOKEN=[MASKED]")
            .to_string();
        output = self
            .api_key_query
            .replace_all(&output, "key=[MASKED]")
            .to_string();
        output = self
            .r2_1
            .replace_all(&output, "R2_ACCESS_KEY_ID=[MASKED]")
            .to_string();
        output = self
            .r2_2
            .replace_all(&output, "R2_SECRET_ACCESS_KEY=[MASKED]")
            .to_string();
        output = self
            .google_secret
            .replace_all(&output, "GOOGLE_CLIENT_SECRET=[MASKED]")
            .to_string();
        output = self
            .google_refresh
            .replace_all(&output, "GOOGLE_REFRESH_TOKEN=[MASKED]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // We return the original buffer length to satisfy the contract,
        // even if the redacted string length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    // Setup logging with redaction
    init_logging(patterns);

    info!("Starting Dost WhatsApp assistant...");

    // Load settings
    let settings = init_settings();

    // Initialize storage
    let storage = init_storage(&settings).await;

    // Initialize outbound clients
    let twilio = Arc::new(twilio::TwilioClient::new(&settings));
    info!("Twilio client initialized.");

    let llm_client = Arc::new(llm::LlmClient::new(&settings));
    info!("LLM client initialized.");

    let calendar = init_calendar(&settings);

    // Scheduler and shared state
    let scheduler = Scheduler::start();
    let state = AppState {
        settings: settings.clone(),
        storage,
        twilio,
        llm: llm_client,
        calendar,
        recipes: Arc::new(RecipeClient::new()),
        scheduler,
        dedup: init_dedup_cache(),
    };

    // Reminders survive restarts via the ledger
    match messaging::restore_pending_reminders(&state).await {
        Ok(count) => info!("Reminder restore complete ({count} jobs)."),
        Err(e) => warn!("Reminder restore failed: {e}"),
    }

    proactive::register_daily_jobs(&state)?;
    info!("Daily briefing and check-in jobs registered.");

    // Serve the webhook
    let addr = format!("{}:{}", state.settings.host, state.settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Webhook server listening on {}", addr);

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn init_storage(settings: &Settings) -> Arc<storage::R2Storage> {
    match storage::R2Storage::new(settings).await {
        Ok(s) => {
            info!("R2 Storage initialized.");
            if s.check_connection().await.is_ok() {
                // Success message already logged in check_connection
            } else {
                error!("R2 Storage connection check returned error.");
            }
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to initialize R2 Storage: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_calendar(settings: &Settings) -> Option<Arc<CalendarClient>> {
    if !settings.calendar_configured() {
        info!("Google Calendar not configured; schedule features degrade gracefully.");
        return None;
    }

    // calendar_configured() guarantees the credentials are present
    let client_id = settings.google_client_id.clone()?;
    let client_secret = settings.google_client_secret.clone()?;
    let refresh_token = settings.google_refresh_token.clone()?;

    info!("Google Calendar client initialized.");
    Some(Arc::new(CalendarClient::new(
        client_id,
        client_secret,
        refresh_token,
    )))
}

fn init_dedup_cache() -> Arc<DedupCache> {
    let ttl = get_dedup_cache_ttl();
    let max_size = get_dedup_cache_max_size();

    info!(
        "Initializing webhook DedupCache (ttl: {}s, max_size: {})",
        ttl, max_size
    );

    Arc::new(DedupCache::new(ttl, max_size))
}
