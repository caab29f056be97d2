//! Sentidash - render one dashboard screen to stdout.
//!
//! Usage: `sentidash [FIXTURE.json] [SEARCH] [POLL_ID=CHOICE]`. Without a
//! fixture argument the configured `source.path` is used. The vote argument
//! applies when `source.kind = "polls"` (the default) and is cast as
//! `source.user`.

use sentidash::config::{self, Config, LoggingConfig, SourceKind};
use sentidash::{Action, Error, JsonFileSource, Result, Store, VoteChoice};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load_or_default()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _guard = init_logging(&config.logging)?;

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .map(Into::into)
        .or_else(|| config.source.path.clone())
        .ok_or_else(|| Error::config("No fixture given and source.path is not set"))?;
    let search = args.next();
    let vote = args.next();

    let source = JsonFileSource::new(path);
    let (action_tx, mut action_rx) = mpsc::unbounded_channel();
    let mut store = Store::new(action_tx);

    match config.source.kind {
        SourceKind::Entities => store.load_from(&source)?,
        SourceKind::Polls => {
            store.dispatch(Action::PollsLoaded(source.polls()?))?;
            store.dispatch(Action::SetUser(config.source.user.clone()))?;
            if let Some(vote) = vote {
                let (poll_id, choice) = parse_vote(&vote)?;
                store.dispatch(Action::CastVote {
                    poll_id,
                    user_id: config.source.user.clone(),
                    choice,
                })?;
            }
        }
    }
    store.dispatch(Action::SetFilter(config.screen.filter.clone()))?;
    store.dispatch(Action::SetSort(config.screen.sort.clone()))?;
    store.dispatch(Action::SetLimit(config.screen.limit))?;
    if let Some(query) = search {
        store.dispatch(Action::Search(query))?;
    }
    store.drain(&mut action_rx);
    if let Some(error) = &store.error {
        eprintln!("{error}");
    }

    let engine = config.engine();
    let result = store.query(&engine);

    println!(
        "{} ({} by {})",
        source.name(),
        store.sort.direction,
        store.sort.key
    );
    for entity in &result.rows {
        let label = entity.text_fields.first().map_or("", String::as_str);
        println!("  {:<8} {}", entity.id, label);
    }
    println!("{}", serde_json::to_string_pretty(&result.stats)?);

    Ok(())
}

/// Parse `POLL_ID=CHOICE`, e.g. `1=holding`.
fn parse_vote(arg: &str) -> Result<(String, VoteChoice)> {
    let (poll_id, choice) = arg
        .split_once('=')
        .ok_or_else(|| Error::invalid_input(format!("Expected POLL_ID=CHOICE, got {arg}")))?;
    Ok((poll_id.to_string(), choice.parse()?))
}

fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());

    let (file_layer, guard) = if logging.file {
        let appender = tracing_appender::rolling::daily(config::log_dir()?, "sentidash.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    Ok(guard)
}
