mod config;
use config::NarrateConfig;
use narration_core::article::{extract_speakable_text, parse_slug, ArticleSource, FsArticleSource};
use narration_core::client::{ArticleView, NarrationClient, NarrationState};
use narration_core::playback::{
    ArticleDom, AudioClock, NarrationPlayer, NarrationSession, SimulatedClock,
};
use narration_core::telemetry::{init_tracing, DEFAULT_FILTER};
use narration_core::{SlugParam, WordTimestamp};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    init_tracing(&format!("{DEFAULT_FILTER},narrate=info"))?;

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = NarrateConfig::load();
    let Some(slug) = std::env::args().nth(1).or_else(|| cfg.slug.clone()) else {
        error!(target: "narrate", "No article given; usage: narrate <slug>");
        return Err("missing slug".into());
    };
    info!(target: "narrate", slug = %slug, api = %cfg.api.base_url, "Starting narration demo");

    // 1) Acquire the narration through the API
    let client = NarrationClient::new(&cfg.api.base_url, cfg.request_timeout())?;
    let mut view = ArticleView::new(client);
    let mut state = view.subscribe();
    view.load(SlugParam::Path(slug.clone()));
    let settled = state
        .wait_for(|s| !matches!(s, NarrationState::Loading { .. }))
        .await?
        .clone();
    view.teardown();
    let narration = match settled {
        NarrationState::Ready { narration, .. } => narration,
        NarrationState::Failed { error, .. } => {
            error!(target: "narrate", slug = %slug, error = %error, "Narration unavailable");
            return Err(error.into());
        }
        other => return Err(format!("unexpected narration state: {other:?}").into()),
    };
    info!(
        target: "narrate",
        audio = %narration.audio_url,
        words = narration.timestamps.len(),
        "Narration ready"
    );

    // 2) Render the article the narration belongs to
    let text = match local_article_text(&cfg, &slug).await {
        Some(text) => text,
        None => {
            warn!(target: "narrate", slug = %slug, "Article not readable locally; rendering narration words");
            words_as_text(&narration.timestamps)
        }
    };
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let article = ArticleDom::from_paragraphs(&paragraphs);

    // 3) Session + clock
    let duration = narration
        .timestamps
        .last()
        .map(|t| t.end)
        .filter(|end| *end > 0.0)
        .unwrap_or(cfg.playback.fallback_duration_secs);
    let mut session = NarrationSession::new(article, narration.timestamps, cfg.highlight);
    if cfg.playback.estimate_when_unaligned {
        session.estimate_if_empty(&text, duration);
    }
    let words: Vec<String> = session.timestamps().iter().map(|t| t.word.clone()).collect();
    let clock = SimulatedClock::with_rate(duration, cfg.playback.rate);
    let mut player = NarrationPlayer::new(session, clock.clone()).with_interval(cfg.frame_interval());

    // 4) Print each word as the highlight reaches it
    let session = player.session().clone();
    let monitor_clock = clock.clone();
    let interval = cfg.frame_interval();
    let monitor = tokio::spawn(async move {
        let mut last = None;
        let mut ticker = tokio::time::interval(interval);
        while !monitor_clock.has_ended() {
            ticker.tick().await;
            let current = session.lock().await.state().last_word_index;
            if current != last {
                if let Some(word) = current.and_then(|i| words.get(i)) {
                    println!("{:>8.2}s  {}", monitor_clock.current_time(), word);
                }
                last = current;
            }
        }
    });

    // 5) Play until the end or Ctrl+C
    player.play()?;
    tokio::select! {
        _ = player.wait() => {
            info!(target: "narrate", "Narration finished");
        }
        _ = signal::ctrl_c() => {
            info!(target: "narrate", "Ctrl+C received; stopping");
            player.pause();
        }
    }
    monitor.abort();
    player.teardown().await;
    Ok(())
}

/// Speakable text of the article as the server would narrate it
async fn local_article_text(cfg: &NarrateConfig, slug: &str) -> Option<String> {
    let segments = parse_slug(Some(&SlugParam::Path(slug.to_string()))).ok()?;
    let source = FsArticleSource::new(&cfg.content_dir);
    let body = source.load(&segments).await.ok()?;
    let text = extract_speakable_text(&body);
    (!text.trim().is_empty()).then_some(text)
}

fn words_as_text(timestamps: &[WordTimestamp]) -> String {
    timestamps
        .iter()
        .map(|t| t.word.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
