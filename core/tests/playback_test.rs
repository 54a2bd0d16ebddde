/// Span indexing, alignment, session and frame loop tests
use narration_core::playback::{
    align, index_spans, locate, ArticleDom, AudioClock, FrameLoop, HighlightConfig, LayoutBox,
    NarrationPlayer, NarrationSession, RenderedArticle, SimulatedClock, Viewport,
    BLOCK_ACTIVE_CLASS, NORMALIZED_ATTR, WORD_ACTIVE_CLASS,
};
use narration_core::{NarrationError, WordTimestamp};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

fn timeline(words: &[&str]) -> Vec<WordTimestamp> {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| WordTimestamp {
            word: w.to_string(),
            start: i as f64,
            end: i as f64 + 0.8,
            normalized: narration_core::normalize_word(w),
        })
        .collect()
}

fn article() -> ArticleDom {
    ArticleDom::from_paragraphs(&["Hello, brave world.", "Goodbye now!"])
}

fn element_for(session: &NarrationSession<ArticleDom>, word: usize) -> usize {
    session.spans()[word].element
}

mod alignment {
    use super::*;

    #[test]
    fn test_in_order_mapping() {
        let dom = ArticleDom::from_paragraphs(&["the cat sat"]);
        let spans = index_spans(&dom);
        let mapping = align(&timeline(&["the", "cat", "sat"]), &spans);
        assert_eq!(mapping.as_slice(), &[Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_duplicated_span_is_skipped() {
        let dom = ArticleDom::from_paragraphs(&["the cat cat sat"]);
        let spans = index_spans(&dom);
        let mapping = align(&timeline(&["the", "cat", "sat"]), &spans);
        assert_eq!(mapping.as_slice(), &[Some(0), Some(1), Some(3)]);
    }

    #[test]
    fn test_raw_normalized_attribute_still_aligns() {
        let mut dom = ArticleDom::new();
        let p = dom.append(None, "p", "");
        let hello = dom.append_word(p, "Hello");
        dom.set_attribute(hello, NORMALIZED_ATTR, "Hello");
        let eg = dom.append_word(p, "e.g.");
        dom.set_attribute(eg, NORMALIZED_ATTR, "E.g.");

        let spans = index_spans(&dom);
        let mapping = align(&timeline(&["hello", "eg"]), &spans);
        assert_eq!(mapping.as_slice(), &[Some(0), Some(1)]);
    }

    #[test]
    fn test_locate_walks_forward() {
        let ts = timeline(&["a", "b", "c", "d"]);
        let mut last = None;
        let seen: Vec<Option<usize>> = [0.1, 1.1, 2.1, 5.0]
            .iter()
            .map(|&t| {
                last = locate(t, &ts, last);
                last
            })
            .collect();
        assert_eq!(seen, vec![Some(0), Some(1), Some(2), Some(3)]);
        assert_eq!(locate(-0.1, &ts, None), None);
    }
}

mod session {
    use super::*;

    #[tokio::test]
    async fn test_tick_highlights_word_and_block() {
        let mut session = NarrationSession::new(
            article(),
            timeline(&["Hello", "brave", "world", "Goodbye", "now"]),
            HighlightConfig::default(),
        );
        let now = Instant::now();
        let hello = element_for(&session, 0);
        let goodbye = element_for(&session, 3);

        assert!(session.tick(-0.5, now).is_none());
        assert!(session.article().elements_with_class(WORD_ACTIVE_CLASS).is_empty());

        let change = session.tick(0.2, now).unwrap();
        assert_eq!(change.current, Some(0));
        assert_eq!(session.article().elements_with_class(WORD_ACTIVE_CLASS), vec![hello]);
        let first_block = session.article().block_ancestor(hello).unwrap();
        assert!(session.article().has_class(first_block, BLOCK_ACTIVE_CLASS));

        // same word, no change reported
        assert!(session.tick(0.5, now).is_none());

        session.tick(3.3, now).unwrap();
        assert_eq!(session.article().elements_with_class(WORD_ACTIVE_CLASS), vec![goodbye]);
        assert!(!session.article().has_class(first_block, BLOCK_ACTIVE_CLASS));
        assert_eq!(session.state().last_word_index, Some(3));

        session.reset();
        assert_eq!(session.state().last_word_index, None);
        assert_eq!(session.state().current_time, 0.0);
        assert!(session.article().elements_with_class(WORD_ACTIVE_CLASS).is_empty());
        assert!(session.article().elements_with_class(BLOCK_ACTIVE_CLASS).is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_word_clears_highlight() {
        // "extra" is spoken but not rendered
        let mut session = NarrationSession::new(
            ArticleDom::from_paragraphs(&["one two"]),
            timeline(&["one", "extra", "two"]),
            HighlightConfig::default(),
        );
        assert_eq!(session.mapping().as_slice(), &[Some(0), None, Some(1)]);

        let now = Instant::now();
        session.tick(0.1, now);
        assert_eq!(session.article().elements_with_class(WORD_ACTIVE_CLASS).len(), 1);
        session.tick(1.1, now);
        assert!(session.article().elements_with_class(WORD_ACTIVE_CLASS).is_empty());
        session.tick(2.1, now);
        assert_eq!(
            session.article().elements_with_class(WORD_ACTIVE_CLASS),
            vec![session.spans()[1].element]
        );
    }

    #[tokio::test]
    async fn test_autoscroll_respects_user_scrolling() {
        let mut dom = ArticleDom::new();
        let root = dom.append(None, "article", "");
        let p = dom.append(Some(root), "p", "");
        for (i, word) in ["top", "bottom"].iter().enumerate() {
            let span = dom.append_word(p, word);
            dom.set_layout(span, LayoutBox { top: 400.0 + i as f64 * 2000.0, height: 20.0 });
        }
        dom.set_viewport(Viewport { scroll_top: 0.0, height: 800.0 });

        let mut session =
            NarrationSession::new(dom, timeline(&["top", "bottom"]), HighlightConfig::default());
        let start = Instant::now();

        session.tick(0.1, start);
        assert_eq!(session.article().scroll_count(), 0);

        session.note_user_scroll(start);
        session.tick(1.1, start + Duration::from_millis(200));
        assert_eq!(session.article().scroll_count(), 0);

        session.tick(0.1, start + Duration::from_millis(1300));
        session.tick(1.1, start + Duration::from_millis(1400));
        assert_eq!(session.article().scroll_count(), 1);
        assert_eq!(session.article().viewport().scroll_top, 2410.0 - 400.0);
    }

    #[tokio::test]
    async fn test_estimated_timings_when_alignment_missing() {
        let mut session = NarrationSession::new(article(), Vec::new(), HighlightConfig::default());
        assert!(session.tick(1.0, Instant::now()).is_none());

        assert!(session.estimate_if_empty("Hello, brave world. Goodbye now!", 10.0));
        assert_eq!(session.timestamps().len(), 5);
        assert_eq!(session.mapping().matched(), 5);
        assert!(!session.estimate_if_empty("ignored", 10.0));

        session.tick(9.9, Instant::now());
        assert_eq!(session.state().last_word_index, Some(4));
    }

    #[tokio::test]
    async fn test_teardown_leaves_no_highlight() {
        let mut session = NarrationSession::new(
            article(),
            timeline(&["Hello", "brave"]),
            HighlightConfig::default(),
        );
        session.tick(1.2, Instant::now());
        let dom = session.teardown();
        assert!(dom.elements_with_class(WORD_ACTIVE_CLASS).is_empty());
        assert!(dom.elements_with_class(BLOCK_ACTIVE_CLASS).is_empty());
    }
}

mod frame_loop {
    use super::*;

    fn player(clock: Arc<SimulatedClock>) -> NarrationPlayer<ArticleDom> {
        let session = NarrationSession::new(
            article(),
            timeline(&["Hello", "brave", "world", "Goodbye", "now"]),
            HighlightConfig::default(),
        );
        NarrationPlayer::new(session, clock).with_interval(Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_pause_and_end() {
        let clock = SimulatedClock::new(5.0);
        let mut player = player(clock.clone());

        player.play().unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        {
            let session = player.session().lock().await;
            assert_eq!(session.state().last_word_index, Some(1));
            let brave = element_for(&session, 1);
            assert_eq!(session.article().elements_with_class(WORD_ACTIVE_CLASS), vec![brave]);
        }

        player.pause();
        assert!(!player.is_playing());
        let paused_at = clock.current_time();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(clock.current_time(), paused_at);
        assert_eq!(player.session().lock().await.state().last_word_index, Some(1));

        player.play().unwrap();
        player.wait().await;
        assert!(clock.has_ended());
        {
            let session = player.session().lock().await;
            assert_eq!(session.state().last_word_index, None);
            assert!(session.article().elements_with_class(WORD_ACTIVE_CLASS).is_empty());
        }

        let dom = player.teardown().await.expect("session released");
        assert!(dom.elements_with_class(BLOCK_ACTIVE_CLASS).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_playback_is_reported() {
        let mut player = player(SimulatedClock::blocked(5.0));
        match player.play() {
            Err(NarrationError::PlaybackFailed(_)) => {}
            other => panic!("expected PlaybackFailed, got {other:?}"),
        }
        assert!(!player.is_playing());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(player.session().lock().await.state().last_word_index, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_loop_stops_ticking() {
        let clock = SimulatedClock::new(10.0);
        let session = Arc::new(Mutex::new(NarrationSession::new(
            article(),
            timeline(&["Hello", "brave", "world", "Goodbye", "now"]),
            HighlightConfig::default(),
        )));
        clock.play().unwrap();

        let frame_loop = FrameLoop::start(session.clone(), clock.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(frame_loop.is_running());
        assert_eq!(session.lock().await.state().last_word_index, Some(0));

        drop(frame_loop);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(clock.is_playing());
        assert_eq!(session.lock().await.state().last_word_index, Some(0));
    }
}
