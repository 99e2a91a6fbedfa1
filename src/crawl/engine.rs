// src/crawl/engine.rs
// =============================================================================
// The breadth-first crawl loop.
//
// How it works:
// 1. Take the next title from the frontier (stop when it is empty)
// 2. Skip it if it was already crawled
// 3. Fetch its links; on failure log it and move on (the page is dropped
//    for this session but can come back through another page's links)
// 4. Persist page -> links to the graph; a failure here stops the crawl
// 5. Mark the page visited and queue every link we have not seen
// 6. Every `checkpoint_every` pages, write a checkpoint
//
// The loop stops when the frontier is empty, when the page budget is used up,
// or when it is cancelled. In every case a final checkpoint is written.
//
// States: Idle -> Running -> (Exhausted | BudgetReached | Cancelled) -> Stopped
//
// Politeness is enforced by the link source itself (see wiki::pacer), so the
// loop does not sleep on its own.
// =============================================================================

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::frontier::Frontier;
use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::graph::{GraphError, GraphStore, GraphWriter};
use crate::wiki::LinkSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Running,
    Exhausted,
    BudgetReached,
    Cancelled,
    Stopped,
}

/// Why a crawl session ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// No pages left to crawl.
    Exhausted,
    /// The visited set reached `max_pages`.
    BudgetReached,
    /// Stopped on request (Ctrl-C).
    Cancelled,
}

impl From<CrawlOutcome> for CrawlState {
    fn from(outcome: CrawlOutcome) -> Self {
        match outcome {
            CrawlOutcome::Exhausted => CrawlState::Exhausted,
            CrawlOutcome::BudgetReached => CrawlState::BudgetReached,
            CrawlOutcome::Cancelled => CrawlState::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Stop once this many pages are visited (counting previous sessions).
    pub max_pages: usize,
    /// Write a checkpoint after this many crawled pages.
    pub checkpoint_every: usize,
}

/// What happened during one `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub outcome: CrawlOutcome,
    /// Pages fetched and persisted in this session.
    pub crawled: usize,
    /// Pages whose fetch failed and were dropped.
    pub failed: usize,
    /// Dequeued titles that were already visited.
    pub skipped: usize,
    /// Checkpoints written, including the final one.
    pub checkpoints: usize,
    pub visited_total: usize,
    pub frontier_len: usize,
}

/// Errors that end a crawl session early (or spoil its final checkpoint).
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("could not persist links of '{page}': {source}")]
    Persistence {
        page: String,
        #[source]
        source: GraphError,
    },

    #[error("final checkpoint failed: {0}")]
    Checkpoint(#[source] CheckpointError),
}

#[derive(Debug, Default)]
struct Counters {
    crawled: usize,
    failed: usize,
    skipped: usize,
    checkpoints: usize,
}

pub struct Crawler<L, G, C> {
    source: L,
    writer: GraphWriter<G>,
    checkpoints: C,
    settings: CrawlSettings,
    cancel: CancellationToken,
    state: CrawlState,
}

impl<L, G, C> Crawler<L, G, C>
where
    L: LinkSource,
    G: GraphStore,
    C: CheckpointStore,
{
    pub fn new(source: L, writer: GraphWriter<G>, checkpoints: C, settings: CrawlSettings) -> Self {
        Self {
            source,
            writer,
            checkpoints,
            settings,
            cancel: CancellationToken::new(),
            state: CrawlState::Idle,
        }
    }

    /// Uses `token` to stop the crawl from outside.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn writer(&self) -> &GraphWriter<G> {
        &self.writer
    }

    #[cfg(test)]
    pub fn checkpoints(&self) -> &C {
        &self.checkpoints
    }

    fn transition(&mut self, next: CrawlState) {
        debug!(from = ?self.state, to = ?next, "crawl state change");
        self.state = next;
    }

    /// Runs the crawl until the frontier is empty, the budget is reached or
    /// the crawl is cancelled.
    ///
    /// The visited set only grows after a page was both fetched and
    /// persisted, so a checkpoint never claims a page the graph is missing.
    pub async fn run(&mut self, frontier: &mut Frontier) -> Result<CrawlSummary, CrawlError> {
        self.transition(CrawlState::Running);
        info!(
            visited = frontier.visited_len(),
            queued = frontier.queue_len(),
            max_pages = self.settings.max_pages,
            "starting crawl"
        );

        let mut counters = Counters::default();
        let mut since_checkpoint = 0usize;

        let outcome = loop {
            if self.cancel.is_cancelled() {
                break CrawlOutcome::Cancelled;
            }
            if frontier.visited_len() >= self.settings.max_pages {
                break CrawlOutcome::BudgetReached;
            }
            let Some(page) = frontier.dequeue() else {
                break CrawlOutcome::Exhausted;
            };

            if frontier.is_visited(&page) {
                info!(page = %page, "already crawled, skipping");
                counters.skipped += 1;
                continue;
            }

            info!(
                "Crawling: {} ({}/{})",
                page,
                frontier.visited_len() + 1,
                self.settings.max_pages
            );

            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                result = self.source.fetch(&page) => Some(result),
            };
            let Some(fetched) = fetched else {
                // Interrupted mid-fetch: keep the page for the next session
                frontier.requeue_front(page);
                break CrawlOutcome::Cancelled;
            };

            let links = match fetched {
                Ok(links) => links,
                Err(e) => {
                    warn!(page = %page, error = %e, "error getting links, skipping page");
                    counters.failed += 1;
                    continue;
                }
            };

            if let Err(source) = self.writer.persist(&page, links.page_id, &links.links).await {
                frontier.requeue_front(page.clone());
                self.best_effort_checkpoint(frontier).await;
                self.transition(CrawlState::Stopped);
                return Err(CrawlError::Persistence { page, source });
            }

            frontier.mark_visited(&page);
            let discovered = links
                .links
                .iter()
                .filter(|link| frontier.enqueue_if_new(link))
                .count();
            debug!(page = %page, links = links.links.len(), discovered, "page crawled");

            counters.crawled += 1;
            since_checkpoint += 1;
            if since_checkpoint >= self.settings.checkpoint_every {
                match frontier.save(&self.checkpoints).await {
                    Ok(()) => {
                        counters.checkpoints += 1;
                        info!(
                            visited = frontier.visited_len(),
                            queued = frontier.queue_len(),
                            "Progress saved."
                        );
                    }
                    Err(e) => warn!(error = %e, "checkpoint failed, continuing in memory"),
                }
                since_checkpoint = 0;
            }
        };

        self.transition(outcome.into());

        if let Err(e) = frontier.save(&self.checkpoints).await {
            self.transition(CrawlState::Stopped);
            return Err(CrawlError::Checkpoint(e));
        }
        counters.checkpoints += 1;
        info!("Final progress saved.");
        self.transition(CrawlState::Stopped);

        Ok(CrawlSummary {
            outcome,
            crawled: counters.crawled,
            failed: counters.failed,
            skipped: counters.skipped,
            checkpoints: counters.checkpoints,
            visited_total: frontier.visited_len(),
            frontier_len: frontier.queue_len(),
        })
    }

    async fn best_effort_checkpoint(&self, frontier: &Frontier) {
        match frontier.save(&self.checkpoints).await {
            Ok(()) => info!("progress saved before stopping"),
            Err(e) => warn!(error = %e, "could not save progress before stopping"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;
    use crate::graph::{MemoryGraph, PageLinksUpsert};
    use crate::wiki::{FetchError, PageLinks};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // ---- test doubles -------------------------------------------------------

    /// Link source answering from a fixed table.
    #[derive(Default)]
    struct MockSource {
        pages: HashMap<String, (u64, Vec<String>)>,
        // title -> how many more fetches fail
        failures: Mutex<HashMap<String, usize>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockSource {
        fn new(table: &[(&str, &[&str])]) -> Self {
            let pages = table
                .iter()
                .enumerate()
                .map(|(i, (title, links))| {
                    let links = links.iter().map(|l| l.to_string()).collect();
                    (title.to_string(), (i as u64 + 1, links))
                })
                .collect();
            Self {
                pages,
                ..Self::default()
            }
        }

        fn failing(self, title: &str, times: usize) -> Self {
            self.failures.lock().unwrap().insert(title.to_string(), times);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LinkSource for MockSource {
        async fn fetch(&self, title: &str) -> Result<PageLinks, FetchError> {
            self.calls.lock().unwrap().push(title.to_string());

            if let Some(left) = self.failures.lock().unwrap().get_mut(title) {
                if *left > 0 {
                    *left -= 1;
                    return Err(FetchError::Status {
                        title: title.to_string(),
                        status: StatusCode::BAD_GATEWAY,
                    });
                }
            }

            match self.pages.get(title) {
                Some((id, links)) => Ok(PageLinks {
                    page_id: Some(*id),
                    links: links.iter().cloned().collect(),
                }),
                None => Err(FetchError::MissingPage {
                    title: title.to_string(),
                }),
            }
        }
    }

    /// Link source that cancels the crawl and then never answers.
    struct HangingSource {
        token: CancellationToken,
    }

    #[async_trait]
    impl LinkSource for HangingSource {
        async fn fetch(&self, _title: &str) -> Result<PageLinks, FetchError> {
            self.token.cancel();
            std::future::pending().await
        }
    }

    /// Graph store that records every upsert it receives.
    #[derive(Default)]
    struct RecordingGraph {
        upserts: Mutex<Vec<PageLinksUpsert>>,
    }

    #[async_trait]
    impl GraphStore for RecordingGraph {
        async fn upsert_page_links(&self, upsert: &PageLinksUpsert) -> Result<(), GraphError> {
            self.upserts.lock().unwrap().push(upsert.clone());
            Ok(())
        }
    }

    /// Checkpoint store that keeps every (visited, frontier) pair written.
    #[derive(Default)]
    struct RecordingCheckpoints {
        pending_frontier: Mutex<Vec<String>>,
        history: Mutex<Vec<(Vec<String>, Vec<String>)>>,
    }

    #[async_trait]
    impl CheckpointStore for RecordingCheckpoints {
        async fn load_visited(&self) -> Result<Option<Vec<String>>, CheckpointError> {
            Ok(None)
        }

        async fn load_frontier(&self) -> Result<Option<Vec<String>>, CheckpointError> {
            Ok(None)
        }

        async fn store_visited(&self, visited: &[String]) -> Result<(), CheckpointError> {
            let frontier = self.pending_frontier.lock().unwrap().clone();
            self.history.lock().unwrap().push((visited.to_vec(), frontier));
            Ok(())
        }

        async fn store_frontier(&self, frontier: &[String]) -> Result<(), CheckpointError> {
            *self.pending_frontier.lock().unwrap() = frontier.to_vec();
            Ok(())
        }
    }

    /// Checkpoint store whose frontier writes start failing after a while.
    struct FlakyFrontierCheckpoints {
        inner: MemoryCheckpointStore,
        frontier_writes_left: AtomicUsize,
    }

    impl FlakyFrontierCheckpoints {
        fn new(frontier_writes_left: usize) -> Self {
            Self {
                inner: MemoryCheckpointStore::new(),
                frontier_writes_left: AtomicUsize::new(frontier_writes_left),
            }
        }
    }

    #[async_trait]
    impl CheckpointStore for FlakyFrontierCheckpoints {
        async fn load_visited(&self) -> Result<Option<Vec<String>>, CheckpointError> {
            self.inner.load_visited().await
        }

        async fn load_frontier(&self) -> Result<Option<Vec<String>>, CheckpointError> {
            self.inner.load_frontier().await
        }

        async fn store_visited(&self, visited: &[String]) -> Result<(), CheckpointError> {
            self.inner.store_visited(visited).await
        }

        async fn store_frontier(&self, frontier: &[String]) -> Result<(), CheckpointError> {
            let allowed = self
                .frontier_writes_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if !allowed {
                return Err(CheckpointError::Unavailable("queue.json is read-only".to_string()));
            }
            self.inner.store_frontier(frontier).await
        }
    }

    fn settings(max_pages: usize, checkpoint_every: usize) -> CrawlSettings {
        CrawlSettings {
            max_pages,
            checkpoint_every,
        }
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn pending(frontier: &Frontier) -> Vec<&str> {
        frontier.pending().collect()
    }

    fn chemistry() -> MockSource {
        MockSource::new(&[
            ("Hydrogen", &["Oxygen", "Water"]),
            ("Oxygen", &["Water", "Ozone"]),
            ("Water", &["Ice"]),
            ("Ozone", &[]),
            ("Ice", &[]),
        ])
    }

    // ---- scenarios ----------------------------------------------------------

    #[tokio::test]
    async fn test_hydrogen_scenario_budget_three() {
        let mut crawler = Crawler::new(
            chemistry(),
            GraphWriter::new(RecordingGraph::default()),
            RecordingCheckpoints::default(),
            settings(3, 2),
        );
        let mut frontier = Frontier::seeded("Hydrogen");

        let summary = crawler.run(&mut frontier).await.unwrap();

        assert_eq!(summary.outcome, CrawlOutcome::BudgetReached);
        assert_eq!(summary.crawled, 3);
        assert_eq!(crawler.state(), CrawlState::Stopped);

        // Visited in BFS order
        assert_eq!(crawler.source.calls(), strings(&["Hydrogen", "Oxygen", "Water"]));
        for page in ["Hydrogen", "Oxygen", "Water"] {
            assert!(frontier.is_visited(page));
        }
        assert_eq!(pending(&frontier), vec!["Ozone", "Ice"]);

        // One checkpoint after two pages, one final
        let history = crawler.checkpoints().history.lock().unwrap().clone();
        assert_eq!(summary.checkpoints, 2);
        assert_eq!(
            history,
            vec![
                (strings(&["Hydrogen", "Oxygen"]), strings(&["Water", "Ozone"])),
                (strings(&["Hydrogen", "Oxygen", "Water"]), strings(&["Ozone", "Ice"])),
            ]
        );

        // One upsert per crawled page, edges exactly as the source listed them
        let upserts = crawler.writer().store().upserts.lock().unwrap().clone();
        assert_eq!(
            upserts,
            vec![
                PageLinksUpsert {
                    page: "Hydrogen".to_string(),
                    page_id: Some(1),
                    links: strings(&["Oxygen", "Water"]),
                },
                PageLinksUpsert {
                    page: "Oxygen".to_string(),
                    page_id: Some(2),
                    links: strings(&["Water", "Ozone"]),
                },
                PageLinksUpsert {
                    page: "Water".to_string(),
                    page_id: Some(3),
                    links: strings(&["Ice"]),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_is_dropped_not_visited() {
        let source = chemistry().failing("Oxygen", 1);
        let mut crawler = Crawler::new(
            source,
            GraphWriter::new(MemoryGraph::new()),
            MemoryCheckpointStore::new(),
            settings(100, 5),
        );
        let mut frontier = Frontier::seeded("Hydrogen");

        let summary = crawler.run(&mut frontier).await.unwrap();

        assert_eq!(summary.outcome, CrawlOutcome::Exhausted);
        assert_eq!(summary.failed, 1);
        assert!(!frontier.is_visited("Oxygen"));
        assert!(!pending(&frontier).contains(&"Oxygen"));
        // Ozone was only reachable through Oxygen
        assert!(!frontier.is_visited("Ozone"));

        let graph = crawler.writer().store();
        assert!(graph.edges_from("Oxygen").is_empty());
        assert_eq!(graph.page_id("Oxygen"), Some(None));
        assert_eq!(graph.upserts(), 3); // Hydrogen, Water, Ice
    }

    #[tokio::test]
    async fn test_failed_page_is_retried_when_rediscovered() {
        let source = MockSource::new(&[
            ("Hydrogen", &["Oxygen", "Water"]),
            ("Water", &["Oxygen"]),
            ("Oxygen", &[]),
        ])
        .failing("Oxygen", 1);
        let mut crawler = Crawler::new(
            source,
            GraphWriter::new(MemoryGraph::new()),
            MemoryCheckpointStore::new(),
            settings(100, 5),
        );
        let mut frontier = Frontier::seeded("Hydrogen");

        crawler.run(&mut frontier).await.unwrap();

        assert!(frontier.is_visited("Oxygen"));
        assert_eq!(
            crawler.source.calls(),
            strings(&["Hydrogen", "Oxygen", "Water", "Oxygen"])
        );
    }

    #[tokio::test]
    async fn test_budget_is_never_exceeded() {
        for budget in 1..=5 {
            let mut crawler = Crawler::new(
                chemistry(),
                GraphWriter::new(MemoryGraph::new()),
                MemoryCheckpointStore::new(),
                settings(budget, 1),
            );
            let mut frontier = Frontier::seeded("Hydrogen");
            crawler.run(&mut frontier).await.unwrap();
            assert!(frontier.visited_len() <= budget);
        }
    }

    #[tokio::test]
    async fn test_restored_visited_over_budget_fetches_nothing() {
        let store = MemoryCheckpointStore::with_state(
            strings(&["Hydrogen", "Oxygen"]),
            strings(&["Water"]),
        );
        let mut frontier = Frontier::load(&store, "Hydrogen").await.unwrap();
        let mut crawler = Crawler::new(
            chemistry(),
            GraphWriter::new(MemoryGraph::new()),
            store,
            settings(2, 5),
        );

        let summary = crawler.run(&mut frontier).await.unwrap();
        assert_eq!(summary.outcome, CrawlOutcome::BudgetReached);
        assert!(crawler.source.calls().is_empty());
        // The final checkpoint is still written
        assert_eq!(crawler.checkpoints().writes(), 1);
    }

    #[tokio::test]
    async fn test_stale_visited_entry_is_skipped_without_fetch() {
        let store = MemoryCheckpointStore::with_state(
            strings(&["Hydrogen"]),
            strings(&["Hydrogen", "Ice"]),
        );
        let mut frontier = Frontier::load(&store, "Hydrogen").await.unwrap();
        let mut crawler = Crawler::new(
            chemistry(),
            GraphWriter::new(MemoryGraph::new()),
            store,
            settings(2, 5),
        );

        let summary = crawler.run(&mut frontier).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.crawled, 1);
        assert_eq!(crawler.source.calls(), strings(&["Ice"]));
    }

    #[tokio::test]
    async fn test_resume_continues_where_the_last_session_stopped() {
        let store = MemoryCheckpointStore::new();

        let mut first = Crawler::new(
            chemistry(),
            GraphWriter::new(MemoryGraph::new()),
            store,
            settings(2, 10),
        );
        let mut frontier = Frontier::load(first.checkpoints(), "Hydrogen").await.unwrap();
        first.run(&mut frontier).await.unwrap();
        let Crawler { checkpoints: store, .. } = first;

        // The start page is ignored once a checkpoint exists
        let mut frontier = Frontier::load(&store, "Ice").await.unwrap();
        assert_eq!(pending(&frontier), vec!["Water", "Ozone"]);

        let mut second = Crawler::new(
            chemistry(),
            GraphWriter::new(MemoryGraph::new()),
            store,
            settings(4, 10),
        );
        second.run(&mut frontier).await.unwrap();

        assert_eq!(second.source.calls(), strings(&["Water", "Ozone"]));
        let visited: HashSet<_> = frontier.snapshot().visited.into_iter().collect();
        let expected: HashSet<_> = strings(&["Hydrogen", "Oxygen", "Water", "Ozone"])
            .into_iter()
            .collect();
        assert_eq!(visited, expected);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_fatal_and_keeps_the_page() {
        let graph = MemoryGraph::new();
        graph.fail_on("Oxygen");
        let mut crawler = Crawler::new(
            chemistry(),
            GraphWriter::new(graph),
            MemoryCheckpointStore::new(),
            settings(100, 50),
        );
        let mut frontier = Frontier::seeded("Hydrogen");

        let err = crawler.run(&mut frontier).await.unwrap_err();

        assert!(matches!(err, CrawlError::Persistence { ref page, .. } if page == "Oxygen"));
        assert_eq!(crawler.state(), CrawlState::Stopped);
        assert!(!frontier.is_visited("Oxygen"));
        assert_eq!(pending(&frontier), vec!["Oxygen", "Water"]);

        // A best-effort checkpoint was written with Oxygen still pending
        let saved = Frontier::load(crawler.checkpoints(), "Hydrogen").await.unwrap();
        assert_eq!(saved, frontier);
    }

    #[tokio::test]
    async fn test_checkpoint_failures_do_not_stop_the_crawl() {
        let store = MemoryCheckpointStore::new();
        store.set_failing(true);
        let mut crawler = Crawler::new(
            chemistry(),
            GraphWriter::new(MemoryGraph::new()),
            store,
            settings(100, 1),
        );
        let mut frontier = Frontier::seeded("Hydrogen");

        let err = crawler.run(&mut frontier).await.unwrap_err();

        // Every page was still crawled and persisted; only the final save failed
        assert!(matches!(err, CrawlError::Checkpoint(_)));
        assert_eq!(frontier.visited_len(), 5);
        assert_eq!(crawler.writer().store().upserts(), 5);
    }

    #[tokio::test]
    async fn test_failed_frontier_write_never_strands_discovered_links() {
        let mut crawler = Crawler::new(
            MockSource::new(&[("Hydrogen", &["Oxygen"]), ("Oxygen", &["Ozone"])]),
            GraphWriter::new(MemoryGraph::new()),
            FlakyFrontierCheckpoints::new(1),
            settings(2, 1),
        );
        let mut frontier = Frontier::seeded("Hydrogen");

        // Checkpoint after Hydrogen succeeds, the one after Oxygen and the
        // final one fail on the frontier write
        let err = crawler.run(&mut frontier).await.unwrap_err();
        assert!(matches!(err, CrawlError::Checkpoint(_)));
        assert!(frontier.is_visited("Oxygen"));

        // What is on disk still leads to Ozone: Oxygen is pending, not visited
        let saved = Frontier::load(crawler.checkpoints(), "Hydrogen").await.unwrap();
        assert!(saved.is_visited("Hydrogen"));
        assert!(!saved.is_visited("Oxygen"));
        assert_eq!(saved.visited_len(), 1);
        assert_eq!(pending(&saved), vec!["Oxygen"]);

        // A resumed session crawls Oxygen again and reaches Ozone
        let mut resumed = Crawler::new(
            MockSource::new(&[("Oxygen", &["Ozone"]), ("Ozone", &[])]),
            GraphWriter::new(MemoryGraph::new()),
            MemoryCheckpointStore::new(),
            settings(100, 1),
        );
        let mut saved = saved;
        resumed.run(&mut saved).await.unwrap();
        assert_eq!(resumed.source.calls(), strings(&["Oxygen", "Ozone"]));
        assert!(saved.is_visited("Ozone"));
    }

    #[tokio::test]
    async fn test_cancel_before_start_still_checkpoints() {
        let token = CancellationToken::new();
        token.cancel();
        let mut crawler = Crawler::new(
            chemistry(),
            GraphWriter::new(MemoryGraph::new()),
            MemoryCheckpointStore::new(),
            settings(100, 5),
        )
        .with_cancellation(token);
        let mut frontier = Frontier::seeded("Hydrogen");

        let summary = crawler.run(&mut frontier).await.unwrap();

        assert_eq!(summary.outcome, CrawlOutcome::Cancelled);
        assert!(crawler.source.calls().is_empty());
        assert_eq!(crawler.checkpoints().writes(), 1);
        assert_eq!(pending(&frontier), vec!["Hydrogen"]);
    }

    #[tokio::test]
    async fn test_cancel_mid_fetch_requeues_the_page() {
        let token = CancellationToken::new();
        let mut crawler = Crawler::new(
            HangingSource {
                token: token.clone(),
            },
            GraphWriter::new(MemoryGraph::new()),
            MemoryCheckpointStore::new(),
            settings(100, 5),
        )
        .with_cancellation(token);
        let mut frontier = Frontier::seeded("Hydrogen");
        frontier.enqueue_if_new("Helium");

        let summary = crawler.run(&mut frontier).await.unwrap();

        assert_eq!(summary.outcome, CrawlOutcome::Cancelled);
        assert_eq!(summary.crawled, 0);
        assert_eq!(pending(&frontier), vec!["Hydrogen", "Helium"]);
        assert_eq!(crawler.writer().store().upserts(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_crawl_visits_everything_once() {
        let mut crawler = Crawler::new(
            chemistry(),
            GraphWriter::new(MemoryGraph::new()),
            MemoryCheckpointStore::new(),
            settings(100, 2),
        );
        let mut frontier = Frontier::seeded("Hydrogen");

        let summary = crawler.run(&mut frontier).await.unwrap();

        assert_eq!(summary.outcome, CrawlOutcome::Exhausted);
        assert_eq!(summary.visited_total, 5);
        assert_eq!(summary.frontier_len, 0);
        assert_eq!(
            crawler.source.calls(),
            strings(&["Hydrogen", "Oxygen", "Water", "Ozone", "Ice"])
        );
        // 5 pages / every 2 = 2 periodic checkpoints, plus the final one
        assert_eq!(summary.checkpoints, 3);
        assert_eq!(crawler.checkpoints().writes(), 3);
    }
}
