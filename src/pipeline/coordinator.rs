use log::{debug, error, trace, warn};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::constants::pipeline::{MATCH_QUEUE_CAPACITY, MIN_WORKERS, PATH_QUEUE_CAPACITY};
use crate::core::error::{Result, UrlScanError};
use crate::core::types::{Classification, Input, Match};
use crate::discovery::classifier::{ClassifyPath, FileClassifier};
use crate::discovery::extractor::{IgnorePattern, extract_bytes};
use crate::discovery::path_utils::PathWalker;
use crate::reporting::logging::{
    log_check_result, log_classification_error, log_pipeline_complete, log_worker_split,
};
use crate::validation::checker::CheckLink;

/// How the worker budget is divided between the two stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSplit {
    producers: usize,
    consumers: usize,
}

impl WorkerSplit {
    /// Split a total budget: `floor(W/2)` producers and `ceil(W/2)`
    /// consumers. A budget of 0 means one worker per CPU and anything
    /// below two is raised to two, since a single worker would have to
    /// both extract and check.
    ///
    /// # Examples
    /// ```
    /// use urlscan::pipeline::WorkerSplit;
    ///
    /// let split = WorkerSplit::from_budget(5);
    /// assert_eq!((split.producers(), split.consumers()), (2, 3));
    /// assert_eq!(WorkerSplit::from_budget(1).total(), 2);
    /// ```
    pub fn from_budget(budget: usize) -> Self {
        let budget = match budget {
            0 => num_cpus::get(),
            n => n,
        }
        .max(MIN_WORKERS);

        Self {
            producers: budget / 2,
            consumers: budget - budget / 2,
        }
    }

    /// Explicit split; each stage needs at least one worker.
    pub fn new(producers: usize, consumers: usize) -> Result<Self> {
        if producers == 0 || consumers == 0 {
            return Err(UrlScanError::InvalidArgument(format!(
                "worker split needs at least one producer and one consumer, got {producers}/{consumers}"
            )));
        }
        Ok(Self {
            producers,
            consumers,
        })
    }

    pub fn producers(&self) -> usize {
        self.producers
    }

    pub fn consumers(&self) -> usize {
        self.consumers
    }

    pub fn total(&self) -> usize {
        self.producers + self.consumers
    }
}

/// Coordinator lifecycle, in the order a run moves through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Feeding,
    AllPathsQueued,
    WaitingForProducers,
    /// Every producer has finished and the match queue is closed
    ProducersDone,
    WaitingForConsumers,
    Finished,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Feeding => "feeding",
            Self::AllPathsQueued => "all paths queued",
            Self::WaitingForProducers => "waiting for producers",
            Self::ProducersDone => "producers done, match queue closed",
            Self::WaitingForConsumers => "waiting for consumers",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Counts reported once a run has finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub paths_queued: usize,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub classification_errors: usize,
    pub matches_checked: usize,
}

#[derive(Debug, Default)]
struct Counters {
    files_scanned: AtomicUsize,
    files_skipped: AtomicUsize,
    classification_errors: AtomicUsize,
    matches_checked: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn summary(&self, paths_queued: usize) -> PipelineSummary {
        PipelineSummary {
            paths_queued,
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            classification_errors: self.classification_errors.load(Ordering::Relaxed),
            matches_checked: self.matches_checked.load(Ordering::Relaxed),
        }
    }
}

/// Two-stage worker pool: producers classify and extract, consumers
/// check liveness, with a bounded queue in front of each stage.
///
/// The match queue is closed only after every producer has finished, and
/// a run returns only after every consumer has finished, so each
/// extracted match is checked and forwarded exactly once.
pub struct Coordinator {
    split: WorkerSplit,
    classifier: Arc<dyn ClassifyPath>,
    checker: Arc<dyn CheckLink>,
    ignore: Arc<IgnorePattern>,
    path_queue_capacity: usize,
    match_queue_capacity: usize,
}

impl Coordinator {
    pub fn new(split: WorkerSplit, checker: Arc<dyn CheckLink>, ignore: IgnorePattern) -> Self {
        Self {
            split,
            classifier: Arc::new(FileClassifier::default()),
            checker,
            ignore: Arc::new(ignore),
            path_queue_capacity: PATH_QUEUE_CAPACITY,
            match_queue_capacity: MATCH_QUEUE_CAPACITY,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ClassifyPath>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Override queue bounds; zero is raised to one.
    pub fn with_queue_capacities(mut self, paths: usize, matches: usize) -> Self {
        self.path_queue_capacity = paths.max(1);
        self.match_queue_capacity = matches.max(1);
        self
    }

    pub fn split(&self) -> WorkerSplit {
        self.split
    }

    /// Scan every file under the walker's roots.
    pub async fn run_paths(
        &self,
        walker: PathWalker,
        sink: mpsc::Sender<Match>,
    ) -> Result<PipelineSummary> {
        self.run(walker, sink).await
    }

    /// Scan one in-memory text, such as standard input, under `name`.
    pub async fn run_text(
        &self,
        name: impl Into<String>,
        text: impl Into<Vec<u8>>,
        sink: mpsc::Sender<Match>,
    ) -> Result<PipelineSummary> {
        let name = name.into();
        if name.is_empty() {
            return Err(UrlScanError::InvalidArgument(
                "source name cannot be empty".to_string(),
            ));
        }

        let input = Input::Text {
            name,
            text: text.into(),
        };
        self.run(std::iter::once(input), sink).await
    }

    /// Run the pipeline over `inputs`, forwarding each checked match to
    /// `sink`.
    ///
    /// The caller must keep receiving from the other end of `sink` while
    /// this runs. The sink is never closed here; the coordinator only
    /// drops its clones, so the receiver sees end-of-stream once the
    /// caller's own sender is gone too.
    pub async fn run<I>(&self, inputs: I, sink: mpsc::Sender<Match>) -> Result<PipelineSummary>
    where
        I: IntoIterator<Item = Input> + Send + 'static,
    {
        let WorkerSplit {
            producers,
            consumers,
        } = self.split;
        log_worker_split(producers, consumers);

        let (path_tx, path_rx) = mpsc::channel::<Input>(self.path_queue_capacity);
        let (match_tx, match_rx) = mpsc::channel::<Match>(self.match_queue_capacity);
        let path_rx = Arc::new(Mutex::new(path_rx));
        let match_rx = Arc::new(Mutex::new(match_rx));
        let counters = Arc::new(Counters::default());

        let mut state = PipelineState::Feeding;
        debug!("Pipeline: {state}");

        // The walk may block on disk, so it runs off the async workers;
        // the path queue closes when the feeder drops its sender
        let feeder = tokio::task::spawn_blocking(move || {
            let mut queued = 0;
            for input in inputs {
                if path_tx.blocking_send(input).is_err() {
                    warn!("Path queue closed before the walk finished");
                    break;
                }
                queued += 1;
            }
            queued
        });

        let mut producer_set = JoinSet::new();
        for id in 0..producers {
            producer_set.spawn(producer_loop(
                id,
                Arc::clone(&path_rx),
                match_tx.clone(),
                Arc::clone(&self.classifier),
                Arc::clone(&self.ignore),
                Arc::clone(&counters),
            ));
        }
        drop(path_rx);

        let mut consumer_set = JoinSet::new();
        for id in 0..consumers {
            consumer_set.spawn(consumer_loop(
                id,
                Arc::clone(&match_rx),
                sink.clone(),
                Arc::clone(&self.checker),
                Arc::clone(&counters),
            ));
        }
        drop(match_rx);
        drop(sink);

        let mut failure: Option<UrlScanError> = None;

        let paths_queued = match feeder.await {
            Ok(queued) => queued,
            Err(err) => {
                error!("Path feeder failed: {err}");
                failure.get_or_insert(err.into());
                0
            }
        };
        advance(&mut state, PipelineState::AllPathsQueued);

        advance(&mut state, PipelineState::WaitingForProducers);
        let finished = await_workers(&mut producer_set, "Producer", &mut failure).await;
        debug_assert_eq!(finished, producers);

        // Last sender: every producer has finished, so closing is safe
        drop(match_tx);
        advance(&mut state, PipelineState::ProducersDone);

        advance(&mut state, PipelineState::WaitingForConsumers);
        let finished = await_workers(&mut consumer_set, "Consumer", &mut failure).await;
        debug_assert_eq!(finished, consumers);
        advance(&mut state, PipelineState::Finished);

        let summary = counters.summary(paths_queued);
        log_pipeline_complete(&summary);

        match failure {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    debug!("Pipeline: {state} -> {next}");
    *state = next;
}

/// Wait for every task in `set`, counting completions. A panicked worker
/// is reported and still counted so the barrier never hangs.
async fn await_workers(
    set: &mut JoinSet<()>,
    role: &str,
    failure: &mut Option<UrlScanError>,
) -> usize {
    let mut finished = 0;
    while let Some(joined) = set.join_next().await {
        finished += 1;
        if let Err(err) = joined {
            error!("{role} failed: {err}");
            failure.get_or_insert(err.into());
        }
    }
    finished
}

enum Scan {
    Found(Vec<Match>),
    Skipped,
    Failed(UrlScanError),
}

fn scan_input(input: Input, classifier: &dyn ClassifyPath, ignore: &IgnorePattern) -> Scan {
    let source = input.source_name();
    let text = match input {
        Input::Text { text, .. } => text,
        Input::Path(path) => match classifier.classify(&path) {
            Ok(Classification::Text(text)) => text,
            Ok(Classification::NotText | Classification::Directory) => return Scan::Skipped,
            Err(err) => return Scan::Failed(err),
        },
    };

    Scan::Found(extract_bytes(&source, &text, ignore))
}

async fn producer_loop(
    id: usize,
    paths: Arc<Mutex<mpsc::Receiver<Input>>>,
    matches: mpsc::Sender<Match>,
    classifier: Arc<dyn ClassifyPath>,
    ignore: Arc<IgnorePattern>,
    counters: Arc<Counters>,
) {
    trace!("Producer {id}: running");

    loop {
        let next = paths.lock().await.recv().await;
        let Some(input) = next else {
            break;
        };

        let classifier = Arc::clone(&classifier);
        let ignore = Arc::clone(&ignore);
        let scanned =
            tokio::task::spawn_blocking(move || scan_input(input, classifier.as_ref(), &ignore))
                .await;

        match scanned {
            Ok(Scan::Found(found)) => {
                Counters::bump(&counters.files_scanned);
                for unchecked in found {
                    if let Err(mpsc::error::SendError(lost)) = matches.send(unchecked).await {
                        error!("Producer {id}: match queue closed, lost {}", lost.url());
                    }
                }
            }
            Ok(Scan::Skipped) => Counters::bump(&counters.files_skipped),
            Ok(Scan::Failed(err)) => {
                Counters::bump(&counters.classification_errors);
                log_classification_error(&err);
            }
            Err(err) => {
                Counters::bump(&counters.classification_errors);
                warn!("Producer {id}: scan task failed: {err}");
            }
        }
    }

    trace!("Producer {id}: stopped");
}

async fn consumer_loop(
    id: usize,
    matches: Arc<Mutex<mpsc::Receiver<Match>>>,
    sink: mpsc::Sender<Match>,
    checker: Arc<dyn CheckLink>,
    counters: Arc<Counters>,
) {
    trace!("Consumer {id}: running");
    let mut sink_open = true;

    loop {
        let next = matches.lock().await.recv().await;
        let Some(unchecked) = next else {
            break;
        };

        // Keep draining so producers never block on a full queue
        if !sink_open {
            continue;
        }

        let checked = checker.check(unchecked).await;
        Counters::bump(&counters.matches_checked);
        log_check_result(&checked);

        if sink.send(checked).await.is_err() {
            debug!("Consumer {id}: output closed, draining");
            sink_open = false;
        }
    }

    trace!("Consumer {id}: stopped");
}
