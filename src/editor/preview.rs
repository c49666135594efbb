use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{Duration, sleep},
};
use tracing::{debug, trace};

use crate::{
    models::{
        draft::Draft,
        preview::{PreviewConfig, RenderedPreview},
        template::RenderedContent,
    },
    renderer::{Variables, render_content},
};

/// Debounces preview renders.
///
/// Each `schedule` supersedes the previous one: the pending timer task is
/// aborted and a new one started, so at most one render is pending. A render
/// is published only if no newer schedule happened in the meantime.
pub struct PreviewScheduler {
    config: PreviewConfig,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
    output: Arc<watch::Sender<Option<RenderedPreview>>>,
}

impl PreviewScheduler {
    pub fn new(config: PreviewConfig) -> Self {
        let (output, _) = watch::channel(None);

        Self {
            config,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
            output: Arc::new(output),
        }
    }

    /// Restarts the debounce timer for `draft` and returns the new generation.
    ///
    /// Outside a tokio runtime nothing is scheduled.
    pub fn schedule(&mut self, draft: &Draft, variables: Variables) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.abort_pending();

        let Ok(runtime) = Handle::try_current() else {
            debug!(generation, "No async runtime, preview render not scheduled");
            return generation;
        };

        let delay = Duration::from_millis(self.config.debounce_ms);
        let draft = draft.clone();
        let latest = Arc::clone(&self.generation);
        let output = Arc::clone(&self.output);

        self.pending = Some(runtime.spawn(async move {
            sleep(delay).await;

            if latest.load(Ordering::SeqCst) != generation {
                return;
            }

            let content = render_content(&draft, &variables);

            output.send_if_modified(|slot| {
                if latest.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *slot = Some(RenderedPreview {
                    generation,
                    content,
                });
                true
            });

            trace!(generation, "Preview published");
        }));

        trace!(generation, delay_ms = self.config.debounce_ms, "Preview render scheduled");
        generation
    }

    /// Drops the pending render, if any.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.abort_pending();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<RenderedPreview>> {
        self.output.subscribe()
    }

    pub fn latest(&self) -> Option<RenderedPreview> {
        self.output.borrow().clone()
    }

    pub fn render_now(&self, draft: &Draft, variables: &Variables) -> RenderedContent {
        render_content(draft, variables)
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("Pending preview render superseded");
            }
            handle.abort();
        }
    }
}

impl Default for PreviewScheduler {
    fn default() -> Self {
        Self::new(PreviewConfig::default())
    }
}

impl Drop for PreviewScheduler {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
