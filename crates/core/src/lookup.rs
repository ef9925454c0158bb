//! Debounced CID suggestion lookup.
//!
//! Every edit of the code field bumps a generation counter. Edits that should search start
//! a task which waits out the debounce window and then queries the [`CidSearch`] source.
//! A task whose generation is no longer current when it wakes, or when its response
//! arrives, does nothing, so only the latest edit's results are ever kept. The previous
//! task is also aborted on every edit and on teardown.
//!
//! Search failures never reach the caller: they are logged and shown as an empty list.

use crate::cid::{should_search, CidSearch, CidSuggestion};
use crate::{AtestadoError, AtestadoResult};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

/// What the suggestion dropdown shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SuggestionState {
    pub results: Vec<CidSuggestion>,
    /// A request is in flight.
    pub searching: bool,
    /// The dropdown is open.
    pub open: bool,
}

#[derive(Debug, Default)]
struct Shared {
    generation: u64,
    state: SuggestionState,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct CidLookup<S> {
    searcher: Arc<S>,
    debounce: Duration,
    shared: Arc<Mutex<Shared>>,
    pending: Option<JoinHandle<()>>,
}

impl<S: CidSearch + 'static> CidLookup<S> {
    pub fn new(searcher: Arc<S>, debounce: Duration) -> Self {
        Self {
            searcher,
            debounce,
            shared: Arc::new(Mutex::new(Shared::default())),
            pending: None,
        }
    }

    /// Reacts to a new value of the code field.
    ///
    /// Short or code-shaped values clear and close the dropdown immediately. Anything else
    /// schedules a search after the debounce window. Must be called inside a tokio runtime.
    pub fn on_input(&mut self, term: &str) {
        self.cancel_pending();

        let generation = {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            shared.state.searching = false;
            if !should_search(term) {
                shared.state.results.clear();
                shared.state.open = false;
                return;
            }
            shared.generation
        };

        let searcher = Arc::clone(&self.searcher);
        let shared = Arc::clone(&self.shared);
        let debounce = self.debounce;
        let term = term.to_string();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            {
                let mut guard = lock(&shared);
                if guard.generation != generation {
                    return;
                }
                guard.state.searching = true;
            }

            let results = match searcher.search(&term).await {
                Ok(results) => results,
                Err(e) => {
                    tracing::warn!(term = %term, error = %e, "CID search failed");
                    Vec::new()
                }
            };

            let mut guard = lock(&shared);
            if guard.generation != generation {
                tracing::debug!(term = %term, "discarding stale CID search response");
                return;
            }
            guard.state.searching = false;
            guard.state.open = !results.is_empty();
            guard.state.results = results;
        }));
    }
}

impl<S> CidLookup<S> {
    pub fn state(&self) -> SuggestionState {
        lock(&self.shared).state.clone()
    }

    /// Picks suggestion `index` and closes the dropdown.
    pub fn select(&self, index: usize) -> AtestadoResult<CidSuggestion> {
        let mut shared = lock(&self.shared);
        let len = shared.state.results.len();
        let chosen = shared
            .state
            .results
            .get(index)
            .cloned()
            .ok_or(AtestadoError::SuggestionIndexOutOfRange { index, len })?;
        shared.state.open = false;
        Ok(chosen)
    }

    pub fn close(&self) {
        lock(&self.shared).state.open = false;
    }

    /// Reopens the dropdown when the field regains focus and there is something to show.
    pub fn focus(&self) {
        let mut shared = lock(&self.shared);
        if !shared.state.results.is_empty() {
            shared.state.open = true;
        }
    }

    /// Pointer pressed somewhere on the page. Closes the dropdown unless the press landed
    /// inside the lookup's own region.
    pub fn pointer_down(&self, inside: bool) {
        if !inside {
            self.close();
        }
    }

    /// Stops any pending search and forgets in-flight responses.
    pub fn teardown(&mut self) {
        self.cancel_pending();
        let mut shared = lock(&self.shared);
        shared.generation += 1;
        shared.state.searching = false;
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<S> Drop for CidLookup<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    #[derive(Default)]
    struct FakeSearch {
        calls: Mutex<Vec<String>>,
        delay: Duration,
        fail: bool,
    }

    impl FakeSearch {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CidSearch for FakeSearch {
        async fn search(&self, term: &str) -> AtestadoResult<Vec<CidSuggestion>> {
            self.calls.lock().unwrap().push(term.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(AtestadoError::MalformedCidPayload);
            }
            Ok(vec![CidSuggestion {
                code: format!("{}-code", term),
                name: format!("{}-name", term),
            }])
        }
    }

    fn lookup(fake: FakeSearch) -> (Arc<FakeSearch>, CidLookup<FakeSearch>) {
        let fake = Arc::new(fake);
        let lookup = CidLookup::new(Arc::clone(&fake), DEBOUNCE);
        (fake, lookup)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_code_shaped_input_never_searches() {
        let (fake, mut lookup) = lookup(FakeSearch::default());
        lookup.on_input("A15");
        lookup.on_input("A15.2");
        advance(2_000).await;

        assert!(fake.calls().is_empty());
        assert_eq!(lookup.state(), SuggestionState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_text_searches_after_debounce() {
        let (fake, mut lookup) = lookup(FakeSearch::default());
        lookup.on_input("diabetes");

        advance(499).await;
        assert!(fake.calls().is_empty());

        advance(2).await;
        assert_eq!(fake.calls(), ["diabetes"]);
        let state = lookup.state();
        assert!(state.open);
        assert!(!state.searching);
        assert_eq!(state.results[0].code, "diabetes-code");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_within_window_only_search_latest() {
        let (fake, mut lookup) = lookup(FakeSearch::default());
        lookup.on_input("dia");
        advance(200).await;
        lookup.on_input("diab");
        advance(200).await;
        lookup.on_input("diabetes");
        advance(600).await;

        assert_eq!(fake.calls(), ["diabetes"]);
        assert_eq!(lookup.state().results[0].code, "diabetes-code");
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_in_flight_request_is_ignored() {
        let (fake, mut lookup) = lookup(FakeSearch {
            delay: Duration::from_millis(1_000),
            ..FakeSearch::default()
        });
        lookup.on_input("diabetes");
        advance(600).await;
        assert!(lookup.state().searching);

        lookup.on_input("diabetes tipo 2");
        assert!(!lookup.state().searching);
        advance(3_000).await;

        assert_eq!(fake.calls(), ["diabetes", "diabetes tipo 2"]);
        let state = lookup.state();
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.results[0].code, "diabetes tipo 2-code");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_degrade_to_no_results() {
        let (fake, mut lookup) = lookup(FakeSearch {
            fail: true,
            ..FakeSearch::default()
        });
        lookup.on_input("tuberculose");
        advance(600).await;

        assert_eq!(fake.calls().len(), 1);
        assert_eq!(lookup.state(), SuggestionState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_clears_previous_results() {
        let (_fake, mut lookup) = lookup(FakeSearch::default());
        lookup.on_input("diabetes");
        advance(600).await;
        assert!(lookup.state().open);

        lookup.on_input("di");
        assert_eq!(lookup.state(), SuggestionState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_closes_dropdown() {
        let (_fake, mut lookup) = lookup(FakeSearch::default());
        lookup.on_input("asma");
        advance(600).await;

        let chosen = lookup.select(0).unwrap();
        assert_eq!(chosen.code, "asma-code");
        assert!(!lookup.state().open);

        assert!(matches!(
            lookup.select(4),
            Err(AtestadoError::SuggestionIndexOutOfRange { index: 4, len: 1 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_outside_closes_and_focus_reopens() {
        let (_fake, mut lookup) = lookup(FakeSearch::default());
        lookup.on_input("asma");
        advance(600).await;

        lookup.pointer_down(true);
        assert!(lookup.state().open);

        lookup.pointer_down(false);
        assert!(!lookup.state().open);

        lookup.focus();
        assert!(lookup.state().open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_without_results_stays_closed() {
        let (_fake, lookup) = lookup(FakeSearch::default());
        lookup.focus();
        assert!(!lookup.state().open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_pending_search() {
        let (fake, mut lookup) = lookup(FakeSearch::default());
        lookup.on_input("diabetes");
        lookup.teardown();
        advance(2_000).await;

        assert!(fake.calls().is_empty());
    }
}
