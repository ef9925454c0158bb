//! Form sessions.
//!
//! A [`Session`] is one open certificate form together with its CID lookup. Sessions live
//! only in memory, in a [`SessionStore`] keyed by random UUIDs; nothing is written to disk.

use crate::cid::CidSearch;
use crate::config::CoreConfig;
use crate::date::today;
use crate::form::{FormData, FormField, FormState};
use crate::lookup::{CidLookup, SuggestionState};
use crate::notice::Notice;
use crate::print::print_document;
use crate::requests::{request_heading, RequestCounters, RequestDetails, RequestField};
use crate::{AtestadoError, AtestadoResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use utoipa::ToSchema;
use uuid::Uuid;

/// One referral request as shown on screen.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestView {
    pub heading: String,
    pub details: RequestDetails,
    pub counters: RequestCounters,
}

/// Everything a client needs to draw the form.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub form: FormData,
    pub generated_text: String,
    pub is_date_invalid: bool,
    pub date_error: Option<String>,
    pub can_print: bool,
    pub print_tooltip: String,
    pub requests: Vec<RequestView>,
    pub suggestions: SuggestionState,
    pub notice: Option<Notice>,
}

pub struct Session<S> {
    form: FormState,
    lookup: CidLookup<S>,
    config: Arc<CoreConfig>,
}

impl<S: CidSearch + 'static> Session<S> {
    pub fn new(searcher: Arc<S>, config: Arc<CoreConfig>) -> Self {
        Self {
            form: FormState::new(today()),
            lookup: CidLookup::new(searcher, config.cid_debounce()),
            config,
        }
    }

    /// Applies a field edit. Edits of the CID field also drive the suggestion lookup.
    pub fn update_field(&mut self, field: FormField, value: &str) {
        self.form.update_field(field, value);
        if field == FormField::Cid {
            self.lookup.on_input(&self.form.data().cid);
        }
    }

    /// Writes suggestion `index` into the CID field and closes the dropdown.
    pub fn select_suggestion(&mut self, index: usize) -> AtestadoResult<()> {
        let chosen = self.lookup.select(index)?;
        self.update_field(FormField::Cid, &chosen.code);
        Ok(())
    }

    /// Resets the form to a blank one dated today.
    pub fn clear(&mut self) {
        self.form.clear(today());
        self.lookup.on_input(&self.form.data().cid);
    }
}

impl<S> Session<S> {
    pub fn suggestions(&self) -> SuggestionState {
        self.lookup.state()
    }

    pub fn edit_generated_text(&mut self, value: &str) {
        self.form.edit_generated_text(value);
    }

    pub fn focus_cid(&self) {
        self.lookup.focus();
    }

    pub fn pointer_down(&self, inside_lookup: bool) {
        self.lookup.pointer_down(inside_lookup);
    }

    pub fn add_request(&mut self) -> usize {
        self.form.add_request()
    }

    pub fn duplicate_request(&mut self, index: usize) -> AtestadoResult<usize> {
        self.form.duplicate_request(index)
    }

    pub fn remove_request(&mut self, index: usize) -> AtestadoResult<()> {
        self.form.remove_request(index)
    }

    pub fn update_request(
        &mut self,
        index: usize,
        field: RequestField,
        value: &str,
    ) -> AtestadoResult<()> {
        self.form.update_request(index, field, value)
    }

    /// The print document for the current form.
    ///
    /// # Errors
    ///
    /// Returns `AtestadoError::InvalidStartDate` while the start date is invalid, or any
    /// error from assembling the document.
    pub fn print(&self) -> AtestadoResult<String> {
        if !self.form.can_print() {
            return Err(AtestadoError::InvalidStartDate(
                self.form.data().start_date.clone(),
            ));
        }
        print_document(self.form.data(), self.form.generated_text(), &self.config)
    }

    pub fn view(&self, id: Uuid) -> SessionView {
        let now = Instant::now();
        SessionView {
            id,
            form: self.form.data().clone(),
            generated_text: self.form.generated_text().to_string(),
            is_date_invalid: self.form.is_date_invalid(),
            date_error: self.form.start_date_error().map(str::to_string),
            can_print: self.form.can_print(),
            print_tooltip: self.form.print_tooltip().to_string(),
            requests: self
                .form
                .requests()
                .iter()
                .enumerate()
                .map(|(index, details)| RequestView {
                    heading: request_heading(index),
                    details: details.clone(),
                    counters: details.counters(),
                })
                .collect(),
            suggestions: self.lookup.state(),
            notice: self
                .form
                .notice()
                .filter(|notice| notice.is_visible_at(now))
                .cloned(),
        }
    }
}

/// A stored session and the last time any request touched it.
struct Entry<S> {
    session: Session<S>,
    last_access: Mutex<tokio::time::Instant>,
}

impl<S> Entry<S> {
    fn new(session: Session<S>) -> Self {
        Self {
            session,
            last_access: Mutex::new(tokio::time::Instant::now()),
        }
    }

    fn touch(&self) {
        *self
            .last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = tokio::time::Instant::now();
    }

    fn last_access(&self) -> tokio::time::Instant {
        *self
            .last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory map of open sessions.
///
/// Every lookup refreshes the session's last-access time. Sessions left untouched for
/// longer than [`CoreConfig::session_idle_ttl`] are dropped by [`SessionStore::evict_idle`],
/// which [`SessionStore::spawn_idle_sweeper`] runs periodically.
pub struct SessionStore<S> {
    sessions: Arc<RwLock<HashMap<Uuid, Entry<S>>>>,
    searcher: Arc<S>,
    config: Arc<CoreConfig>,
}

impl<S> Clone for SessionStore<S> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            searcher: Arc::clone(&self.searcher),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: CidSearch + 'static> SessionStore<S> {
    pub fn new(searcher: S, config: Arc<CoreConfig>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            searcher: Arc::new(searcher),
            config,
        }
    }

    /// Opens a blank session and returns its view.
    pub async fn create(&self) -> SessionView {
        let id = Uuid::new_v4();
        let session = Session::new(Arc::clone(&self.searcher), Arc::clone(&self.config));
        let view = session.view(id);
        self.sessions.write().await.insert(id, Entry::new(session));
        tracing::debug!(session = %id, "opened form session");
        view
    }

    pub async fn view(&self, id: Uuid) -> AtestadoResult<SessionView> {
        self.with_session(id, |session| Ok(session.view(id))).await
    }

    /// Runs `f` against session `id` under the store's read lock.
    pub async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&Session<S>) -> AtestadoResult<T>,
    ) -> AtestadoResult<T> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&id).ok_or(AtestadoError::SessionNotFound(id))?;
        entry.touch();
        f(&entry.session)
    }

    /// Runs `f` against session `id` under the store's write lock.
    pub async fn with_session_mut<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session<S>) -> AtestadoResult<T>,
    ) -> AtestadoResult<T> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or(AtestadoError::SessionNotFound(id))?;
        entry.touch();
        f(&mut entry.session)
    }

    /// Closes session `id`, cancelling any pending lookup.
    pub async fn remove(&self, id: Uuid) -> AtestadoResult<()> {
        if self.sessions.write().await.remove(&id).is_none() {
            return Err(AtestadoError::SessionNotFound(id));
        }
        tracing::debug!(session = %id, "closed form session");
        Ok(())
    }

    /// Drops every session idle for at least the configured timeout. Returns how many
    /// were dropped.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.config.session_idle_ttl();
        let now = tokio::time::Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = now.saturating_duration_since(entry.last_access()) < ttl;
            if !keep {
                tracing::debug!(session = %id, "evicting idle form session");
            }
            keep
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "evicted idle sessions");
        }
        evicted
    }

    /// Runs [`SessionStore::evict_idle`] every half idle timeout until the handle is
    /// aborted. Must be called inside a tokio runtime.
    pub fn spawn_idle_sweeper(&self) -> JoinHandle<()> {
        let store = self.clone();
        let period = (self.config.session_idle_ttl() / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                store.evict_idle().await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid::CidSuggestion;

    #[derive(Default)]
    struct FakeSearch {
        calls: Mutex<Vec<String>>,
    }

    impl CidSearch for FakeSearch {
        async fn search(&self, term: &str) -> AtestadoResult<Vec<CidSuggestion>> {
            self.calls.lock().unwrap().push(term.to_string());
            Ok(vec![
                CidSuggestion {
                    code: "E11.9".into(),
                    name: "Type 2 diabetes mellitus without complications".into(),
                },
                CidSuggestion {
                    code: "E10.9".into(),
                    name: "Type 1 diabetes mellitus without complications".into(),
                },
            ])
        }
    }

    fn store() -> SessionStore<FakeSearch> {
        let config = CoreConfig::from_env_values(None, None, None, None).unwrap();
        SessionStore::new(FakeSearch::default(), Arc::new(config))
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn test_create_returns_blank_form_dated_today() {
        let store = store();
        let view = store.create().await;
        assert_eq!(view.form, FormData::blank(today()));
        assert!(view.can_print);
        assert!(view.requests.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_an_error() {
        let store = store();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.view(id).await,
            Err(AtestadoError::SessionNotFound(missing)) if missing == id
        ));
        assert!(store.remove(id).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cid_edit_drives_lookup_and_selection_resolves_it() {
        let store = store();
        let id = store.create().await.id;

        store
            .with_session_mut(id, |s| {
                s.update_field(FormField::Cid, "diabetes");
                Ok(())
            })
            .await
            .unwrap();
        advance(600).await;

        let view = store.view(id).await.unwrap();
        assert!(view.suggestions.open);
        assert_eq!(view.suggestions.results.len(), 2);

        store
            .with_session_mut(id, |s| s.select_suggestion(1))
            .await
            .unwrap();
        let view = store.view(id).await.unwrap();
        assert_eq!(view.form.cid, "E10.9");
        assert!(!view.suggestions.open);
        assert!(view.generated_text.contains("(CID: E10.9)"));

        advance(600).await;
        let calls = store.searcher.calls.lock().unwrap().clone();
        assert_eq!(calls, ["diabetes"]);
    }

    #[tokio::test]
    async fn test_print_refused_while_start_date_invalid() {
        let store = store();
        let id = store.create().await.id;

        let result = store
            .with_session_mut(id, |s| {
                s.update_field(FormField::StartDate, "31/02/2024");
                s.print()
            })
            .await;
        assert!(matches!(result, Err(AtestadoError::InvalidStartDate(_))));

        let view = store.view(id).await.unwrap();
        assert!(view.is_date_invalid);
        assert!(!view.can_print);
        assert_eq!(
            view.date_error.as_deref(),
            Some("Data inválida. Use o formato DD/MM/AAAA.")
        );
    }

    #[tokio::test]
    async fn test_print_document_for_valid_form() {
        let store = store();
        let id = store.create().await.id;

        let doc = store
            .with_session_mut(id, |s| {
                s.update_field(FormField::PatientName, "Carlos Lima");
                s.update_field(FormField::StartDate, "20102026");
                s.print()
            })
            .await
            .unwrap();
        assert!(doc.contains("Carlos Lima"));
        assert!(doc.contains("a partir de 20/10/2026."));
    }

    #[tokio::test]
    async fn test_clear_resets_form_and_shows_notice() {
        let store = store();
        let id = store.create().await.id;

        store
            .with_session_mut(id, |s| {
                s.update_field(FormField::PatientName, "Carlos");
                s.update_field(FormField::StartDate, "3102");
                s.add_request();
                s.clear();
                Ok(())
            })
            .await
            .unwrap();

        let view = store.view(id).await.unwrap();
        assert_eq!(view.form, FormData::blank(today()));
        assert!(!view.is_date_invalid);
        assert!(view.requests.is_empty());
        assert_eq!(
            view.notice.map(|n| n.message),
            Some("Formulário limpo com sucesso!".to_string())
        );
    }

    #[tokio::test]
    async fn test_request_views_carry_headings() {
        let store = store();
        let id = store.create().await.id;

        store
            .with_session_mut(id, |s| {
                let first = s.add_request();
                s.update_request(first, RequestField::ReferralService, "Cardiologia")?;
                s.duplicate_request(first)?;
                Ok(())
            })
            .await
            .unwrap();

        let view = store.view(id).await.unwrap();
        assert_eq!(view.requests.len(), 2);
        assert_eq!(view.requests[0].heading, "2ª Interconsulta - Detalhes");
        assert_eq!(view.requests[1].heading, "3ª Interconsulta - Detalhes");
        assert_eq!(
            view.requests[1].details.referral_service.as_str(),
            "Cardiologia"
        );
        assert_eq!(view.requests[1].counters.referral_service.len, 11);
        assert_eq!(view.requests[1].counters.referral_service.remaining, 26);
    }

    fn store_with_idle_ttl(ttl: Duration) -> SessionStore<FakeSearch> {
        let config = CoreConfig::from_env_values(None, None, None, None)
            .unwrap()
            .with_session_idle_ttl(ttl);
        SessionStore::new(FakeSearch::default(), Arc::new(config))
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted_and_active_ones_kept() {
        let store = store_with_idle_ttl(Duration::from_secs(60));
        let idle = store.create().await.id;
        let active = store.create().await.id;

        advance(40_000).await;
        store.view(active).await.unwrap();
        advance(30_000).await;

        assert_eq!(store.evict_idle().await, 1);
        assert!(matches!(
            store.view(idle).await,
            Err(AtestadoError::SessionNotFound(_))
        ));
        assert!(store.view(active).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_keep_a_session_alive() {
        let store = store_with_idle_ttl(Duration::from_secs(60));
        let id = store.create().await.id;

        for _ in 0..3 {
            advance(45_000).await;
            store
                .with_session_mut(id, |s| {
                    s.update_field(FormField::PatientName, "Ana");
                    Ok(())
                })
                .await
                .unwrap();
            assert_eq!(store.evict_idle().await, 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_abandoned_sessions() {
        let store = store_with_idle_ttl(Duration::from_secs(60));
        store.create().await;
        let sweeper = store.spawn_idle_sweeper();

        advance(30_000).await;
        assert_eq!(store.len().await, 1);

        advance(70_000).await;
        assert!(store.is_empty().await);
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_remove_drops_session() {
        let store = store();
        let id = store.create().await.id;
        store.remove(id).await.unwrap();
        assert!(store.is_empty().await);
    }
}
