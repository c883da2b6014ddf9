//! Session, conversation and send orchestration behind a single handle.
//!
//! Every operation that talks to the backend is split in two phases. The
//! synchronous phase runs when the method is called: it validates input,
//! checks the busy rules, applies optimistic changes and captures the tickets
//! the result is checked against. The returned future performs the backend
//! call and reconciles under the state lock. Results whose tickets went stale
//! in the meantime are discarded and reported as [`ClientError::Superseded`].
//!
//! The state lock is never held across an `.await`.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chat_backend::{
    BackendError, ChatBackend, Conversation, ConversationId, HealthResponse, InferenceRequest,
    InferenceResponse, LoginRequest, RegisterRequest, TokenResponse, User,
};
use client_store::CredentialStore;
use futures_util::future::join;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::directory::ConversationDirectory;
use crate::error::{ClientError, ValidationError};
use crate::generation::{Generation, Ticket};
use crate::notice::{
    Notice, Notices, ACCOUNT_CREATED, CREDENTIALS_NOT_CLEARED, CREDENTIALS_NOT_SAVED,
    SERVED_FROM_CACHE, SIGNED_IN,
};
use crate::session::{SessionPhase, SessionState};
use crate::settings::InferenceSettings;
use crate::transcript::{PendingId, Transcript};
use crate::validate;

struct ClientState {
    session: SessionState,
    directory: ConversationDirectory,
    transcript: Transcript,
    history: Generation,
    history_loading: Option<Ticket>,
    sending: Option<PendingId>,
    settings: InferenceSettings,
    notices: Notices,
}

impl ClientState {
    fn new() -> Self {
        Self {
            session: SessionState::new(),
            directory: ConversationDirectory::default(),
            transcript: Transcript::default(),
            history: Generation::new(),
            history_loading: None,
            sending: None,
            settings: InferenceSettings::default(),
            notices: Notices::default(),
        }
    }

    /// Drops everything scoped to the signed-in account and invalidates
    /// in-flight history loads. Settings and queued notices survive.
    fn clear_conversations(&mut self) {
        self.directory.clear();
        self.transcript.reset(None);
        self.history.advance();
        self.history_loading = None;
        self.sending = None;
    }

    fn ensure_signed_out(&self) -> Result<(), ClientError> {
        match self.session.phase() {
            SessionPhase::Anonymous => Ok(()),
            SessionPhase::Authenticating => Err(ClientError::Busy),
            SessionPhase::Authenticated => Err(ClientError::AlreadySignedIn),
        }
    }

    /// Token for calls that need a ready session. While a sign-in is still
    /// bootstrapping the directory and transcript are about to be replaced,
    /// so those calls are refused as busy.
    fn token(&self) -> Result<String, ClientError> {
        match (self.session.phase(), self.session.token()) {
            (SessionPhase::Authenticating, _) => Err(ClientError::Busy),
            (SessionPhase::Authenticated, Some(token)) => Ok(token.to_owned()),
            _ => Err(ClientError::AuthenticationMissing),
        }
    }
}

struct HistoryLoad {
    token: String,
    epoch: Ticket,
    ticket: Ticket,
    conversation_id: ConversationId,
}

struct PreparedSend {
    token: String,
    epoch: Ticket,
    pending: PendingId,
    request: InferenceRequest,
}

pub struct ChatClient {
    backend: Arc<dyn ChatBackend>,
    credentials: CredentialStore,
    config: ClientConfig,
    state: Mutex<ClientState>,
}

impl ChatClient {
    #[must_use]
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        credentials: CredentialStore,
        config: ClientConfig,
    ) -> Self {
        Self {
            backend,
            credentials,
            config,
            state: Mutex::new(ClientState::new()),
        }
    }

    #[must_use]
    pub fn backend_id(&self) -> &str {
        self.backend.backend_id()
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, ClientError>> + '_ {
        let started = self.begin_sign_in(validate::login_fields(username, password));
        let request = LoginRequest::new(username.trim(), password);
        async move {
            let epoch = started?;
            debug!(username = %request.username, "signing in");
            let outcome = self.backend.login(request).await;
            self.finish_sign_in(epoch, outcome, SIGNED_IN).await
        }
    }

    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, ClientError>> + '_ {
        let started =
            self.begin_sign_in(validate::register_fields(username, email, password));
        let request = RegisterRequest::new(username.trim(), email.trim(), password);
        async move {
            let epoch = started?;
            debug!(username = %request.username, "registering account");
            let outcome = self.backend.register(request).await;
            self.finish_sign_in(epoch, outcome, ACCOUNT_CREATED).await
        }
    }

    /// Picks up a token left in the credential store and bootstraps it.
    /// Resolves to `None` when no token is stored.
    pub fn restore_session(
        &self,
    ) -> impl Future<Output = Result<Option<User>, ClientError>> + '_ {
        let started = self.begin_restore().or_else(|error| self.surface(error));
        async move {
            match started? {
                None => Ok(None),
                Some((token, epoch)) => self.bootstrap(token, epoch).await.map(Some),
            }
        }
    }

    /// Signs out immediately. In-flight results for the old session are
    /// discarded when they arrive.
    pub fn logout(&self) {
        let mut state = self.state();
        self.sign_out(&mut state);
        info!("signed out");
    }

    /// Makes `conversation_id` active and loads its history. `None` selects a
    /// fresh conversation that the next send creates.
    pub fn select_conversation(
        &self,
        conversation_id: Option<ConversationId>,
    ) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let started = self
            .begin_select(conversation_id)
            .or_else(|error| self.surface(error));
        async move {
            match started? {
                None => Ok(()),
                Some(load) => self.fetch_history(load).await,
            }
        }
    }

    /// Re-fetches the active conversation's history. The current transcript
    /// stays visible until the replacement arrives.
    pub fn load_history(&self) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let started = self.begin_reload().or_else(|error| self.surface(error));
        async move {
            match started? {
                None => Ok(()),
                Some(load) => self.fetch_history(load).await,
            }
        }
    }

    pub fn refresh_conversations(&self) -> impl Future<Output = Result<(), ClientError>> + '_ {
        let started = self.begin_refresh().or_else(|error| self.surface(error));
        async move {
            let (token, epoch) = started?;
            self.fetch_conversations(token, epoch).await
        }
    }

    /// Sends `prompt` to the active conversation.
    ///
    /// A pending user turn is appended before this returns. When the future
    /// resolves the turn is either confirmed together with the assistant
    /// reply or removed again, leaving the transcript as it was.
    pub fn send(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<InferenceResponse, ClientError>> + '_ {
        let started = self.begin_send(prompt).or_else(|error| self.surface(error));
        async move {
            let send = started?;
            let outcome = self.backend.complete(&send.token, send.request.clone()).await;
            self.finish_send(send, outcome).await
        }
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        match self.backend.health().await {
            Ok(report) => Ok(report),
            Err(error) => self.surface(error.into()),
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state().session.phase()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::Authenticated
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state().session.user().cloned()
    }

    #[must_use]
    pub fn conversations(&self) -> Vec<Conversation> {
        self.state().directory.list().to_vec()
    }

    #[must_use]
    pub fn selected_conversation(&self) -> Option<ConversationId> {
        self.state().directory.selected()
    }

    #[must_use]
    pub fn selected_label(&self) -> String {
        self.state().directory.selected_label()
    }

    /// Snapshot of the active transcript.
    #[must_use]
    pub fn transcript(&self) -> Transcript {
        self.state().transcript.clone()
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.state().sending.is_some()
    }

    #[must_use]
    pub fn is_loading_history(&self) -> bool {
        self.state().history_loading.is_some()
    }

    #[must_use]
    pub fn settings(&self) -> InferenceSettings {
        self.state().settings.clone()
    }

    pub fn set_model(&self, model: &str) {
        self.state().settings.set_model(model);
    }

    pub fn set_temperature(&self, temperature: f64) {
        self.state().settings.set_temperature(temperature);
    }

    pub fn set_max_tokens(&self, max_tokens: u32) {
        self.state().settings.set_max_tokens(max_tokens);
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        self.state().notices.drain()
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        lock_unpoisoned(&self.state)
    }

    /// Queues an error notice for user-facing failures and returns the error.
    /// Must not be called while the state lock is held.
    fn surface<T>(&self, error: ClientError) -> Result<T, ClientError> {
        if let ClientError::Unexpected(detail) = &error {
            warn!(detail = %detail, "unexpected failure");
        }
        if error.is_user_facing() {
            self.state().notices.push(Notice::error(error.to_string()));
        }
        Err(error)
    }

    fn sign_out(&self, state: &mut ClientState) {
        if let Err(error) = self.credentials.clear() {
            warn!(error = %error, "failed to clear stored credentials");
            state
                .notices
                .push(Notice::error(format!("{CREDENTIALS_NOT_CLEARED}: {error}")));
        }
        state.session.reset();
        state.clear_conversations();
    }

    fn begin_sign_in(&self, fields: Result<(), ValidationError>) -> Result<Ticket, ClientError> {
        let started = fields.map_err(ClientError::from).and_then(|()| {
            let mut state = self.state();
            state.ensure_signed_out()?;
            state.session.begin_sign_in();
            Ok(state.session.epoch())
        });
        started.or_else(|error| self.surface(error))
    }

    async fn finish_sign_in(
        &self,
        epoch: Ticket,
        outcome: Result<TokenResponse, BackendError>,
        greeting: &'static str,
    ) -> Result<User, ClientError> {
        let installed = {
            let mut state = self.state();
            if !state.session.is_current(epoch) {
                debug!("discarding sign-in result for a previous session");
                return Err(ClientError::Superseded);
            }
            match outcome {
                Ok(response) => {
                    let token = response.access_token;
                    if let Err(error) = self.credentials.set(&token, self.config.remember_credentials)
                    {
                        warn!(error = %error, "failed to store access token");
                        state
                            .notices
                            .push(Notice::error(format!("{CREDENTIALS_NOT_SAVED}: {error}")));
                    }
                    state.clear_conversations();
                    state.notices.push(Notice::success(greeting));
                    let epoch = state.session.install_token(token.clone());
                    Ok((token, epoch))
                }
                Err(error) => {
                    state.session.abort_sign_in();
                    Err(ClientError::from(error))
                }
            }
        };

        match installed {
            Ok((token, epoch)) => {
                info!(greeting, "signed in");
                self.bootstrap(token, epoch).await
            }
            Err(error) => {
                info!(error = %error, "sign-in rejected");
                self.surface(error)
            }
        }
    }

    fn begin_restore(&self) -> Result<Option<(String, Ticket)>, ClientError> {
        let stored = match self.credentials.get() {
            Ok(stored) => stored,
            Err(error) => {
                warn!(error = %error, "failed to read stored credentials");
                None
            }
        };
        let Some(token) = stored else {
            debug!("no stored credentials");
            return Ok(None);
        };

        let mut state = self.state();
        state.ensure_signed_out()?;
        state.clear_conversations();
        let epoch = state.session.install_token(token.clone());
        Ok(Some((token, epoch)))
    }

    /// Loads profile and conversation list for a freshly installed token.
    /// Either failing signs the session out.
    async fn bootstrap(&self, token: String, epoch: Ticket) -> Result<User, ClientError> {
        debug!("bootstrapping session");
        let (profile, conversations) = join(
            self.backend.profile(&token),
            self.backend.list_conversations(&token),
        )
        .await;

        let applied = {
            let mut state = self.state();
            if !state.session.is_current(epoch) {
                debug!("discarding bootstrap for a previous session");
                return Err(ClientError::Superseded);
            }
            match profile.and_then(|user| conversations.map(|list| (user, list))) {
                Ok((user, conversations)) => {
                    let first = conversations.first().map(|conversation| conversation.id);
                    state.session.authenticate(user.clone());
                    state.directory.replace(conversations);
                    state.directory.select(first);
                    state.transcript.reset(first);
                    let ticket = state.history.advance();
                    state.history_loading = first.map(|_| ticket);
                    let load = first.map(|conversation_id| HistoryLoad {
                        token: token.clone(),
                        epoch,
                        ticket,
                        conversation_id,
                    });
                    Ok((user, load))
                }
                Err(error) => {
                    warn!(error = %error, "bootstrap failed; signing out");
                    self.sign_out(&mut state);
                    Err(ClientError::from(error))
                }
            }
        };

        let (user, load) = match applied {
            Ok(applied) => applied,
            Err(error) => return self.surface(error),
        };
        info!(username = %user.username, "session ready");

        if let Some(load) = load {
            if let Err(error) = self.fetch_history(load).await {
                debug!(error = %error, "initial history load did not apply");
            }
        }
        Ok(user)
    }

    fn begin_select(
        &self,
        conversation_id: Option<ConversationId>,
    ) -> Result<Option<HistoryLoad>, ClientError> {
        let mut state = self.state();
        let token = state.token()?;
        state.directory.select(conversation_id);
        state.transcript.reset(conversation_id);
        let ticket = state.history.advance();
        state.history_loading = conversation_id.map(|_| ticket);
        let epoch = state.session.epoch();
        Ok(conversation_id.map(|conversation_id| HistoryLoad {
            token,
            epoch,
            ticket,
            conversation_id,
        }))
    }

    fn begin_reload(&self) -> Result<Option<HistoryLoad>, ClientError> {
        let mut state = self.state();
        let token = state.token()?;
        let Some(conversation_id) = state.directory.selected() else {
            return Ok(None);
        };
        if state.sending.is_some() {
            return Err(ClientError::Busy);
        }
        let ticket = state.history.advance();
        state.history_loading = Some(ticket);
        Ok(Some(HistoryLoad {
            token,
            epoch: state.session.epoch(),
            ticket,
            conversation_id,
        }))
    }

    async fn fetch_history(&self, load: HistoryLoad) -> Result<(), ClientError> {
        let conversation_id = load.conversation_id;
        let outcome = self.backend.list_messages(&load.token, conversation_id).await;

        let applied = {
            let mut state = self.state();
            if !state.session.is_current(load.epoch) || !state.history.is_current(load.ticket) {
                debug!(%conversation_id, "discarding stale history");
                return Err(ClientError::Superseded);
            }
            state.history_loading = None;
            match outcome {
                Ok(history) => {
                    debug!(%conversation_id, messages = history.len(), "history loaded");
                    state.transcript.replace_history(conversation_id, history);
                    Ok(())
                }
                Err(error) => {
                    state.transcript.reset(Some(conversation_id));
                    Err(ClientError::from(error))
                }
            }
        };

        applied.or_else(|error| {
            warn!(%conversation_id, error = %error, "history load failed");
            self.surface(error)
        })
    }

    fn begin_refresh(&self) -> Result<(String, Ticket), ClientError> {
        let state = self.state();
        let token = state.token()?;
        Ok((token, state.session.epoch()))
    }

    async fn fetch_conversations(&self, token: String, epoch: Ticket) -> Result<(), ClientError> {
        let outcome = self.backend.list_conversations(&token).await;

        let applied = {
            let mut state = self.state();
            if !state.session.is_current(epoch) {
                debug!("discarding conversation list for a previous session");
                return Err(ClientError::Superseded);
            }
            outcome
                .map(|conversations| state.directory.replace(conversations))
                .map_err(ClientError::from)
        };

        applied.or_else(|error| {
            warn!(error = %error, "conversation refresh failed");
            self.surface(error)
        })
    }

    fn begin_send(&self, prompt: &str) -> Result<PreparedSend, ClientError> {
        let mut state = self.state();
        let token = state.token()?;
        let prompt = validate::prompt(prompt, self.config.prompt_limit)?;
        if state.sending.is_some() || state.history_loading.is_some() {
            return Err(ClientError::Busy);
        }

        let pending = state.transcript.append_pending(prompt);
        state.sending = Some(pending);
        let request = state
            .settings
            .apply(InferenceRequest::new(prompt).with_conversation_id(state.directory.selected()));
        Ok(PreparedSend {
            token,
            epoch: state.session.epoch(),
            pending,
            request,
        })
    }

    async fn finish_send(
        &self,
        send: PreparedSend,
        outcome: Result<InferenceResponse, BackendError>,
    ) -> Result<InferenceResponse, ClientError> {
        let applied = {
            let mut state = self.state();
            if !state.session.is_current(send.epoch) {
                debug!("discarding send result for a previous session");
                return Err(ClientError::Superseded);
            }
            if state.sending == Some(send.pending) {
                state.sending = None;
            }
            match outcome {
                Ok(response) => {
                    if state.transcript.confirm(send.pending, &response) {
                        state.directory.select(Some(response.conversation_id));
                    } else {
                        debug!("selection changed during send; reply not shown");
                    }
                    if response.cached {
                        state.notices.push(Notice::info(SERVED_FROM_CACHE));
                    }
                    Ok(response)
                }
                Err(error) => {
                    state.transcript.rollback(send.pending);
                    Err(ClientError::from(error))
                }
            }
        };

        match applied {
            Ok(response) => {
                debug!(
                    conversation_id = %response.conversation_id,
                    cached = response.cached,
                    "send confirmed"
                );
                if let Err(error) = self.fetch_conversations(send.token, send.epoch).await {
                    debug!(error = %error, "conversation refresh after send did not apply");
                }
                Ok(response)
            }
            Err(error) => {
                warn!(error = %error, "send failed; pending message rolled back");
                self.surface(error)
            }
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
