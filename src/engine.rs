use crate::ast::FieldValue;
use crate::catalog::FormVariant;
use crate::config::EngineConfig;
use crate::data::FormRecord;
use crate::error::{ServiceError, SubmitError};
use crate::evaluator::{Convergence, Recalculator};
use crate::form::{FieldDescriptor, FormDefinition};
use crate::service::RecordService;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Whether the engine is waiting on an initial fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
}

/// What the presentation layer needs to render one field and route its edits.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBinding {
    pub descriptor: FieldDescriptor,
    pub value: FieldValue,
    /// False for derived fields; the widget must not accept direct input.
    pub editable: bool,
}

#[derive(Debug)]
struct EngineState {
    record: FormRecord,
    load_state: LoadState,
    identifier: Option<String>,
    /// Bumped by every `initialize`; a load only applies if it still matches.
    generation: u64,
}

/// The derived-field form engine for one form on screen.
///
/// `FormEngine` is a cheap handle; clones share the same record. Edits run the
/// convergence loop synchronously, while loading and saving delegate to
/// caller-supplied futures. The internal lock is never held across an `.await`.
#[derive(Debug, Clone)]
pub struct FormEngine {
    definition: Arc<FormDefinition>,
    config: Arc<EngineConfig>,
    state: Arc<Mutex<EngineState>>,
}

impl FormEngine {
    /// Creates an engine with an empty record and the default config.
    pub fn new(definition: FormDefinition) -> Self {
        Self::with_config(definition, EngineConfig::default())
    }

    pub fn with_config(definition: FormDefinition, config: EngineConfig) -> Self {
        Self {
            definition: Arc::new(definition),
            config: Arc::new(config),
            state: Arc::new(Mutex::new(EngineState {
                record: FormRecord::new(),
                load_state: LoadState::Ready,
                identifier: None,
                generation: 0,
            })),
        }
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A snapshot of the current record.
    pub fn record(&self) -> FormRecord {
        self.lock().record.clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.lock().load_state
    }

    pub fn is_ready(&self) -> bool {
        self.load_state() == LoadState::Ready
    }

    /// The identifier of the record being edited, once `initialize` was called.
    pub fn identifier(&self) -> Option<String> {
        self.lock().identifier.clone()
    }

    /// Loads the record for `identifier` from `fetch`.
    ///
    /// The engine switches to [`LoadState::Loading`] and clears the record as
    /// soon as this is called, before the returned future is polled. When the
    /// fetch settles, its record is applied only if no later `initialize` has
    /// been made in the meantime. A missing record or a failed fetch both
    /// yield an empty record; failures are logged, never returned.
    pub fn initialize<Fut>(&self, identifier: &str, fetch: Fut) -> impl Future<Output = FormRecord>
    where
        Fut: Future<Output = Result<Option<FormRecord>, ServiceError>>,
    {
        let generation = self.begin_load(identifier);
        let engine = self.clone();
        let identifier = identifier.to_string();

        async move {
            let loaded = match fetch.await {
                Ok(Some(record)) => {
                    info!(
                        form = %engine.definition.id,
                        %identifier,
                        fields = record.len(),
                        "record loaded"
                    );
                    record
                }
                Ok(None) => {
                    debug!(form = %engine.definition.id, %identifier, "no saved record");
                    FormRecord::new()
                }
                Err(e) if e.is_not_found() => {
                    debug!(form = %engine.definition.id, %identifier, "no saved record");
                    FormRecord::new()
                }
                Err(e) => {
                    warn!(
                        form = %engine.definition.id,
                        %identifier,
                        error = %e,
                        "record load failed; starting empty"
                    );
                    FormRecord::new()
                }
            };
            engine.finish_load(generation, &identifier, loaded)
        }
    }

    /// `initialize` against a record service.
    pub fn load_from<S: RecordService>(
        &self,
        service: &S,
        identifier: &str,
    ) -> impl Future<Output = FormRecord> {
        self.initialize(identifier, service.fetch(identifier))
    }

    fn begin_load(&self, identifier: &str) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        state.load_state = LoadState::Loading;
        state.identifier = Some(identifier.to_string());
        state.record = FormRecord::new();
        state.generation
    }

    fn finish_load(&self, generation: u64, identifier: &str, record: FormRecord) -> FormRecord {
        let mut state = self.lock();
        if state.generation != generation {
            debug!(
                form = %self.definition.id,
                %identifier,
                "discarding load superseded by a newer identifier"
            );
            return state.record.clone();
        }
        state.record = record;
        state.load_state = LoadState::Ready;
        state.record.clone()
    }

    /// Sets `field` to `raw_value` and propagates calculation rules to a fixed point.
    ///
    /// An empty `raw_value` clears the field. Names the form does not declare
    /// are stored as-is.
    pub fn apply_edit(&self, field: &str, raw_value: &str) -> FormRecord {
        self.apply_edit_with_report(field, raw_value).record
    }

    /// Like [`apply_edit`](Self::apply_edit), also returning what the convergence loop did.
    pub fn apply_edit_with_report(&self, field: &str, raw_value: &str) -> Convergence {
        let mut state = self.lock();
        if self.definition.field(field).is_none() {
            debug!(form = %self.definition.id, field, "edit to undeclared field stored as-is");
        }

        let mut candidate = state.record.clone();
        candidate.set(field, FieldValue::from_raw(raw_value));

        let convergence = self.recalculator().propagate(candidate, field);
        state.record = convergence.record.clone();
        convergence
    }

    /// Evaluates every rule against the current record until it settles.
    ///
    /// Useful after loading a record that was saved before its derived fields
    /// were filled in.
    pub fn recalculate(&self) -> Convergence {
        let mut state = self.lock();
        let convergence = self.recalculator().settle(state.record.clone());
        state.record = convergence.record.clone();
        convergence
    }

    /// Hands the current record to `save`.
    ///
    /// The record is never reset: on success editing continues, on failure
    /// the same record can be resubmitted. The error carries the message the
    /// service supplied, or the configured fallback.
    pub async fn submit<F, Fut>(&self, save: F) -> Result<(), SubmitError>
    where
        F: FnOnce(FormRecord) -> Fut,
        Fut: Future<Output = Result<(), ServiceError>>,
    {
        let snapshot = self.record();
        match save(snapshot).await {
            Ok(()) => {
                info!(form = %self.definition.id, "record saved");
                Ok(())
            }
            Err(source) => {
                let message = source
                    .user_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| self.config.save_failure_message.clone());
                error!(form = %self.definition.id, error = %source, "record save failed");
                Err(SubmitError::SaveFailed { message, source })
            }
        }
    }

    /// `submit` to a record service, under the identifier given to `initialize`.
    pub async fn save_to<S: RecordService>(&self, service: &S) -> Result<(), SubmitError> {
        let identifier = self.identifier().ok_or(SubmitError::NoIdentifier)?;
        self.submit(|record| async move { service.save(&identifier, &record).await })
            .await
    }

    /// One binding per declared field, in declaration order.
    pub fn bindings(&self) -> Vec<FieldBinding> {
        let state = self.lock();
        self.definition
            .fields()
            .iter()
            .map(|descriptor| FieldBinding {
                descriptor: descriptor.clone(),
                value: state.record.get(&descriptor.name).clone(),
                editable: !descriptor.read_only,
            })
            .collect()
    }

    /// Explains how a formula-derived field gets its value from the current record.
    pub fn explain(&self, field: &str) -> Option<String> {
        let rule = self.definition.rule_for(field)?;
        rule.explain(&self.lock().record)
    }

    /// The current record as the typed shape of a catalog form.
    pub fn typed<F: FormVariant>(&self) -> F {
        F::from_record(&self.lock().record)
    }

    fn recalculator(&self) -> Recalculator<'_> {
        Recalculator::new(self.definition.rules(), self.config.pass_multiplier)
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
