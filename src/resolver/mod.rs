//! Recognition Resolver
//!
//! Consumes engine events for the one active prompt, keeps a running
//! hypothesis while speech is in progress and turns the terminal event of an
//! attempt into an accepted choice or a rejection.
//!
//! Engine events arrive on engine threads while `show`/`dismiss` come from
//! the control thread. All attempt state lives in one snapshot that is
//! replaced by compare-and-swap, so a dismiss racing a terminal event ends
//! the attempt exactly once.

pub mod notification;
mod state;

pub use notification::{Notification, RejectReason};

use crate::audio_signal::{AudioSignalProblem, AudioSignalProblems};
use crate::choices::PreparedChoices;
use crate::confidence::{Confidence, ConfidenceWeighting};
use crate::config::ResolverConfig;
use crate::engine::{EngineProvider, RecognitionEvent};
use crate::error::{ResolverError, ResolverResult};
use crate::hypothesis::Hypothesis;
use crate::prompt::{AcceptedResult, Prompt, PromptResult, Selection};
use crate::rule::{best_multiple_choices, best_single_result, Indices, Rule};
use state::{AttemptCell, AttemptState};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

/// Side effect of a transition, performed after the state swap succeeded
enum Effect {
    Notify(Notification),
    Signal(Arc<dyn Prompt>, PromptResult),
    RestartEngine,
    StopEngine,
}

type Transition = (Option<AttemptState>, Vec<Effect>);

fn unchanged() -> ResolverResult<Transition> {
    Ok((None, Vec::new()))
}

/// Event-driven decision engine for one recognition backend
pub struct Resolver<E: EngineProvider> {
    engine: E,
    config: ResolverConfig,
    weighting: ConfidenceWeighting,
    state: AttemptCell,
    notifications: broadcast::Sender<Notification>,
}

impl<E: EngineProvider> Resolver<E> {
    pub fn new(engine: E, config: ResolverConfig) -> Self {
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));
        Self {
            engine,
            weighting: ConfidenceWeighting::from_config(&config),
            state: AttemptCell::new(AttemptState::new(AudioSignalProblems::from_config(&config))),
            config,
            notifications,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Receive notifications from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.state
            .load()
            .map(|state| state.prompt.is_some())
            .unwrap_or(false)
    }

    /// Current interim best guess, if any
    pub fn hypothesis(&self) -> Option<Hypothesis> {
        self.state
            .load()
            .ok()
            .and_then(|state| state.hypothesis.clone())
    }

    /// Audio problems recorded during the current attempt
    pub fn audio_problems(&self) -> ResolverResult<AudioSignalProblems> {
        Ok(self.state.load()?.audio_problems.clone())
    }

    pub fn awareness_bonus(&self) -> ResolverResult<f32> {
        Ok(self.state.load()?.awareness_bonus)
    }

    /// Start recognition for `prompt`. Only one prompt may be active.
    pub fn show(&self, prompt: Arc<dyn Prompt>) -> ResolverResult<()> {
        self.state.update(|state| {
            if let Some(active) = &state.prompt {
                return Err(ResolverError::ContractViolation(format!(
                    "{:?} shown while {:?} is still active",
                    prompt, active
                )));
            }
            Ok((Some(state.showing(prompt.clone())), ()))
        })?;
        info!("💬 Prompt shown: {:?}", prompt);

        if let Err(e) = self.engine.start() {
            let message = e.to_string();
            self.fault(Some(&prompt), e);
            return Err(ResolverError::Engine(message));
        }
        Ok(())
    }

    /// End the attempt of `prompt`.
    ///
    /// Returns `false` when the attempt already ended (accepted or faulted),
    /// fails when a different prompt is active.
    pub fn dismiss(&self, prompt: &Arc<dyn Prompt>) -> ResolverResult<bool> {
        let dismissed = self.state.update(|state| match &state.prompt {
            None => Ok((None, false)),
            Some(_) if state.is_showing(prompt) => Ok((Some(state.idle()), true)),
            Some(active) => Err(ResolverError::ContractViolation(format!(
                "dismissing {:?} while {:?} is active",
                prompt, active
            ))),
        })?;

        if dismissed {
            info!("👋 Prompt dismissed: {:?}", prompt);
            self.perform(Effect::StopEngine);
            self.perform(Effect::Notify(Notification::Dismissed));
        } else {
            debug!("Dismiss after the attempt already ended: {:?}", prompt);
        }
        Ok(dismissed)
    }

    /// Relax the required confidence while the user is known to be attentive
    pub fn set_awareness(&self, aware: bool) -> ResolverResult<()> {
        let bonus = if aware { self.config.awareness_bonus } else { 1.0 };
        self.state.update(|state| {
            let mut next = state.clone();
            next.awareness_bonus = bonus;
            Ok((Some(next), ()))
        })?;
        debug!("Awareness bonus set to {}", bonus);
        Ok(())
    }

    /// Event sink for engine threads
    pub fn handle(&self, event: RecognitionEvent) {
        debug!("Engine event: {}", event.kind());

        match &event {
            RecognitionEvent::Started => self.apply(|state| self.on_started(state)),
            RecognitionEvent::AudioLevelUpdated { level } => {
                self.perform(Effect::Notify(Notification::AudioLevel { level: *level }))
            }
            RecognitionEvent::AudioSignalProblemOccurred { problem } => {
                self.apply(|state| self.on_audio_signal_problem(state, *problem))
            }
            RecognitionEvent::SpeechDetected { rules } => {
                self.apply(|state| self.on_speech_detected(state, rules))
            }
            RecognitionEvent::RecognitionRejected { rules } => {
                self.apply(|state| self.on_recognition_rejected(state, rules))
            }
            RecognitionEvent::RecognitionCompleted { rules } => {
                self.apply(|state| self.on_recognition_completed(state, rules))
            }
        }
    }

    /// Feed events from a channel until all senders are gone
    pub async fn pump(&self, mut events: mpsc::UnboundedReceiver<RecognitionEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        debug!("Recognition event channel closed");
    }

    /// Run a transition and perform its effects. A failing transition faults
    /// the attempt it ran against, not whatever attempt is active by then.
    fn apply<F>(&self, mut transition: F)
    where
        F: FnMut(&AttemptState) -> ResolverResult<Transition>,
    {
        let mut attempt: Option<Arc<dyn Prompt>> = None;
        let outcome = self.state.update(|state| {
            attempt = state.prompt.clone();
            transition(state)
        });

        match outcome {
            Ok(effects) => {
                for effect in effects {
                    self.perform(effect);
                }
            }
            Err(e) => self.fault(attempt.as_ref(), e),
        }
    }

    fn perform(&self, effect: Effect) {
        match effect {
            Effect::Notify(notification) => {
                if let Notification::Rejected { reason, rule } = &notification {
                    match rule {
                        Some(rule) => info!("🔇 Rejected ({}): {}", reason, rule),
                        None => info!("🔇 Rejected ({})", reason),
                    }
                }
                // No subscribers is fine
                let _ = self.notifications.send(notification);
            }
            Effect::Signal(prompt, result) => {
                info!(
                    "✅ Accepted {:?} ({:.2}, {})",
                    result.selection, result.probability, result.confidence
                );
                prompt.signal(result);
            }
            Effect::RestartEngine => {
                if let Err(e) = self.engine.restart() {
                    warn!("⚠️ Engine restart failed: {}", e);
                }
            }
            Effect::StopEngine => {
                if let Err(e) = self.engine.stop() {
                    warn!("⚠️ Engine stop failed: {}", e);
                }
            }
        }
    }

    /// End the attempt of `attempt` with `error` attached to it.
    ///
    /// Only logs when that attempt already ended, so a late failure never
    /// reaches a prompt shown afterwards.
    fn fault(&self, attempt: Option<&Arc<dyn Prompt>>, error: ResolverError) {
        let Some(prompt) = attempt else {
            error!("❌ Recognition error without active prompt: {}", error);
            return;
        };

        let ended = self.state.update(|state| {
            if state.is_showing(prompt) {
                Ok((Some(state.idle()), true))
            } else {
                Ok((None, false))
            }
        });

        match ended {
            Ok(true) => {
                error!("❌ Recognition attempt failed: {}", error);
                self.perform(Effect::StopEngine);
                self.perform(Effect::Notify(Notification::Faulted {
                    message: error.to_string(),
                }));
                prompt.set_error(error);
            }
            Ok(false) => warn!(
                "⚠️ Attempt of {:?} already ended, dropping error: {}",
                prompt, error
            ),
            Err(e) => error!("❌ {} while handling: {}", e, error),
        }
    }

    fn required_confidence(&self, choices: &dyn PreparedChoices, rule: &Rule, state: &AttemptState) -> f32 {
        self.weighting
            .required_confidence(choices.intent(), rule.word_count(), state.awareness_bonus)
    }

    /// Best rule resolving to one choice.
    ///
    /// If no reported rule does, gaps are repaired; repaired trees only count
    /// when they all lead to the same choice.
    fn best_distinct(&self, choices: &dyn PreparedChoices, rules: &[Rule]) -> Option<Rule> {
        let mapper = |phrase| choices.map_phrase_to_choice(phrase);
        best_single_result(rules, mapper).or_else(|| {
            let sliced = choices.sliced_phrases()?;
            let repaired: Vec<Rule> = rules.iter().flat_map(|rule| rule.repair(sliced)).collect();
            let agreed: Indices = repaired
                .iter()
                .filter_map(|rule| rule.single_choice(&mapper))
                .collect();
            if agreed.len() != 1 {
                return None;
            }
            debug!("Repaired gap resolves to choice {:?}", agreed);
            best_single_result(&repaired, mapper)
        })
    }

    fn on_started(&self, state: &AttemptState) -> ResolverResult<Transition> {
        if state.prompt.is_none() {
            debug!("Recognition started without an active prompt");
            return unchanged();
        }
        Ok((
            Some(state.cleared()),
            vec![Effect::Notify(Notification::Started)],
        ))
    }

    fn on_audio_signal_problem(
        &self,
        state: &AttemptState,
        problem: AudioSignalProblem,
    ) -> ResolverResult<Transition> {
        if state.prompt.is_none() {
            return unchanged();
        }

        let mut next = state.clone();
        next.audio_problems.record(problem);
        let total = next.audio_problems.total();
        Ok((
            Some(next),
            vec![Effect::Notify(Notification::AudioSignalProblem { problem, total })],
        ))
    }

    fn on_speech_detected(&self, state: &AttemptState, rules: &[Rule]) -> ResolverResult<Transition> {
        let Some(prompt) = &state.prompt else {
            return unchanged();
        };

        if state.audio_problems.exceeded_limits() {
            warn!(
                "⚠️ {} audio signal problems, restarting recognition",
                state.audio_problems.total()
            );
            return Ok((
                None,
                vec![
                    Effect::RestartEngine,
                    Effect::Notify(Notification::RestartRequested),
                ],
            ));
        }

        for rule in rules {
            rule.validate()?;
        }

        if prompt.accepted_result() == AcceptedResult::Multiple {
            // Hypotheses only make sense for a single choice
            return match state.hypothesis {
                Some(_) => Ok((Some(state.with_hypothesis(None)), Vec::new())),
                None => unchanged(),
            };
        }

        let choices = prompt.choices();
        let mapper = |phrase| choices.map_phrase_to_choice(phrase);
        let Some(candidate) = self.best_distinct(choices.as_ref(), rules) else {
            debug!("Speech detected, but no rule resolves to a single choice");
            return unchanged();
        };

        let probability = choices.weighted_probability(&candidate);
        let required = self.required_confidence(choices.as_ref(), &candidate, state);
        if probability < required {
            debug!(
                "Discarding hypothesis {} ({:.2} < {:.2})",
                candidate, probability, required
            );
            return unchanged();
        }

        let hypothesis = match &state.hypothesis {
            None => Hypothesis::new(candidate.with_probability(probability)),
            Some(current) if current.is_continued_by(&candidate, &mapper) => {
                current.continued_with(candidate, probability)
            }
            Some(current) => {
                debug!("Utterance moved on from {}", current);
                Hypothesis::new(candidate.with_probability(probability))
            }
        };
        debug!("Hypothesis: {}", hypothesis);

        let notification = Notification::Hypothesis {
            rule: hypothesis.rule().clone(),
            probability: hypothesis.probability(),
        };
        Ok((
            Some(state.with_hypothesis(Some(hypothesis))),
            vec![Effect::Notify(notification)],
        ))
    }

    fn on_recognition_rejected(
        &self,
        state: &AttemptState,
        rules: &[Rule],
    ) -> ResolverResult<Transition> {
        let Some(prompt) = &state.prompt else {
            return unchanged();
        };

        if state.audio_problems.exceeded_limits() {
            return Ok((
                Some(state.cleared()),
                vec![Effect::Notify(Notification::Rejected {
                    reason: RejectReason::AudioSignalProblems,
                    rule: None,
                })],
            ));
        }

        let choices = prompt.choices();
        if let Some(hypothesis) = &state.hypothesis {
            let required = self.required_confidence(choices.as_ref(), hypothesis.rule(), state);
            if hypothesis.probability() >= required {
                info!("💡 Promoting hypothesis {}", hypothesis);
                return self.complete(state, prompt, std::slice::from_ref(hypothesis.rule()));
            }
        }

        let diagnostic = match prompt.accepted_result() {
            AcceptedResult::Distinct => self.best_distinct(choices.as_ref(), rules),
            AcceptedResult::Multiple => best_multiple_choices(rules),
        };
        let reason = RejectReason::NoConfidentMatch;
        Ok((
            Some(state.cleared()),
            vec![
                Effect::Notify(Notification::Rejected {
                    reason,
                    rule: diagnostic,
                }),
                Effect::Notify(Notification::HandlerInvocation { reason }),
            ],
        ))
    }

    fn on_recognition_completed(
        &self,
        state: &AttemptState,
        rules: &[Rule],
    ) -> ResolverResult<Transition> {
        match &state.prompt {
            Some(prompt) => self.complete(state, prompt, rules),
            None => {
                debug!("Recognition completed without an active prompt");
                unchanged()
            }
        }
    }

    /// Accept or reject the final candidates of an attempt
    fn complete(
        &self,
        state: &AttemptState,
        prompt: &Arc<dyn Prompt>,
        rules: &[Rule],
    ) -> ResolverResult<Transition> {
        for rule in rules {
            rule.validate()?;
        }

        let choices = prompt.choices();
        let mapper = |phrase| choices.map_phrase_to_choice(phrase);
        let accepted = prompt.accepted_result();
        let reject = |reason, rule| -> ResolverResult<Transition> {
            Ok((
                Some(state.cleared()),
                vec![Effect::Notify(Notification::Rejected { reason, rule })],
            ))
        };

        let best = match accepted {
            AcceptedResult::Distinct => self.best_distinct(choices.as_ref(), rules),
            AcceptedResult::Multiple => best_multiple_choices(rules),
        };
        let Some(best) = best else {
            return reject(RejectReason::NoMatchingChoice, None);
        };

        let mut probability = choices.weighted_probability(&best);
        if let Some(hypothesis) = &state.hypothesis {
            if hypothesis.probability() > probability
                && hypothesis.rule().choices(&mapper) == best.choices(&mapper)
            {
                debug!(
                    "Hypothesis outweighs final result ({:.2} > {:.2})",
                    hypothesis.probability(),
                    probability
                );
                probability = hypothesis.probability();
            }
        }

        let required = self.required_confidence(choices.as_ref(), &best, state);
        let effective = probability - state.audio_problems.penalty();

        if effective < required {
            let reason = if probability >= required {
                RejectReason::AudioSignalPenalty
            } else {
                RejectReason::InsufficientConfidence
            };
            debug!(
                "{}: {:.2} (raw {:.2}) < {:.2}",
                reason, effective, probability, required
            );
            return reject(reason, Some(best));
        }

        let selection = match accepted {
            AcceptedResult::Distinct => best.single_choice(&mapper).map(Selection::Single),
            AcceptedResult::Multiple => {
                let distinct = best.distinct_choices(&mapper);
                (!distinct.is_empty()).then_some(Selection::Multiple(distinct))
            }
        };
        let valid = selection.filter(|selection| {
            selection
                .choices()
                .iter()
                .all(|&choice| choice < choices.choice_count())
        });
        let Some(selection) = valid else {
            return reject(RejectReason::UndefinedResult, Some(best));
        };

        let result = PromptResult {
            selection,
            probability,
            confidence: Confidence::from_probability(probability),
            text: best.text().map(str::to_string),
        };
        Ok((
            Some(state.idle()),
            vec![
                Effect::Signal(prompt.clone(), result.clone()),
                Effect::StopEngine,
                Effect::Notify(Notification::Accepted { result }),
            ],
        ))
    }
}
