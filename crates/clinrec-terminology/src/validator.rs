//! Controlled-vocabulary membership validation.
//!
//! A call first resolves the composition graph reachable from the requested set
//! (detecting circular references along each branch), then checks membership:
//! direct `(system, code)` membership first, then every distinct composed
//! reference exactly once, split across a bounded set of worker threads and
//! fanned back in over a channel. The first member result wins; workers still
//! running at that point finish on their own and their results are dropped with
//! the receiver.

use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::{Arc, mpsc};
use std::thread;

use clinrec_model::{Coding, ValidationResult, VocabularySet};
use tracing::{debug, debug_span};

use crate::error::TerminologyError;
use crate::provider::VocabularySetProvider;

/// Vocabulary sets reachable from one top-level reference, resolved once per call.
///
/// `None` marks a reference the provider does not know.
#[derive(Debug, Default)]
struct Composition {
    sets: HashMap<String, Option<Arc<VocabularySet>>>,
}

impl Composition {
    fn resolve(
        provider: &dyn VocabularySetProvider,
        reference: &str,
    ) -> Result<Self, TerminologyError> {
        let mut composition = Self::default();
        let mut in_flight = Vec::new();
        composition.visit(provider, reference, &mut in_flight)?;
        Ok(composition)
    }

    fn visit(
        &mut self,
        provider: &dyn VocabularySetProvider,
        reference: &str,
        in_flight: &mut Vec<String>,
    ) -> Result<(), TerminologyError> {
        if in_flight.iter().any(|pending| pending == reference) {
            let mut chain = in_flight.clone();
            chain.push(reference.to_string());
            return Err(TerminologyError::VocabularyCycle {
                reference: reference.to_string(),
                chain,
            });
        }
        if self.sets.contains_key(reference) {
            return Ok(());
        }
        let set = provider.vocabulary_set(reference)?;
        in_flight.push(reference.to_string());
        if let Some(set) = &set {
            for include in &set.includes {
                self.visit(provider, include, in_flight)?;
            }
        }
        in_flight.pop();
        self.sets.insert(reference.to_string(), set);
        Ok(())
    }

    fn get(&self, reference: &str) -> Option<&Arc<VocabularySet>> {
        self.sets.get(reference).and_then(Option::as_ref)
    }

    /// Distinct references composed by `reference`, breadth first, excluding itself.
    fn reachable(&self, reference: &str) -> Vec<String> {
        let mut seen = HashSet::from([reference]);
        let mut queue = VecDeque::from([reference]);
        let mut order = Vec::new();
        while let Some(current) = queue.pop_front() {
            let Some(set) = self.get(current) else {
                continue;
            };
            for include in &set.includes {
                if seen.insert(include.as_str()) {
                    order.push(include.clone());
                    queue.push_back(include.as_str());
                }
            }
        }
        order
    }

    /// Direct membership in one reference; composed references are not followed.
    fn check_direct(&self, reference: &str, coding: &Coding) -> ValidationResult {
        match self.get(reference) {
            None => ValidationResult::failed(format!("unknown vocabulary set '{reference}'")),
            Some(set) if set.contains(coding.system.as_deref(), &coding.code) => {
                ValidationResult::member_of(&set.url)
            }
            Some(_) => ValidationResult::not_member(),
        }
    }
}

/// Checks whether codings are members of named vocabulary sets.
#[derive(Clone)]
pub struct VocabularyValidator {
    sets: Arc<dyn VocabularySetProvider>,
}

impl VocabularyValidator {
    pub fn new(sets: Arc<dyn VocabularySetProvider>) -> Self {
        Self { sets }
    }

    /// Membership of one coding in the set named by `reference` or any set it composes.
    ///
    /// An unknown reference is reported as an invalid result carrying a message;
    /// a circular composition is an error.
    pub fn validate(
        &self,
        reference: &str,
        coding: &Coding,
    ) -> Result<ValidationResult, TerminologyError> {
        self.validate_any(reference, std::slice::from_ref(coding))
    }

    /// Membership of any of `codings`; the first member found wins.
    pub fn validate_any(
        &self,
        reference: &str,
        codings: &[Coding],
    ) -> Result<ValidationResult, TerminologyError> {
        let span = debug_span!("validate", vocabulary = reference, codings = codings.len());
        let _enter = span.enter();

        let composition = Arc::new(Composition::resolve(self.sets.as_ref(), reference)?);
        let mut first_error = None;
        for coding in codings {
            let result = check(&composition, reference, coding);
            if result.valid {
                debug!(matched_in = ?result.matched_in, "code is a member");
                return Ok(result);
            }
            if first_error.is_none() && result.is_error() {
                first_error = Some(result);
            }
        }
        Ok(first_error.unwrap_or_else(ValidationResult::not_member))
    }
}

impl std::fmt::Debug for VocabularyValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VocabularyValidator").finish_non_exhaustive()
    }
}

fn check(composition: &Arc<Composition>, reference: &str, coding: &Coding) -> ValidationResult {
    let direct = composition.check_direct(reference, coding);
    if direct.valid || direct.is_error() {
        return direct;
    }
    let references = composition.reachable(reference);
    if references.is_empty() {
        return direct;
    }

    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(references.len());
    let chunk_len = references.len().div_ceil(workers);
    let (sender, receiver) = mpsc::channel();
    for (chunk_index, chunk) in references.chunks(chunk_len).enumerate() {
        let offset = chunk_index * chunk_len;
        let work = {
            let sender = sender.clone();
            let composition = Arc::clone(composition);
            let chunk = chunk.to_vec();
            let coding = coding.clone();
            move || {
                for (position, include) in chunk.iter().enumerate() {
                    let result = composition.check_direct(include, &coding);
                    let member = result.valid;
                    if sender.send((offset + position, result)).is_err() || member {
                        return;
                    }
                }
            }
        };
        let spawned = thread::Builder::new()
            .name(format!("vocabulary-check-{chunk_index}"))
            .spawn(work);
        if let Err(error) = spawned {
            debug!(%error, "worker spawn failed; checking references inline");
            for (position, include) in chunk.iter().enumerate() {
                let _ = sender.send((offset + position, composition.check_direct(include, coding)));
            }
        }
    }
    drop(sender);

    let mut outcomes: Vec<Option<ValidationResult>> = vec![None; references.len()];
    for (position, result) in receiver {
        if result.valid {
            return result;
        }
        outcomes[position] = Some(result);
    }
    outcomes
        .into_iter()
        .flatten()
        .find(ValidationResult::is_error)
        .unwrap_or(direct)
}
