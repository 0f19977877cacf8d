// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Debounced re-extraction.
//!
//! Model and category changes are sent to a background task as triggers.
//! The task waits until no trigger has arrived for the quiet window, folds
//! everything it received into one pending run and executes a single pass.
//! Triggers that arrive while a pass is running queue up and become the
//! next run, so none are lost.

use std::sync::Arc;
use std::time::Duration;

use schedule_lite_core::Element;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::store::ParameterStore;

/// A change that calls for a new pass.
#[derive(Debug, Clone)]
pub enum Trigger {
    ModelChanged(Vec<Element>),
    CategoriesChanged {
        parents: Vec<String>,
        children: Vec<String>,
    },
}

/// Triggers folded together: the latest elements and the latest categories.
#[derive(Debug, Default)]
struct PendingRun {
    elements: Option<Vec<Element>>,
    categories: Option<(Vec<String>, Vec<String>)>,
    triggers: usize,
}

impl PendingRun {
    fn absorb(&mut self, trigger: Trigger) {
        self.triggers += 1;
        match trigger {
            Trigger::ModelChanged(elements) => self.elements = Some(elements),
            Trigger::CategoriesChanged { parents, children } => {
                self.categories = Some((parents, children))
            }
        }
    }
}

/// Handle to the background scheduling task.
#[derive(Debug)]
pub struct ExtractionScheduler {
    tx: mpsc::UnboundedSender<Trigger>,
    handle: JoinHandle<()>,
}

impl ExtractionScheduler {
    /// Spawns the scheduling task on the current runtime.
    pub fn spawn(store: Arc<ParameterStore>, window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(store, rx, window));
        Self { tx, handle }
    }

    /// Returns false if the task has stopped.
    pub fn model_changed(&self, elements: Vec<Element>) -> bool {
        self.tx.send(Trigger::ModelChanged(elements)).is_ok()
    }

    pub fn categories_changed(&self, parents: Vec<String>, children: Vec<String>) -> bool {
        self.tx
            .send(Trigger::CategoriesChanged { parents, children })
            .is_ok()
    }

    /// Flushes pending triggers and waits for the task to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Extraction scheduler task failed");
        }
    }
}

async fn run(store: Arc<ParameterStore>, mut rx: mpsc::UnboundedReceiver<Trigger>, window: Duration) {
    while let Some(first) = rx.recv().await {
        let mut pending = PendingRun::default();
        pending.absorb(first);

        // Every trigger restarts the quiet window.
        let mut closed = false;
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(trigger) => pending.absorb(trigger),
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = tokio::time::sleep(window) => break,
            }
        }

        execute(&store, pending, window).await;
        if closed {
            break;
        }
    }
    tracing::info!("Extraction scheduler stopped");
}

async fn execute(store: &ParameterStore, pending: PendingRun, window: Duration) {
    tracing::debug!(triggers = pending.triggers, "Running debounced pass");
    if let Some((parents, children)) = pending.categories {
        store.set_categories(parents, children);
    }
    let elements = pending.elements.unwrap_or_else(|| store.elements());
    if elements.is_empty() {
        return;
    }

    loop {
        match store.extract_and_process(elements.clone()).await {
            Ok(()) => break,
            Err(Error::Busy) => tokio::time::sleep(window).await,
            Err(e) => {
                tracing::debug!(error = %e, "Debounced pass failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_run_keeps_latest_of_each_kind() {
        let mut pending = PendingRun::default();
        pending.absorb(Trigger::ModelChanged(vec![Element::new("a", "Walls")]));
        pending.absorb(Trigger::CategoriesChanged {
            parents: vec!["Walls".into()],
            children: vec![],
        });
        pending.absorb(Trigger::ModelChanged(vec![
            Element::new("a", "Walls"),
            Element::new("b", "Walls"),
        ]));
        assert_eq!(pending.triggers, 3);
        assert_eq!(pending.elements.map(|e| e.len()), Some(2));
        assert_eq!(pending.categories, Some((vec!["Walls".to_string()], vec![])));
    }
}
