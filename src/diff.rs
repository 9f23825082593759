//! Keyed enter/update/exit reconciliation with animated, interruptible
//! transitions.
//!
//! Every render pass hands the scene the complete target set for its keys.
//! Keys new to the scene enter from a caller-chosen anchor at zero opacity;
//! keys present in both sets retarget toward their new absolute state; keys
//! that disappeared play out toward an exit state and are removed when the
//! tween finishes. Re-applying mid-flight is part of the contract: a
//! transition is always replaced from the current animated value toward an
//! absolute target, so a superseded tween can never fight the new one.

use std::collections::{HashMap, HashSet};

/// Interpolatable scene state (position, opacity, spline points, ...).
pub trait Animate: Clone {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Updating,
    Exiting,
}

#[derive(Debug, Clone)]
struct Transition<S> {
    from: S,
    to: S,
    start_ms: u64,
    duration_ms: u64,
    /// Render pass that scheduled this tween; superseded passes only survive
    /// in this stamp, useful when debugging re-entrant renders.
    pass: u64,
}

/// One keyed element of the scene: the animated state plus whatever static
/// payload the renderer needs to draw it.
#[derive(Debug, Clone)]
pub struct RenderItem<S, D> {
    pub key: String,
    pub data: D,
    pub phase: Phase,
    pub state: S,
    transition: Option<Transition<S>>,
}

impl<S, D> RenderItem<S, D> {
    pub fn in_flight(&self) -> bool {
        self.transition.is_some()
    }

    pub fn transition_pass(&self) -> Option<u64> {
        self.transition.as_ref().map(|t| t.pass)
    }
}

/// Desired end state for one key of the next frame.
#[derive(Debug, Clone)]
pub struct SceneTarget<S, D> {
    pub key: String,
    pub state: S,
    /// Where the element materializes when it is new to the scene.
    pub enter_from: S,
    pub data: D,
}

/// Three-way partition of previous vs current key sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffOutcome {
    pub enter: Vec<String>,
    pub update: Vec<String>,
    pub exit: Vec<String>,
}

/// Partition `current` against `previous` by key equality. Keys only in
/// `current` enter, keys in both update, keys only in `previous` exit.
pub fn reconcile<'a, P, C>(previous: P, current: C) -> DiffOutcome
where
    P: IntoIterator<Item = &'a str>,
    C: IntoIterator<Item = &'a str>,
{
    let previous: Vec<&str> = previous.into_iter().collect();
    let prev_set: HashSet<&str> = previous.iter().copied().collect();
    let mut current_set: HashSet<&str> = HashSet::new();
    let mut outcome = DiffOutcome::default();
    for key in current {
        current_set.insert(key);
        if prev_set.contains(key) {
            outcome.update.push(key.to_string());
        } else {
            outcome.enter.push(key.to_string());
        }
    }
    for key in previous {
        if !current_set.contains(key) {
            outcome.exit.push(key.to_string());
        }
    }
    outcome
}

/// A keyed set of animated render items. Paint order is stable: surviving
/// items keep their slot, entered items append.
#[derive(Debug)]
pub struct KeyedScene<S, D> {
    items: Vec<RenderItem<S, D>>,
}

impl<S: Animate, D> Default for KeyedScene<S, D> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<S: Animate, D> KeyedScene<S, D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[RenderItem<S, D>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RenderItem<S, D>> {
        self.items.iter().find(|item| item.key == key)
    }

    /// Keys currently alive in the scene, exiting ones included.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.key.as_str())
    }

    /// Reconcile the scene against the complete target set of the next
    /// frame. `exit_to` picks the destination of a disappearing item, given
    /// the item and the new states by key (e.g. collapse toward the new
    /// position of the item's parent).
    pub fn apply<F>(
        &mut self,
        targets: Vec<SceneTarget<S, D>>,
        exit_to: F,
        now_ms: u64,
        duration_ms: u64,
        pass: u64,
    ) -> DiffOutcome
    where
        F: Fn(&RenderItem<S, D>, &HashMap<String, S>) -> S,
    {
        let new_states: HashMap<String, S> = targets
            .iter()
            .map(|t| (t.key.clone(), t.state.clone()))
            .collect();

        let outcome = reconcile(
            self.items
                .iter()
                .filter(|item| item.phase != Phase::Exiting)
                .map(|item| item.key.as_str())
                .collect::<Vec<_>>(),
            targets.iter().map(|t| t.key.as_str()).collect::<Vec<_>>(),
        );

        for item in &mut self.items {
            if new_states.contains_key(&item.key) {
                continue;
            }
            if item.phase == Phase::Exiting && item.in_flight() {
                continue;
            }
            let to = exit_to(item, &new_states);
            item.phase = Phase::Exiting;
            item.transition = Some(Transition {
                from: item.state.clone(),
                to,
                start_ms: now_ms,
                duration_ms,
                pass,
            });
        }

        for target in targets {
            if let Some(item) = self.items.iter_mut().find(|item| item.key == target.key) {
                // An exiting key that reappears is resurrected in place.
                item.phase = Phase::Updating;
                item.data = target.data;
                item.transition = Some(Transition {
                    from: item.state.clone(),
                    to: target.state,
                    start_ms: now_ms,
                    duration_ms,
                    pass,
                });
            } else {
                self.items.push(RenderItem {
                    key: target.key,
                    data: target.data,
                    phase: Phase::Entering,
                    state: target.enter_from.clone(),
                    transition: Some(Transition {
                        from: target.enter_from,
                        to: target.state,
                        start_ms: now_ms,
                        duration_ms,
                        pass,
                    }),
                });
            }
        }

        outcome
    }

    /// Advance all tweens to `now_ms`. Finished exits are removed for good;
    /// finished enters settle into the updating phase.
    pub fn tick(&mut self, now_ms: u64) {
        for item in &mut self.items {
            let Some(transition) = &item.transition else {
                continue;
            };
            let t = if transition.duration_ms == 0 {
                1.0
            } else {
                (now_ms.saturating_sub(transition.start_ms) as f32
                    / transition.duration_ms as f32)
                    .min(1.0)
            };
            item.state = S::lerp(&transition.from, &transition.to, ease_cubic_in_out(t));
            if t >= 1.0 {
                item.transition = None;
                if item.phase == Phase::Entering {
                    item.phase = Phase::Updating;
                }
            }
        }
        self.items
            .retain(|item| !(item.phase == Phase::Exiting && item.transition.is_none()));
    }
}

pub fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = 2.0 * t - 2.0;
        u * u * u / 2.0 + 1.0
    }
}

pub fn lerp_f32(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}
