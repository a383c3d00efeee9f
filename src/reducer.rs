use crate::action::Action;
use crate::merge::Merge;

/// A pure function that computes the next state from the current state and
/// an action.
///
/// Reducers receive owned state and return owned state, like an eventfold
/// fold. Any `Fn(S, &Action<A, S>) -> S` is a reducer.
///
/// A [`PersistState`](crate::PersistState) enhancer wraps every reducer that
/// does not report [`handles_rehydrate`](Reducer::handles_rehydrate) with
/// [`merge_persisted_state`] and a [`ShallowMerge`](crate::ShallowMerge).
///
/// # Examples
///
/// ```
/// use persiststate::{Action, Reducer};
///
/// fn counter(state: u64, action: &Action<u64, u64>) -> u64 {
///     match action {
///         Action::App(n) => state + n,
///         _ => state,
///     }
/// }
///
/// assert_eq!(counter.reduce(1, &Action::App(2)), 3);
/// assert!(!counter.handles_rehydrate());
/// ```
pub trait Reducer<S, A> {
    fn reduce(&self, state: S, action: &Action<A, S>) -> S;

    /// Whether this reducer already applies [`Action::Rehydrate`] itself.
    ///
    /// Reducers reporting `true` are never wrapped and receive the
    /// rehydration action unchanged.
    fn handles_rehydrate(&self) -> bool {
        false
    }
}

/// Boxed reducer handed to a store constructor.
pub type BoxReducer<S, A> = Box<dyn Reducer<S, A>>;

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(S, &Action<A, S>) -> S,
{
    fn reduce(&self, state: S, action: &Action<A, S>) -> S {
        self(state, action)
    }
}

/// A reducer that replaces state with `merge(state, payload)` on
/// rehydration and defers to the wrapped reducer for everything else.
pub struct MergePersisted<R, M> {
    inner: R,
    merge: M,
}

impl<R, M> MergePersisted<R, M> {
    pub fn new(inner: R, merge: M) -> Self {
        MergePersisted { inner, merge }
    }

    /// The wrapped application reducer.
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<S, A, R, M> Reducer<S, A> for MergePersisted<R, M>
where
    S: Clone,
    R: Reducer<S, A>,
    M: Merge<S>,
{
    fn reduce(&self, state: S, action: &Action<A, S>) -> S {
        match action {
            Action::Rehydrate(init) => match &init.payload {
                Some(persisted) => self.merge.merge(state, persisted.clone()),
                None => state,
            },
            Action::App(_) => self.inner.reduce(state, action),
        }
    }

    fn handles_rehydrate(&self) -> bool {
        true
    }
}

/// Higher-order reducer that rehydrates by merging persisted state into the
/// current state with `merge`.
///
/// # Examples
///
/// ```
/// use persiststate::{Action, Reducer, merge_persisted_state};
///
/// fn counter(state: u64, _action: &Action<(), u64>) -> u64 {
///     state + 1
/// }
///
/// let keep_max = |initial: u64, persisted: u64| initial.max(persisted);
/// let reducer = merge_persisted_state(keep_max)(counter);
/// assert_eq!(reducer.reduce(2, &Action::rehydrate(Some(7))), 7);
/// assert_eq!(reducer.reduce(2, &Action::rehydrate(None)), 2);
/// assert_eq!(reducer.reduce(2, &Action::App(())), 3);
/// ```
pub fn merge_persisted_state<R, M>(merge: M) -> impl FnOnce(R) -> MergePersisted<R, M> {
    move |reducer| MergePersisted::new(reducer, merge)
}

/// Marks a reducer as handling [`Action::Rehydrate`] on its own.
pub struct HandlesRehydration<R>(R);

impl<S, A, R> Reducer<S, A> for HandlesRehydration<R>
where
    R: Reducer<S, A>,
{
    fn reduce(&self, state: S, action: &Action<A, S>) -> S {
        self.0.reduce(state, action)
    }

    fn handles_rehydrate(&self) -> bool {
        true
    }
}

/// Opt a reducer out of automatic rehydration wrapping.
///
/// The reducer then sees the rehydration action like any other action and
/// decides itself what the persisted payload means.
pub fn handles_rehydration<R>(reducer: R) -> HandlesRehydration<R> {
    HandlesRehydration(reducer)
}
