//! Host Framework Binding
//!
//! UI frameworks with a hooks model (an effect primitive that runs after
//! mount and returns a cleanup, and a reducer primitive whose dispatch
//! schedules a re-render) can drive subscriptions through
//! [`create_use_subscribe_hook`].
//!
//! # How It Works
//!
//! 1. `use_subscribe` registers a counting reducer with the host; its
//!    dispatcher is the "force update" function.
//! 2. It registers an effect that subscribes when the host runs it and
//!    returns a cleanup that unsubscribes.
//! 3. Every notification runs the user callback, then forces an update
//!    unless the callback returned [`Rerender::Skip`].
//!
//! The host owns the graph; effects and cleanups receive it from the host
//! when they run.

use std::rc::Rc;

use crate::error::Result;
use crate::graph::Graph;
use crate::reactive::Tracker;

/// What a hook callback wants the host to do after a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rerender {
    /// Re-render the component.
    #[default]
    Update,
    /// The change does not affect the rendered output.
    Skip,
}

impl From<()> for Rerender {
    fn from(_: ()) -> Self {
        Self::Update
    }
}

impl From<bool> for Rerender {
    /// `false` skips the re-render.
    fn from(update: bool) -> Self {
        if update {
            Self::Update
        } else {
            Self::Skip
        }
    }
}

/// Dispatcher returned by the host's reducer primitive.
pub type ForceUpdate = Rc<dyn Fn()>;

/// Reducer handed to the host: bumps a render counter.
pub type Reducer = fn(u64) -> u64;

/// Cleanup returned from an effect; the host runs it on unmount.
pub type EffectCleanup = Box<dyn FnOnce(&mut Graph)>;

/// Effect handed to the host; the host runs it once after mount.
pub type EffectFn = Box<dyn FnOnce(&mut Graph) -> Result<EffectCleanup>>;

/// Hook built from a host's effect and reducer primitives.
pub struct SubscribeHook<E, R> {
    use_effect: E,
    use_reducer: R,
}

/// Build a subscribe hook from the host's primitives.
///
/// `use_effect` registers an effect with no dependencies: the host must run
/// it once, after the first mount, and run its cleanup once on unmount.
/// Re-renders call `use_subscribe` again, which hands the host a fresh
/// effect each time; the host discards those, as a hooks runtime does for
/// an effect with an empty dependency list. Running every effect it is
/// given would stack one subscription per render.
///
/// `use_reducer` registers a reducer with an initial state and returns the
/// current state and a dispatcher.
pub fn create_use_subscribe_hook<E, R>(use_effect: E, use_reducer: R) -> SubscribeHook<E, R>
where
    E: Fn(EffectFn),
    R: Fn(Reducer, u64) -> (u64, ForceUpdate),
{
    SubscribeHook {
        use_effect,
        use_reducer,
    }
}

impl<E, R> SubscribeHook<E, R>
where
    E: Fn(EffectFn),
    R: Fn(Reducer, u64) -> (u64, ForceUpdate),
{
    /// Subscribe for the lifetime of the calling component.
    pub fn use_subscribe<G, T, C, U>(&self, getter: G, callback: C)
    where
        G: Fn(&Tracker<'_>) -> Result<T> + 'static,
        C: Fn(&mut Graph) -> Result<U> + 'static,
        U: Into<Rerender>,
    {
        let (_, force_update) = (self.use_reducer)(bump, 0);

        (self.use_effect)(Box::new(move |graph: &mut Graph| {
            let subscription = graph.subscribe(getter, move |graph| {
                let rerender: Rerender = callback(graph)?.into();
                if rerender != Rerender::Skip {
                    force_update();
                }
                Ok(())
            })?;
            let cleanup: EffectCleanup =
                Box::new(move |graph: &mut Graph| subscription.unsubscribe(graph));
            Ok(cleanup)
        }));
    }
}

fn bump(count: u64) -> u64 {
    count.wrapping_add(1)
}
