//! Interceptors and their composition.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Wraps a stage function to produce another of the same type.
///
/// An interceptor may pass the call through, transform input or output,
/// short-circuit without calling `next`, or rewrite the error on the way
/// back.
pub trait Interceptor<F>: Send + Sync {
    /// Returns a stage function that delegates to `next`.
    fn wrap(&self, next: F) -> F;
}

/// Nests interceptors so that the first one is outermost.
///
/// A single interceptor is returned as-is, with no extra layer around it. An
/// empty list yields an interceptor that returns `next` unchanged.
#[must_use]
pub fn compose<F>(mut interceptors: Vec<Arc<dyn Interceptor<F>>>) -> Arc<dyn Interceptor<F>>
where
    F: 'static,
{
    match interceptors.len() {
        0 => Arc::new(Identity),
        1 => interceptors.remove(0),
        _ => Arc::new(Composed { interceptors }),
    }
}

struct Identity;

impl<F> Interceptor<F> for Identity {
    fn wrap(&self, next: F) -> F {
        next
    }
}

struct Composed<F> {
    interceptors: Vec<Arc<dyn Interceptor<F>>>,
}

impl<F> Interceptor<F> for Composed<F> {
    fn wrap(&self, next: F) -> F {
        self.interceptors
            .iter()
            .rev()
            .fold(next, |inner, interceptor| interceptor.wrap(inner))
    }
}

/// An interceptor made from a closure. See [`from_fn`].
pub struct FnInterceptor<W, F> {
    wrap: W,
    _stage: PhantomData<fn(F) -> F>,
}

impl<W, F> Interceptor<F> for FnInterceptor<W, F>
where
    W: Fn(F) -> F + Send + Sync,
{
    fn wrap(&self, next: F) -> F {
        (self.wrap)(next)
    }
}

impl<W, F> fmt::Debug for FnInterceptor<W, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor").finish_non_exhaustive()
    }
}

/// Lifts a `Fn(next) -> stage` closure into an interceptor.
pub fn from_fn<F, W>(wrap: W) -> FnInterceptor<W, F>
where
    W: Fn(F) -> F + Send + Sync,
{
    FnInterceptor {
        wrap,
        _stage: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Step = Arc<dyn Fn(Vec<&'static str>) -> Vec<&'static str> + Send + Sync>;

    fn tag(name: &'static str) -> Arc<dyn Interceptor<Step>> {
        Arc::new(from_fn(move |next: Step| -> Step {
            Arc::new(move |mut trail: Vec<&'static str>| {
                trail.push(name);
                next(trail)
            })
        }))
    }

    fn terminal() -> Step {
        Arc::new(|mut trail: Vec<&'static str>| {
            trail.push("terminal");
            trail
        })
    }

    #[test]
    fn test_first_interceptor_is_outermost() {
        let chain = compose(vec![tag("a"), tag("b"), tag("c")]);
        let step = chain.wrap(terminal());
        assert_eq!(step(Vec::new()), vec!["a", "b", "c", "terminal"]);
    }

    #[test]
    fn test_single_interceptor_returned_unchanged() {
        let only = tag("only");
        let composed = compose(vec![only.clone()]);
        assert!(Arc::ptr_eq(&only, &composed));
    }

    #[test]
    fn test_empty_list_is_identity() {
        let step = compose::<Step>(Vec::new()).wrap(terminal());
        assert_eq!(step(Vec::new()), vec!["terminal"]);
    }

    #[test]
    fn test_short_circuit_skips_inner() {
        let stop: Arc<dyn Interceptor<Step>> = Arc::new(from_fn(|_next: Step| -> Step {
            Arc::new(|mut trail: Vec<&'static str>| {
                trail.push("stop");
                trail
            })
        }));
        let step = compose(vec![tag("a"), stop, tag("never")]).wrap(terminal());
        assert_eq!(step(Vec::new()), vec!["a", "stop"]);
    }
}
