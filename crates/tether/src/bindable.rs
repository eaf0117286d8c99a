#![forbid(unsafe_code)]

//! Consumer endpoints and the terminal `bind` operation.
//!
//! A [`Bindable`] is whatever applies a value to something outside the
//! binding layer: a label's text, a button's enabled flag, the input of
//! another source. The binding layer owns none of that state.
//!
//! `bind` accepts both exact-type and optional-type consumers through a single
//! signature. [`BindValue`] has exactly two implementations, identity and
//! `Some`-wrapping, which the compiler selects from the consumer's type.

use std::fmt;

use crate::observation::Observation;

/// A consumer capability: accept a value and apply it.
pub trait Bindable<T> {
    /// The function that applies one value to the target.
    fn advance(&self) -> impl Fn(T) + '_;
}

/// How an element of type `Self` is delivered to a `Bindable<Target>`.
pub trait BindValue<Target> {
    fn into_bind_value(self) -> Target;
}

impl<T> BindValue<T> for T {
    #[inline]
    fn into_bind_value(self) -> T {
        self
    }
}

impl<T> BindValue<Option<T>> for T {
    #[inline]
    fn into_bind_value(self) -> Option<T> {
        Some(self)
    }
}

/// Adapts a closure into a [`Bindable`].
#[derive(Clone)]
pub struct BindableFn<F>(pub F);

impl<T, F: Fn(T)> Bindable<T> for BindableFn<F> {
    fn advance(&self) -> impl Fn(T) + '_ {
        &self.0
    }
}

impl<F> fmt::Debug for BindableFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindableFn").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Observation<T> {
    /// Apply every value pushed from now on to `bindable`.
    ///
    /// Works for a `Bindable<T>` and for a `Bindable<Option<T>>`.
    pub fn bind<V, B>(&self, bindable: B)
    where
        B: Bindable<V> + 'static,
        T: BindValue<V>,
    {
        self.register(move |value: &T| {
            let apply = bindable.advance();
            apply(value.clone().into_bind_value());
        });
    }

    /// Apply every value pushed from now on to a closure.
    pub fn bind_fn(&self, apply: impl Fn(T) + 'static) {
        self.bind::<T, _>(BindableFn(apply));
    }
}
