//! Possibly-failing conversions between key or value types.
//!
//! Transformers must be pure: the same input always yields the same output. Pooling relies on
//! this when a transformer is applied to keys, since two equal keys must map to the same pooled
//! fetch.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

/// A conversion from `Input` to `Output` that may fail by returning `None`.
pub trait OneWayTransformer: Send + Sync {
    type Input;
    type Output;

    fn transform(&self, input: &Self::Input) -> Option<Self::Output>;

    /// Chains `next` after this transformer.
    ///
    /// The chained transformer fails as soon as one of the stages fails, without running the
    /// stages after it.
    fn then<N>(self, next: N) -> Chained<Self, N>
    where
        Self: Sized,
        N: OneWayTransformer<Input = Self::Output>,
    {
        Chained {
            first: self,
            second: next,
        }
    }
}

/// A transformer that can also convert back from `Output` to `Input`.
pub trait TwoWayTransformer: OneWayTransformer {
    fn inverse_transform(&self, output: &Self::Output) -> Option<Self::Input>;

    /// Swaps the directions of this transformer.
    fn invert(self) -> Inverted<Self>
    where
        Self: Sized,
    {
        Inverted { inner: self }
    }
}

/// A [`OneWayTransformer`] backed by a closure. Created by [`transformer`].
pub struct FnTransformer<F, A, B> {
    f: F,
    _marker: PhantomData<fn(&A) -> B>,
}

/// Wraps a closure as a [`OneWayTransformer`].
pub fn transformer<A, B, F>(f: F) -> FnTransformer<F, A, B>
where
    F: Fn(&A) -> Option<B> + Send + Sync,
{
    FnTransformer {
        f,
        _marker: PhantomData,
    }
}

impl<F, A, B> OneWayTransformer for FnTransformer<F, A, B>
where
    F: Fn(&A) -> Option<B> + Send + Sync,
{
    type Input = A;
    type Output = B;

    fn transform(&self, input: &A) -> Option<B> {
        (self.f)(input)
    }
}

/// A [`TwoWayTransformer`] backed by a pair of closures. Created by [`two_way_transformer`].
pub struct FnTwoWayTransformer<F, G, A, B> {
    forward: F,
    backward: G,
    _marker: PhantomData<fn(&A) -> B>,
}

/// Wraps a pair of closures as a [`TwoWayTransformer`].
pub fn two_way_transformer<A, B, F, G>(forward: F, backward: G) -> FnTwoWayTransformer<F, G, A, B>
where
    F: Fn(&A) -> Option<B> + Send + Sync,
    G: Fn(&B) -> Option<A> + Send + Sync,
{
    FnTwoWayTransformer {
        forward,
        backward,
        _marker: PhantomData,
    }
}

impl<F, G, A, B> OneWayTransformer for FnTwoWayTransformer<F, G, A, B>
where
    F: Fn(&A) -> Option<B> + Send + Sync,
    G: Fn(&B) -> Option<A> + Send + Sync,
{
    type Input = A;
    type Output = B;

    fn transform(&self, input: &A) -> Option<B> {
        (self.forward)(input)
    }
}

impl<F, G, A, B> TwoWayTransformer for FnTwoWayTransformer<F, G, A, B>
where
    F: Fn(&A) -> Option<B> + Send + Sync,
    G: Fn(&B) -> Option<A> + Send + Sync,
{
    fn inverse_transform(&self, output: &B) -> Option<A> {
        (self.backward)(output)
    }
}

/// Two transformers applied one after the other. Created by [`OneWayTransformer::then`].
pub struct Chained<A, B> {
    first: A,
    second: B,
}

impl<A, B> OneWayTransformer for Chained<A, B>
where
    A: OneWayTransformer,
    B: OneWayTransformer<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn transform(&self, input: &Self::Input) -> Option<Self::Output> {
        let intermediate = self.first.transform(input)?;
        self.second.transform(&intermediate)
    }
}

impl<A, B> TwoWayTransformer for Chained<A, B>
where
    A: TwoWayTransformer,
    B: TwoWayTransformer<Input = A::Output>,
{
    fn inverse_transform(&self, output: &Self::Output) -> Option<Self::Input> {
        let intermediate = self.second.inverse_transform(output)?;
        self.first.inverse_transform(&intermediate)
    }
}

/// A [`TwoWayTransformer`] with its directions swapped. Created by [`TwoWayTransformer::invert`].
pub struct Inverted<T> {
    inner: T,
}

impl<T: TwoWayTransformer> OneWayTransformer for Inverted<T> {
    type Input = T::Output;
    type Output = T::Input;

    fn transform(&self, input: &Self::Input) -> Option<Self::Output> {
        self.inner.inverse_transform(input)
    }
}

impl<T: TwoWayTransformer> TwoWayTransformer for Inverted<T> {
    fn inverse_transform(&self, output: &Self::Output) -> Option<Self::Input> {
        self.inner.transform(output)
    }
}

/// Converts values to their string representation, and parses them back.
///
/// The forward direction never fails. The inverse fails for strings that do not parse.
pub struct StringTransformer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> StringTransformer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for StringTransformer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Display + FromStr> OneWayTransformer for StringTransformer<T> {
    type Input = T;
    type Output = String;

    fn transform(&self, input: &T) -> Option<String> {
        Some(input.to_string())
    }
}

impl<T: Display + FromStr> TwoWayTransformer for StringTransformer<T> {
    fn inverse_transform(&self, output: &String) -> Option<T> {
        output.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn half() -> impl OneWayTransformer<Input = u32, Output = u32> {
        transformer(|x: &u32| (x % 2 == 0).then_some(x / 2))
    }

    #[test]
    fn test_closure_transformer() {
        let t = half();
        assert_eq!(t.transform(&8), Some(4));
        assert_eq!(t.transform(&7), None);
    }

    fn small_to_string() -> impl OneWayTransformer<Input = u32, Output = String> {
        transformer(|x: &u32| (*x < 100).then(|| x.to_string()))
    }

    #[test]
    fn test_chaining_law() {
        let to_string = small_to_string();

        for x in [0, 3, 4, 150, 200] {
            let chained = half().then(small_to_string());
            let stepwise = half()
                .transform(&x)
                .and_then(|y| to_string.transform(&y));
            assert_eq!(chained.transform(&x), stepwise, "input {x}");
        }
    }

    #[test]
    fn test_chaining_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let counted = transformer(move |x: &u32| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Some(*x)
        });

        let chained = half().then(counted);
        assert_eq!(chained.transform(&3), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(chained.transform(&4), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_string_transformer() {
        let t = StringTransformer::<i64>::new();
        assert_eq!(t.transform(&12), Some("12".to_owned()));
        assert_eq!(t.inverse_transform(&"-3".to_owned()), Some(-3));
        assert_eq!(t.inverse_transform(&"twelve".to_owned()), None);
    }

    #[test]
    fn test_inverted_and_chained_two_way() {
        let parse = StringTransformer::<u32>::new().invert();
        assert_eq!(parse.transform(&"5".to_owned()), Some(5));
        assert_eq!(parse.inverse_transform(&5), Some("5".to_owned()));

        let offset = two_way_transformer(|x: &u32| x.checked_add(10), |x: &u32| x.checked_sub(10));
        let chained = parse.then(offset);

        assert_eq!(chained.transform(&"5".to_owned()), Some(15));
        assert_eq!(chained.inverse_transform(&15), Some("5".to_owned()));
        assert_eq!(chained.inverse_transform(&3), None);
    }
}
