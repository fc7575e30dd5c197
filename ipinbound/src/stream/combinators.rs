//! Small stream combinators.

use futures::future::Either;
use futures::{stream, Stream, StreamExt};

use super::EventStream;

/// Yield `initial` first, then everything from `source`.
pub fn bootstrap<T, E, S>(source: S, initial: T) -> EventStream<T, E>
where
    S: Stream<Item = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    stream::once(async move { Ok(initial) }).chain(source).boxed()
}

/// Pair the most recent values of `left` and `right`.
///
/// Emits whenever either side produces, once both have produced at least
/// once. An error from either side is forwarded and ends the stream; the
/// stream otherwise ends when both sides have ended.
pub fn combine_latest<A, B, E, SA, SB>(left: SA, right: SB) -> EventStream<(A, B), E>
where
    SA: Stream<Item = Result<A, E>> + Send + 'static,
    SB: Stream<Item = Result<B, E>> + Send + 'static,
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    E: Send + 'static,
{
    let left = left.map(|item| item.map(Either::Left)).boxed();
    let right = right.map(|item| item.map(Either::Right)).boxed();
    let merged = stream::select(left, right);

    struct State<S, A, B> {
        merged: S,
        left: Option<A>,
        right: Option<B>,
        failed: bool,
    }

    let state = State {
        merged,
        left: None,
        right: None,
        failed: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.failed {
            return None;
        }
        loop {
            match state.merged.next().await? {
                Ok(Either::Left(value)) => state.left = Some(value),
                Ok(Either::Right(value)) => state.right = Some(value),
                Err(error) => {
                    state.failed = true;
                    return Some((Err(error), state));
                }
            }
            if let (Some(left), Some(right)) = (&state.left, &state.right) {
                let pair = (left.clone(), right.clone());
                return Some((Ok(pair), state));
            }
        }
    })
    .boxed()
}
