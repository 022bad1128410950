//! Typed views over a stream of completion chunks.
//!
//! A streamed reply arrives as [`ChatCompletionChunk`]s, most of which carry a
//! little text and some of which carry only metadata. [`fragments`] classifies
//! each chunk as a [`Fragment`]; [`accumulate_text`] drives the stream to the
//! end, hands every text delta to a callback as it arrives, and returns the
//! joined reply.

use futures::future;
use futures::stream::{Stream, StreamExt, TryStreamExt};

use crate::observability::STREAM_TEXT_FRAGMENTS;
use crate::{ChatCompletionChunk, Error, Fragment, Result};

/// Map each chunk of `chunks` to its [`Fragment`].
pub fn fragments<S>(chunks: S) -> impl Stream<Item = Result<Fragment>>
where
    S: Stream<Item = Result<ChatCompletionChunk>>,
{
    chunks.map_ok(Fragment::from)
}

/// Keep only the text deltas of `chunks`, in arrival order.
pub fn text_deltas<S>(chunks: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = Result<ChatCompletionChunk>>,
{
    fragments(chunks)
        .try_filter_map(|fragment| future::ready(Ok::<_, Error>(fragment.into_text())))
}

/// Drain `chunks`, calling `on_text` with each text delta as soon as it is
/// decoded, and return the concatenation of all deltas.
///
/// The first error ends consumption and is returned; text already passed to
/// `on_text` is not retracted.
pub async fn accumulate_text<S, F>(chunks: S, mut on_text: F) -> Result<String>
where
    S: Stream<Item = Result<ChatCompletionChunk>>,
    F: FnMut(&str),
{
    let deltas = text_deltas(chunks);
    futures::pin_mut!(deltas);

    let mut reply = Vec::new();
    while let Some(delta) = deltas.next().await {
        let delta = delta?;
        STREAM_TEXT_FRAGMENTS.click();
        on_text(&delta);
        reply.push(delta);
    }
    Ok(reply.concat())
}
