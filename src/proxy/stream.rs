//! Fixed-size re-chunking of upstream body streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::Stream;

/// Upstream bodies are relayed to the client in chunks of this size.
pub const STREAM_CHUNK_BYTES: usize = 16 * 1024;

/// Stream adapter that re-buffers an inner byte stream into fixed-size
/// chunks. Only the final chunk may be short. Chunking is transparent: the
/// concatenated output is byte-identical to the input.
pub struct FixedChunks<S> {
    inner: S,
    buffer: BytesMut,
    chunk_size: usize,
    upstream_done: bool,
}

impl<S> FixedChunks<S> {
    /// Wrap a byte stream, emitting `chunk_size`-byte chunks.
    pub fn new(inner: S, chunk_size: usize) -> Self {
        debug_assert!(chunk_size > 0);
        Self {
            inner,
            buffer: BytesMut::new(),
            chunk_size,
            upstream_done: false,
        }
    }
}

impl<S, E> Stream for FixedChunks<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.buffer.len() >= this.chunk_size {
                return Poll::Ready(Some(Ok(this.buffer.split_to(this.chunk_size).freeze())));
            }
            if this.upstream_done {
                if this.buffer.is_empty() {
                    return Poll::Ready(None);
                }
                return Poll::Ready(Some(Ok(this.buffer.split().freeze())));
            }
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => this.buffer.extend_from_slice(&chunk),
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Some(Err(err))),
                Poll::Ready(None) => this.upstream_done = true,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{stream, StreamExt};
    use std::convert::Infallible;

    async fn collect_chunks(
        input: Vec<Bytes>,
        chunk_size: usize,
    ) -> Vec<Bytes> {
        let inner = stream::iter(input.into_iter().map(Ok::<_, Infallible>));
        FixedChunks::new(inner, chunk_size)
            .map(|chunk| chunk.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn rechunks_into_fixed_sizes() {
        let input = vec![
            Bytes::from(vec![1u8; 10]),
            Bytes::from(vec![2u8; 10]),
            Bytes::from(vec![3u8; 10]),
        ];
        let chunks = collect_chunks(input, 8).await;
        let sizes: Vec<usize> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![8, 8, 8, 6]);
    }

    #[tokio::test]
    async fn output_bytes_match_input_for_any_layout() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        for split in [1usize, 7, 1024, 16 * 1024, 40_000] {
            let input: Vec<Bytes> = payload
                .chunks(split)
                .map(|piece| Bytes::copy_from_slice(piece))
                .collect();
            let chunks = collect_chunks(input, STREAM_CHUNK_BYTES).await;
            let rejoined: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
            assert_eq!(rejoined, payload, "split size {split} corrupted the body");
            for chunk in &chunks[..chunks.len() - 1] {
                assert_eq!(chunk.len(), STREAM_CHUNK_BYTES);
            }
        }
    }

    #[tokio::test]
    async fn empty_stream_yields_nothing() {
        let chunks = collect_chunks(Vec::new(), STREAM_CHUNK_BYTES).await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let inner = stream::iter(vec![
            Ok(Bytes::from_static(b"data")),
            Err("upstream reset"),
        ]);
        let mut chunked = FixedChunks::new(inner, 2);
        assert_eq!(chunked.next().await.unwrap().unwrap(), "da");
        assert_eq!(chunked.next().await.unwrap().unwrap(), "ta");
        assert!(chunked.next().await.unwrap().is_err());
    }
}
