/// One step of a streamed reply, as seen by the relay loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text from the remote model.
    Chunk(String),
    /// The remote model finished the reply.
    Done,
    /// The exchange failed; no further events follow.
    Failed(String),
}
