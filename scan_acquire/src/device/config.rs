/// Default size of the buffer handed to every device read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096 * 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    // The maximum number of bytes requested from the device per read call.
    pub read_chunk_size: usize,
    // How many data chunks may wait for the consumer before the worker stops reading,
    // `None` for no bound.
    pub max_queued_chunks: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_queued_chunks: Some(256),
        }
    }
}
