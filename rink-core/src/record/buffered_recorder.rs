use super::{AggregateRecorder, Record, RecordStorage, Recorder};

/// Buffered recorder.
///
/// Written records are kept in memory. Stored records are aggregated with
/// [`RecordStorage`] on [`AggregateRecorder::flush`] and the aggregate, tagged with
/// the given step as `"episode"`, is kept as a written record.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    storage: RecordStorage,
    n_stored: usize,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the written records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// The number of written records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// If no record has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The number of records passed to [`AggregateRecorder::store`] so far.
    pub fn n_stored(&self) -> usize {
        self.n_stored
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.n_stored += 1;
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let mut record = self.storage.aggregate();
        if !record.is_empty() {
            record.insert("episode", super::RecordValue::Scalar(step as f32));
            self.buf.push(record);
        }
    }
}
