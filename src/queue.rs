//! The bounded FIFO of pending jobs.

use std::collections::VecDeque;

use crate::state::JobRecord;

/// A bounded FIFO of [`JobRecord`]s, capacity fixed at construction.
///
/// All mutation happens while the caller holds the enclosing [`crate::state::Shared`]
/// mutex; this type itself does no locking.
#[derive(Debug)]
pub struct WaitingQueue {
    records: VecDeque<JobRecord>,
    capacity: usize,
}

impl WaitingQueue {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    /// Appends `record` to the back of the queue. Returns the record back if
    /// the queue was already full.
    pub fn enqueue(&mut self, record: JobRecord) -> Result<(), JobRecord> {
        if self.is_full() {
            return Err(record);
        }
        self.records.push_back(record);
        Ok(())
    }

    /// Removes and returns the job at the head of the queue.
    ///
    /// # Panics
    /// Panics if the queue is empty; callers must check `is_empty()` (or the
    /// equivalent shared-state predicate) under the same lock first.
    pub fn dequeue_head(&mut self) -> JobRecord {
        self.records
            .pop_front()
            .expect("dequeue_head called on an empty queue")
    }

    /// Removes the first record with the given job ID, preserving the
    /// relative order of the remaining records.
    pub fn remove_by_id(&mut self, job_id: &str) -> Option<JobRecord> {
        let pos = self.records.iter().position(|r| r.job_id == job_id)?;
        self.records.remove(pos)
    }

    /// Returns an ordered snapshot of `(job_id, command)` for every job
    /// currently waiting.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.records
            .iter()
            .map(|r| (r.job_id.clone(), r.command.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::JobRecord;
    use tokio::sync::oneshot;

    fn record(id: &str, cmd: &str) -> JobRecord {
        let (tx, _rx) = oneshot::channel();
        JobRecord {
            job_id: id.to_string(),
            command: cmd.to_string(),
            reply: tx,
        }
    }

    #[test]
    fn enforces_capacity() {
        let mut q = WaitingQueue::new(2);
        assert!(q.enqueue(record("job_1", "a")).is_ok());
        assert!(q.enqueue(record("job_2", "b")).is_ok());
        assert!(q.is_full());
        assert!(q.enqueue(record("job_3", "c")).is_err());
    }

    #[test]
    fn dequeue_is_fifo() {
        let mut q = WaitingQueue::new(3);
        q.enqueue(record("job_1", "a")).unwrap();
        q.enqueue(record("job_2", "b")).unwrap();
        assert_eq!(q.dequeue_head().job_id, "job_1");
        assert_eq!(q.dequeue_head().job_id, "job_2");
        assert!(q.is_empty());
    }

    #[test]
    fn remove_by_id_preserves_survivor_order() {
        let mut q = WaitingQueue::new(4);
        q.enqueue(record("job_1", "a")).unwrap();
        q.enqueue(record("job_2", "b")).unwrap();
        q.enqueue(record("job_3", "c")).unwrap();

        let removed = q.remove_by_id("job_2").unwrap();
        assert_eq!(removed.job_id, "job_2");

        let snapshot = q.snapshot();
        assert_eq!(
            snapshot,
            vec![
                ("job_1".to_string(), "a".to_string()),
                ("job_3".to_string(), "c".to_string()),
            ]
        );
    }

    #[test]
    fn remove_by_id_reports_unknown_ids() {
        let mut q = WaitingQueue::new(2);
        q.enqueue(record("job_1", "a")).unwrap();
        assert!(q.remove_by_id("job_404").is_none());
    }

    #[test]
    fn snapshot_reflects_insertion_order() {
        let mut q = WaitingQueue::new(4);
        q.enqueue(record("job_1", "a")).unwrap();
        q.enqueue(record("job_2", "b")).unwrap();
        q.enqueue(record("job_3", "c")).unwrap();

        assert_eq!(
            q.snapshot(),
            vec![
                ("job_1".to_string(), "a".to_string()),
                ("job_2".to_string(), "b".to_string()),
                ("job_3".to_string(), "c".to_string()),
            ]
        );
    }
}
