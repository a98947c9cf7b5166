//! Bounded FIFO order queue shared by customers and cooks.
//!
//! Besides capacity-bounded blocking on both ends, the queue knows how many
//! orders the whole run will place and uses the count of taken orders to tell
//! idle cooks when no more work can ever arrive.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::{Order, OrderNumber, OrderRequest};

/// Outcome of [`OrderQueue::take`].
#[derive(Debug, PartialEq, Eq)]
pub enum Take {
    Order(Order),
    /// Every expected order has been taken; the cook should go home.
    EndOfWork,
}

/// Point-in-time view of the queue counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueStats {
    pub len: usize,
    pub capacity: usize,
    pub submitted: u64,
    pub completed: u64,
    pub expected_total: u64,
    /// Largest `len` observed since open.
    pub peak_len: usize,
}

/// Capacity-bounded order queue with a built-in end-of-work oracle.
pub struct OrderQueue {
    inner: Mutex<OrderQueueState>,
    can_add: Condvar,
    can_get: Condvar,
    capacity: usize,
    expected_total: u64,
}

struct OrderQueueState {
    orders: VecDeque<Order>,
    next_number: OrderNumber,
    completed: u64,
    peak_len: usize,
}

impl OrderQueueState {
    fn is_full(&self, capacity: usize) -> bool {
        self.orders.len() >= capacity
    }

    fn submitted(&self) -> u64 {
        self.next_number - 1
    }
}

impl OrderQueue {
    /// Open an empty queue holding at most `capacity` orders, for a run that
    /// will place exactly `expected_total` orders.
    pub fn open(capacity: usize, expected_total: u64) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config("queue capacity must be > 0".to_string()));
        }
        info!("order queue open capacity={capacity} expected_total={expected_total}");
        Ok(Self {
            inner: Mutex::new(OrderQueueState {
                orders: VecDeque::with_capacity(capacity),
                next_number: 1,
                completed: 0,
                peak_len: 0,
            }),
            can_add: Condvar::new(),
            can_get: Condvar::new(),
            capacity,
            expected_total,
        })
    }

    /// Number the order and append it, blocking while the queue is full.
    pub fn submit(&self, request: OrderRequest) -> OrderNumber {
        let mut guard = self.inner.lock().expect("order queue mutex poisoned");
        if guard.is_full(self.capacity) {
            debug!(
                "queue full, customer {} waiting for a slot",
                request.customer_id
            );
        }
        while guard.is_full(self.capacity) {
            // Wait releases the lock and re-acquires it before returning.
            guard = self.can_add.wait(guard).expect("condvar wait failed");
        }

        let number = guard.next_number;
        guard.next_number += 1;
        if number > self.expected_total {
            warn!(
                "order #{number} exceeds expected_total={}; closing will fail",
                self.expected_total
            );
        }
        guard.orders.push_back(Order::accept(request, number));
        guard.peak_len = guard.peak_len.max(guard.orders.len());

        self.can_get.notify_one();
        number
    }

    /// Remove the oldest order, blocking while the queue is empty and more
    /// orders are still expected.
    pub fn take(&self) -> Take {
        let mut guard = self.inner.lock().expect("order queue mutex poisoned");
        loop {
            if let Some(order) = guard.orders.pop_front() {
                guard.completed += 1;
                self.can_add.notify_one();
                if guard.completed == self.expected_total {
                    // The last order is out: wake idle cooks so they can leave.
                    self.can_get.notify_all();
                }
                return Take::Order(order);
            }
            if guard.completed >= self.expected_total {
                self.can_get.notify_all();
                return Take::EndOfWork;
            }
            guard = self.can_get.wait(guard).expect("condvar wait failed");
        }
    }

    /// Check that every expected order was taken.
    pub fn verify_drained(&self) -> Result<()> {
        let guard = self.inner.lock().expect("order queue mutex poisoned");
        if guard.completed == self.expected_total {
            return Ok(());
        }
        Err(Error::Invariant(format!(
            "completed={} expected_total={} submitted={} queued={}",
            guard.completed,
            self.expected_total,
            guard.submitted(),
            guard.orders.len()
        )))
    }

    /// Tear the queue down once every customer and cook has been joined.
    ///
    /// # Panics
    ///
    /// If the number of taken orders differs from `expected_total`. That
    /// means the driver computed the plan wrong or closed early, and the run's
    /// accounting cannot be trusted.
    pub fn close(self) {
        if let Err(err) = self.verify_drained() {
            panic!("closing order queue with outstanding work: {err}");
        }
        let state = self
            .inner
            .into_inner()
            .expect("order queue mutex poisoned");
        info!(
            "order queue closed completed={} peak_len={}",
            state.completed, state.peak_len
        );
    }

    /// Current number of queued orders.
    pub fn len(&self) -> usize {
        let guard = self.inner.lock().expect("order queue mutex poisoned");
        guard.orders.len()
    }

    pub fn stats(&self) -> QueueStats {
        let guard = self.inner.lock().expect("order queue mutex poisoned");
        QueueStats {
            len: guard.orders.len(),
            capacity: self.capacity,
            submitted: guard.submitted(),
            completed: guard.completed,
            expected_total: self.expected_total,
            peak_len: guard.peak_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;
    use std::time::Duration;

    fn request(item: &'static str) -> OrderRequest {
        OrderRequest::new(item, 0)
    }

    fn expect_order(take: Take) -> Order {
        match take {
            Take::Order(order) => order,
            Take::EndOfWork => panic!("expected an order, got end of work"),
        }
    }

    #[test]
    fn open_rejects_zero_capacity() {
        assert!(matches!(OrderQueue::open(0, 3), Err(Error::Config(_))));
    }

    #[test]
    fn orders_come_out_in_submission_order() {
        let queue = OrderQueue::open(10, 5).expect("open");
        let items = ["a", "b", "c", "d", "e"];
        for (idx, &item) in items.iter().enumerate() {
            assert_eq!(queue.submit(request(item)), idx as u64 + 1);
        }
        for (idx, &item) in items.iter().enumerate() {
            let order = expect_order(queue.take());
            assert_eq!(order.item, item);
            assert_eq!(order.number(), idx as u64 + 1);
        }
        assert_eq!(queue.take(), Take::EndOfWork);
        queue.close();
    }

    #[test]
    fn full_queue_blocks_submit_until_take() {
        // Scenario: capacity 2, three orders expected.
        let queue = Arc::new(OrderQueue::open(2, 3).expect("open"));
        assert_eq!(queue.submit(request("a")), 1);
        assert_eq!(queue.submit(request("b")), 2);

        let (ready_tx, ready_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let queue_clone = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            ready_tx.send(()).expect("ready");
            let number = queue_clone.submit(request("c"));
            done_tx.send(number).expect("done");
        });

        ready_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("ready");
        // The third submit must stay parked while the queue is full.
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(queue.len(), 2);

        assert_eq!(expect_order(queue.take()).item, "a");
        let number = done_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("blocked submit should return after a take");
        assert_eq!(number, 3);
        handle.join().expect("customer thread panicked");

        assert_eq!(expect_order(queue.take()).item, "b");
        assert_eq!(expect_order(queue.take()).item, "c");
        assert_eq!(queue.take(), Take::EndOfWork);

        let queue = Arc::try_unwrap(queue).unwrap_or_else(|_| panic!("queue still shared"));
        assert_eq!(queue.stats().peak_len, 2);
        queue.close();
    }

    #[test]
    fn nothing_expected_ends_immediately() {
        let queue = OrderQueue::open(5, 0).expect("open");
        assert_eq!(queue.take(), Take::EndOfWork);
        queue.close();
    }

    #[test]
    fn customers_and_cooks_drain_every_order_once() {
        let customers = 3;
        let orders_each = 2;
        let cooks = 2;
        let queue = Arc::new(OrderQueue::open(2, (customers * orders_each) as u64).expect("open"));
        let seen: Arc<Mutex<HashSet<u64>>> = Arc::new(Mutex::new(HashSet::new()));
        let duplicate = Arc::new(Mutex::new(false));

        let mut handles = Vec::new();
        for customer in 0..customers {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                for _ in 0..orders_each {
                    queue.submit(OrderRequest::new("BensChilli", customer as u64));
                }
            }));
        }
        for _ in 0..cooks {
            let queue = Arc::clone(&queue);
            let seen = Arc::clone(&seen);
            let duplicate = Arc::clone(&duplicate);
            handles.push(thread::spawn(move || {
                while let Take::Order(order) = queue.take() {
                    let mut guard = seen.lock().expect("seen mutex poisoned");
                    if !guard.insert(order.number()) {
                        *duplicate.lock().expect("flag mutex poisoned") = true;
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker thread panicked");
        }

        let guard = seen.lock().expect("seen mutex poisoned");
        assert!(!*duplicate.lock().expect("flag mutex poisoned"));
        let expected: HashSet<u64> = (1..=6).collect();
        assert_eq!(*guard, expected);

        let queue = Arc::try_unwrap(queue).unwrap_or_else(|_| panic!("queue still shared"));
        let stats = queue.stats();
        assert!(stats.peak_len <= stats.capacity);
        assert_eq!(stats.completed, 6);
        queue.close();
    }

    #[test]
    fn idle_cooks_all_see_end_of_work() {
        let cooks = 6;
        let queue = Arc::new(OrderQueue::open(4, 1).expect("open"));
        let barrier = Arc::new(Barrier::new(cooks));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let mut handles = Vec::new();
        for _ in 0..cooks {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            let ready_tx = ready_tx.clone();
            let done_tx = done_tx.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                ready_tx.send(()).expect("ready");
                // Each cook takes once; only one gets the order.
                let got_order = matches!(queue.take(), Take::Order(_));
                done_tx.send(got_order).expect("done");
            }));
        }
        for _ in 0..cooks {
            ready_rx
                .recv_timeout(Duration::from_secs(1))
                .expect("ready recv");
        }

        queue.submit(request("last"));

        let mut orders = 0;
        for _ in 0..cooks {
            let got_order = done_rx
                .recv_timeout(Duration::from_secs(2))
                .expect("cook never woke up");
            if got_order {
                orders += 1;
            }
        }
        assert_eq!(orders, 1);
        for handle in handles {
            handle.join().expect("cook thread panicked");
        }
    }

    #[test]
    fn verify_drained_reports_outstanding_orders() {
        let queue = OrderQueue::open(3, 2).expect("open");
        queue.submit(request("a"));
        let err = queue.verify_drained().expect_err("one order outstanding");
        assert!(matches!(err, Error::Invariant(_)));
        assert!(err.to_string().contains("completed=0 expected_total=2"));
    }

    #[test]
    #[should_panic(expected = "closing order queue with outstanding work")]
    fn close_with_outstanding_orders_panics() {
        let queue = OrderQueue::open(3, 2).expect("open");
        queue.submit(request("a"));
        let _ = queue.take();
        queue.close();
    }

    #[test]
    #[should_panic(expected = "closing order queue with outstanding work")]
    fn over_submitted_plan_ends_work_but_fails_close() {
        let queue = OrderQueue::open(3, 1).expect("open");
        // Submit has no error path; the second order is accepted anyway.
        assert_eq!(queue.submit(request("a")), 1);
        assert_eq!(queue.submit(request("b")), 2);
        assert_eq!(expect_order(queue.take()).item, "a");
        assert_eq!(expect_order(queue.take()).item, "b");
        assert_eq!(queue.take(), Take::EndOfWork);
        assert_eq!(queue.len(), 0);
        queue.close();
    }

    #[test]
    fn stats_track_counters() {
        let queue = OrderQueue::open(3, 3).expect("open");
        queue.submit(request("a"));
        queue.submit(request("b"));
        let _ = queue.take();
        let stats = queue.stats();
        assert_eq!(
            stats,
            QueueStats {
                len: 1,
                capacity: 3,
                submitted: 2,
                completed: 1,
                expected_total: 3,
                peak_len: 2,
            }
        );
    }
}
