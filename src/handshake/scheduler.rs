use std::cell::{Cell, RefCell};
use std::time::Duration;

/// 予約済みタイマーを識別するハンドル。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u32);

/// 一度だけ発火するタイマーの予約・取り消しを行うインターフェース。
/// ブラウザでは `setTimeout`、テストでは仮想時計で実装する。
///
/// 実装は、コールバックを呼ぶ前に自身の借用を解放しなければならない。
/// コールバックの中から `cancel` が呼ばれることがある。
pub trait Scheduler {
    /// 予約に失敗した場合は None を返す。
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Option<TimerHandle>;

    /// 発火済み、または取り消し済みのハンドルを渡しても何もしない。
    fn cancel(&self, handle: TimerHandle);
}

struct PendingTimer {
    handle: TimerHandle,
    due: Duration,
    callback: Box<dyn FnOnce()>,
}

/// 手動で進める仮想時計。`advance` で期限を迎えたタイマーを期限順に発火させる。
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_id: Cell<u32>,
    pending: RefCell<Vec<PendingTimer>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// 時計を `by` だけ進め、発火したタイマーの数を返す。
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut fired = 0;
        loop {
            // 借用を解放してから発火させる
            let next = {
                let mut pending = self.pending.borrow_mut();
                let index = pending
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.handle.0))
                    .map(|(i, _)| i);
                index.map(|i| pending.remove(i))
            };
            let Some(timer) = next else {
                break;
            };
            self.now.set(timer.due);
            (timer.callback)();
            fired += 1;
        }
        self.now.set(target);
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Option<TimerHandle> {
        let handle = TimerHandle(self.next_id.get());
        self.next_id.set(handle.0 + 1);
        self.pending.borrow_mut().push(PendingTimer {
            handle,
            due: self.now.get() + delay,
            callback,
        });
        Some(handle)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.pending.borrow_mut().retain(|t| t.handle != handle);
    }
}
