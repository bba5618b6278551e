//! 脑区任务调度.
//!
//! 固定数量的工作线程从同一个任务队列 (有序脑区列表上的原子游标) 中取任务,
//! 每个任务的结果写入其专属的一次性结果槽. 调度器在所有线程 join 之后
//! (统计开始前的完整屏障) 按任务顺序读取结果槽, 因此最终结果与线程完成顺序无关.
//!
//! 任一线程都不会修改共享的报告状态. 工作线程之间共享的只有只读的输入、
//! 任务游标与取消标志.

use crate::error::{JaggyError, JaggyResult};
use crate::RegionId;
use std::any::Any;
use std::fmt::{self, Display, Formatter};
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::thread;

/// 工作线程数配置.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Workers {
    /// 可用并行度减 1, 最少为 1.
    #[default]
    Auto,

    /// 固定线程数.
    Fixed(NonZeroUsize),
}

/// 获得可并行核心数.
fn cpus() -> usize {
    thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

impl Workers {
    /// 计算实际线程数. 保证至少为 1.
    pub fn resolve(self) -> NonZeroUsize {
        match self {
            Self::Auto => NonZeroUsize::new(cpus().saturating_sub(1)).unwrap_or(NonZeroUsize::MIN),
            Self::Fixed(n) => n,
        }
    }
}

/// 解析 `AUTO` (不区分大小写) 或不小于 1 的整数.
impl FromStr for Workers {
    type Err = JaggyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<NonZeroUsize>()
            .map(Self::Fixed)
            .map_err(|_| JaggyError::InvalidWorkers(s.to_string()))
    }
}

impl Display for Workers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("AUTO"),
            Self::Fixed(n) => write!(f, "{n}"),
        }
    }
}

/// 单个脑区任务失败时的处理策略.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// 第一次失败即设置取消标志, 尚未开始的任务被丢弃,
    /// 最终返回 `Err(JaggyError::WorkerFailure)`, 不产生报告.
    #[default]
    FailFast,

    /// 跳过失败的脑区并继续. 失败的脑区不进入统计,
    /// 而是以 [`RegionFailure`] 的形式显式记录.
    SkipAndRecord,
}

/// 被跳过的脑区及失败原因.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionFailure {
    /// 脑区编号.
    pub id: RegionId,

    /// 失败原因.
    pub reason: String,
}

/// 调度结果.
#[derive(Debug)]
pub struct ScheduleOutcome<T> {
    /// 成功任务的 (脑区, 结果), 按任务顺序排列.
    pub done: Vec<(RegionId, T)>,

    /// 失败的脑区 (仅 [`FailurePolicy::SkipAndRecord`] 下非空), 按任务顺序排列.
    pub failures: Vec<RegionFailure>,
}

/// 从 panic payload 中提取信息.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// 固定大小的工作线程池调度器.
#[derive(Copy, Clone, Debug)]
pub struct WorkScheduler {
    workers: NonZeroUsize,
    policy: FailurePolicy,
}

impl WorkScheduler {
    /// 创建调度器. `workers` 在此时被解析为实际线程数.
    pub fn new(workers: Workers, policy: FailurePolicy) -> Self {
        Self {
            workers: workers.resolve(),
            policy,
        }
    }

    /// 实际线程数.
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// 失败处理策略.
    #[inline]
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// 对 `ids` 中的每个脑区运行一次 `task`, 阻塞直到全部任务结束或被取消.
    ///
    /// `task` 返回的错误以及 `task` 中的 panic 都被视为该脑区的失败,
    /// 按 [`FailurePolicy`] 处理. 取消标志在每个任务出队前检查;
    /// 已经开始的任务不会被中断.
    pub fn run<T, F>(&self, ids: &[RegionId], task: F) -> JaggyResult<ScheduleOutcome<T>>
    where
        T: Send + Sync,
        F: Fn(RegionId) -> JaggyResult<T> + Sync,
    {
        let slots: Vec<OnceLock<Result<T, String>>> = ids.iter().map(|_| OnceLock::new()).collect();
        let cursor = AtomicUsize::new(0);
        let cancelled = AtomicBool::new(false);
        let n = self.workers().min(ids.len()).max(1);

        log::info!("processing {} region(s) on {n} worker(s)", ids.len());
        thread::scope(|s| {
            for _ in 0..n {
                s.spawn(|| loop {
                    if cancelled.load(Ordering::Acquire) {
                        break;
                    }
                    let i = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(&id) = ids.get(i) else {
                        break;
                    };

                    let r = panic::catch_unwind(AssertUnwindSafe(|| task(id)))
                        .map_err(|p| panic_message(p.as_ref()))
                        .and_then(|r| r.map_err(|e| e.to_string()));
                    if r.is_err() && self.policy == FailurePolicy::FailFast {
                        cancelled.store(true, Ordering::Release);
                    }
                    // 每个下标只会被一个线程取到, 结果槽不会被重复写入.
                    let _ = slots[i].set(r);
                });
            }
        });

        let mut done = Vec::with_capacity(ids.len());
        let mut failures = vec![];
        let mut skipped = 0usize;
        for (slot, &id) in slots.into_iter().zip(ids) {
            match slot.into_inner() {
                Some(Ok(v)) => done.push((id, v)),
                Some(Err(reason)) => failures.push(RegionFailure { id, reason }),
                None => skipped += 1,
            }
        }

        if self.policy == FailurePolicy::FailFast {
            if let Some(first) = failures.first() {
                log::info!("cancelled {skipped} queued region(s) after failure");
                return Err(JaggyError::WorkerFailure {
                    id: first.id,
                    failed: failures.len(),
                    reason: first.reason.clone(),
                });
            }
        }
        for f in failures.iter() {
            log::warn!("skipped region {}: {}", f.id, f.reason);
        }
        Ok(ScheduleOutcome { done, failures })
    }
}

#[cfg(test)]
mod tests {
    use super::{FailurePolicy, RegionFailure, WorkScheduler, Workers};
    use crate::{JaggyError, RegionId};
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ids(n: u32) -> Vec<RegionId> {
        (1..=n).map(|r| RegionId::new(r).unwrap()).collect()
    }

    fn fixed(n: usize) -> Workers {
        Workers::Fixed(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn test_workers_parse() {
        assert_eq!("AUTO".parse::<Workers>().unwrap(), Workers::Auto);
        assert_eq!("auto".parse::<Workers>().unwrap(), Workers::Auto);
        assert_eq!("4".parse::<Workers>().unwrap(), fixed(4));
        for bad in ["0", "-1", "many", ""] {
            assert!(matches!(
                bad.parse::<Workers>(),
                Err(JaggyError::InvalidWorkers(_))
            ));
        }
        assert_eq!(fixed(3).to_string(), "3");
        assert_eq!(Workers::Auto.to_string(), "AUTO");
    }

    #[test]
    fn test_workers_resolve() {
        assert!(Workers::Auto.resolve().get() >= 1);
        assert_eq!(fixed(7).resolve().get(), 7);
    }

    #[test]
    fn test_run_keeps_task_order() {
        for w in [1, 2, 8] {
            let sched = WorkScheduler::new(fixed(w), FailurePolicy::FailFast);
            let out = sched.run(&ids(20), |id| Ok(id.get() * 10)).unwrap();
            assert!(out.failures.is_empty());
            let expected: Vec<_> = ids(20).into_iter().map(|id| (id, id.get() * 10)).collect();
            assert_eq!(out.done, expected);
        }
    }

    #[test]
    fn test_run_empty() {
        let sched = WorkScheduler::new(fixed(4), FailurePolicy::FailFast);
        let out = sched.run(&[], |id| Ok(id.get())).unwrap();
        assert!(out.done.is_empty());
    }

    #[test]
    fn test_fail_fast_cancels_queue() {
        let executed = AtomicUsize::new(0);
        let sched = WorkScheduler::new(fixed(1), FailurePolicy::FailFast);
        let err = sched
            .run(&ids(10), |id| {
                executed.fetch_add(1, Ordering::SeqCst);
                if id.get() == 3 {
                    Err(JaggyError::InvalidAxis(9))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        // 单线程: 第 3 个任务失败后其余任务不再执行.
        assert_eq!(executed.load(Ordering::SeqCst), 3);
        match err {
            JaggyError::WorkerFailure { id, failed, .. } => {
                assert_eq!(id.get(), 3);
                assert_eq!(failed, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fail_fast_on_panic() {
        let sched = WorkScheduler::new(fixed(3), FailurePolicy::FailFast);
        let err = sched
            .run(&ids(6), |id| {
                if id.get() == 2 {
                    panic!("boom");
                }
                Ok(id.get())
            })
            .unwrap_err();
        match err {
            JaggyError::WorkerFailure { id, reason, .. } => {
                assert_eq!(id.get(), 2);
                assert!(reason.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skip_and_record() {
        let sched = WorkScheduler::new(fixed(4), FailurePolicy::SkipAndRecord);
        let out = sched
            .run(&ids(8), |id| {
                if id.get() % 4 == 0 {
                    panic!("region {id} exploded");
                }
                Ok(id.get())
            })
            .unwrap();
        assert_eq!(
            out.done.iter().map(|(id, _)| id.get()).collect::<Vec<_>>(),
            vec![1, 2, 3, 5, 6, 7]
        );
        assert_eq!(out.failures.len(), 2);
        assert_eq!(
            out.failures[0],
            RegionFailure {
                id: RegionId::new(4).unwrap(),
                reason: "panicked: region 4 exploded".to_string(),
            }
        );
        assert_eq!(out.failures[1].id.get(), 8);
    }
}
