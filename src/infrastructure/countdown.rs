//! 倒计时器 - 基础设施层
//!
//! 持有一个 tokio 定时任务，只暴露"按周期回调"能力，不关心考试状态

use std::ops::ControlFlow;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// 周期回调任务
///
/// - 第一次回调发生在 `period` 之后
/// - 回调返回 `Break` 时任务结束
/// - `cancel()` 或 drop 时立即中止任务
#[derive(Debug)]
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// 启动定时任务（需要在 tokio 运行时中调用）
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });

        Self { handle }
    }

    /// 任务是否已经结束
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 中止任务
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
