//! 后台布局会话：交互调用方的配置变更接连不断，
//! 这里负责合并抖动、取消被取代的布局、只交付最新结果。
//!
//! 语义：同一画布同一时刻至多一个在跑的布局；新请求到来时
//! 旧布局被协作式取消并重启，两次布局绝不会交错修改同一份
//! 四叉树。被取代的布局不交付任何结果。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, error};

use crate::config::{Canvas, LayoutConfig, Word};
use crate::engine::{CancelFlag, LayoutEngine, LayoutResult};
use crate::raster::{BoxRasterizer, GlyphRasterizer};
use crate::Error;

/// 静默窗口：这段时间内的连续请求合并成一次布局
const QUIESCENCE: Duration = Duration::from_millis(100);

/// 一次完成的布局交付，带请求代号方便调用方识别新旧
#[derive(Debug)]
pub struct LayoutOutcome {
    pub generation: u64,
    pub result: LayoutResult,
}

struct Request {
    generation: u64,
    words: Vec<Word>,
    config: LayoutConfig,
    canvas: Canvas,
    seed: Option<u64>,
}

enum Msg {
    Run(Request),
    Shutdown,
}

pub struct LayoutSession {
    tx: Sender<Msg>,
    results: Receiver<LayoutOutcome>,
    latest: Arc<AtomicU64>,
    in_flight: Arc<Mutex<Option<CancelFlag>>>,
    worker: Option<JoinHandle<()>>,
}

impl LayoutSession {
    /// 默认的保守矩形后端
    pub fn new() -> Self {
        Self::spawn(Arc::new(BoxRasterizer::new()))
    }

    pub fn spawn(rasterizer: Arc<dyn GlyphRasterizer>) -> Self {
        let (tx, rx) = mpsc::channel::<Msg>();
        let (result_tx, results) = mpsc::channel::<LayoutOutcome>();
        let latest = Arc::new(AtomicU64::new(0));
        let in_flight = Arc::new(Mutex::new(None::<CancelFlag>));

        let worker_latest = Arc::clone(&latest);
        let worker_flag = Arc::clone(&in_flight);
        let worker = std::thread::spawn(move || {
            worker_loop(rx, result_tx, rasterizer, worker_latest, worker_flag);
        });

        Self {
            tx,
            results,
            latest,
            in_flight,
            worker: Some(worker),
        }
    }

    /// 提交一次布局请求，取代任何未完成的旧请求
    ///
    /// 配置在这里就校验，非法配置立即失败、不进队列。
    pub fn request(
        &self,
        words: Vec<Word>,
        config: LayoutConfig,
        canvas: Canvas,
        seed: Option<u64>,
    ) -> Result<u64, Error> {
        config.validate()?;
        canvas.validate()?;

        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        // 在跑的布局立即作废
        if let Ok(guard) = self.in_flight.lock() {
            if let Some(flag) = guard.as_ref() {
                flag.cancel();
            }
        }

        self.tx
            .send(Msg::Run(Request {
                generation,
                words,
                config,
                canvas,
                seed,
            }))
            .map_err(|_| Error::Config("Layout session worker is gone".into()))?;
        Ok(generation)
    }

    /// 不阻塞地取走当前最新的交付，没有则返回 None
    pub fn try_latest(&self) -> Option<LayoutOutcome> {
        let mut newest = None;
        while let Ok(outcome) = self.results.try_recv() {
            newest = Some(outcome);
        }
        newest
    }

    /// 阻塞等待下一次交付，然后清空积压、只留最新
    pub fn recv_latest(&self) -> Option<LayoutOutcome> {
        let mut newest = self.results.recv().ok()?;
        while let Ok(outcome) = self.results.try_recv() {
            newest = outcome;
        }
        Some(newest)
    }
}

impl Default for LayoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LayoutSession {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    rx: Receiver<Msg>,
    result_tx: Sender<LayoutOutcome>,
    rasterizer: Arc<dyn GlyphRasterizer>,
    latest: Arc<AtomicU64>,
    in_flight: Arc<Mutex<Option<CancelFlag>>>,
) {
    loop {
        let mut request = match rx.recv() {
            Ok(Msg::Run(request)) => request,
            Ok(Msg::Shutdown) | Err(_) => return,
        };

        // 静默窗口内后到的请求直接顶掉前面的
        loop {
            match rx.recv_timeout(QUIESCENCE) {
                Ok(Msg::Run(newer)) => request = newer,
                Ok(Msg::Shutdown) => return,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        let cancel = CancelFlag::new();
        if let Ok(mut guard) = in_flight.lock() {
            *guard = Some(cancel.clone());
        }

        let engine = match LayoutEngine::new(request.config, request.canvas) {
            Ok(engine) => match request.seed {
                Some(seed) => engine.rasterizer(Arc::clone(&rasterizer)).seed(seed),
                None => engine.rasterizer(Arc::clone(&rasterizer)),
            },
            // request() 已校验过，这里兜底
            Err(e) => {
                error!("layout request {} invalid: {e}", request.generation);
                continue;
            }
        };

        match engine.layout_with_cancel(&request.words, &cancel) {
            Ok(result) => {
                // 结果出炉时已有更新的请求 -> 本次作废，不交付
                if latest.load(Ordering::SeqCst) != request.generation {
                    debug!("discarding stale layout generation {}", request.generation);
                    continue;
                }
                if result_tx
                    .send(LayoutOutcome {
                        generation: request.generation,
                        result,
                    })
                    .is_err()
                {
                    return;
                }
            }
            Err(Error::Cancelled) => {
                debug!("layout generation {} cancelled", request.generation);
            }
            Err(e) => {
                error!("layout generation {} failed: {e}", request.generation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_words() -> Vec<Word> {
        vec![
            Word::new("alpha", 30.0),
            Word::new("beta", 20.0),
            Word::new("gamma", 10.0),
        ]
    }

    #[test]
    fn delivers_result_for_single_request() {
        let session = LayoutSession::new();
        let generation = session
            .request(small_words(), LayoutConfig::default(), Canvas::default(), Some(1))
            .unwrap();

        let outcome = session.recv_latest().expect("worker delivered nothing");
        assert_eq!(outcome.generation, generation);
        assert_eq!(
            outcome.result.words.len() + outcome.result.dropped_count,
            3
        );
    }

    #[test]
    fn rapid_requests_coalesce_to_newest() {
        let session = LayoutSession::new();
        for _ in 0..5 {
            session
                .request(small_words(), LayoutConfig::default(), Canvas::default(), Some(1))
                .unwrap();
        }
        let last = session
            .request(vec![Word::new("final", 1.0)], LayoutConfig::default(), Canvas::default(), Some(1))
            .unwrap();

        let outcome = session.recv_latest().expect("worker delivered nothing");
        assert_eq!(outcome.generation, last);
        assert_eq!(outcome.result.words.len(), 1);
        assert_eq!(outcome.result.words[0].text, "final");
    }

    #[test]
    fn invalid_config_fails_fast_at_request() {
        let session = LayoutSession::new();
        let bad = LayoutConfig::new().font_size_range(80.0, 20.0);
        assert!(session
            .request(small_words(), bad, Canvas::default(), None)
            .is_err());
    }
}
