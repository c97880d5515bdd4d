//! Playback runner - the timer loop around a render cycle.
//!
//! Each iteration waits one period on the context clock, renders one frame
//! and hands it to every sink before the next wait starts. A slow query or
//! sink simply delays the next tick; nothing overlaps.

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use devview_core::{
    FrameSink, PlaybackError, RenderCycle, SampleStore, SinkError, Timestamp,
};
use devview_env::PlaybackContext;
use tracing::{debug, info};

/// Outcome of a finished playback session.
#[derive(Debug, Clone)]
pub struct PlaybackSummary {
    /// Frames rendered and delivered
    pub ticks: u64,

    /// Clock label of the last frame (the start time if no tick ran)
    pub last_time: Timestamp,

    /// Whether a sink closed the session (e.g. dashboard quit)
    pub stopped_by_sink: bool,

    /// Context time spent in the loop
    pub elapsed: Duration,
}

/// Drives a [`RenderCycle`] from the context clock.
pub struct PlaybackRunner<Ctx, S> {
    ctx: Arc<Ctx>,
    cycle: RenderCycle<S>,
    period: Duration,
    max_ticks: Option<u64>,
    sinks: Vec<Box<dyn FrameSink + Send>>,
}

impl<Ctx, S> PlaybackRunner<Ctx, S>
where
    Ctx: PlaybackContext,
    S: SampleStore + Send,
{
    pub fn new(ctx: Arc<Ctx>, cycle: RenderCycle<S>, period: Duration) -> Self {
        Self {
            ctx,
            cycle,
            period,
            max_ticks: None,
            sinks: Vec::new(),
        }
    }

    /// Stop after `ticks` frames instead of running until a sink closes.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn with_sink(mut self, sink: impl FrameSink + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Run until the tick limit is reached or a sink disconnects.
    ///
    /// Store and sink failures end the session with an error.
    pub async fn run(&mut self) -> Result<PlaybackSummary, PlaybackError> {
        let started = self.ctx.now();
        let mut ticks = 0u64;
        let mut stopped_by_sink = false;
        let wall_clock_s = self
            .ctx
            .system_time()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());

        info!(
            start = %self.cycle.current(),
            wall_clock_s,
            period_ms = self.period.as_millis() as u64,
            max_ticks = ?self.max_ticks,
            "playback started"
        );

        while self.max_ticks.map_or(true, |max| ticks < max) {
            self.ctx.sleep(self.period).await;

            let frame = self.cycle.tick(ticks)?;
            ticks += 1;

            match present_all(&mut self.sinks, &frame) {
                Ok(()) => {}
                Err(SinkError::Disconnected) => {
                    info!(tick = frame.tick, "frame receiver closed, stopping playback");
                    stopped_by_sink = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }
            debug!(tick = frame.tick, time = %frame.time, "tick complete");
        }

        let summary = PlaybackSummary {
            ticks,
            last_time: *self.cycle.current(),
            stopped_by_sink,
            elapsed: self.ctx.now().saturating_sub(started),
        };
        info!(
            ticks = summary.ticks,
            last_time = %summary.last_time,
            "playback finished"
        );
        Ok(summary)
    }
}

fn present_all(
    sinks: &mut [Box<dyn FrameSink + Send>],
    frame: &devview_core::RenderFrame,
) -> Result<(), SinkError> {
    for sink in sinks.iter_mut() {
        sink.present(frame)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VirtualContext;
    use devview_core::{ingest_csv, PlaybackConfig, RenderFrame, SqliteStore, StoreError};
    use proptest::prelude::*;
    use std::sync::Mutex;

    const CSV: &str = "\
device_id,x_pos,y_pos,z_pos,device_type,time
d1,1.0,2.0,3.0,drone,2024-01-01 00:00:00
d1,1.1,2.0,3.0,drone,2024-01-01 00:00:01
d2,4.0,5.0,6.0,tag,2024-01-01 00:00:01
d1,1.2,2.0,3.0,drone,2024-01-01 00:00:02
d1,1.3,2.0,3.0,drone,2024-01-01 00:00:03
";

    fn cycle() -> RenderCycle<SqliteStore> {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        ingest_csv(&mut store, CSV.as_bytes()).unwrap();
        RenderCycle::new(store, &PlaybackConfig::default()).unwrap()
    }

    fn runner_on(
        ctx: Arc<VirtualContext>,
        period_ms: u64,
    ) -> PlaybackRunner<VirtualContext, SqliteStore> {
        PlaybackRunner::new(ctx, cycle(), Duration::from_millis(period_ms))
    }

    /// Records every frame it is shown.
    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<RenderFrame>>>);

    impl FrameSink for Recorder {
        fn present(&mut self, frame: &RenderFrame) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    /// Accepts `limit` frames, then reports the receiver gone.
    struct ClosesAfter {
        limit: usize,
        seen: usize,
    }

    impl FrameSink for ClosesAfter {
        fn present(&mut self, _frame: &RenderFrame) -> Result<(), SinkError> {
            if self.seen == self.limit {
                return Err(SinkError::Disconnected);
            }
            self.seen += 1;
            Ok(())
        }
    }

    struct Broken;

    impl FrameSink for Broken {
        fn present(&mut self, _frame: &RenderFrame) -> Result<(), SinkError> {
            Err(SinkError::Visualization("viewer crashed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_runs_requested_ticks_on_virtual_clock() {
        let ctx = VirtualContext::shared();
        let recorder = Recorder::default();
        let mut runner = runner_on(ctx.clone(), 1000)
            .with_max_ticks(5)
            .with_sink(recorder.clone());

        let summary = runner.run().await.unwrap();

        assert_eq!(summary.ticks, 5);
        assert!(!summary.stopped_by_sink);
        assert_eq!(summary.elapsed, Duration::from_secs(5));
        assert_eq!(ctx.now(), Duration::from_secs(5));

        let frames = recorder.0.lock().unwrap();
        let times: Vec<String> = frames.iter().map(|f| f.time.to_string()).collect();
        // 00:00:03 is the last recorded second, so the clock wraps before it
        assert_eq!(
            times,
            [
                "2024-01-01 00:00:01",
                "2024-01-01 00:00:02",
                "2024-01-01 00:00:00",
                "2024-01-01 00:00:01",
                "2024-01-01 00:00:02",
            ]
        );
        assert_eq!(frames.iter().map(|f| f.tick).collect::<Vec<_>>(), [0, 1, 2, 3, 4]);
        assert_eq!(frames[0].scatter.series.len(), 2);
        assert_eq!(summary.last_time.to_string(), "2024-01-01 00:00:02");
    }

    #[tokio::test]
    async fn test_every_sink_sees_every_frame() {
        let first = Recorder::default();
        let second = Recorder::default();
        let mut runner = runner_on(VirtualContext::shared(), 10)
            .with_max_ticks(3)
            .with_sink(first.clone())
            .with_sink(second.clone());

        runner.run().await.unwrap();
        assert_eq!(*first.0.lock().unwrap(), *second.0.lock().unwrap());
        assert_eq!(first.0.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_disconnected_sink_stops_cleanly() {
        let mut runner = runner_on(VirtualContext::shared(), 1000)
            .with_sink(ClosesAfter { limit: 2, seen: 0 });

        let summary = runner.run().await.unwrap();
        assert!(summary.stopped_by_sink);
        assert_eq!(summary.ticks, 3);
    }

    #[tokio::test]
    async fn test_sink_failure_is_fatal() {
        let mut runner = runner_on(VirtualContext::shared(), 1000)
            .with_max_ticks(10)
            .with_sink(Broken);

        let result = runner.run().await;
        assert!(matches!(result, Err(PlaybackError::Sink(SinkError::Visualization(_)))));
    }

    #[tokio::test]
    async fn test_zero_ticks_renders_nothing() {
        let recorder = Recorder::default();
        let mut runner = runner_on(VirtualContext::shared(), 1000)
            .with_max_ticks(0)
            .with_sink(recorder.clone());

        let summary = runner.run().await.unwrap();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.last_time.to_string(), "2024-01-01 00:00:00");
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_store_fails_before_playback() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        let result = RenderCycle::new(store, &PlaybackConfig::default());
        assert!(matches!(result, Err(StoreError::EmptyTimeline)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_virtual_time_is_ticks_times_period(ticks in 0u64..50, period_ms in 1u64..5000) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let ctx = VirtualContext::shared();
            let mut runner = runner_on(ctx.clone(), period_ms)
                .with_max_ticks(ticks);

            let summary = rt.block_on(runner.run()).unwrap();
            prop_assert_eq!(summary.ticks, ticks);
            prop_assert_eq!(ctx.now(), Duration::from_millis(period_ms * ticks));
        }
    }
}
