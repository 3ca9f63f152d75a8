// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Replay host — plays a fixed sequence of images as preview frames and serves
// a prepared still. Drives the full pipeline without a camera.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use docscan_capture::{Frame, FrameSource, HostEnvironment, StillReceiver};
use docscan_core::OsVersion;
use docscan_core::error::{Result, ScanError};
use image::GrayImage;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

const DEFAULT_INTERVAL: Duration = Duration::from_millis(33);

/// Host whose camera is a recorded frame sequence.
#[derive(Debug, Clone)]
pub struct ReplayHost {
    version: OsVersion,
    frames: Vec<GrayImage>,
    still: Option<Vec<u8>>,
    interval: Duration,
}

impl ReplayHost {
    pub fn new(frames: Vec<GrayImage>) -> Self {
        Self {
            version: OsVersion::SEGMENTATION,
            frames,
            still: None,
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_os_version(mut self, version: OsVersion) -> Self {
        self.version = version;
        self
    }

    /// Encoded image returned for the still capture.
    pub fn with_still(mut self, still: Vec<u8>) -> Self {
        self.still = Some(still);
        self
    }

    /// Delay between preview frames.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl HostEnvironment for ReplayHost {
    fn os_version(&self) -> OsVersion {
        self.version
    }

    fn has_host_view(&self) -> bool {
        true
    }

    fn open_frame_source(&self, frame_buffer: usize) -> Result<Box<dyn FrameSource>> {
        if self.frames.is_empty() {
            return Err(ScanError::CameraUnavailable("no frames to replay".into()));
        }
        info!(
            frames = self.frames.len(),
            interval_ms = self.interval.as_millis() as u64,
            "replay source opened"
        );
        Ok(Box::new(ReplayFrameSource::new(
            self.frames.clone(),
            self.still.clone(),
            self.interval,
            frame_buffer,
        )))
    }
}

/// Frame source that emits each image once, at a fixed interval, then closes.
///
/// Frames that arrive while the channel is full are dropped, the same as a
/// live camera whose consumer is still busy.
pub struct ReplayFrameSource {
    frames: Vec<GrayImage>,
    still: Option<Vec<u8>>,
    interval: Duration,
    buffer: usize,
    stopped: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl ReplayFrameSource {
    pub fn new(
        frames: Vec<GrayImage>,
        still: Option<Vec<u8>>,
        interval: Duration,
        buffer: usize,
    ) -> Self {
        Self {
            frames,
            still,
            // A zero period would make the ticker panic.
            interval: interval.max(Duration::from_millis(1)),
            buffer: buffer.max(1),
            stopped: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }
}

impl FrameSource for ReplayFrameSource {
    fn start(&mut self) -> Result<mpsc::Receiver<Frame>> {
        if self.task.is_some() {
            return Err(ScanError::CameraUnavailable("replay already started".into()));
        }
        let runtime = Handle::try_current()
            .map_err(|_| ScanError::CameraUnavailable("replay needs a Tokio runtime".into()))?;

        let (tx, rx) = mpsc::channel(self.buffer);
        let frames = std::mem::take(&mut self.frames);
        let stopped = Arc::clone(&self.stopped);
        let interval = self.interval;

        self.task = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            for (sequence, luma) in frames.into_iter().enumerate() {
                ticker.tick().await;
                if stopped.load(Ordering::Acquire) {
                    break;
                }
                let sequence = sequence as u64;
                match tx.try_send(Frame { sequence, luma }) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => trace!(sequence, "consumer busy; frame dropped"),
                    Err(TrySendError::Closed(_)) => break,
                }
            }
            debug!("replay finished");
        }));
        Ok(rx)
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn capture_still(&mut self) -> StillReceiver {
        let (tx, rx) = oneshot::channel();
        let still = self
            .still
            .clone()
            .ok_or_else(|| ScanError::Capture("replay has no still image".into()));
        let _ = tx.send(still);
        rx
    }
}

impl Drop for ReplayFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_capture::Scanner;
    use docscan_core::{CaptureReason, ScannerConfig};
    use docscan_vision::encode::encode_jpeg;
    use image::{DynamicImage, Luma};

    fn page(width: u32, height: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(width, height, Luma([30u8]));
        for y in 60..440 {
            for x in 50..350 {
                img.put_pixel(x, y, Luma([235u8]));
            }
        }
        img
    }

    fn blank() -> GrayImage {
        GrayImage::from_pixel(8, 8, Luma([128u8]))
    }

    #[tokio::test]
    async fn frames_arrive_in_order_then_close() {
        let frames = vec![blank(), blank(), blank()];
        let mut source = ReplayFrameSource::new(frames, None, Duration::from_millis(1), 8);
        let mut rx = source.start().unwrap();

        let mut seen = Vec::new();
        while let Some(frame) = rx.recv().await {
            seen.push(frame.sequence);
        }
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn stop_ends_the_stream() {
        let mut source =
            ReplayFrameSource::new(vec![blank(); 1000], None, Duration::from_millis(2), 4);
        let mut rx = source.start().unwrap();
        assert!(rx.recv().await.is_some());
        source.stop();

        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            let mut count = 0;
            while rx.recv().await.is_some() {
                count += 1;
            }
            count
        })
        .await
        .expect("stream did not close after stop");
        assert!(drained < 10);
    }

    #[tokio::test]
    async fn starting_twice_is_refused() {
        let mut source = ReplayFrameSource::new(vec![blank()], None, Duration::from_millis(1), 1);
        let _rx = source.start().unwrap();
        assert!(matches!(source.start(), Err(ScanError::CameraUnavailable(_))));
    }

    #[tokio::test]
    async fn still_is_served_or_reported_missing() {
        let mut with =
            ReplayFrameSource::new(vec![blank()], Some(vec![1, 2, 3]), Duration::from_millis(1), 1);
        assert_eq!(with.capture_still().await.unwrap().unwrap(), vec![1, 2, 3]);

        let mut without = ReplayFrameSource::new(vec![blank()], None, Duration::from_millis(1), 1);
        let err = without.capture_still().await.unwrap().unwrap_err();
        assert_eq!(err.code(), "CAPTURE_FAILED");
    }

    #[test]
    fn empty_replay_has_no_camera() {
        let host = ReplayHost::new(vec![]);
        assert!(matches!(
            host.open_frame_source(4),
            Err(ScanError::CameraUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn replayed_page_settles_and_is_rectified() {
        let frames = vec![page(400, 500); 12];
        let still = encode_jpeg(&DynamicImage::ImageLuma8(page(400, 500)), 0.95).unwrap();
        let host: Arc<dyn HostEnvironment> = Arc::new(
            ReplayHost::new(frames)
                .with_still(still)
                .with_interval(Duration::from_millis(5)),
        );
        let config = ScannerConfig {
            frame_buffer: 32,
            ..ScannerConfig::default()
        };
        let scanner = Scanner::new(host, config).unwrap();

        let page = tokio::time::timeout(Duration::from_secs(60), scanner.start_scan().result())
            .await
            .expect("scan did not finish")
            .unwrap();
        assert_eq!(page.reason, CaptureReason::AutoStable);
        assert_eq!(page.frames_analyzed, 5);
        assert!((page.width as i32 - 300).abs() <= 4, "width {}", page.width);
        assert!((page.height as i32 - 380).abs() <= 4, "height {}", page.height);
    }
}
