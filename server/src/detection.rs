use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// HSV bounds on the 8-bit OpenCV scale: hue 0..=179, saturation and value 0..=255.
pub const GREEN_LOWER: [u8; 3] = [35, 40, 40];
pub const GREEN_UPPER: [u8; 3] = [90, 255, 255];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected a colour like #22cc44, got {0:?}")]
pub struct ParseRgbError(String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseRgbError(value.to_string()));
        }
        let mut channels = [0u8; 3];
        for (index, channel) in channels.iter_mut().enumerate() {
            *channel = u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16)
                .map_err(|_| ParseRgbError(value.to_string()))?;
        }
        Ok(Rgb(channels))
    }
}

#[derive(Clone, Debug)]
pub struct Frame {
    pub pixels: Vec<Rgb>,
}

impl Frame {
    pub fn solid(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            pixels: vec![color; (width * height) as usize],
        }
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> Result<Frame, FrameError>;
}

/// Camera stand-in that always returns a solid frame of one colour.
pub struct SyntheticCamera {
    pub width: u32,
    pub height: u32,
    pub color: Rgb,
}

impl SyntheticCamera {
    pub fn new(color: Rgb) -> Self {
        Self {
            width: 320,
            height: 240,
            color,
        }
    }
}

#[async_trait]
impl FrameSource for SyntheticCamera {
    async fn capture(&self) -> Result<Frame, FrameError> {
        Ok(Frame::solid(self.width, self.height, self.color))
    }
}

pub fn to_hsv(Rgb([r, g, b]): Rgb) -> [u8; 3] {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max == 0.0 { 0.0 } else { 255.0 * delta / max };
    let mut hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }
    [
        (hue / 2.0).round().min(179.0) as u8,
        saturation.round() as u8,
        max as u8,
    ]
}

fn in_green_range(hsv: [u8; 3]) -> bool {
    (0..3).all(|channel| {
        GREEN_LOWER[channel] <= hsv[channel] && hsv[channel] <= GREEN_UPPER[channel]
    })
}

pub fn green_fraction(frame: &Frame) -> f64 {
    if frame.pixels.is_empty() {
        return 0.0;
    }
    let green = frame
        .pixels
        .iter()
        .filter(|pixel| in_green_range(to_hsv(**pixel)))
        .count();
    green as f64 / frame.pixels.len() as f64
}

#[derive(Clone, Debug)]
pub struct DetectorConfig {
    pub warmup: Duration,
    pub sample_interval: Duration,
    pub error_backoff: Duration,
    /// Percentage of green pixels above which an object counts as detected.
    pub threshold_percent: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(2),
            sample_interval: Duration::from_millis(100),
            error_backoff: Duration::from_millis(200),
            threshold_percent: 6.0,
        }
    }
}

struct Running {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct Detector {
    source: Arc<dyn FrameSource>,
    config: DetectorConfig,
    detected: Arc<AtomicBool>,
    running: Mutex<Option<Running>>,
}

impl Detector {
    pub fn new(source: Arc<dyn FrameSource>, config: DetectorConfig) -> Self {
        Self {
            source,
            config,
            detected: Arc::new(AtomicBool::new(false)),
            running: Mutex::new(None),
        }
    }

    pub fn object_detected(&self) -> bool {
        self.detected.load(Ordering::Relaxed)
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Returns false when a detection task is already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
        {
            tracing::info!("Detection already running");
            return false;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(detection_loop(
            self.source.clone(),
            self.config.clone(),
            self.detected.clone(),
            stop.clone(),
        ));
        *running = Some(Running { stop, handle });
        true
    }

    pub async fn stop(&self) {
        if let Some(running) = self.running.lock().await.as_ref() {
            running.stop.store(true, Ordering::Relaxed);
        }
    }
}

async fn detection_loop(
    source: Arc<dyn FrameSource>,
    config: DetectorConfig,
    detected: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
) {
    tokio::time::sleep(config.warmup).await;
    tracing::info!("Green object detection started");

    while !stop.load(Ordering::Relaxed) {
        match source.capture().await {
            Ok(frame) => {
                let percent = green_fraction(&frame) * 100.0;
                if percent > config.threshold_percent {
                    if !detected.swap(true, Ordering::Relaxed) {
                        tracing::info!("Green object detected ({percent:.1}% of frame)");
                    }
                } else {
                    detected.store(false, Ordering::Relaxed);
                }
                tokio::time::sleep(config.sample_interval).await;
            }
            Err(error) => {
                tracing::warn!("Camera error: {error}");
                tokio::time::sleep(config.error_backoff).await;
            }
        }
    }
    tracing::info!("Green detection stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    const GREEN: Rgb = Rgb([40, 200, 60]);
    const BLACK: Rgb = Rgb([0, 0, 0]);

    fn fast_config() -> DetectorConfig {
        DetectorConfig {
            warmup: Duration::ZERO,
            ..DetectorConfig::default()
        }
    }

    struct FlakyCamera {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FrameSource for FlakyCamera {
        async fn capture(&self) -> Result<Frame, FrameError> {
            if self.calls.fetch_add(1, Ordering::Relaxed) == 0 {
                Err(FrameError::Unavailable("not ready".into()))
            } else {
                Ok(Frame::solid(4, 4, GREEN))
            }
        }
    }

    #[test]
    fn parses_hex_colours() {
        assert_eq!("#22cc44".parse::<Rgb>(), Ok(Rgb([0x22, 0xcc, 0x44])));
        assert_eq!("FFFFFF".parse::<Rgb>(), Ok(Rgb([255, 255, 255])));
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#zz0000".parse::<Rgb>().is_err());
    }

    #[test]
    fn hsv_uses_half_degree_hue() {
        assert_eq!(to_hsv(Rgb([0, 255, 0])), [60, 255, 255]);
        assert_eq!(to_hsv(Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(to_hsv(Rgb([0, 0, 255])), [120, 255, 255]);
        assert_eq!(to_hsv(BLACK), [0, 0, 0]);
    }

    #[test]
    fn green_fraction_counts_green_pixels() {
        assert_eq!(green_fraction(&Frame::solid(8, 8, GREEN)), 1.0);
        assert_eq!(green_fraction(&Frame::solid(8, 8, BLACK)), 0.0);

        let mut frame = Frame::solid(10, 10, BLACK);
        for pixel in frame.pixels.iter_mut().take(25) {
            *pixel = GREEN;
        }
        assert_eq!(green_fraction(&frame), 0.25);
    }

    #[test]
    fn pale_grey_is_not_green() {
        // Saturation below 40 falls outside the range even with a green hue.
        assert_eq!(green_fraction(&Frame::solid(2, 2, Rgb([200, 215, 200]))), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn detects_green_camera() {
        let detector = Detector::new(Arc::new(SyntheticCamera::new(GREEN)), fast_config());
        assert!(!detector.object_detected());
        assert!(detector.start().await);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(detector.object_detected());

        detector.stop().await;
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!detector.is_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn black_camera_detects_nothing() {
        let detector = Detector::new(Arc::new(SyntheticCamera::new(BLACK)), fast_config());
        detector.start().await;
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!detector.object_detected());
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_ignored_while_running() {
        let detector = Detector::new(Arc::new(SyntheticCamera::new(BLACK)), fast_config());
        assert!(detector.start().await);
        assert!(!detector.start().await);
        detector.stop().await;
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(detector.start().await);
    }

    #[tokio::test(start_paused = true)]
    async fn camera_errors_are_retried() {
        let camera = Arc::new(FlakyCamera {
            calls: AtomicUsize::new(0),
        });
        let detector = Detector::new(camera.clone(), fast_config());
        detector.start().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(detector.object_detected());
        assert!(camera.calls.load(Ordering::Relaxed) >= 2);
    }
}
