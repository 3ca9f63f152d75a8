// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use docscan_bridge::{ReplayHost, platform_host};
use docscan_capture::{HostEnvironment, Scanner};
use docscan_core::error::{Result, ScanError};
use docscan_core::{DetectorKind, OsVersion, PageFailurePolicy, ScannerConfig};
use docscan_vision::encode::{decode_image, encode_jpeg};
use docscan_vision::{DetectorSettings, Rectifier, detector_for, encode_pages};
use image::{DynamicImage, GrayImage};
use tracing::{info, warn};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

pub struct ScanOptions {
    pub frames: Option<PathBuf>,
    pub output: PathBuf,
    pub still: Option<PathBuf>,
    pub os_version: OsVersion,
    pub interval_ms: u64,
    pub manual_after_ms: Option<u64>,
}

pub fn load_config(path: Option<&Path>) -> Result<ScannerConfig> {
    match path {
        Some(path) => {
            let config = ScannerConfig::load(path)?;
            info!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        None => Ok(ScannerConfig::default()),
    }
}

/// Image files in `dir`, sorted by file name.
pub fn frame_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if path.is_file() && is_image {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Decode every frame in `dir` to luma.
pub fn load_frames(dir: &Path) -> Result<Vec<GrayImage>> {
    frame_paths(dir)?
        .iter()
        .map(|path| -> Result<GrayImage> { Ok(decode_image(&std::fs::read(path)?)?.to_luma8()) })
        .collect()
}

/// Host backed by the recorded frames in `dir`.
fn replay_host(config: &ScannerConfig, dir: &Path, options: &ScanOptions) -> Result<ReplayHost> {
    let frames = load_frames(dir)?;
    let Some(last) = frames.last() else {
        return Err(ScanError::CameraUnavailable(format!(
            "no image frames in {}",
            dir.display()
        )));
    };

    let still = match &options.still {
        Some(path) => std::fs::read(path)?,
        None => encode_jpeg(&DynamicImage::ImageLuma8(last.clone()), config.jpeg_quality)?,
    };

    Ok(ReplayHost::new(frames)
        .with_still(still)
        .with_os_version(options.os_version)
        .with_interval(Duration::from_millis(options.interval_ms)))
}

/// Run a full scan session, on recorded frames when given, otherwise on the
/// platform camera.
pub async fn scan(config: ScannerConfig, options: ScanOptions) -> Result<()> {
    let host: Arc<dyn HostEnvironment> = match &options.frames {
        Some(dir) => Arc::new(replay_host(&config, dir, &options)?),
        None => {
            info!("no frames given; using the platform camera");
            platform_host()
        }
    };
    let scanner = Scanner::new(host, config)?;
    let handle = scanner.start_scan();
    let controls = handle.controls();

    if let Some(delay) = options.manual_after_ms {
        let shutter = controls.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if shutter.capture_now() {
                info!(delay_ms = delay, "manual capture triggered");
            }
        });
    }

    let result = handle.result();
    tokio::pin!(result);
    let page = tokio::select! {
        outcome = &mut result => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; dismissing scanner");
            controls.dismiss();
            result.await
        }
    }?;

    std::fs::write(&options.output, &page.jpeg)?;
    println!(
        "{}: {}x{} page, {:?} capture after {} frames",
        options.output.display(),
        page.width,
        page.height,
        page.reason,
        page.frames_analyzed
    );
    Ok(())
}

/// Detect and rectify the document in a single image.
pub fn rectify(
    config: &ScannerConfig,
    input: &Path,
    output: &Path,
    kind: DetectorKind,
) -> Result<()> {
    let image = decode_image(&std::fs::read(input)?)?;
    let detector = detector_for(kind, DetectorSettings::from(config));
    let page = Rectifier::from_config(config).rectify_still(&image, Some(detector.as_ref()), None)?;
    std::fs::write(output, &page.jpeg)?;
    println!("{}: {}x{} page", output.display(), page.width, page.height);
    Ok(())
}

/// Encode each input image as a JPEG page under `output_dir`.
pub fn pages(config: &ScannerConfig, output_dir: &Path, files: &[PathBuf]) -> Result<()> {
    let mut images = Vec::with_capacity(files.len());
    for file in files {
        match std::fs::read(file).map_err(ScanError::from).and_then(|b| decode_image(&b)) {
            Ok(image) => images.push(image),
            Err(err) if config.page_failure_policy == PageFailurePolicy::SkipFailed => {
                warn!(file = %file.display(), error = %err, "skipping unreadable page");
            }
            Err(err) => return Err(err),
        }
    }

    let encoded = encode_pages(&images, config.page_failure_policy, config.jpeg_quality)?;
    std::fs::create_dir_all(output_dir)?;
    for (index, jpeg) in encoded.iter().enumerate() {
        let path = output_dir.join(format!("page-{:03}.jpg", index + 1));
        std::fs::write(&path, jpeg)?;
    }
    println!("{} pages written to {}", encoded.len(), output_dir.display());
    Ok(())
}
