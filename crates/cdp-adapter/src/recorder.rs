//! Screencast recording of a tab into a motion-JPEG file.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use chromiumoxide::cdp::browser_protocol::page::{
    EventScreencastFrame, ScreencastFrameAckParams, StartScreencastFormat,
    StartScreencastParams, StopScreencastParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AdapterError, AdapterErrorKind};

/// File extension of recordings: concatenated JPEG frames.
pub const VIDEO_EXTENSION: &str = "mjpeg";

/// Writes every screencast frame of one page to its own file until stopped.
pub struct ScreencastRecorder {
    page: Page,
    path: PathBuf,
    stop: oneshot::Sender<()>,
    writer: JoinHandle<u64>,
}

impl ScreencastRecorder {
    pub async fn start(page: &Page, dir: &Path, quality: u8) -> Result<Self, AdapterError> {
        tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
        let path = dir.join(format!("{}.{}", Uuid::new_v4().simple(), VIDEO_EXTENSION));
        let mut file = tokio::fs::File::create(&path).await.map_err(io_error)?;

        let mut frames = page
            .event_listener::<EventScreencastFrame>()
            .await
            .map_err(cdp_error)?;
        let ack_page = page.clone();
        let (stop, mut stopped) = oneshot::channel::<()>();

        let writer = tokio::spawn(async move {
            let mut written = 0u64;
            loop {
                let frame = tokio::select! {
                    _ = &mut stopped => break,
                    frame = frames.next() => match frame {
                        Some(frame) => frame,
                        None => break,
                    },
                };
                let encoded: &str = frame.data.as_ref();
                match Base64.decode(encoded) {
                    Ok(bytes) => {
                        if let Err(err) = file.write_all(&bytes).await {
                            warn!(?err, "failed to write screencast frame; stopping recorder");
                            break;
                        }
                        written += 1;
                    }
                    Err(err) => debug!(?err, "skipping undecodable screencast frame"),
                }
                if let Err(err) = ack_page
                    .execute(ScreencastFrameAckParams::new(frame.session_id))
                    .await
                {
                    debug!(?err, "screencast frame ack failed");
                }
            }
            if let Err(err) = file.flush().await {
                warn!(?err, "failed to flush screencast file");
            }
            written
        });

        page.execute(
            StartScreencastParams::builder()
                .format(StartScreencastFormat::Jpeg)
                .quality(i64::from(quality.min(100)))
                .every_nth_frame(1)
                .build(),
        )
        .await
        .map_err(cdp_error)?;

        info!(path = %path.display(), "screencast recording started");
        Ok(Self {
            page: page.clone(),
            path,
            stop,
            writer,
        })
    }

    /// Stops the screencast, flushes the file and returns its path.
    pub async fn stop(self) -> Result<PathBuf, AdapterError> {
        if let Err(err) = self.page.execute(StopScreencastParams::default()).await {
            debug!(?err, "stop screencast command failed");
        }
        let _ = self.stop.send(());
        let frames = self.writer.await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("screencast writer panicked: {err}"))
        })?;
        info!(path = %self.path.display(), frames, "screencast recording stopped");
        Ok(self.path)
    }
}

fn io_error(err: std::io::Error) -> AdapterError {
    AdapterError::new(AdapterErrorKind::Internal).with_hint(format!("recording i/o: {err}"))
}

fn cdp_error(err: chromiumoxide::error::CdpError) -> AdapterError {
    AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string())
}
