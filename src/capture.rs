// Capture source manager: live camera or a user-supplied file as the backdrop.
// Acquisition is async on the JS side, so this is a state machine that emits commands.
// Rule: every stream and object URL handed out is released exactly once.

use serde::{Deserialize, Serialize};

use crate::error::GachaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front camera.
    User,
    /// Back camera.
    #[default]
    Environment,
}

impl FacingMode {
    pub fn flipped(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    Camera,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME type. Only `image/*` and `video/*` are accepted.
    pub fn from_mime(mime: &str) -> Result<Self, GachaError> {
        let top = mime.split('/').next().unwrap_or_default().trim();
        match top.to_ascii_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            _ => Err(GachaError::UnsupportedMedia(mime.to_string())),
        }
    }
}

/// Host-side handle for a `MediaStream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(pub u32);

/// Constraints for `getUserMedia`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraRequest {
    pub request_id: u32,
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

/// Work for the host to carry out, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaptureCommand {
    RequestCamera(CameraRequest),
    /// Stop every track of the stream.
    StopStream { stream: StreamId },
    RevokeObjectUrl { url: String },
    ShowStream { stream: StreamId },
    ShowFile { url: String, kind: MediaKind },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActiveSource {
    Camera(StreamId),
    File { url: String, kind: MediaKind },
}

#[derive(Debug, Default)]
pub struct CaptureManager {
    mode: SourceMode,
    facing: FacingMode,
    active: Option<ActiveSource>,
    pending_request: Option<u32>,
    next_request: u32,
    last_error: Option<String>,
}

const IDEAL_WIDTH: u32 = 1920;
const IDEAL_HEIGHT: u32 = 1080;

impl CaptureManager {
    pub fn new(facing: FacingMode) -> Self {
        CaptureManager {
            facing,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// A source is on screen.
    pub fn is_ready(&self) -> bool {
        self.active.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Release the current source and request a camera stream.
    pub fn start_camera(&mut self) -> Vec<CaptureCommand> {
        let mut commands = self.release_active();
        self.mode = SourceMode::Camera;
        self.last_error = None;

        self.next_request += 1;
        let request_id = self.next_request;
        self.pending_request = Some(request_id);

        log::info!(
            "Requesting camera {} ({:?})",
            request_id,
            self.facing
        );

        commands.push(CaptureCommand::RequestCamera(CameraRequest {
            request_id,
            facing_mode: self.facing,
            ideal_width: IDEAL_WIDTH,
            ideal_height: IDEAL_HEIGHT,
            audio: false,
        }));
        commands
    }

    /// The host obtained a stream. Streams for superseded requests are stopped at once.
    pub fn camera_acquired(&mut self, request_id: u32, stream: StreamId) -> Vec<CaptureCommand> {
        if self.pending_request != Some(request_id) {
            log::warn!(
                "Stream {:?} arrived for stale request {}, releasing",
                stream,
                request_id
            );
            return vec![CaptureCommand::StopStream { stream }];
        }

        self.pending_request = None;
        let mut commands = self.release_active();
        self.active = Some(ActiveSource::Camera(stream));
        self.last_error = None;
        commands.push(CaptureCommand::ShowStream { stream });
        commands
    }

    /// The host failed to obtain a stream (permission denied, no device).
    pub fn camera_failed(&mut self, request_id: u32, message: &str) {
        if self.pending_request != Some(request_id) {
            return;
        }
        log::warn!("Camera request {} failed: {}", request_id, message);
        self.pending_request = None;
        self.last_error = Some(message.to_string());
    }

    /// Flip front/back. Tears down and reacquires when the camera is the source.
    pub fn switch_facing(&mut self) -> Vec<CaptureCommand> {
        self.facing = self.facing.flipped();
        if self.mode == SourceMode::Camera {
            self.start_camera()
        } else {
            Vec::new()
        }
    }

    /// Show a local file instead of the camera. `url` is an object URL the manager now owns,
    /// so a rejected file is revoked straight away and the reason kept in `last_error`.
    pub fn load_file(&mut self, url: &str, mime: &str) -> Vec<CaptureCommand> {
        let showing_url = matches!(
            &self.active,
            Some(ActiveSource::File { url: active, .. }) if active == url
        );

        let kind = match MediaKind::from_mime(mime) {
            Ok(kind) => kind,
            Err(err) => {
                log::warn!("Rejected file: {}", err);
                self.last_error = Some(err.to_string());
                if showing_url {
                    return Vec::new();
                }
                return vec![CaptureCommand::RevokeObjectUrl {
                    url: url.to_string(),
                }];
            }
        };

        let mut commands = if showing_url {
            self.active = None;
            Vec::new()
        } else {
            self.release_active()
        };
        self.pending_request = None;
        self.mode = SourceMode::File;
        self.last_error = None;
        self.active = Some(ActiveSource::File {
            url: url.to_string(),
            kind,
        });

        log::info!("Showing {:?} file", kind);
        commands.push(CaptureCommand::ShowFile {
            url: url.to_string(),
            kind,
        });
        commands
    }

    /// Leave file mode and reacquire the camera.
    pub fn switch_to_camera(&mut self) -> Vec<CaptureCommand> {
        if self.mode == SourceMode::Camera && (self.is_ready() || self.pending_request.is_some()) {
            return Vec::new();
        }
        self.start_camera()
    }

    /// Release everything. Any in-flight request becomes stale.
    pub fn teardown(&mut self) -> Vec<CaptureCommand> {
        self.pending_request = None;
        self.release_active()
    }

    fn release_active(&mut self) -> Vec<CaptureCommand> {
        match self.active.take() {
            Some(ActiveSource::Camera(stream)) => vec![CaptureCommand::StopStream { stream }],
            Some(ActiveSource::File { url, .. }) => vec![CaptureCommand::RevokeObjectUrl { url }],
            None => Vec::new(),
        }
    }
}
