use serde::{Deserialize, Serialize};

use crate::{
    domain::GarmentType,
    error::{ReplyError, UNKNOWN_ERROR_MESSAGE, UNKNOWN_STATUS_MESSAGE},
};

pub const UPLOAD_PATH: &str = "/api/tryon/upload";
pub const TRY_ON_PATH: &str = "/api/tryon/direct";
pub const HEALTH_PATH: &str = "/api/health";

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "file";

/// Body of the upload endpoint. Exactly one of the fields is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadReply {
    pub fn success(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            url: None,
            error: Some(error.into()),
        }
    }

    /// A reported `error` wins over any `url` in the same body.
    pub fn into_reference_url(self) -> Result<String, ReplyError> {
        if let Some(error) = self.error {
            return Err(ReplyError::Rejected(error));
        }
        match self.url {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(ReplyError::malformed(
                "upload reply carried neither `url` nor `error`",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryOnRequest {
    pub person_image_url: String,
    pub garment_image_url: String,
    pub garment_type: GarmentType,
}

/// Raw body of the try-on endpoint.
///
/// Kept loose on purpose: the `status` value decides which other fields
/// matter, and an unrecognized status must still deserialize so it can be
/// reported as a protocol error rather than a transport one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryOnReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// Non-error results of a try-on call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryOnOutcome {
    Success {
        image_url: String,
        task_id: Option<String>,
    },
    /// Job accepted for asynchronous processing. No polling contract exists.
    Submitted { task_id: Option<String> },
}

impl TryOnReply {
    pub fn success(image_url: impl Into<String>) -> Self {
        Self {
            status: Some("success".to_string()),
            image_url: Some(image_url.into()),
            ..Self::default()
        }
    }

    pub fn submitted() -> Self {
        Self {
            status: Some("submitted".to_string()),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Some("error".to_string()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn into_outcome(self) -> Result<TryOnOutcome, ReplyError> {
        match self.status.as_deref() {
            Some("success") => match self.image_url {
                Some(image_url) if !image_url.trim().is_empty() => Ok(TryOnOutcome::Success {
                    image_url,
                    task_id: self.task_id,
                }),
                _ => Err(ReplyError::malformed("success reply is missing `image_url`")),
            },
            Some("submitted") => Ok(TryOnOutcome::Submitted {
                task_id: self.task_id,
            }),
            Some("error") => Err(ReplyError::Rejected(
                self.message
                    .or(self.error)
                    .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
            )),
            // A missing status is as unusable as an unknown one, even when a bare
            // `error` field came along with it.
            Some(_) | None => Err(ReplyError::malformed(UNKNOWN_STATUS_MESSAGE)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReply {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthReply {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_reply_prefers_error_over_url() {
        let reply: UploadReply =
            serde_json::from_str(r#"{"url":"/img/p1.png","error":"too large"}"#).unwrap();
        assert_eq!(
            reply.into_reference_url(),
            Err(ReplyError::rejected("too large"))
        );
    }

    #[test]
    fn upload_reply_without_fields_is_malformed() {
        let reply: UploadReply = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            reply.into_reference_url(),
            Err(ReplyError::Malformed(_))
        ));
    }

    #[test]
    fn try_on_request_uses_documented_field_names() {
        let request = TryOnRequest {
            person_image_url: "/img/p1.png".to_string(),
            garment_image_url: "/img/g1.png".to_string(),
            garment_type: GarmentType::Top,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "person_image_url": "/img/p1.png",
                "garment_image_url": "/img/g1.png",
                "garment_type": "top",
            })
        );
    }

    #[test]
    fn try_on_reply_dispatches_on_status() {
        let success: TryOnReply = serde_json::from_str(
            r#"{"status":"success","image_url":"/img/result1.png","task_id":"t-1"}"#,
        )
        .unwrap();
        assert_eq!(
            success.into_outcome(),
            Ok(TryOnOutcome::Success {
                image_url: "/img/result1.png".to_string(),
                task_id: Some("t-1".to_string()),
            })
        );

        let submitted: TryOnReply = serde_json::from_str(r#"{"status":"submitted"}"#).unwrap();
        assert_eq!(
            submitted.into_outcome(),
            Ok(TryOnOutcome::Submitted { task_id: None })
        );

        let error: TryOnReply =
            serde_json::from_str(r#"{"status":"error","message":"face not detected"}"#).unwrap();
        assert_eq!(
            error.into_outcome(),
            Err(ReplyError::rejected("face not detected"))
        );
    }

    #[test]
    fn try_on_reply_edge_cases() {
        let unknown: TryOnReply = serde_json::from_str(r#"{"status":"queued"}"#).unwrap();
        assert_eq!(
            unknown.into_outcome(),
            Err(ReplyError::malformed(UNKNOWN_STATUS_MESSAGE))
        );

        let bare_error: TryOnReply =
            serde_json::from_str(r#"{"error":"rate limit exceeded"}"#).unwrap();
        assert_eq!(
            bare_error.into_outcome(),
            Err(ReplyError::malformed(UNKNOWN_STATUS_MESSAGE))
        );

        let silent_error = TryOnReply {
            status: Some("error".to_string()),
            ..TryOnReply::default()
        };
        assert_eq!(
            silent_error.into_outcome(),
            Err(ReplyError::rejected(UNKNOWN_ERROR_MESSAGE))
        );

        let imageless = TryOnReply {
            status: Some("success".to_string()),
            ..TryOnReply::default()
        };
        assert!(matches!(
            imageless.into_outcome(),
            Err(ReplyError::Malformed(_))
        ));
    }
}
