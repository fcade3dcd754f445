use serde::Serialize;
use ts_rs::TS;

/// JSON envelope returned by every API endpoint.
#[derive(Debug, Serialize, TS)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: &str) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_has_no_data() {
        let response: ApiResponse<()> = ApiResponse::error("File not found");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["message"], "File not found");
    }

    #[test]
    fn test_success_with_message() {
        let response = ApiResponse::success_with_message(3, "Task added successfully");
        assert!(response.is_success());
        assert_eq!(response.data(), Some(&3));
        assert_eq!(response.message(), Some("Task added successfully"));
    }
}
