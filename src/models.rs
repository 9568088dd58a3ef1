use serde::{Deserialize, Serialize};

// GET / response body
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CountResponse {
    pub request_amount: usize,
}

// Body of every error response
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
