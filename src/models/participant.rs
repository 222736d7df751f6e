// src/models/participant.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Someone who joined the running session. The id is opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
}

/// DTO for joining a session.
#[derive(Debug, Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, max = 100, message = "Name length must be between 1 and 100 characters."))]
    pub name: String,
}
