//! Where the client should go after a checkout step

use serde::{Deserialize, Serialize};

/// Seconds the success view stays up before moving to the confirmation
pub const CONFIRMATION_REDIRECT_SECS: u64 = 5;

/// Next step in the purchase flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Navigation {
    /// Payment method selection
    Payment,
    /// Receipt view, shown after a fixed delay
    Confirmation { after_secs: u64 },
    /// Start over from the landing page
    Home,
}

impl Navigation {
    pub fn confirmation() -> Self {
        Navigation::Confirmation {
            after_secs: CONFIRMATION_REDIRECT_SECS,
        }
    }

    /// Client route for this step
    pub fn path(&self) -> &'static str {
        match self {
            Navigation::Payment => "/payment",
            Navigation::Confirmation { .. } => "/confirmation",
            Navigation::Home => "/",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_serializes_with_step_tag() {
        let json = serde_json::to_value(Navigation::confirmation()).unwrap();
        assert_eq!(json, serde_json::json!({"step": "confirmation", "after_secs": 5}));
        assert_eq!(Navigation::Home.path(), "/");
    }
}
