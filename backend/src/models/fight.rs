use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{error::AppError, utils::validate::Violations};

/// Result of a bout, maps to the Postgres enum `fight_outcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "fight_outcome")]
pub enum FightOutcome {
    Win,
    Loss,
    Draw,
}

/// A row of the 'fights' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Fight {
    pub fight_id: i64,
    pub fighter_id: i64,
    pub date: NaiveDate,
    pub outcome: FightOutcome,
    /// e.g. "KO (punches), R2".
    pub decision: String,
    pub promotion: String,
}

/// DTO for creating or editing a fight record.
#[derive(Debug, Deserialize, Validate)]
pub struct FightRequest {
    pub date: NaiveDate,
    pub outcome: FightOutcome,
    #[validate(length(max = 200, message = "decision must be at most 200 characters"))]
    pub decision: String,
    #[validate(length(max = 100, message = "promotion must be at most 100 characters"))]
    pub promotion: String,
}

/// Query parameters for listing fights.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightListParams {
    pub fighter_id: i64,
}

impl FightRequest {
    pub fn validated(self) -> Result<FightRequest, AppError> {
        let mut violations = Violations::default();
        violations.extend_from(self.validate());

        let decision = self.decision.trim().to_string();
        let promotion = self.promotion.trim().to_string();
        if decision.is_empty() {
            violations.push("decision is required");
        }
        if promotion.is_empty() {
            violations.push("promotion is required");
        }

        violations.finish(Some(FightRequest {
            date: self.date,
            outcome: self.outcome,
            decision,
            promotion,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_must_be_known() {
        let result = serde_json::from_value::<FightRequest>(json!({
            "date": "2024-05-04",
            "outcome": "Forfeit",
            "decision": "DQ",
            "promotion": "UFC"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn blank_decision_is_rejected() {
        let req: FightRequest = serde_json::from_value(json!({
            "date": "2024-05-04",
            "outcome": "Win",
            "decision": "  ",
            "promotion": "UFC"
        }))
        .unwrap();
        let err = req.validated().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("decision is required")));
    }

    #[test]
    fn valid_fight_is_trimmed() {
        let req: FightRequest = serde_json::from_value(json!({
            "date": "2024-05-04",
            "outcome": "Draw",
            "decision": " Split decision ",
            "promotion": "PFL"
        }))
        .unwrap();
        let fight = req.validated().unwrap();
        assert_eq!(fight.decision, "Split decision");
        assert_eq!(fight.outcome, FightOutcome::Draw);
    }
}
