//! End-of-season summary.

use serde::Serialize;

use crate::session::{Session, WeekSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Performance {
    pub fn rate(profit: i64, harvested: u32) -> Self {
        if profit > 1_000 && harvested >= 8 {
            Performance::Excellent
        } else if profit > 0 && harvested >= 5 {
            Performance::Good
        } else if profit > -1_000 && harvested >= 3 {
            Performance::Fair
        } else {
            Performance::Poor
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Performance::Excellent => {
                "Amazing! You're a master farmer who used NASA data perfectly!"
            }
            Performance::Good => "Well done! You made smart decisions using satellite data.",
            Performance::Fair => "Not bad! You learned the basics of data-driven farming.",
            Performance::Poor => "Keep trying! Understanding satellite data takes practice.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonReport {
    pub region: String,
    pub weeks_played: u32,
    pub complete: bool,
    pub final_money: i64,
    pub season_profit: i64,
    pub total_harvested: u32,
    pub sustainability_score: Option<f64>,
    pub performance: Performance,
    pub message: String,
    pub history: Vec<WeekSummary>,
}

impl SeasonReport {
    pub fn from_session(session: &Session) -> Self {
        let profit = session.season_profit();
        let performance = Performance::rate(profit, session.total_harvested);
        Self {
            region: session.config.region.clone(),
            weeks_played: session.week,
            complete: session.complete,
            final_money: session.money,
            season_profit: profit,
            total_harvested: session.total_harvested,
            sustainability_score: session.sustainability_score(),
            performance,
            message: performance.message().to_string(),
            history: session.history.clone(),
        }
    }
}
