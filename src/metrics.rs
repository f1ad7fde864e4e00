use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Aggregate snapshot served by the dashboard endpoint.
///
/// Everything here is read-only except `house_balance`, which is written
/// back through the house-balance endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_bets: Decimal,
    pub total_wagered: Decimal,
    pub total_lost: Decimal,
    pub total_won: Decimal,
    pub house_balance: Decimal,
    pub total_withdrawn: Decimal,
    /// Amount still waiting for settlement, in SOL.
    pub pending_withdrawals: Decimal,
    #[serde(
        default,
        rename = "pendingWithdrawalsCount",
        deserialize_with = "count_from_any"
    )]
    pub pending_withdrawal_count: Option<u64>,
}

impl DashboardMetrics {
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "=== Dashboard Metrics ===".to_string(),
            format!("Total Bets:             {}", self.total_bets.round_dp(3)),
            format!("Total Amount Wagered:   {} SOL", self.total_wagered.round_dp(3)),
            format!("Total Lost (by Players): {} SOL", self.total_lost.round_dp(3)),
            format!("Total Won (by Players): {} SOL", self.total_won.round_dp(3)),
            format!("House Balance:          {} SOL", self.house_balance),
            format!("Total Withdrawn:        {} SOL", self.total_withdrawn.round_dp(3)),
            format!("Pending Withdrawals:    {} SOL", self.pending_withdrawals.round_dp(3)),
        ];
        if let Some(count) = self.pending_withdrawal_count {
            lines.push(format!("Pending Requests:       {}", count));
        }
        lines
    }
}

/// The count arrives as a number, a numeric string or an aggregate row
/// such as `{"count": "3"}` depending on the backend query.
fn count_from_any<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    fn read(value: &Value) -> Option<u64> {
        match value {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse().ok(),
            Value::Object(fields) => fields.values().find_map(read),
            Value::Array(items) => items.first().and_then(read),
            _ => None,
        }
    }
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(read))
}
