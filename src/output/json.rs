use crate::journal::UserStatus;
use crate::output::format::json_date;

pub(crate) fn output_status_json(statuses: &[UserStatus]) -> String {
    let output: Vec<serde_json::Value> = statuses
        .iter()
        .map(|s| {
            serde_json::json!({
                "user": s.user,
                "state": s.state.as_str(),
                "max_id": s.max_id,
                "last_tweet_date": json_date(s.last_tweet_date.as_ref()),
                "last_access": json_date(s.last_access.as_ref()),
            })
        })
        .collect();
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "[]".to_string())
}
