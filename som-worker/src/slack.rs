use crate::dto;

/// Posts `text` to the configured Slack channel.
pub async fn post_alert(
    client: &reqwest::Client,
    url: &str,
    slack_channel_id: &str,
    text: String,
) -> Result<(), String> {
    let serialized_data = match serde_json::to_string(&dto::SlackNotificationData {
        channel: slack_channel_id.to_string(),
        text,
    }) {
        Ok(json) => json,
        Err(err) => return Err(format!("error in serializing data {}", err)),
    };
    let response = client
        .post(url)
        .header("content-type", "application/json")
        .body(serialized_data)
        .send()
        .await;
    match response {
        Ok(resp) => match resp.status() {
            reqwest::StatusCode::OK => Ok(()),
            status => Err(format!("Slack responded with {}", status)),
        },
        Err(error) => Err(format!("Slack request error: {}", error)),
    }
}
