//! Alert email formatting

use crate::models::AlertMessage;

/// Render the alert email, returning `(subject, html_body)`
pub fn render_alert_email(alert: &AlertMessage) -> (String, String) {
    let subject = format!("GCP Budget Alert: {}", alert.service_name);

    let body = format!(
        r#"
    <p>A budget alert has been triggered for your GCP project.</p>
    <ul>
        <li><strong>Service:</strong> {}</li>
        <li><strong>Current Cost:</strong> ${:.2}</li>
        <li><strong>Budget Limit:</strong> ${:.2}</li>
        <li><strong>Action Taken:</strong> {}</li>
        <li><strong>Timestamp:</strong> {}</li>
    </ul>
    "#,
        alert.service_name,
        alert.current_cost,
        alert.budget_limit,
        alert.action_taken.as_str(),
        alert.timestamp.to_rfc3339(),
    );

    (subject, body)
}
