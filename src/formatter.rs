use crate::types::NewsSummary;

/// Renders a summary into the notification template:
///
/// ```text
/// {overall_summary}
/// 1. *{title}*：{description}
/// 2. *{title}*：{description}
/// ```
///
/// Points are numbered from 1 in the order given. No trailing newline.
pub fn format_notification(summary: &NewsSummary) -> String {
    let mut lines = Vec::with_capacity(summary.points.len() + 1);
    lines.push(summary.overall_summary.clone());
    for (i, point) in summary.points.iter().enumerate() {
        lines.push(format!("{}. *{}*：{}", i + 1, point.title, point.description));
    }
    lines.join("\n")
}
