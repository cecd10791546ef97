use std::time::Duration;

/// `$30,000`; missing amounts display as `$0`.
pub fn format_currency(v: Option<f64>) -> String {
    let v = v.unwrap_or(0.0);
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(v.abs().round() as u64))
}

/// `+$4,000` / `-$1,200`, for profit columns.
pub fn format_signed_currency(v: Option<f64>) -> String {
    let v = v.unwrap_or(0.0);
    if v > 0.0 {
        format!("+{}", format_currency(Some(v)))
    } else {
        format_currency(Some(v))
    }
}

pub fn format_percent(v: Option<f64>) -> String {
    let v = v.unwrap_or(0.0);
    if v > 0.0 {
        format!("+{:.1}%", v)
    } else {
        format!("{:.1}%", v)
    }
}

pub fn format_mileage(v: Option<i64>) -> String {
    match v {
        Some(m) if m >= 0 => format!("{} mi", group_thousands(m as u64)),
        _ => "N/A".to_string(),
    }
}

/// Flip score on its 0–10 scale.
pub fn format_score(v: Option<f64>) -> String {
    format!("{:.1}", v.unwrap_or(0.0).clamp(0.0, 10.0))
}

pub fn format_count(v: Option<i64>) -> String {
    v.map_or("—".to_string(), |n| group_thousands(n.max(0) as u64))
}

pub fn format_age(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency() {
        assert_eq!(format_currency(Some(30000.0)), "$30,000");
        assert_eq!(format_currency(Some(1234567.4)), "$1,234,567");
        assert_eq!(format_currency(Some(-1200.0)), "-$1,200");
        assert_eq!(format_currency(None), "$0");
        assert_eq!(format_signed_currency(Some(4000.0)), "+$4,000");
        assert_eq!(format_signed_currency(Some(-50.0)), "-$50");
    }

    #[test]
    fn percent_and_score() {
        assert_eq!(format_percent(Some(12.345)), "+12.3%");
        assert_eq!(format_percent(Some(-1.4)), "-1.4%");
        assert_eq!(format_percent(None), "0.0%");
        assert_eq!(format_score(Some(7.44)), "7.4");
        assert_eq!(format_score(Some(14.0)), "10.0");
        assert_eq!(format_score(None), "0.0");
    }

    #[test]
    fn missing_mileage_is_na() {
        assert_eq!(format_mileage(None), "N/A");
        assert_eq!(format_mileage(Some(45210)), "45,210 mi");
        assert_eq!(format_mileage(Some(999)), "999 mi");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("Mercedes AMG GT", 8), "Mercede…");
        assert_eq!(truncate("Škoda", 10), "Škoda");
        assert_eq!(truncate("Škoda Octavia", 3), "Šk…");
    }

    #[test]
    fn age() {
        assert_eq!(format_age(Duration::from_secs(5)), "5s ago");
        assert_eq!(format_age(Duration::from_secs(125)), "2m ago");
        assert_eq!(format_age(Duration::from_secs(7300)), "2h ago");
    }
}
