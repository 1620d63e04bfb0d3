/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Percentage with the given precision: `pct(66.666, 1)` -> "66.7%".
pub fn pct(val: f64, decimals: usize) -> String {
    format!("{val:.decimals$}%")
}

/// Short month label for a `YYYY-MM` key, e.g. "2025-03" -> "Mar 2025".
pub fn month_label(key: &str) -> String {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    match key.split_once('-') {
        Some((year, month)) => match month.parse::<usize>() {
            Ok(m) if (1..=12).contains(&m) => format!("{} {year}", NAMES[m - 1]),
            _ => key.to_string(),
        },
        None => key.to_string(),
    }
}
