// Raw RouterOS value parsers.
//
// Each returns `None` when the text is not a valid instance of the type;
// the property store turns that into a coercion error.

use std::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") || raw.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// Comma-separated set, e.g. log `topics`. Empty text is the empty set.
pub(crate) fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// RouterOS durations: `1w2d3h4m5s`, `150ms`, `00:05:00`, `1d02:00:00`,
/// or a bare number of seconds.
pub(crate) fn parse_duration(raw: &str) -> Option<Duration> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if !s.contains(':') {
        return parse_units(s);
    }

    let split = s.rfind(|c: char| c.is_ascii_alphabetic()).map_or(0, |i| i + 1);
    let (units, clock) = s.split_at(split);
    let base = if units.is_empty() {
        Duration::ZERO
    } else {
        parse_units(units)?
    };
    base.checked_add(parse_clock(clock)?)
}

fn parse_units(s: &str) -> Option<Duration> {
    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let value: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let (unit, tail) = rest.split_at(unit_len);
        rest = tail;

        let step = match unit {
            "" | "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.checked_mul(60)?),
            "h" => Duration::from_secs(value.checked_mul(3_600)?),
            "d" => Duration::from_secs(value.checked_mul(86_400)?),
            "w" => Duration::from_secs(value.checked_mul(604_800)?),
            "ms" => Duration::from_millis(value),
            "us" => Duration::from_micros(value),
            "ns" => Duration::from_nanos(value),
            _ => return None,
        };
        total = total.checked_add(step)?;
    }
    Some(total)
}

fn parse_clock(s: &str) -> Option<Duration> {
    let mut parts = s.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds = parts.next()?;
    if parts.next().is_some() || minutes >= 60 {
        return None;
    }

    let (whole, frac) = seconds.split_once('.').unwrap_or((seconds, ""));
    let secs: u64 = whole.parse().ok()?;
    if secs >= 60 || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nanos: u32 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<9}").parse().ok()?
    };

    let total = hours.checked_mul(3_600)?.checked_add(minutes * 60 + secs)?;
    Some(Duration::new(total, nanos))
}

/// RouterOS timestamps. Forms without a year take the latest year that
/// puts the date on or before `today`; a bare time of day is taken as
/// `today`.
pub(crate) fn parse_datetime(raw: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    let s = raw.trim();

    for fmt in ["%Y-%m-%d %H:%M:%S", "%b/%d/%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    if let Some((date, time)) = s.split_once(' ') {
        // Eight years back always reaches a leap year for `feb/29`.
        return (0..=8)
            .map(|back| today.year() - back)
            .filter_map(|year| {
                NaiveDateTime::parse_from_str(&format!("{date}/{year} {time}"), "%b/%d/%Y %H:%M:%S")
                    .ok()
            })
            .find(|dt| dt.date() <= today);
    }

    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .ok()
        .map(|t| today.and_time(t))
}

/// Render a duration the way RouterOS prints it (`1d2h3m4s`, `250ms`).
pub(crate) fn format_duration(d: Duration) -> String {
    let mut secs = d.as_secs();
    let millis = d.subsec_millis();
    if secs == 0 && millis == 0 {
        return "0s".into();
    }

    let mut out = String::new();
    for (unit, size) in [("w", 604_800), ("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{unit}", secs / size));
            secs %= size;
        }
    }
    if millis > 0 {
        out.push_str(&format!("{millis}ms"));
    }
    out
}
