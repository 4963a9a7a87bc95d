use std::time::Duration;

/// Renders a run time as `s.mmm seconds`, `m:ss.mmm` or `h:mm:ss.mmm`.
pub fn format_human_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    match secs {
        0..60 => format!("{secs}.{millis:03} seconds"),
        60..3600 => format!("{}:{:02}.{millis:03} (m:ss.mmm)", secs / 60, secs % 60),
        _ => format!(
            "{}:{:02}:{:02}.{millis:03} (h:mm:ss.mmm)",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        ),
    }
}
