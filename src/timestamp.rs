pub fn time_str(sec: f64) -> String {
    let total_ms = (sec * 1000.0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let milliseconds = total_ms % 1000;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_millis() {
        assert_eq!(time_str(83.204), "00:01:23.204");
    }
}
