use std::time::Duration;

/// Parse a human duration such as `"10s"` or `"1m"`, naming the field on failure
pub(crate) fn parse_duration(field: &str, value: &str) -> anyhow::Result<Duration> {
    duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid duration for {field} '{value}': {e}"))
}
