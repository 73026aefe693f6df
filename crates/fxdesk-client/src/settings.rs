use crate::{ClientError, ClientResult};

pub const DEFAULT_VIRTUALIZATION_THRESHOLD: usize = 1000;
pub const DEFAULT_ROW_HEIGHT_PX: u32 = 36;
pub const DEFAULT_VIEWPORT_HEIGHT_PX: u32 = 600;
pub const DEFAULT_OVERSCAN_ROWS: usize = 5;

const THRESHOLD_ENV: &str = "FXDESK_VIRTUALIZATION_THRESHOLD";
const ROW_HEIGHT_ENV: &str = "FXDESK_ROW_HEIGHT";
const VIEWPORT_HEIGHT_ENV: &str = "FXDESK_VIEWPORT_HEIGHT";
const OVERSCAN_ENV: &str = "FXDESK_OVERSCAN";

/// Preview sizing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub virtualization_threshold: usize,
    pub row_height_px: u32,
    pub viewport_height_px: u32,
    pub overscan_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            virtualization_threshold: DEFAULT_VIRTUALIZATION_THRESHOLD,
            row_height_px: DEFAULT_ROW_HEIGHT_PX,
            viewport_height_px: DEFAULT_VIEWPORT_HEIGHT_PX,
            overscan_rows: DEFAULT_OVERSCAN_ROWS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsOverrides {
    pub virtualization_threshold: Option<usize>,
    pub row_height_px: Option<u32>,
    pub viewport_height_px: Option<u32>,
    pub overscan_rows: Option<usize>,
}

impl Settings {
    /// Explicit overrides win, then `FXDESK_*` environment variables, then defaults.
    pub fn resolve(overrides: SettingsOverrides) -> ClientResult<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    fn resolve_with<F>(overrides: SettingsOverrides, lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            virtualization_threshold: pick(
                overrides.virtualization_threshold,
                THRESHOLD_ENV,
                &lookup,
                defaults.virtualization_threshold,
            )?,
            row_height_px: pick(
                overrides.row_height_px,
                ROW_HEIGHT_ENV,
                &lookup,
                defaults.row_height_px,
            )?,
            viewport_height_px: pick(
                overrides.viewport_height_px,
                VIEWPORT_HEIGHT_ENV,
                &lookup,
                defaults.viewport_height_px,
            )?,
            overscan_rows: pick_allowing_zero(
                overrides.overscan_rows,
                OVERSCAN_ENV,
                &lookup,
                defaults.overscan_rows,
            )?,
        })
    }
}

fn pick<T, F>(explicit: Option<T>, key: &str, lookup: &F, fallback: T) -> ClientResult<T>
where
    T: std::str::FromStr + PartialEq + Default + Copy,
    F: Fn(&str) -> Option<String>,
{
    let value = pick_allowing_zero(explicit, key, lookup, fallback)?;
    if value == T::default() {
        return Err(invalid_setting(key));
    }
    Ok(value)
}

fn pick_allowing_zero<T, F>(explicit: Option<T>, key: &str, lookup: &F, fallback: T) -> ClientResult<T>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = explicit {
        return Ok(value);
    }
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| invalid_setting(key)),
        None => Ok(fallback),
    }
}

fn invalid_setting(key: &str) -> ClientError {
    ClientError::invalid_argument_with_recovery(
        &format!("`{key}` must be a positive whole number."),
        vec![format!("Unset `{key}` or set it to a positive integer.")],
    )
}
