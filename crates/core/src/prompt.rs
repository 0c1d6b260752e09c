//! Prompt construction and unit-count clamping for job admission.
//!
//! A style carries an ordered list of prompt templates plus an optional
//! prefix and suffix. One generation unit consumes one template; the
//! requested unit count is clamped to both the configured ceiling and
//! the number of templates the style actually has.

use crate::error::CoreError;

/// Absolute ceiling on units per job, regardless of configuration.
/// Prevents a misconfigured `MAX_UNITS_PER_JOB` from fanning out
/// unbounded engine calls.
pub const HARD_MAX_UNITS_PER_JOB: u32 = 50;

/// Minimum number of reference images required for a generation request.
pub const MIN_REFERENCE_IMAGES: usize = 1;

/// Clamp a requested unit count to the configured maximum and the
/// number of available prompt templates.
///
/// Returns an error if the request is zero or the style has no
/// templates at all (nothing could be generated).
pub fn clamp_unit_count(
    requested: u32,
    configured_max: u32,
    template_count: usize,
) -> Result<u32, CoreError> {
    if requested == 0 {
        return Err(CoreError::Validation(
            "Requested photo count must be at least 1".to_string(),
        ));
    }
    if template_count == 0 {
        return Err(CoreError::Validation(
            "Style has no prompt templates".to_string(),
        ));
    }
    let ceiling = configured_max
        .min(HARD_MAX_UNITS_PER_JOB)
        .min(template_count as u32);
    Ok(requested.min(ceiling))
}

/// Merge a style prefix/suffix with a single template.
///
/// Empty prefix/suffix segments are skipped so the result never has
/// leading, trailing, or doubled separators.
pub fn merge_prompt(prefix: &str, template: &str, suffix: &str) -> String {
    [prefix, template, suffix]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the ordered list of per-unit prompts for a job.
///
/// Takes the first `count` templates in their stored order. The ordinal
/// index of each prompt in the returned vector is the task ordinal and
/// determines output ordering.
pub fn build_prompts(
    prefix: &str,
    suffix: &str,
    templates: &[String],
    count: u32,
) -> Vec<String> {
    templates
        .iter()
        .take(count as usize)
        .map(|t| merge_prompt(prefix, t, suffix))
        .collect()
}

/// Validate the reference image set supplied at admission.
pub fn validate_reference_images(urls: &[String]) -> Result<(), CoreError> {
    if urls.len() < MIN_REFERENCE_IMAGES {
        return Err(CoreError::Validation(format!(
            "At least {MIN_REFERENCE_IMAGES} reference image is required"
        )));
    }
    if let Some(bad) = urls
        .iter()
        .find(|u| !u.starts_with("http://") && !u.starts_with("https://"))
    {
        return Err(CoreError::Validation(format!(
            "Reference image is not an absolute URL: {bad}"
        )));
    }
    Ok(())
}
